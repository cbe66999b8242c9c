pub mod interface;
pub mod response;
pub mod runtime;
