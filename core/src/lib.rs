pub mod adapters;
pub mod completeness;
pub mod config;
pub mod determinism;
pub mod engine;
pub mod history;
pub mod model;
pub mod policy;
pub mod reasoning;
pub mod validator;

pub mod error;
