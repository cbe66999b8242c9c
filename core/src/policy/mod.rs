pub mod compliance;
pub mod risk_matrix;
pub mod types;
