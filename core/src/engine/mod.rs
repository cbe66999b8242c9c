pub mod orchestrator;
pub mod report;
pub mod request;

pub use orchestrator::ValidationEngine;
pub use report::{SeveritySummary, Stage, StageOutcome, StageStatus, ValidationReport};
pub use request::ValidationRequest;
