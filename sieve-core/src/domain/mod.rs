// sieve-core/src/domain/mod.rs

pub mod anomaly;
pub mod classification;
pub mod detection;
pub mod error;
pub mod project;
pub mod report;

// Handy re-exports to keep imports short elsewhere
pub use classification::{FieldRegistry, RuleSet, TableFields};
pub use error::DomainError;
pub use project::{DetectionConfig, ProjectConfig};
pub use report::DetectionReport;
