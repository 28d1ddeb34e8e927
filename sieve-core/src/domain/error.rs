// sieve-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("Field '{field}' of table '{table}' is classified both numeric and text")]
    #[diagnostic(
        code(sieve::domain::registry::overlap),
        help("A field belongs to exactly one of `numeric_fields` / `text_fields`.")
    )]
    OverlappingField { table: String, field: String },

    #[error("Invalid average length {length} for text field '{field}'")]
    #[diagnostic(
        code(sieve::domain::registry::length),
        help("Average lengths must be strictly positive.")
    )]
    InvalidAverageLength { field: String, length: f64 },

    #[error("Invalid detection settings: {0}")]
    #[diagnostic(code(sieve::domain::detection_config))]
    InvalidDetectionConfig(String),

    #[error("Unknown detection method '{0}'")]
    #[diagnostic(
        code(sieve::domain::unknown_method),
        help("Expected one of: z_score, iqr, isolation_forest, pattern.")
    )]
    UnknownMethod(String),

    #[error("Unknown anomaly value '{value}' for {kind}")]
    #[diagnostic(code(sieve::domain::unknown_value))]
    UnknownValue { kind: &'static str, value: String },
}
