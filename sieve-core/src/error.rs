// sieve-core/src/error.rs

use crate::domain::detection::DetectionError;
use crate::domain::error::DomainError;
use crate::infrastructure::error::{DatabaseError, InfrastructureError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SieveError {
    // --- DOMAIN ERRORS (registry, thresholds) ---
    #[error(transparent)]
    Domain(#[from] DomainError),

    // --- DETECTOR-LOCAL ERRORS (isolated by the orchestrator) ---
    #[error(transparent)]
    Detection(#[from] DetectionError),

    // --- INFRASTRUCTURE ERRORS (IO, parsing, storage) ---
    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),

    // --- GENERIC / APPLICATION ERRORS ---
    #[error("Internal Error: {0}")]
    InternalError(String),
}

// Manual implementations to keep `?` ergonomic on std / driver calls
impl From<std::io::Error> for SieveError {
    fn from(err: std::io::Error) -> Self {
        SieveError::Infrastructure(InfrastructureError::Io(err))
    }
}

impl From<duckdb::Error> for SieveError {
    fn from(err: duckdb::Error) -> Self {
        SieveError::Infrastructure(InfrastructureError::Database(DatabaseError::DuckDB(err)))
    }
}
