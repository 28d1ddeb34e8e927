// sieve-core/src/infrastructure/error.rs

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DatabaseError {
    #[error("DuckDB Engine Error: {0}")]
    #[diagnostic(
        code(sieve::infra::database::duckdb),
        help("An error occurred inside the anomaly store.")
    )]
    DuckDB(#[from] duckdb::Error),

    #[error("Anomaly store lock poisoned")]
    #[diagnostic(code(sieve::infra::database::poisoned))]
    Poisoned,

    #[error("Corrupted anomaly row: {0}")]
    #[diagnostic(
        code(sieve::infra::database::corrupted_row),
        help("The data_quality_anomalies table holds a value this engine cannot read back.")
    )]
    CorruptedRow(String),
}

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- DATABASE (Abstracted) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Database(#[from] DatabaseError),

    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(sieve::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    // --- CONFIG / YAML ---
    #[error("YAML Parsing Error in {path:?}: {source}")]
    #[diagnostic(
        code(sieve::infra::yaml),
        help("Check your YAML syntax (indentation, types).")
    )]
    YamlError {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    // --- BATCH / REPORT JSON ---
    #[error("JSON Error: {0}")]
    #[diagnostic(
        code(sieve::infra::json),
        help("Batches are JSON arrays of flat objects.")
    )]
    JsonError(#[from] serde_json::Error),

    #[error("Project configuration not found at '{0}'")]
    #[diagnostic(code(sieve::infra::config_missing))]
    ConfigNotFound(String),
}

// Manual implementation for shortcuts (e.g. `?` operator on duckdb calls)
impl From<duckdb::Error> for InfrastructureError {
    fn from(err: duckdb::Error) -> Self {
        InfrastructureError::Database(DatabaseError::DuckDB(err))
    }
}
