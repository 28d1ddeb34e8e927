// sieve-core/src/domain/detection/mod.rs

pub mod business_rules;
pub mod ensemble;
pub mod iqr;
pub mod pattern;
pub mod stats;
pub mod zscore;

pub use business_rules::BusinessRuleDetector;
pub use ensemble::EnsembleDetector;
pub use iqr::IqrDetector;
pub use pattern::PatternDetector;
pub use zscore::ZScoreDetector;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::anomaly::{Anomaly, Record};
use crate::domain::error::DomainError;

/// Failure local to one detector. The orchestrator logs it and moves on.
#[derive(Debug, Error, Diagnostic)]
pub enum DetectionError {
    #[error("Non-finite {statistic} on field '{field}' (value overflow)")]
    #[diagnostic(
        code(sieve::detection::non_finite),
        help("Check the field for absurdly large magnitudes in this batch.")
    )]
    NonFiniteStatistic {
        field: String,
        statistic: &'static str,
    },

    #[error("Detector '{method}' failed: {reason}")]
    #[diagnostic(code(sieve::detection::failed))]
    Failed { method: String, reason: String },
}

/// One anomaly detection strategy.
///
/// Detectors only read the batch; they never persist anything.
pub trait Detector: Send + Sync {
    /// Method name used in logs.
    fn method(&self) -> &str;

    fn detect(
        &self,
        table_name: &str,
        records: &[Record],
        batch_id: &str,
    ) -> Result<Vec<Anomaly>, DetectionError>;
}

/// Configurable statistical / pattern strategies. Business rules always run.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    ZScore,
    Iqr,
    IsolationForest,
    Pattern,
}

impl DetectionMethod {
    pub const ALL: [DetectionMethod; 4] = [
        Self::ZScore,
        Self::Iqr,
        Self::IsolationForest,
        Self::Pattern,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ZScore => "z_score",
            Self::Iqr => "iqr",
            Self::IsolationForest => "isolation_forest",
            Self::Pattern => "pattern",
        }
    }
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DetectionMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s.trim())
            .ok_or_else(|| DomainError::UnknownMethod(s.to_string()))
    }
}
