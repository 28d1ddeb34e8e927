// src/domain/project/configuration.rs

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

use crate::domain::classification::{
    FieldRegistry, TableFields, default_tables, default_text_lengths,
};
use crate::domain::detection::DetectionMethod;
use crate::domain::error::DomainError;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProjectConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub detection: DetectionConfig,

    #[serde(default = "default_tables")]
    pub tables: BTreeMap<String, TableFields>,

    /// Entries override the built-in lengths; unlisted fields keep theirs.
    #[serde(default = "default_text_lengths", deserialize_with = "merge_text_lengths")]
    pub text_lengths: BTreeMap<String, f64>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            version: default_version(),
            store: StoreConfig::default(),
            detection: DetectionConfig::default(),
            tables: default_tables(),
            text_lengths: default_text_lengths(),
        }
    }
}

impl ProjectConfig {
    pub fn registry(&self) -> FieldRegistry {
        FieldRegistry::new(self.tables.clone(), self.text_lengths.clone())
    }

    /// Checks thresholds (validator rules + cross-field rules) and the registry.
    pub fn validate_config(&self) -> Result<(), DomainError> {
        self.detection
            .validate()
            .map_err(|e| DomainError::InvalidDetectionConfig(e.to_string()))?;
        if self.detection.iqr_extreme_multiplier < self.detection.iqr_multiplier {
            return Err(DomainError::InvalidDetectionConfig(format!(
                "iqr_extreme_multiplier ({}) must be >= iqr_multiplier ({})",
                self.detection.iqr_extreme_multiplier, self.detection.iqr_multiplier
            )));
        }
        self.registry().validate()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StoreConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// Tunables of the statistical and pattern detectors.
#[derive(Debug, Deserialize, Serialize, Validate, Clone, PartialEq)]
pub struct DetectionConfig {
    /// Strategy table, run in this order.
    #[serde(default = "default_methods")]
    pub methods: Vec<DetectionMethod>,

    #[validate(range(min = 2, message = "at least 2 samples are needed for a spread"))]
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,

    #[validate(range(exclusive_min = 0.0))]
    #[serde(default = "default_z_threshold")]
    pub z_threshold: f64,

    #[validate(range(exclusive_min = 0.0))]
    #[serde(default = "default_iqr_multiplier")]
    pub iqr_multiplier: f64,

    #[validate(range(exclusive_min = 0.0))]
    #[serde(default = "default_iqr_extreme_multiplier")]
    pub iqr_extreme_multiplier: f64,

    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default = "default_isolation_threshold")]
    pub isolation_threshold: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            methods: default_methods(),
            min_samples: default_min_samples(),
            z_threshold: default_z_threshold(),
            iqr_multiplier: default_iqr_multiplier(),
            iqr_extreme_multiplier: default_iqr_extreme_multiplier(),
            isolation_threshold: default_isolation_threshold(),
        }
    }
}

fn merge_text_lengths<'de, D>(deserializer: D) -> Result<BTreeMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let overrides = BTreeMap::<String, f64>::deserialize(deserializer)?;
    let mut lengths = default_text_lengths();
    lengths.extend(overrides);
    Ok(lengths)
}

fn default_name() -> String {
    "sieve".to_string()
}
fn default_version() -> String {
    "1.0".to_string()
}
fn default_db_path() -> String {
    "sieve.duckdb".to_string()
}
fn default_methods() -> Vec<DetectionMethod> {
    DetectionMethod::ALL.to_vec()
}
fn default_min_samples() -> usize {
    10
}
fn default_z_threshold() -> f64 {
    3.0
}
fn default_iqr_multiplier() -> f64 {
    1.5
}
fn default_iqr_extreme_multiplier() -> f64 {
    3.0
}
fn default_isolation_threshold() -> f64 {
    0.3
}
