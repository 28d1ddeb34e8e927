// sieve-core/src/domain/anomaly/model.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::domain::error::DomainError;

/// Coarse category of a flagged record.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyType {
    Statistical,
    Pattern,
    BusinessRule,
}

impl AnomalyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Statistical => "statistical",
            Self::Pattern => "pattern",
            Self::BusinessRule => "business_rule",
        }
    }
}

impl fmt::Display for AnomalyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The specific rule or method that flagged a record.
///
/// Each category belongs to exactly one detector, so the coarse type and the
/// detection method are derived from it rather than passed around separately.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyCategory {
    ZScoreOutlier,
    IqrOutlier,
    IsolationForest,
    UnusualCharacters,
    UnusualLength,
    DeliveryTimeDistanceMismatch,
    MarginOutsideExpectedRange,
    SuspiciousRoundAmount,
}

impl AnomalyCategory {
    pub const ALL: [AnomalyCategory; 8] = [
        Self::ZScoreOutlier,
        Self::IqrOutlier,
        Self::IsolationForest,
        Self::UnusualCharacters,
        Self::UnusualLength,
        Self::DeliveryTimeDistanceMismatch,
        Self::MarginOutsideExpectedRange,
        Self::SuspiciousRoundAmount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ZScoreOutlier => "z_score_outlier",
            Self::IqrOutlier => "iqr_outlier",
            Self::IsolationForest => "isolation_forest",
            Self::UnusualCharacters => "unusual_characters",
            Self::UnusualLength => "unusual_length",
            Self::DeliveryTimeDistanceMismatch => "delivery_time_distance_mismatch",
            Self::MarginOutsideExpectedRange => "margin_outside_expected_range",
            Self::SuspiciousRoundAmount => "suspicious_round_amount",
        }
    }

    pub fn anomaly_type(&self) -> AnomalyType {
        match self {
            Self::ZScoreOutlier | Self::IqrOutlier | Self::IsolationForest => {
                AnomalyType::Statistical
            }
            Self::UnusualCharacters | Self::UnusualLength => AnomalyType::Pattern,
            Self::DeliveryTimeDistanceMismatch
            | Self::MarginOutsideExpectedRange
            | Self::SuspiciousRoundAmount => AnomalyType::BusinessRule,
        }
    }

    pub fn detection_method(&self) -> &'static str {
        match self {
            Self::ZScoreOutlier => "z_score",
            Self::IqrOutlier => "iqr",
            Self::IsolationForest => "isolation_forest",
            Self::UnusualCharacters | Self::UnusualLength => "pattern_matching",
            Self::DeliveryTimeDistanceMismatch
            | Self::MarginOutsideExpectedRange
            | Self::SuspiciousRoundAmount => "business_rule",
        }
    }
}

impl fmt::Display for AnomalyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AnomalyCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| DomainError::UnknownValue {
                kind: "anomaly_category",
                value: s.to_string(),
            })
    }
}

/// Review lifecycle. The engine only ever creates `Detected`; the other
/// states are written by downstream review tooling.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyStatus {
    #[default]
    Detected,
    Reviewed,
    Resolved,
    Dismissed,
}

impl AnomalyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Detected => "DETECTED",
            Self::Reviewed => "REVIEWED",
            Self::Resolved => "RESOLVED",
            Self::Dismissed => "DISMISSED",
        }
    }
}

impl FromStr for AnomalyStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DETECTED" => Ok(Self::Detected),
            "REVIEWED" => Ok(Self::Reviewed),
            "RESOLVED" => Ok(Self::Resolved),
            "DISMISSED" => Ok(Self::Dismissed),
            other => Err(DomainError::UnknownValue {
                kind: "status",
                value: other.to_string(),
            }),
        }
    }
}

/// One flagged (table, record, field-or-rule) combination.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Anomaly {
    pub table_name: String,
    /// Position of the record inside its batch (0-based).
    pub record_id: usize,
    /// Stable warehouse key, when the table declares one and the record carries it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_key: Option<String>,
    pub anomaly_type: AnomalyType,
    pub anomaly_category: AnomalyCategory,
    pub description: String,
    pub severity_score: f64,
    pub detection_method: String,
    #[serde(default)]
    pub anomaly_data: Map<String, Value>,
    pub batch_id: String,
    #[serde(default)]
    pub status: AnomalyStatus,
    pub detected_at: DateTime<Utc>,
}

impl Anomaly {
    /// Creates a `DETECTED` anomaly. Severity is clamped into [0, 1]; NaN becomes 0.
    pub fn new(
        table_name: &str,
        batch_id: &str,
        record_id: usize,
        category: AnomalyCategory,
        severity_score: f64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            table_name: table_name.to_string(),
            record_id,
            record_key: None,
            anomaly_type: category.anomaly_type(),
            anomaly_category: category,
            description: description.into(),
            severity_score: clamp_severity(severity_score),
            detection_method: category.detection_method().to_string(),
            anomaly_data: Map::new(),
            batch_id: batch_id.to_string(),
            status: AnomalyStatus::Detected,
            detected_at: Utc::now(),
        }
    }

    pub fn with_data(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.anomaly_data.insert(key.to_string(), value.into());
        self
    }

    pub fn with_record_key(mut self, key: Option<String>) -> Self {
        self.record_key = key;
        self
    }
}

pub fn clamp_severity(score: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, 1.0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_severity_is_clamped() {
        let high = Anomaly::new("t", "b", 0, AnomalyCategory::ZScoreOutlier, 7.5, "x");
        assert_eq!(high.severity_score, 1.0);

        let low = Anomaly::new("t", "b", 0, AnomalyCategory::ZScoreOutlier, -0.2, "x");
        assert_eq!(low.severity_score, 0.0);

        let nan = Anomaly::new("t", "b", 0, AnomalyCategory::ZScoreOutlier, f64::NAN, "x");
        assert_eq!(nan.severity_score, 0.0);
    }

    #[test]
    fn test_category_drives_type_and_method() {
        let a = Anomaly::new("shipments", "b1", 3, AnomalyCategory::UnusualLength, 0.3, "x");
        assert_eq!(a.anomaly_type, AnomalyType::Pattern);
        assert_eq!(a.detection_method, "pattern_matching");
        assert_eq!(a.status, AnomalyStatus::Detected);

        assert_eq!(
            AnomalyCategory::SuspiciousRoundAmount.anomaly_type(),
            AnomalyType::BusinessRule
        );
        assert_eq!(AnomalyCategory::IqrOutlier.detection_method(), "iqr");
    }

    #[test]
    fn test_category_parses_back_from_its_name() -> Result<()> {
        for category in AnomalyCategory::ALL {
            assert_eq!(category.as_str().parse::<AnomalyCategory>()?, category);
        }
        assert!("made_up".parse::<AnomalyCategory>().is_err());
        Ok(())
    }

    #[test]
    fn test_serialized_shape() -> Result<()> {
        let a = Anomaly::new("shipments", "b1", 0, AnomalyCategory::IqrOutlier, 0.6, "x")
            .with_data("field", "weight_kg");
        let json = serde_json::to_value(&a)?;
        assert_eq!(json["anomaly_type"], "statistical");
        assert_eq!(json["anomaly_category"], "iqr_outlier");
        assert_eq!(json["status"], "DETECTED");
        assert_eq!(json["anomaly_data"]["field"], "weight_kg");
        assert!(json.get("record_key").is_none());
        Ok(())
    }
}
