// sieve-core/src/domain/detection/zscore.rs

use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use crate::domain::anomaly::{Anomaly, AnomalyCategory, Record};
use crate::domain::classification::FieldRegistry;
use crate::domain::detection::stats::{collect_numeric, ensure_finite, population_stats};
use crate::domain::detection::{DetectionError, Detector};

/// z-score at which severity saturates to 1.0.
const SEVERITY_SATURATION_Z: f64 = 4.0;

/// Univariate outlier scan: flags values more than `threshold` population
/// standard deviations away from the batch mean of their field.
pub struct ZScoreDetector {
    registry: Arc<FieldRegistry>,
    threshold: f64,
    min_samples: usize,
}

impl ZScoreDetector {
    pub fn new(registry: Arc<FieldRegistry>, threshold: f64, min_samples: usize) -> Self {
        Self {
            registry,
            threshold,
            min_samples,
        }
    }
}

impl Detector for ZScoreDetector {
    fn method(&self) -> &str {
        "z_score"
    }

    fn detect(
        &self,
        table_name: &str,
        records: &[Record],
        batch_id: &str,
    ) -> Result<Vec<Anomaly>, DetectionError> {
        let mut anomalies = Vec::new();

        for field in self.registry.numeric_fields(table_name) {
            let samples = collect_numeric(records, field);
            if samples.len() < self.min_samples {
                debug!(field = %field, samples = samples.len(), "z_score: not enough samples, skipping");
                continue;
            }

            let values: Vec<f64> = samples.iter().map(|(_, v)| *v).collect();
            let (mean, std_dev) = population_stats(&values);
            let mean = ensure_finite(field, "mean", mean)?;
            let std_dev = ensure_finite(field, "standard deviation", std_dev)?;

            // Degenerate distribution: every value identical
            if std_dev == 0.0 {
                debug!(field = %field, "z_score: zero variance, skipping");
                continue;
            }

            let lower = mean - self.threshold * std_dev;
            let upper = mean + self.threshold * std_dev;

            for (record_id, value) in samples {
                let z_score = (value - mean).abs() / std_dev;
                if z_score <= self.threshold {
                    continue;
                }

                let severity = (z_score / SEVERITY_SATURATION_Z).min(1.0);
                let anomaly = Anomaly::new(
                    table_name,
                    batch_id,
                    record_id,
                    AnomalyCategory::ZScoreOutlier,
                    severity,
                    format!(
                        "Value {} in '{}' is {:.2} standard deviations from the batch mean {:.4}",
                        value, field, z_score, mean
                    ),
                )
                .with_data("field", field.as_str())
                .with_data("value", value)
                .with_data("z_score", z_score)
                .with_data("mean", mean)
                .with_data("std_dev", std_dev)
                .with_data("expected_range", json!([lower, upper]))
                .with_record_key(self.registry.record_key(table_name, &records[record_id]));

                anomalies.push(anomaly);
            }
        }

        Ok(anomalies)
    }
}
