// sieve-core/src/domain/detection/iqr.rs

use std::sync::Arc;
use tracing::debug;

use crate::domain::anomaly::{Anomaly, AnomalyCategory, Record};
use crate::domain::classification::FieldRegistry;
use crate::domain::detection::stats::{collect_numeric, ensure_finite, percentile};
use crate::domain::detection::{DetectionError, Detector};

const SEVERITY_EXTREME: f64 = 0.9;
const SEVERITY_MILD: f64 = 0.6;

/// Tukey fences over the interquartile range of each numeric field.
pub struct IqrDetector {
    registry: Arc<FieldRegistry>,
    multiplier: f64,
    extreme_multiplier: f64,
    min_samples: usize,
}

impl IqrDetector {
    pub fn new(
        registry: Arc<FieldRegistry>,
        multiplier: f64,
        extreme_multiplier: f64,
        min_samples: usize,
    ) -> Self {
        Self {
            registry,
            multiplier,
            extreme_multiplier,
            min_samples,
        }
    }
}

impl Detector for IqrDetector {
    fn method(&self) -> &str {
        "iqr"
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
                debug!(field = %field, samples = samples.len(), "iqr: not enough samples, skipping");
                continue;
            }

            let mut sorted: Vec<f64> = samples.iter().map(|(_, v)| *v).collect();
            sorted.sort_by(f64::total_cmp);

            let (Some(q1), Some(q3)) = (percentile(&sorted, 0.25), percentile(&sorted, 0.75))
            else {
                continue;
            };
            let iqr = ensure_finite(field, "interquartile range", q3 - q1)?;

            let lower_fence = q1 - self.multiplier * iqr;
            let upper_fence = q3 + self.multiplier * iqr;
            let extreme_lower = q1 - self.extreme_multiplier * iqr;
            let extreme_upper = q3 + self.extreme_multiplier * iqr;

            for (record_id, value) in samples {
                if value >= lower_fence && value <= upper_fence {
                    continue;
                }

                let is_extreme = value < extreme_lower || value > extreme_upper;
                let (severity, level) = if is_extreme {
                    (SEVERITY_EXTREME, "HIGH")
                } else {
                    (SEVERITY_MILD, "MEDIUM")
                };

                let anomaly = Anomaly::new(
                    table_name,
                    batch_id,
                    record_id,
                    AnomalyCategory::IqrOutlier,
                    severity,
                    format!(
                        "Value {} in '{}' lies outside the IQR fences [{:.4}, {:.4}]",
                        value, field, lower_fence, upper_fence
                    ),
                )
                .with_data("field", field.as_str())
                .with_data("value", value)
                .with_data("q1", q1)
                .with_data("q3", q3)
                .with_data("iqr", iqr)
                .with_data("lower_fence", lower_fence)
                .with_data("upper_fence", upper_fence)
                .with_data("is_extreme", is_extreme)
                .with_data("severity_level", level)
                .with_record_key(self.registry.record_key(table_name, &records[record_id]));

                anomalies.push(anomaly);
            }
        }

        Ok(anomalies)
    }
}
