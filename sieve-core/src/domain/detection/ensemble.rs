// sieve-core/src/domain/detection/ensemble.rs

use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::domain::anomaly::record::numeric_value;
use crate::domain::anomaly::{Anomaly, AnomalyCategory, Record};
use crate::domain::classification::FieldRegistry;
use crate::domain::detection::{DetectionError, Detector};

/// Rank-based multivariate heuristic ("isolation_forest" in stored anomalies).
///
/// Each record gets, per numeric field, the distance of its rank from the
/// middle rank normalised by `n / 2`, averaged over all fields. Records whose
/// averaged score is *below* `threshold` are flagged with severity
/// `1 - score`, so middle-of-the-pack profiles are the ones reported.
pub struct EnsembleDetector {
    registry: Arc<FieldRegistry>,
    threshold: f64,
}

impl EnsembleDetector {
    pub fn new(registry: Arc<FieldRegistry>, threshold: f64) -> Self {
        Self {
            registry,
            threshold,
        }
    }

    /// Averaged rank-extremity score of every record, in batch order.
    pub fn scores(features: &[Vec<f64>]) -> Vec<f64> {
        let n = features.len();
        let dims = features.first().map(Vec::len).unwrap_or(0);
        if n == 0 || dims == 0 {
            return vec![0.0; n];
        }

        let half = n as f64 / 2.0;
        let mut totals = vec![0.0; n];

        for dim in 0..dims {
            let mut sorted: Vec<f64> = features.iter().map(|f| f[dim]).collect();
            sorted.sort_by(f64::total_cmp);

            for (total, feature) in totals.iter_mut().zip(features) {
                let value = feature[dim];
                // 1 + number of values strictly lower
                let rank = 1 + sorted.partition_point(|v| *v < value);
                *total += (rank as f64 - half).abs() / half;
            }
        }

        totals.into_iter().map(|t| t / dims as f64).collect()
    }
}

impl Detector for EnsembleDetector {
    fn method(&self) -> &str {
        "isolation_forest"
    }

    fn detect(
        &self,
        table_name: &str,
        records: &[Record],
        batch_id: &str,
    ) -> Result<Vec<Anomaly>, DetectionError> {
        let fields = self.registry.numeric_fields(table_name);
        if fields.len() < 2 || records.is_empty() {
            debug!(table = table_name, fields = fields.len(), "isolation_forest: not applicable");
            return Ok(Vec::new());
        }

        // Missing or non-numeric values count as 0.0
        let features: Vec<Vec<f64>> = records
            .iter()
            .map(|record| {
                fields
                    .iter()
                    .map(|field| numeric_value(record, field).unwrap_or(0.0))
                    .collect()
            })
            .collect();

        let scores = Self::scores(&features);
        if let Some(bad) = scores.iter().find(|s| !s.is_finite()) {
            return Err(DetectionError::Failed {
                method: self.method().to_string(),
                reason: format!("non-finite isolation score {bad}"),
            });
        }

        let anomalies = scores
            .into_iter()
            .zip(features)
            .enumerate()
            .filter(|(_, (score, _))| *score < self.threshold)
            .map(|(record_id, (score, feature_vector))| {
                Anomaly::new(
                    table_name,
                    batch_id,
                    record_id,
                    AnomalyCategory::IsolationForest,
                    1.0 - score,
                    format!(
                        "Record numeric profile scored {:.3} (threshold {:.2}) across {} fields",
                        score,
                        self.threshold,
                        fields.len()
                    ),
                )
                .with_data("isolation_score", score)
                .with_data(
                    "feature_vector",
                    Value::Array(feature_vector.into_iter().map(Value::from).collect()),
                )
                .with_data("fields", fields.to_vec())
                .with_record_key(self.registry.record_key(table_name, &records[record_id]))
            })
            .collect();

        Ok(anomalies)
    }
}
