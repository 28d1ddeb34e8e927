// sieve-core/src/domain/report.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::anomaly::Anomaly;

/// Summary of one `detect()` run, derived from its returned anomalies.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DetectionReport {
    pub table_name: String,
    pub batch_id: String,
    pub total_records: usize,
    pub anomalies_found: usize,
    pub flagged_records: usize,
    pub by_type: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
    pub max_severity: f64,
    pub anomalies: Vec<Anomaly>,
}

impl DetectionReport {
    pub fn summarize(
        table_name: &str,
        batch_id: &str,
        total_records: usize,
        anomalies: &[Anomaly],
    ) -> Self {
        let mut by_type = BTreeMap::new();
        let mut by_category = BTreeMap::new();
        let mut records = std::collections::BTreeSet::new();
        let mut max_severity: f64 = 0.0;

        for a in anomalies {
            *by_type.entry(a.anomaly_type.as_str().to_string()).or_insert(0) += 1;
            *by_category
                .entry(a.anomaly_category.as_str().to_string())
                .or_insert(0) += 1;
            records.insert(a.record_id);
            max_severity = max_severity.max(a.severity_score);
        }

        Self {
            table_name: table_name.to_string(),
            batch_id: batch_id.to_string(),
            total_records,
            anomalies_found: anomalies.len(),
            flagged_records: records.len(),
            by_type,
            by_category,
            max_severity,
            anomalies: anomalies.to_vec(),
        }
    }
}
