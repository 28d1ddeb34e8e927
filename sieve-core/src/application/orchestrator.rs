// sieve-core/src/application/orchestrator.rs

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::domain::anomaly::{Anomaly, Record};
use crate::domain::detection::{
    BusinessRuleDetector, DetectionMethod, Detector, EnsembleDetector, IqrDetector,
    PatternDetector, ZScoreDetector,
};
use crate::domain::project::{DetectionConfig, ProjectConfig};
use crate::domain::FieldRegistry;
use crate::error::SieveError;
use crate::ports::anomaly_store::AnomalyStore;

/// Runs every enabled detector over one batch, persists what they find and
/// returns it.
///
/// A failing detector is logged and skipped; the others still report.
/// Store failures are not isolated and abort the remaining writes.
pub struct DetectionOrchestrator {
    detectors: Vec<Box<dyn Detector>>,
    business_rules: Box<dyn Detector>,
    store: Arc<dyn AnomalyStore>,
}

impl DetectionOrchestrator {
    /// Builds the strategy table from `detection.methods`, in that order.
    pub fn from_config(config: &ProjectConfig, store: Arc<dyn AnomalyStore>) -> Self {
        let registry = Arc::new(config.registry());
        let detectors = build_detectors(&config.detection, &registry);
        Self {
            detectors,
            business_rules: Box::new(BusinessRuleDetector::new(registry)),
            store,
        }
    }

    /// Explicit strategy table (custom detectors, test doubles).
    pub fn with_detectors(
        detectors: Vec<Box<dyn Detector>>,
        business_rules: Box<dyn Detector>,
        store: Arc<dyn AnomalyStore>,
    ) -> Self {
        Self {
            detectors,
            business_rules,
            store,
        }
    }

    pub fn methods(&self) -> Vec<&str> {
        self.detectors.iter().map(|d| d.method()).collect()
    }

    #[instrument(skip(self, records), fields(records = records.len()))]
    pub async fn detect(
        &self,
        table_name: &str,
        records: &[Record],
        batch_id: &str,
    ) -> Result<Vec<Anomaly>, SieveError> {
        let start = Instant::now();
        let mut anomalies = Vec::new();

        // Statistical / pattern strategies, then the table's business rules
        let strategies = self
            .detectors
            .iter()
            .chain(std::iter::once(&self.business_rules));

        for detector in strategies {
            match detector.detect(table_name, records, batch_id) {
                Ok(found) => {
                    debug!(method = detector.method(), found = found.len(), "Detector finished");
                    anomalies.extend(found);
                }
                Err(e) => {
                    warn!(
                        method = detector.method(),
                        table = table_name,
                        error = %e,
                        "Detector failed, continuing with remaining detectors"
                    );
                }
            }
        }

        for anomaly in &anomalies {
            self.store.store(anomaly).await?;
        }

        info!(
            table = table_name,
            total_records = records.len(),
            anomalies_found = anomalies.len(),
            batch_id = batch_id,
            elapsed = ?start.elapsed(),
            "Anomaly detection completed"
        );

        Ok(anomalies)
    }
}

fn build_detectors(
    detection: &DetectionConfig,
    registry: &Arc<FieldRegistry>,
) -> Vec<Box<dyn Detector>> {
    detection
        .methods
        .iter()
        .map(|method| -> Box<dyn Detector> {
            match method {
                DetectionMethod::ZScore => Box::new(ZScoreDetector::new(
                    registry.clone(),
                    detection.z_threshold,
                    detection.min_samples,
                )),
                DetectionMethod::Iqr => Box::new(IqrDetector::new(
                    registry.clone(),
                    detection.iqr_multiplier,
                    detection.iqr_extreme_multiplier,
                    detection.min_samples,
                )),
                DetectionMethod::IsolationForest => Box::new(EnsembleDetector::new(
                    registry.clone(),
                    detection.isolation_threshold,
                )),
                DetectionMethod::Pattern => Box::new(PatternDetector::new(registry.clone())),
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::anomaly::AnomalyCategory;
    use crate::domain::classification::TableFields;
    use crate::domain::detection::DetectionError;
    use crate::domain::detection::test_support::records;
    use crate::infrastructure::adapters::InMemoryAnomalyStore;
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::collections::BTreeMap;
    use std::io;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing::subscriber::DefaultGuard;

    // --- TEST DOUBLES ---

    /// Shared sink for the fmt layer output.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    /// Routes this thread's logs into a buffer until the guard drops.
    fn capture_logs() -> (LogBuffer, DefaultGuard) {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        (buffer, tracing::subscriber::set_default(subscriber))
    }

    struct FailingDetector;

    impl Detector for FailingDetector {
        fn method(&self) -> &str {
            "z_score"
        }
        fn detect(&self, _: &str, _: &[Record], _: &str) -> Result<Vec<Anomaly>, DetectionError> {
            Err(DetectionError::Failed {
                method: "z_score".into(),
                reason: "boom".into(),
            })
        }
    }

    /// Accepts `limit` writes, then fails.
    struct FlakyStore {
        limit: usize,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl AnomalyStore for FlakyStore {
        async fn store(&self, _anomaly: &Anomaly) -> Result<(), SieveError> {
            let n = self.writes.fetch_add(1, Ordering::SeqCst);
            if n >= self.limit {
                return Err(SieveError::InternalError("disk full".into()));
            }
            Ok(())
        }
    }

    fn shipment_batch() -> Vec<Record> {
        // 20 ordinary shipments plus one absurd one at index 20
        let mut items: Vec<Value> = (0..20)
            .map(|i| {
                json!({
                    "shipment_id": format!("S-{i}"),
                    "distance_km": 40 + (i % 7),
                    "delivery_duration_minutes": 90 + (i % 5),
                    "weight_kg": 10 + (i % 3),
                    "total_cost": 120 + (i % 4),
                    "margin_percentage": 30,
                    "client_tier": "ENTERPRISE",
                    "tracking_number": format!("TRK{:09}", i),
                })
            })
            .collect();
        items.push(json!({
            "shipment_id": "S-20",
            "distance_km": 150,
            "delivery_duration_minutes": 3,
            "weight_kg": 5000,
            "total_cost": 120,
            "margin_percentage": 30,
            "client_tier": "ENTERPRISE",
            "tracking_number": "TRK\u{0001}000000020",
        }));
        records(Value::Array(items))
    }

    fn categories(anomalies: &[Anomaly]) -> Vec<AnomalyCategory> {
        anomalies.iter().map(|a| a.anomaly_category).collect()
    }

    #[tokio::test]
    async fn test_default_strategy_order() {
        let store = Arc::new(InMemoryAnomalyStore::new());
        let orchestrator = DetectionOrchestrator::from_config(&ProjectConfig::default(), store);
        assert_eq!(
            orchestrator.methods(),
            vec!["z_score", "iqr", "isolation_forest", "pattern"]
        );
    }

    #[tokio::test]
    async fn test_detect_persists_everything_it_returns() -> anyhow::Result<()> {
        let store = Arc::new(InMemoryAnomalyStore::new());
        let orchestrator =
            DetectionOrchestrator::from_config(&ProjectConfig::default(), store.clone());

        let batch = shipment_batch();
        let anomalies = orchestrator.detect("shipments", &batch, "batch-42").await?;

        let found = categories(&anomalies);
        assert!(found.contains(&AnomalyCategory::ZScoreOutlier));
        assert!(found.contains(&AnomalyCategory::IqrOutlier));
        assert!(found.contains(&AnomalyCategory::UnusualCharacters));
        assert!(found.contains(&AnomalyCategory::DeliveryTimeDistanceMismatch));

        let weight_outlier = anomalies
            .iter()
            .find(|a| {
                a.anomaly_category == AnomalyCategory::ZScoreOutlier
                    && a.anomaly_data["field"] == "weight_kg"
            })
            .unwrap();
        assert_eq!(weight_outlier.record_id, 20);
        assert_eq!(weight_outlier.record_key.as_deref(), Some("S-20"));

        assert!(anomalies.iter().all(|a| a.batch_id == "batch-42"));
        assert!(anomalies.iter().all(|a| a.table_name == "shipments"));
        assert!(
            anomalies
                .iter()
                .all(|a| (0.0..=1.0).contains(&a.severity_score))
        );
        assert_eq!(store.snapshot()?, anomalies);
        Ok(())
    }

    #[tokio::test]
    async fn test_failing_detector_does_not_abort_batch() -> anyhow::Result<()> {
        let (logs, _guard) = capture_logs();
        let registry = Arc::new(FieldRegistry::logistics_defaults());
        let store = Arc::new(InMemoryAnomalyStore::new());
        let orchestrator = DetectionOrchestrator::with_detectors(
            vec![
                Box::new(FailingDetector),
                Box::new(IqrDetector::new(registry.clone(), 1.5, 3.0, 10)),
                Box::new(PatternDetector::new(registry.clone())),
            ],
            Box::new(BusinessRuleDetector::new(registry)),
            store.clone(),
        );

        let anomalies = orchestrator
            .detect("shipments", &shipment_batch(), "b-fail")
            .await?;

        let found = categories(&anomalies);
        assert!(!found.contains(&AnomalyCategory::ZScoreOutlier));
        assert!(found.contains(&AnomalyCategory::IqrOutlier));
        assert!(found.contains(&AnomalyCategory::UnusualCharacters));
        assert!(found.contains(&AnomalyCategory::DeliveryTimeDistanceMismatch));
        assert_eq!(store.len(), anomalies.len());

        let output = logs.contents();
        let warning = output
            .lines()
            .find(|l| l.contains("Detector failed"))
            .unwrap();
        assert!(warning.contains("WARN"));
        assert!(warning.contains("method=\"z_score\""));
        assert!(warning.contains("table=\"shipments\""));
        assert!(warning.contains("error=Detector 'z_score' failed: boom"));
        Ok(())
    }

    #[tokio::test]
    async fn test_failing_business_rules_are_isolated_too() -> anyhow::Result<()> {
        let registry = Arc::new(FieldRegistry::logistics_defaults());
        let store = Arc::new(InMemoryAnomalyStore::new());
        let orchestrator = DetectionOrchestrator::with_detectors(
            vec![Box::new(PatternDetector::new(registry))],
            Box::new(FailingDetector),
            store,
        );

        let anomalies = orchestrator
            .detect("shipments", &shipment_batch(), "b1")
            .await?;
        assert_eq!(
            categories(&anomalies),
            vec![AnomalyCategory::UnusualCharacters]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let store = Arc::new(FlakyStore {
            limit: 1,
            writes: AtomicUsize::new(0),
        });
        let orchestrator = DetectionOrchestrator::from_config(&ProjectConfig::default(), store.clone());

        let res = orchestrator.detect("shipments", &shipment_batch(), "b1").await;
        assert!(matches!(res, Err(SieveError::InternalError(_))));
        // first write succeeded, second failed, nothing after that was attempted
        assert_eq!(store.writes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_clean_batch_returns_empty_list() -> anyhow::Result<()> {
        let (logs, _guard) = capture_logs();
        let mut config = ProjectConfig::default();
        config.tables = BTreeMap::from([(
            "depots".to_string(),
            TableFields::new(&["capacity"], &["depot_name"]),
        )]);
        let store = Arc::new(InMemoryAnomalyStore::new());
        let orchestrator = DetectionOrchestrator::from_config(&config, store.clone());

        let batch: Vec<Record> = (0..15)
            .map(|i| {
                let mut r = Record::new();
                r.insert("capacity".into(), json!(500));
                r.insert("depot_name".into(), json!(format!("Depot {i}")));
                r
            })
            .collect();

        let anomalies = orchestrator.detect("depots", &batch, "clean").await?;
        assert!(anomalies.is_empty());
        assert!(store.is_empty());

        // the zero-count summary is still logged
        let output = logs.contents();
        let summary = output
            .lines()
            .find(|l| l.contains("Anomaly detection completed"))
            .unwrap();
        assert!(summary.contains("INFO"));
        assert!(summary.contains("anomalies_found=0"));
        assert!(summary.contains("total_records=15"));
        assert!(summary.contains("batch_id=\"clean\""));

        let none = orchestrator.detect("unknown_table", &batch, "clean").await?;
        assert!(none.is_empty());
        Ok(())
    }
}
