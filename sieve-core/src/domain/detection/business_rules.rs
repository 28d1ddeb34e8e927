// sieve-core/src/domain/detection/business_rules.rs

use serde_json::json;
use std::sync::Arc;

use crate::domain::anomaly::record::{numeric_value, text_value};
use crate::domain::anomaly::{Anomaly, AnomalyCategory, Record};
use crate::domain::classification::{FieldRegistry, RuleSet};
use crate::domain::detection::{DetectionError, Detector};

// --- SHIPMENT RULES ---
const MIN_PLAUSIBLE_MINUTES: f64 = 5.0;
const LONG_HAUL_KM: f64 = 100.0;
const MINUTES_PER_KM: f64 = 2.0;
const SEVERITY_DELIVERY_MISMATCH: f64 = 0.9;
const SEVERITY_MARGIN: f64 = 0.7;

// --- FINANCIAL RULES ---
const ROUND_AMOUNT_STEP: f64 = 100.0;
const ROUND_AMOUNT_FLOOR: f64 = 10_000.0;
const SEVERITY_ROUND_AMOUNT: f64 = 0.5;

/// Expected margin band, in percent, per client tier.
pub fn tier_margin_bounds(tier: &str) -> Option<(f64, f64)> {
    match tier.trim().to_ascii_uppercase().as_str() {
        "ENTERPRISE" => Some((15.0, 35.0)),
        "STANDARD" => Some((25.0, 50.0)),
        "BASIC" => Some((35.0, 65.0)),
        _ => None,
    }
}

/// Domain checks bound to tables through their `rule_set`.
pub struct BusinessRuleDetector {
    registry: Arc<FieldRegistry>,
}

impl BusinessRuleDetector {
    pub fn new(registry: Arc<FieldRegistry>) -> Self {
        Self { registry }
    }

    fn check_shipment(&self, ctx: &RuleContext<'_>, record: &Record) -> Vec<Anomaly> {
        let mut anomalies = Vec::new();

        if let (Some(minutes), Some(distance)) = (
            numeric_value(record, "delivery_duration_minutes"),
            numeric_value(record, "distance_km"),
        ) && minutes < MIN_PLAUSIBLE_MINUTES
            && distance > LONG_HAUL_KM
        {
            let expected_min_time = MIN_PLAUSIBLE_MINUTES.max(distance * MINUTES_PER_KM);
            anomalies.push(
                ctx.anomaly(
                    AnomalyCategory::DeliveryTimeDistanceMismatch,
                    SEVERITY_DELIVERY_MISMATCH,
                    format!(
                        "Delivered {} km in {} minutes (expected at least {} minutes)",
                        distance, minutes, expected_min_time
                    ),
                )
                .with_data("delivery_duration_minutes", minutes)
                .with_data("distance_km", distance)
                .with_data("expected_min_time", expected_min_time),
            );
        }

        if let (Some(margin), Some(tier)) = (
            numeric_value(record, "margin_percentage"),
            text_value(record, "client_tier"),
        ) && let Some((min, max)) = tier_margin_bounds(tier)
            && (margin < min || margin > max)
        {
            anomalies.push(
                ctx.anomaly(
                    AnomalyCategory::MarginOutsideExpectedRange,
                    SEVERITY_MARGIN,
                    format!(
                        "Margin {}% is outside the {} tier range [{}, {}]",
                        margin, tier, min, max
                    ),
                )
                .with_data("margin_percentage", margin)
                .with_data("client_tier", tier)
                .with_data("expected_range", json!([min, max])),
            );
        }

        anomalies
    }

    fn check_financial_transaction(&self, ctx: &RuleContext<'_>, record: &Record) -> Vec<Anomaly> {
        let Some(amount) = numeric_value(record, "amount") else {
            return Vec::new();
        };

        if amount != 0.0 && amount % ROUND_AMOUNT_STEP == 0.0 && amount > ROUND_AMOUNT_FLOOR {
            return vec![
                ctx.anomaly(
                    AnomalyCategory::SuspiciousRoundAmount,
                    SEVERITY_ROUND_AMOUNT,
                    format!("Round transaction amount {} above {}", amount, ROUND_AMOUNT_FLOOR),
                )
                .with_data("amount", amount)
                .with_data("round_to", ROUND_AMOUNT_STEP)
                .with_data("threshold", ROUND_AMOUNT_FLOOR),
            ];
        }
        Vec::new()
    }
}

/// Batch scope of the record currently being checked.
struct RuleContext<'a> {
    table_name: &'a str,
    batch_id: &'a str,
    record_id: usize,
    record_key: Option<String>,
}

impl RuleContext<'_> {
    fn anomaly(&self, category: AnomalyCategory, severity: f64, description: String) -> Anomaly {
        Anomaly::new(
            self.table_name,
            self.batch_id,
            self.record_id,
            category,
            severity,
            description,
        )
        .with_record_key(self.record_key.clone())
    }
}

impl Detector for BusinessRuleDetector {
    fn method(&self) -> &str {
        "business_rule"
    }

    fn detect(
        &self,
        table_name: &str,
        records: &[Record],
        batch_id: &str,
    ) -> Result<Vec<Anomaly>, DetectionError> {
        let Some(rule_set) = self.registry.rule_set(table_name) else {
            return Ok(Vec::new());
        };

        let mut anomalies = Vec::new();
        for (record_id, record) in records.iter().enumerate() {
            let ctx = RuleContext {
                table_name,
                batch_id,
                record_id,
                record_key: self.registry.record_key(table_name, record),
            };
            let found = match rule_set {
                RuleSet::Shipment => self.check_shipment(&ctx, record),
                RuleSet::FinancialTransaction => self.check_financial_transaction(&ctx, record),
            };
            anomalies.extend(found);
        }
        Ok(anomalies)
    }
}
