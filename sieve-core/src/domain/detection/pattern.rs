// sieve-core/src/domain/detection/pattern.rs

use std::sync::Arc;

use crate::domain::anomaly::record::text_value;
use crate::domain::anomaly::{Anomaly, AnomalyCategory, Record};
use crate::domain::classification::FieldRegistry;
use crate::domain::detection::{DetectionError, Detector};

const SEVERITY_UNUSUAL_CHARACTERS: f64 = 0.4;
const SEVERITY_UNUSUAL_LENGTH: f64 = 0.3;
const LONG_FACTOR: f64 = 3.0;
const SHORT_FACTOR: f64 = 0.1;

/// Printable ASCII and Latin-1 supplement are expected; anything else
/// (C0/C1 controls, DEL, code points above U+00FF) is unusual.
fn is_unusual(c: char) -> bool {
    let cp = u32::from(c);
    !((0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp))
}

fn is_c1_control(c: char) -> bool {
    (0x80..=0x9F).contains(&u32::from(c))
}

/// Per text field scan for odd characters and odd lengths.
pub struct PatternDetector {
    registry: Arc<FieldRegistry>,
}

impl PatternDetector {
    pub fn new(registry: Arc<FieldRegistry>) -> Self {
        Self { registry }
    }

    fn scan_characters(&self, text: &str) -> Option<(Vec<char>, Vec<String>)> {
        if !text.chars().any(is_unusual) {
            return None;
        }

        let mut c1 = Vec::new();
        let mut code_points = Vec::new();
        for c in text.chars().filter(|c| is_unusual(*c)) {
            if is_c1_control(c) && !c1.contains(&c) {
                c1.push(c);
            }
            let label = format!("U+{:04X}", u32::from(c));
            if !code_points.contains(&label) {
                code_points.push(label);
            }
        }
        Some((c1, code_points))
    }
}

impl Detector for PatternDetector {
    fn method(&self) -> &str {
        "pattern"
    }

    fn detect(
        &self,
        table_name: &str,
        records: &[Record],
        batch_id: &str,
    ) -> Result<Vec<Anomaly>, DetectionError> {
        let mut anomalies = Vec::new();

        for field in self.registry.text_fields(table_name) {
            let average_length = self.registry.average_length(field);

            for (record_id, record) in records.iter().enumerate() {
                let Some(text) = text_value(record, field) else {
                    continue;
                };
                let record_key = self.registry.record_key(table_name, record);

                if let Some((c1, code_points)) = self.scan_characters(text) {
                    let unusual: Vec<String> = c1.iter().map(|c| c.to_string()).collect();
                    anomalies.push(
                        Anomaly::new(
                            table_name,
                            batch_id,
                            record_id,
                            AnomalyCategory::UnusualCharacters,
                            SEVERITY_UNUSUAL_CHARACTERS,
                            format!(
                                "Field '{}' contains unexpected characters ({})",
                                field,
                                code_points.join(", ")
                            ),
                        )
                        .with_data("field", field.as_str())
                        .with_data("text", text)
                        .with_data("unusual_chars", unusual)
                        .with_data("code_points", code_points)
                        .with_record_key(record_key.clone()),
                    );
                }

                let length = text.chars().count();
                let len = length as f64;
                if len > LONG_FACTOR * average_length || len < SHORT_FACTOR * average_length {
                    anomalies.push(
                        Anomaly::new(
                            table_name,
                            batch_id,
                            record_id,
                            AnomalyCategory::UnusualLength,
                            SEVERITY_UNUSUAL_LENGTH,
                            format!(
                                "Field '{}' has length {} (expected around {})",
                                field, length, average_length
                            ),
                        )
                        .with_data("field", field.as_str())
                        .with_data("length", length)
                        .with_data("average_length", average_length)
                        .with_record_key(record_key),
                    );
                }
            }
        }

        Ok(anomalies)
    }
}
