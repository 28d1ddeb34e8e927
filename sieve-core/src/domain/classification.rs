// sieve-core/src/domain/classification.rs

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::domain::anomaly::Record;
use crate::domain::anomaly::record::key_value;
use crate::domain::error::DomainError;

/// Fallback expected length for text fields absent from the length table.
pub const DEFAULT_TEXT_LENGTH: f64 = 20.0;

/// Business-rule set a table is bound to.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RuleSet {
    Shipment,
    FinancialTransaction,
}

/// Field classification of one warehouse table.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct TableFields {
    #[serde(default)]
    pub numeric_fields: Vec<String>,
    #[serde(default)]
    pub text_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_set: Option<RuleSet>,
}

impl TableFields {
    pub fn new(numeric: &[&str], text: &[&str]) -> Self {
        Self {
            numeric_fields: numeric.iter().map(|s| s.to_string()).collect(),
            text_fields: text.iter().map(|s| s.to_string()).collect(),
            key_field: None,
            rule_set: None,
        }
    }

    pub fn with_key(mut self, key_field: &str) -> Self {
        self.key_field = Some(key_field.to_string());
        self
    }

    pub fn with_rules(mut self, rule_set: RuleSet) -> Self {
        self.rule_set = Some(rule_set);
        self
    }
}

/// Per-table configuration of which fields each detector looks at.
/// Pure lookup: unknown tables simply have no fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldRegistry {
    tables: BTreeMap<String, TableFields>,
    text_lengths: BTreeMap<String, f64>,
}

impl FieldRegistry {
    pub fn new(tables: BTreeMap<String, TableFields>, text_lengths: BTreeMap<String, f64>) -> Self {
        Self {
            tables,
            text_lengths,
        }
    }

    /// Built-in classification of the logistics warehouse tables.
    pub fn logistics_defaults() -> Self {
        Self::new(default_tables(), default_text_lengths())
    }

    pub fn table(&self, table_name: &str) -> Option<&TableFields> {
        self.tables.get(table_name)
    }

    pub fn tables(&self) -> impl Iterator<Item = (&String, &TableFields)> {
        self.tables.iter()
    }

    pub fn numeric_fields(&self, table_name: &str) -> &[String] {
        self.table(table_name)
            .map(|t| t.numeric_fields.as_slice())
            .unwrap_or(&[])
    }

    pub fn text_fields(&self, table_name: &str) -> &[String] {
        self.table(table_name)
            .map(|t| t.text_fields.as_slice())
            .unwrap_or(&[])
    }

    pub fn rule_set(&self, table_name: &str) -> Option<RuleSet> {
        self.table(table_name).and_then(|t| t.rule_set)
    }

    pub fn average_length(&self, field: &str) -> f64 {
        self.text_lengths
            .get(field)
            .copied()
            .unwrap_or(DEFAULT_TEXT_LENGTH)
    }

    /// Stable warehouse key of a record, if its table declares one.
    pub fn record_key(&self, table_name: &str, record: &Record) -> Option<String> {
        let field = self.table(table_name)?.key_field.as_deref()?;
        key_value(record, field)
    }

    /// Adds (or replaces) table classifications.
    pub fn merge_tables(&mut self, tables: BTreeMap<String, TableFields>) {
        self.tables.extend(tables);
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        for (table, fields) in &self.tables {
            let numeric: HashSet<&str> = fields.numeric_fields.iter().map(String::as_str).collect();
            if let Some(field) = fields
                .text_fields
                .iter()
                .find(|f| numeric.contains(f.as_str()))
            {
                return Err(DomainError::OverlappingField {
                    table: table.clone(),
                    field: field.clone(),
                });
            }
        }

        for (field, length) in &self.text_lengths {
            if !(length.is_finite() && *length > 0.0) {
                return Err(DomainError::InvalidAverageLength {
                    field: field.clone(),
                    length: *length,
                });
            }
        }
        Ok(())
    }
}

pub fn default_tables() -> BTreeMap<String, TableFields> {
    BTreeMap::from([
        (
            "shipments".to_string(),
            TableFields::new(
                &[
                    "distance_km",
                    "delivery_duration_minutes",
                    "weight_kg",
                    "total_cost",
                    "margin_percentage",
                ],
                &["tracking_number", "origin_city", "destination_city"],
            )
            .with_key("shipment_id")
            .with_rules(RuleSet::Shipment),
        ),
        (
            "customers".to_string(),
            TableFields::new(
                &["credit_limit", "lifetime_value"],
                &["first_name", "last_name", "email", "phone", "company_name"],
            )
            .with_key("customer_id"),
        ),
        (
            "financial_transactions".to_string(),
            TableFields::new(&["amount", "fee_amount"], &["reference_number", "description"])
                .with_key("transaction_id")
                .with_rules(RuleSet::FinancialTransaction),
        ),
    ])
}

pub fn default_text_lengths() -> BTreeMap<String, f64> {
    [
        ("first_name", 10.0),
        ("last_name", 12.0),
        ("tracking_number", 12.0),
        ("email", 25.0),
        ("phone", 15.0),
        ("company_name", 30.0),
        ("city", 15.0),
        ("origin_city", 15.0),
        ("destination_city", 15.0),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}
