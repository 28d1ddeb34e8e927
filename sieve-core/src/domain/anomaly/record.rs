// sieve-core/src/domain/anomaly/record.rs

use serde_json::{Map, Value};

/// A transformed ETL record: field name -> value (number, string or null).
pub type Record = Map<String, Value>;

/// Extracts a finite numeric value from a record field.
///
/// JSON numbers and numeric strings are accepted. Non-finite values
/// ("NaN", "inf") count as missing.
pub fn numeric_value(record: &Record, field: &str) -> Option<f64> {
    let numeric = match record.get(field)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    numeric.filter(|v| v.is_finite())
}

pub fn text_value<'a>(record: &'a Record, field: &str) -> Option<&'a str> {
    record.get(field).and_then(Value::as_str)
}

/// Renders a key field as a string, whatever its JSON scalar type.
pub fn key_value(record: &Record, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
