// sieve-core/src/domain/detection/stats.rs

use crate::domain::anomaly::Record;
use crate::domain::anomaly::record::numeric_value;
use crate::domain::detection::DetectionError;

/// Usable numeric samples of a field, paired with the record position.
pub fn collect_numeric(records: &[Record], field: &str) -> Vec<(usize, f64)> {
    records
        .iter()
        .enumerate()
        .filter_map(|(idx, record)| numeric_value(record, field).map(|v| (idx, v)))
        .collect()
}

/// Population mean and standard deviation (divides by n, not n-1).
pub fn population_stats(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Linear-interpolation percentile over an ascending slice.
///
/// `index = p * (n - 1)`; a fractional index interpolates between its floor
/// and ceil neighbours. Returns `None` on an empty slice.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let index = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;
    let low = *sorted.get(lower)?;
    if lower == upper {
        return Some(low);
    }
    let high = *sorted.get(upper)?;
    Some(low + (high - low) * (index - lower as f64))
}

pub fn ensure_finite(
    field: &str,
    statistic: &'static str,
    value: f64,
) -> Result<f64, DetectionError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DetectionError::NonFiniteStatistic {
            field: field.to_string(),
            statistic,
        })
    }
}
