// sieve/src/commands/inspect.rs
//
// USE CASE: Review the anomalies stored for one batch.

use anyhow::Context;
use std::path::Path;

use sieve_core::infrastructure::adapters::DuckDbAnomalyStore;

use super::detect::anomaly_table;

pub async fn execute(batch_id: &str, db_path: &str, min_severity: f64) -> anyhow::Result<()> {
    if !Path::new(db_path).exists() {
        anyhow::bail!(
            "❌ Anomaly store not found at: {}\n👉 Have you run 'sieve detect'?",
            db_path
        );
    }

    let store = DuckDbAnomalyStore::new(db_path)
        .with_context(|| format!("Failed to open anomaly store at {}", db_path))?;

    let anomalies: Vec<_> = store
        .list_by_batch(batch_id)
        .await?
        .into_iter()
        .filter(|a| a.severity_score >= min_severity)
        .collect();

    println!("\n🔍 Batch '{}': {} anomalies", batch_id, anomalies.len());
    if !anomalies.is_empty() {
        println!("{}", anomaly_table(&anomalies));
    }

    Ok(())
}
