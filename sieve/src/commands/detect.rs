// sieve/src/commands/detect.rs
//
// USE CASE: Screen one ETL batch for anomalies.

use anyhow::Context;
use comfy_table::{Table, presets::UTF8_FULL};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use sieve_core::application::DetectionOrchestrator;
use sieve_core::domain::DetectionReport;
use sieve_core::infrastructure::adapters::{DuckDbAnomalyStore, InMemoryAnomalyStore};
use sieve_core::infrastructure::fs::write_json;
use sieve_core::ports::AnomalyStore;
use sieve_core::{Anomaly, Record};

pub struct DetectArgs {
    pub table: String,
    pub input: PathBuf,
    pub batch_id: Option<String>,
    pub project_dir: PathBuf,
    pub db_path: Option<String>,
    pub dry_run: bool,
    pub report: Option<PathBuf>,
    pub fail_on_anomaly: bool,
}

pub async fn execute(args: DetectArgs) -> anyhow::Result<()> {
    // A. Config (Infra), falling back to the built-in registry
    let config = super::load_config_or_default(&args.project_dir).with_context(|| {
        format!("Failed to load configuration from {:?}", args.project_dir)
    })?;

    // B. Batch
    let content = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read batch file {:?}", args.input))?;
    let records: Vec<Record> = serde_json::from_str(&content)
        .with_context(|| format!("Batch file {:?} is not a JSON array of objects", args.input))?;
    let batch_id = args
        .batch_id
        .unwrap_or_else(|| format!("batch_{}", chrono::Utc::now().format("%Y%m%dT%H%M%S%.3f")));

    println!(
        "🔎 Screening {} records of '{}' (batch {})",
        records.len(),
        args.table,
        batch_id
    );

    // C. Store adapter (dependency injection)
    let store: Arc<dyn AnomalyStore> = if args.dry_run {
        println!("   Store: in-memory (dry run)");
        Arc::new(InMemoryAnomalyStore::new())
    } else {
        let db_path = args.db_path.unwrap_or_else(|| {
            args.project_dir
                .join(&config.store.db_path)
                .to_string_lossy()
                .to_string()
        });
        println!("   Store: DuckDB 🦆 {}", db_path);
        Arc::new(
            DuckDbAnomalyStore::new(&db_path)
                .with_context(|| format!("Failed to open anomaly store at {}", db_path))?,
        )
    };

    // D. Detection (Application Layer)
    let orchestrator = DetectionOrchestrator::from_config(&config, store);
    let anomalies = orchestrator
        .detect(&args.table, &records, &batch_id)
        .await
        .context("Anomaly detection aborted")?;

    let report = DetectionReport::summarize(&args.table, &batch_id, records.len(), &anomalies);
    print_summary(&report);

    if let Some(path) = &args.report {
        write_json(path, &report)
            .with_context(|| format!("Failed to write report to {:?}", path))?;
        println!("📝 Report written to {}", path.display());
    }

    if args.fail_on_anomaly && !anomalies.is_empty() {
        eprintln!("\n❌ {} anomalies found (--fail-on-anomaly)", anomalies.len());
        std::process::exit(2);
    }

    Ok(())
}

fn print_summary(report: &DetectionReport) {
    if report.anomalies.is_empty() {
        println!("\n✨ CLEAN. No anomalies in {} records.", report.total_records);
        return;
    }

    println!("{}", anomaly_table(&report.anomalies));
    println!(
        "\n⚠️  {} anomalies on {} of {} records (max severity {:.2})",
        report.anomalies_found, report.flagged_records, report.total_records, report.max_severity
    );
    for (category, count) in &report.by_category {
        println!("   ➜ {}: {}", category, count);
    }
}

pub fn anomaly_table(anomalies: &[Anomaly]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "record",
        "key",
        "type",
        "category",
        "severity",
        "description",
    ]);
    for a in anomalies {
        table.add_row(vec![
            a.record_id.to_string(),
            a.record_key.clone().unwrap_or_default(),
            a.anomaly_type.to_string(),
            a.anomaly_category.to_string(),
            format!("{:.2}", a.severity_score),
            a.description.clone(),
        ]);
    }
    table
}
