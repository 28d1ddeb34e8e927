use anyhow::Result;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

/// Throwaway project directory holding batch files.
struct SieveTestEnv {
    _tmp: TempDir,
    root: PathBuf,
}

impl SieveTestEnv {
    fn new() -> Result<Self> {
        let tmp = tempfile::tempdir()?;
        let root = tmp.path().to_path_buf();
        Ok(Self { _tmp: tmp, root })
    }

    fn write_batch(&self, name: &str, records: &Value) -> Result<PathBuf> {
        let path = self.root.join(name);
        fs::write(&path, serde_json::to_string_pretty(records)?)?;
        Ok(path)
    }

    fn sieve(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("sieve"));
        cmd.current_dir(&self.root);
        cmd.env_remove("SIEVE_METHODS")
            .env_remove("SIEVE_DB_PATH")
            .env_remove("SIEVE_BATCH_ID");
        cmd
    }
}

fn transactions() -> Value {
    let mut items: Vec<Value> = (0..12)
        .map(|i| {
            json!({
                "transaction_id": format!("TX-{i}"),
                "amount": 120.5 + i as f64,
                "fee_amount": 2.5,
                "reference_number": format!("REF{:06}", i),
            })
        })
        .collect();
    items.push(json!({
        "transaction_id": "TX-12",
        "amount": 15000,
        "fee_amount": 2.5,
        "reference_number": "REF000012",
    }));
    Value::Array(items)
}

#[test]
fn test_dry_run_reports_round_amount() -> Result<()> {
    let env = SieveTestEnv::new()?;
    let batch = env.write_batch("tx.json", &transactions())?;

    env.sieve()
        .args(["detect", "-t", "financial_transactions", "--dry-run", "-i"])
        .arg(&batch)
        .assert()
        .success()
        .stdout(predicate::str::contains("suspicious_round_amount"))
        .stdout(predicate::str::contains("TX-12"));

    // nothing persisted
    assert!(!env.root.join("sieve.duckdb").exists());
    Ok(())
}

#[test]
fn test_detect_then_inspect() -> Result<()> {
    let env = SieveTestEnv::new()?;
    let batch = env.write_batch("tx.json", &transactions())?;
    let db = env.root.join("anomalies.duckdb");

    env.sieve()
        .args(["detect", "-t", "financial_transactions", "--batch-id", "run-1", "-i"])
        .arg(&batch)
        .arg("--db-path")
        .arg(&db)
        .assert()
        .success();
    assert!(db.exists());

    env.sieve()
        .args(["inspect", "--batch-id", "run-1", "--min-severity", "0.5", "--db-path"])
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("suspicious_round_amount"));

    env.sieve()
        .args(["inspect", "--batch-id", "other-run", "--db-path"])
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("0 anomalies"));
    Ok(())
}

#[test]
fn test_inspect_without_store_fails() -> Result<()> {
    let env = SieveTestEnv::new()?;
    env.sieve()
        .args(["inspect", "--batch-id", "b1", "--db-path", "missing.duckdb"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Anomaly store not found"));
    Ok(())
}

#[test]
fn test_report_file_matches_run() -> Result<()> {
    let env = SieveTestEnv::new()?;
    let batch = env.write_batch("tx.json", &transactions())?;
    let report = env.root.join("out").join("report.json");

    env.sieve()
        .args(["detect", "-t", "financial_transactions", "--dry-run", "--batch-id", "r-9", "-i"])
        .arg(&batch)
        .arg("--report")
        .arg(&report)
        .assert()
        .success();

    let parsed: Value = serde_json::from_str(&fs::read_to_string(&report)?)?;
    assert_eq!(parsed["table_name"], "financial_transactions");
    assert_eq!(parsed["batch_id"], "r-9");
    assert_eq!(parsed["total_records"], 13);
    let anomalies = parsed["anomalies"].as_array().cloned().unwrap_or_default();
    assert_eq!(parsed["anomalies_found"], anomalies.len());
    assert!(
        anomalies
            .iter()
            .any(|a| a["anomaly_category"] == "suspicious_round_amount" && a["record_id"] == 12)
    );
    Ok(())
}

#[test]
fn test_fail_on_anomaly_exit_code() -> Result<()> {
    let env = SieveTestEnv::new()?;
    let batch = env.write_batch("tx.json", &transactions())?;

    env.sieve()
        .args(["detect", "-t", "financial_transactions", "--dry-run", "--fail-on-anomaly", "-i"])
        .arg(&batch)
        .assert()
        .code(2);
    Ok(())
}

#[test]
fn test_unknown_table_is_clean() -> Result<()> {
    let env = SieveTestEnv::new()?;
    let batch = env.write_batch("tx.json", &transactions())?;

    env.sieve()
        .args(["detect", "-t", "audit_log", "--dry-run", "--fail-on-anomaly", "-i"])
        .arg(&batch)
        .assert()
        .success()
        .stdout(predicate::str::contains("CLEAN"));
    Ok(())
}

#[test]
fn test_project_config_restricts_methods() -> Result<()> {
    let env = SieveTestEnv::new()?;
    fs::write(
        env.root.join("sieve.yaml"),
        "name: dwh\ndetection:\n  methods: [pattern]\n",
    )?;
    let batch = env.write_batch(
        "shipments.json",
        &json!([
            {
                "shipment_id": "S-1",
                "distance_km": 150,
                "delivery_duration_minutes": 3,
                "tracking_number": "TRK\u{0001}42",
            },
            {
                "shipment_id": "S-2",
                "distance_km": 20,
                "delivery_duration_minutes": 45,
                "tracking_number": "TRK000000043",
            }
        ]),
    )?;

    env.sieve()
        .args(["detect", "-t", "shipments", "--dry-run", "-i"])
        .arg(&batch)
        .assert()
        .success()
        .stdout(predicate::str::contains("unusual_characters"))
        .stdout(predicate::str::contains("delivery_time_distance_mismatch"))
        .stdout(predicate::str::contains("isolation_forest").not())
        .stdout(predicate::str::contains("z_score_outlier").not());
    Ok(())
}

#[test]
fn test_tables_lists_registry() -> Result<()> {
    let env = SieveTestEnv::new()?;
    env.sieve()
        .arg("tables")
        .assert()
        .success()
        .stdout(predicate::str::contains("shipments"))
        .stdout(predicate::str::contains("financial_transactions"))
        .stdout(predicate::str::contains("tracking_number"));
    Ok(())
}

#[test]
fn test_invalid_batch_file_fails() -> Result<()> {
    let env = SieveTestEnv::new()?;
    let path = env.root.join("broken.json");
    fs::write(&path, "{ not json")?;

    env.sieve()
        .args(["detect", "-t", "shipments", "--dry-run", "-i"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a JSON array"));
    Ok(())
}
