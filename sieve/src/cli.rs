// sieve/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sieve")]
#[command(about = "Anomaly detection gate for logistics warehouse ETL batches", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Emit logs as JSON lines (for ETL schedulers)
    #[arg(long, global = true, default_value = "false")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🔎 Screens a JSON batch and stores the anomalies found
    Detect {
        /// Warehouse table the batch belongs to (ex: "shipments")
        #[arg(long, short)]
        table: String,

        /// JSON file holding an array of records
        #[arg(long, short)]
        input: PathBuf,

        /// Correlation id of the ETL run (default: timestamp-derived)
        #[arg(long, env = "SIEVE_BATCH_ID")]
        batch_id: Option<String>,

        /// Project directory holding sieve.yaml
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// DuckDB file receiving the anomalies (overrides the config)
        #[arg(long)]
        db_path: Option<String>,

        /// Keep anomalies in memory only
        #[arg(long, default_value = "false")]
        dry_run: bool,

        /// Write a JSON report of the run
        #[arg(long)]
        report: Option<PathBuf>,

        /// Exit with code 2 when at least one anomaly is found
        #[arg(long, default_value = "false")]
        fail_on_anomaly: bool,
    },

    /// 🔍 Lists the anomalies stored for a batch
    Inspect {
        #[arg(long)]
        batch_id: String,

        /// DuckDB file holding the anomalies
        #[arg(long, default_value = "sieve.duckdb")]
        db_path: String,

        /// Only show anomalies at or above this severity
        #[arg(long, default_value = "0.0")]
        min_severity: f64,
    },

    /// 📋 Shows the field classification of every configured table
    Tables {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, bail};
    use clap::Parser;

    #[test]
    fn test_cli_parse_detect_defaults() -> Result<()> {
        let args = Cli::parse_from([
            "sieve",
            "detect",
            "--table",
            "shipments",
            "--input",
            "batch.json",
        ]);
        assert!(!args.json_logs);
        match args.command {
            Commands::Detect {
                table,
                input,
                project_dir,
                db_path,
                dry_run,
                report,
                fail_on_anomaly,
                ..
            } => {
                assert_eq!(table, "shipments");
                assert_eq!(input.to_string_lossy(), "batch.json");
                assert_eq!(project_dir.to_string_lossy(), ".");
                assert_eq!(db_path, None);
                assert!(!dry_run);
                assert!(report.is_none());
                assert!(!fail_on_anomaly);
                Ok(())
            }
            _ => bail!("Expected Detect command"),
        }
    }

    #[test]
    fn test_cli_parse_detect_full() -> Result<()> {
        let args = Cli::parse_from([
            "sieve",
            "--json-logs",
            "detect",
            "-t",
            "financial_transactions",
            "-i",
            "/tmp/tx.json",
            "--batch-id",
            "run-7",
            "--dry-run",
            "--report",
            "out/report.json",
        ]);
        assert!(args.json_logs);
        match args.command {
            Commands::Detect {
                batch_id,
                dry_run,
                report,
                ..
            } => {
                assert_eq!(batch_id.as_deref(), Some("run-7"));
                assert!(dry_run);
                assert_eq!(report.map(|p| p.to_string_lossy().to_string()).as_deref(), Some("out/report.json"));
                Ok(())
            }
            _ => bail!("Expected Detect command"),
        }
    }

    #[test]
    fn test_cli_parse_inspect() -> Result<()> {
        let args = Cli::parse_from(["sieve", "inspect", "--batch-id", "b1", "--min-severity", "0.5"]);
        match args.command {
            Commands::Inspect {
                batch_id,
                db_path,
                min_severity,
            } => {
                assert_eq!(batch_id, "b1");
                assert_eq!(db_path, "sieve.duckdb");
                assert_eq!(min_severity, 0.5);
                Ok(())
            }
            _ => bail!("Expected Inspect command"),
        }
    }

    #[test]
    fn test_detect_requires_table() {
        let res = Cli::try_parse_from(["sieve", "detect", "--input", "batch.json"]);
        assert!(res.is_err());
    }
}
