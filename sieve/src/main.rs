// sieve/src/main.rs

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

/// RUST_LOG=debug sieve detect ... to see per-detector details.
/// Logs go to stderr so stdout stays usable in pipes.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let result = match cli.command {
        Commands::Detect {
            table,
            input,
            batch_id,
            project_dir,
            db_path,
            dry_run,
            report,
            fail_on_anomaly,
        } => {
            commands::detect::execute(commands::detect::DetectArgs {
                table,
                input,
                batch_id,
                project_dir,
                db_path,
                dry_run,
                report,
                fail_on_anomaly,
            })
            .await
        }
        Commands::Inspect {
            batch_id,
            db_path,
            min_severity,
        } => commands::inspect::execute(&batch_id, &db_path, min_severity).await,
        Commands::Tables { project_dir } => commands::tables::execute(&project_dir),
    };

    result.map_err(|e| miette::miette!("{:#}", e))
}
