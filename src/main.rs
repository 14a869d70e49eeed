use age_sweeper::utils::now_iso;
use age_sweeper::{load_policies, run_policies};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Age Sweeper - move aged files to an archive tree and reap expired ones
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the JSON policy document
    config: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    // Initialize logging (RUST_LOG overrides the default level)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Parse CLI arguments
    let args = Args::parse();

    let entries = load_policies(&args.config).await;
    if entries.is_empty() {
        info!("No valid configurations found. Exiting.");
        return Ok(ExitCode::FAILURE);
    }

    info!(
        started_at = %now_iso(),
        "Starting scheduled file cleanup using config: {}",
        args.config.display()
    );

    let summary = run_policies(&entries).await;
    if !summary.has_work() {
        info!(skipped = summary.skipped, "No valid configurations found. Exiting.");
        return Ok(ExitCode::FAILURE);
    }

    info!(
        policies = summary.executed,
        skipped = summary.skipped,
        moved = summary.moved,
        deleted = summary.deleted,
        dirs_removed = summary.dirs_removed,
        failures = summary.failures,
        "Scheduled file cleanup finished."
    );
    Ok(ExitCode::SUCCESS)
}
