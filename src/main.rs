//! lms-migrate command line
//!
//! Usage:
//!     lms-migrate --config migrate.json courses.csv

use clap::Parser;
use lms_migrate::{BatchRunner, BrightspaceClient, Config, Error, SakaiClient};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "lms-migrate",
    version,
    about = "Migrate assignments and attachments from Sakai to Brightspace"
)]
struct Args {
    /// JSON configuration file
    #[arg(long, short, env = "LMS_MIGRATE_CONFIG")]
    config: PathBuf,

    /// Batch input with a `guid` and an `ouid` column
    input: PathBuf,

    /// Override the success ledger path
    #[arg(long, env = "LMS_MIGRATE_SUCCESS")]
    success: Option<PathBuf>,

    /// Override the failure ledger path
    #[arg(long, env = "LMS_MIGRATE_FAILURE")]
    failure: Option<PathBuf>,

    /// Override the staging directory
    #[arg(long, env = "LMS_MIGRATE_WORKING_ROOT")]
    working_root: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = e.error_code(), "{}", e.chain());
            eprintln!("lms-migrate: {}", e.chain());
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

async fn run(args: Args) -> Result<(), Error> {
    let mut config = Config::from_file(&args.config)?;
    if let Some(path) = args.success {
        config.ledger.success_path = path;
    }
    if let Some(path) = args.failure {
        config.ledger.failure_path = path;
    }
    if let Some(path) = args.working_root {
        config.working_root = path;
    }
    config.validate()?;

    let source = Arc::new(SakaiClient::new(&config.source)?);
    let target = Arc::new(BrightspaceClient::new(&config.target, &config.webdav)?);

    tracing::info!(
        source_url = %config.source.base_url,
        target_url = %config.target.host,
        input = %args.input.display(),
        "starting migration"
    );

    let runner = BatchRunner::new(config, source, target)?;
    let summary = runner.run_file(&args.input).await?;

    println!(
        "{} rows: {} succeeded, {} failed ({:.1}s)",
        summary.total,
        summary.succeeded,
        summary.failed,
        summary.elapsed.as_secs_f64()
    );
    Ok(())
}
