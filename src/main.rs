//! Command-line entry point.
//!
//! Usage:
//!   sitedeploy <SITE_URL> <USER> <PASSWORD> <FOLDER> <SOURCE> [--dry-run]

use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use sitedeploy::progress::{completion_line, make_console_reporter};
use sitedeploy::{CliArgs, DeployConfig, DeployOptions, DeployReport, RestStore, deploy};
use tracing_subscriber::{EnvFilter, fmt};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sitedeploy=info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: CliArgs) -> sitedeploy::Result<DeployReport> {
    let config = DeployConfig::try_from(args)?;
    let mut store = RestStore::connect(&config).await?;

    let options = DeployOptions {
        dry_run: config.dry_run,
        progress: Some(make_console_reporter()),
    };
    deploy(
        &mut store,
        &config.target_folder,
        &config.source_dir,
        options,
    )
    .await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();
    let started = Instant::now();
    let args = CliArgs::parse();

    match run(args).await {
        Ok(_) => {
            println!("{}", completion_line(started.elapsed()));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", e.kind(), e);
            ExitCode::FAILURE
        }
    }
}
