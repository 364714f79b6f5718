use anyhow::Context;
use clap::{Arg, Command};
use common::config::Settings;
use std::process;
use tracing_subscriber::EnvFilter;

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn run(config_path: &str) -> anyhow::Result<bool> {
    let settings = Settings::new(config_path)
        .with_context(|| format!("failed to load config from {}", config_path))?;
    init_tracing(settings.logging.json);
    tracing::info!(config = config_path, "Starting lakehouse pipeline");

    let report = lakehouse::run_pipeline(&settings)
        .await
        .context("lakehouse pipeline aborted")?;

    tracing::info!(
        silver_processed = report.silver.processed.len(),
        silver_failed = report.silver.failed.len(),
        gold_processed = report.gold.processed.len(),
        gold_failed = report.gold.failed.len(),
        gold_warnings = report.gold.warnings,
        "Lakehouse pipeline finished"
    );
    Ok(report.is_clean())
}

#[tokio::main]
async fn main() {
    let matches = Command::new("MATRABA Lakehouse")
        .version("1.0")
        .about("Refines monthly vehicle registration archives into silver and gold tables")
        .subcommand(
            Command::new("run")
                .about("Run download, silver and gold stages once")
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .value_name("FILE")
                        .help("Sets a custom config file"),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("run", run_matches)) => {
            let config_path = run_matches
                .get_one::<String>("config")
                .map(|s| s.as_str())
                .unwrap_or("config/lakehouse.toml");

            match run(config_path).await {
                Ok(true) => {}
                Ok(false) => process::exit(1),
                Err(e) => {
                    eprintln!("Lakehouse pipeline error: {:#}", e);
                    process::exit(1);
                }
            }
        }
        _ => {
            println!("No subcommand specified. Use --help for usage information.");
            process::exit(1);
        }
    }
}
