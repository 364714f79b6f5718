use clap::{Arg, Command};
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let matches = Command::new("MATRABA bronze downloader")
        .version("1.0")
        .about("Downloads new monthly registration archives into the bronze tier")
        .subcommand(
            Command::new("etl")
                .about("Download missing archives")
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
        Some(("etl", etl_matches)) => {
            let config_path = etl_matches
                .get_one::<String>("config")
                .map(|s| s.as_str())
                .unwrap_or("config/lakehouse.toml");
            tracing::info!(config = config_path, "Starting bronze download");

            match etl::run_etl_pipeline(config_path).await {
                Ok(report) if report.failed.is_empty() => {}
                Ok(report) => {
                    tracing::error!(failed = ?report.failed, "Some archives could not be downloaded");
                    process::exit(1);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Bronze download failed");
                    process::exit(1);
                }
            }
        }

        _ => {
            eprintln!("Please specify a valid subcommand");
            process::exit(1);
        }
    }
}
