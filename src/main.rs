//! CLI entry point for the degree-day ingestion tool.
//!
//! Downloads the NOAA CPC climate-division degree-day files year by year,
//! turns them into tidy CSVs plus a national daily CDD/HDD table, and pulls
//! the spot-price series used alongside them.

use anyhow::Result;
use clap::{Parser, Subcommand};
use degree_day_ingest::{
    aggregate::{self, RunSummary, Source},
    cache::FetchCache,
    config::Config,
    fetch::BasicClient,
    series::{self, FredClient},
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "degree_day_ingest")]
#[command(about = "Fetch and normalise daily degree-day data", long_about = None)]
struct Cli {
    /// Listing URL whose YYYY/ entries are the year partitions
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Local cache root for raw files
    #[arg(long, global = true)]
    raw_root: Option<PathBuf>,

    /// Directory for the processed CSV tables
    #[arg(long, global = true)]
    processed_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover partitions, fetch missing files, and write all tables
    Run,
    /// Discover partitions and fetch missing files only
    Download,
    /// Rebuild the tables from already-cached files, without network access
    Aggregate,
    /// Pull Henry Hub and WTI daily spot prices from FRED
    Prices,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/degree_day_ingest.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("degree_day_ingest.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    match cli.command {
        Commands::Run => {
            let summary =
                aggregate::pipeline::run(&cache(&config)?, &config.processed_dir, Source::Remote)
                    .await?;
            report(&summary);
        }
        Commands::Download => {
            let run_report = aggregate::pipeline::download(&cache(&config)?).await?;
            run_report.log_summary();
        }
        Commands::Aggregate => {
            let summary =
                aggregate::pipeline::run(&cache(&config)?, &config.processed_dir, Source::Local)
                    .await?;
            report(&summary);
        }
        Commands::Prices => {
            let api_key = config.require_fred_api_key()?;
            let client =
                FredClient::new(http_client(&config)?, api_key, config.fred_url.clone());
            for s in series::DEFAULT_SERIES {
                let (path, rows) = series::pull_series(&client, s, &config.processed_dir).await?;
                info!(series = s.id, rows, path = %path.display(), "series written");
            }
        }
    }

    Ok(())
}

/// Environment first, then CLI overrides.
fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::from_env()?;
    if let Some(url) = &cli.base_url {
        config = config.with_base_url(url)?;
    }
    if let Some(root) = &cli.raw_root {
        config.raw_root = root.clone();
    }
    if let Some(dir) = &cli.processed_dir {
        config.processed_dir = dir.clone();
    }
    Ok(config)
}

fn http_client(config: &Config) -> Result<BasicClient> {
    match &config.ssl_cert_file {
        Some(path) => BasicClient::with_root_certificates(path),
        None => Ok(BasicClient::new()),
    }
}

fn cache(config: &Config) -> Result<FetchCache<BasicClient>> {
    Ok(FetchCache::new(
        http_client(config)?,
        config.base_url.clone(),
        config.raw_root.clone(),
    ))
}

fn report(summary: &RunSummary) {
    summary.report.log_summary();
    info!(
        cooling = %summary.outputs.cooling.display(),
        heating = %summary.outputs.heating.display(),
        combined = %summary.outputs.combined.display(),
        combined_rows = summary.aggregates.combined.len(),
        "parsed and saved"
    );
}
