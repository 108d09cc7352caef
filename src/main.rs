//! Entry point: runs the block rating pipeline over one listing dump.
//!
//! Configured entirely through the environment (a `.env` file is honoured):
//! `LISTINGS_PATH` names the CSV or JSON dump, `PIPELINE_CONFIG` an optional
//! JSON config file, and `AREA_NAME` the area used for block ids.

use anyhow::{Context, Result};
use block_rater::config::PipelineConfig;
use block_rater::output::{print_blocks, print_json, print_pretty};
use block_rater::parser::load_listings;
use block_rater::pipeline::Pipeline;
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/block_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("block_rater.log"));

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

    let listings_path = std::env::var("LISTINGS_PATH").context("LISTINGS_PATH must be set")?;
    let area_name = std::env::var("AREA_NAME").unwrap_or_else(|_| "Athens".to_string());

    let config = match std::env::var("PIPELINE_CONFIG") {
        Ok(path) => PipelineConfig::load(&path)
            .with_context(|| format!("loading pipeline config from {path}"))?,
        Err(_) => {
            info!("PIPELINE_CONFIG not set, using defaults");
            PipelineConfig::default()
        }
    };
    let pipeline = Pipeline::new(config).context("invalid pipeline config")?;

    let listings = load_listings(&listings_path)?;
    info!(path = %listings_path, count = listings.len(), area = %area_name, "Starting analysis");

    let report = pipeline.run(&area_name, listings);

    print_pretty(&report);
    print_blocks(&report);
    print_json(&report)?;

    info!(
        blocks = report.summary.blocks_analyzed,
        listings_in_blocks = report.summary.listings_in_blocks,
        acceptance_rate = report.summary.acceptance_rate,
        average_confidence = report.summary.average_confidence,
        "Finished"
    );
    Ok(())
}
