//! CLI helper functions

use crate::{
    client::ElasticsearchClient,
    config::PipelineConfig,
    job::{Job, Step},
    scheduler::{RunReport, Scheduler},
    source::PostgresExtractor,
};
use eyre::{Context, Result};
use std::path::Path;

/// The job as it runs in production
pub type TableJob = Job<PostgresExtractor, ElasticsearchClient>;

/// Load the effective configuration
///
/// Reads the YAML file if one is given, then applies `ETL_*` environment
/// variables. Call after the dotenv file has been sourced.
pub fn load_config(config_path: Option<&Path>) -> Result<PipelineConfig> {
    match config_path {
        Some(path) => log::debug!("Loading configuration from {}", path.display()),
        None => log::debug!("No configuration file, using defaults and environment"),
    }
    PipelineConfig::load(config_path).context("Invalid configuration")
}

/// Build the Elasticsearch client for the configured destination
pub fn load_index_client(config: &PipelineConfig) -> Result<ElasticsearchClient> {
    let url = config.destination.parsed_url()?;
    ElasticsearchClient::try_new(url, config.destination.auth())
        .context("Failed to create Elasticsearch client")
}

/// Build the production job from configuration
pub fn build_job(config: &PipelineConfig) -> Result<TableJob> {
    let source = PostgresExtractor::new(config.source.clone());
    let index = load_index_client(config)?;
    Job::new(source, index, config)
}

/// Run the whole job once, retrying each step per the configured policy
///
/// Returns the run report, or an error carrying the failed step's message.
pub async fn run_once(config: &PipelineConfig) -> Result<RunReport> {
    let job = build_job(config)?;
    let mut scheduler = Scheduler::from_config(job, &config.schedule);
    let report = scheduler.run_once().await;

    match report.failed_step() {
        Some(failed) => eyre::bail!(
            "Run {} failed at {}: {}",
            report.run,
            failed.step,
            report.error().unwrap_or("unknown error")
        ),
        None => Ok(report),
    }
}

/// Run a single step without retries
pub async fn run_step(config: &PipelineConfig, step: Step) -> Result<usize> {
    let job = build_job(config)?;
    if let Some(upstream) = step.upstream() {
        log::debug!("Step {} reads the output of {}", step, upstream);
    }
    job.run_step(step).await
}

/// Run on the configured interval until Ctrl-C
pub async fn serve(config: &PipelineConfig) -> Result<()> {
    let job = build_job(config)?;
    let mut scheduler = Scheduler::from_config(job, &config.schedule);
    scheduler.serve().await
}

/// Verify that both the source and the destination are reachable
pub async fn check_connections(config: &PipelineConfig) -> Result<()> {
    let source = PostgresExtractor::new(config.source.clone());
    let index = load_index_client(config)?;

    let source_result = source.check().await;
    match &source_result {
        Ok(()) => log::info!("✓ Source reachable: {}", config.source),
        Err(e) => log::error!("✗ Source unreachable: {:#}", e),
    }

    let index_result = index.ping().await;
    match &index_result {
        Ok(()) => log::info!("✓ Index reachable: {}", index),
        Err(e) => log::error!("✗ Index unreachable: {:#}", e),
    }

    source_result.context("Source check failed")?;
    index_result.context("Index check failed")?;
    Ok(())
}
