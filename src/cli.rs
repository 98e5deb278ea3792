//! CLI helper functions

use chunked_extractor::{
    client::{ElasticsearchClient, SearchBackend},
    config::ExtractionConfig,
    extract::{Chunk, ChunkPlanner, DataSummary, DataSummaryProbe, ExtractionContext, SummaryProbe},
};
use eyre::{Context, Result};
use std::path::Path;

/// Load the extraction context for `[start, end)` from a config file
pub fn load_context(config_path: impl AsRef<Path>, start: i64, end: i64) -> Result<ExtractionContext> {
    let config_path = config_path.as_ref();
    log::debug!("Loading extraction config from {}", config_path.display());
    let config = ExtractionConfig::read(config_path)?;
    config.into_context(start, end)
}

/// Verify connectivity and credentials, returning the cluster version
pub async fn test_auth() -> Result<String> {
    let client = ElasticsearchClient::from_env()?;
    log::info!("Connecting to {}", client);
    let info = client
        .test_connection()
        .await
        .with_context(|| format!("Failed to connect to {}", client))?;
    let version = info["version"]["number"]
        .as_str()
        .unwrap_or("unknown")
        .to_string();
    Ok(version)
}

/// Run one data summary search over the context's range
pub async fn summarize(context: &ExtractionContext) -> Result<DataSummary> {
    let client = ElasticsearchClient::from_env()?;
    log::info!("Connecting to {}", client);
    summarize_with(&client, context).await
}

pub async fn summarize_with<B: SearchBackend>(
    backend: &B,
    context: &ExtractionContext,
) -> Result<DataSummary> {
    let probe = DataSummaryProbe::new(backend, context);
    probe.probe(context.start(), context.end()).await
}

/// Dry-run the chunk planner against the live cluster
///
/// Every chunk is assumed to yield data, so the plan never reconfigures.
pub async fn plan(context: &ExtractionContext) -> Result<Vec<Chunk>> {
    let client = ElasticsearchClient::from_env()?;
    log::info!("Connecting to {}", client);
    plan_with(&client, context).await
}

pub async fn plan_with<B: SearchBackend>(
    backend: &B,
    context: &ExtractionContext,
) -> Result<Vec<Chunk>> {
    let probe = DataSummaryProbe::new(backend, context);
    let mut planner = ChunkPlanner::new(context);
    let mut chunks = Vec::new();
    while let Some(chunk) = planner.next_chunk(context, &probe).await? {
        chunks.push(chunk);
        planner.report(chunk, true);
    }
    Ok(chunks)
}
