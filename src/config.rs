//! Extraction config file
//!
//! The config is stored as YAML (`extraction.yml` by default) and describes
//! everything about a run except its time range, which is given per run.
//!
//! Example format:
//! ```yaml
//! job_id: farequote
//! time_field: "@timestamp"
//! indices:
//!   - farequote-*
//! query:
//!   term:
//!     airline: AAL
//! batch_size: 1000
//! chunk_span: 15m
//! ```

use crate::extract::{DEFAULT_BATCH_SIZE, ExtractionContext};
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

/// Extraction settings loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractionConfig {
    pub job_id: String,
    pub time_field: String,
    pub indices: Vec<String>,
    /// Query DSL filter; matches everything when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u32>,
    /// Fixed chunk span as a time value (`90s`, `15m`, ...); adaptive when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_span: Option<String>,
}

impl ExtractionConfig {
    /// Read config from YAML file
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!(
                "Failed to read extraction config: {}",
                path.as_ref().display()
            )
        })?;

        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| "Failed to parse extraction config YAML")?;

        Ok(config)
    }

    /// Write config to YAML file
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(self)
            .with_context(|| "Failed to serialize extraction config to YAML")?;

        std::fs::write(path.as_ref(), yaml).with_context(|| {
            format!(
                "Failed to write extraction config: {}",
                path.as_ref().display()
            )
        })?;

        Ok(())
    }

    /// Build a validated context for `[start, end)`
    pub fn into_context(self, start: i64, end: i64) -> Result<ExtractionContext> {
        let chunk_span = self
            .chunk_span
            .as_deref()
            .map(parse_time_value)
            .transpose()
            .with_context(|| format!("[{}] Invalid chunk_span", self.job_id))?;

        let mut builder = ExtractionContext::builder(self.job_id, self.time_field)
            .indices(self.indices)
            .batch_size(self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE))
            .time_range(start, end)
            .chunk_span(chunk_span);
        if let Some(query) = self.query {
            builder = builder.query(query);
        }
        builder.build()
    }
}

/// Parse an Elasticsearch-style time value such as `500ms`, `90s`, `15m`, `2h` or `1d`
pub fn parse_time_value(value: &str) -> Result<Duration> {
    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| eyre::eyre!("Time value '{}' is missing a unit", value))?;
    let (amount, unit) = value.split_at(split);
    if amount.is_empty() {
        eyre::bail!("Time value '{}' is missing an amount", value);
    }
    let amount: u64 = amount
        .parse()
        .with_context(|| format!("Invalid amount in time value '{}'", value))?;

    let millis_per_unit = match unit.trim() {
        "ms" => 1,
        "s" => 1_000,
        "m" => 60_000,
        "h" => 3_600_000,
        "d" => 86_400_000,
        other => eyre::bail!("Unknown time unit '{}' in '{}'", other, value),
    };
    let millis = amount
        .checked_mul(millis_per_unit)
        .ok_or_else(|| eyre::eyre!("Time value '{}' is too large", value))?;

    Ok(Duration::from_millis(millis))
}
