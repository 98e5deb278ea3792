//! Search seam between the extraction core and a cluster
//!
//! The core only ever needs "run this `_search` body against these indices";
//! [`SearchBackend`] is that contract, and [`SearchResponse`] is the subset of
//! the response it inspects.

use eyre::Result;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// Executes search requests on behalf of the extraction core
///
/// Implementations return non-success responses as values rather than errors,
/// leaving classification to the caller. Transport failures are errors.
pub trait SearchBackend: Send + Sync {
    /// Run `body` as a `_search` against `indices`
    fn search(
        &self,
        indices: &[String],
        body: &Value,
    ) -> impl std::future::Future<Output = Result<SearchResponse>> + Send;
}

/// HTTP status plus the parsed response body
#[derive(Debug, Clone)]
pub struct SearchResponse {
    pub status: StatusCode,
    pub body: SearchResponseBody,
}

impl SearchResponse {
    pub fn new(status: StatusCode, body: SearchResponseBody) -> Self {
        Self { status, body }
    }

    /// Build a response from raw JSON, as returned by the cluster
    pub fn from_json(status: StatusCode, json: Value) -> Result<Self> {
        let body = serde_json::from_value(json)?;
        Ok(Self { status, body })
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Total number of matching documents
    pub fn total_hits(&self) -> u64 {
        self.body.hits.total.value()
    }

    /// Shard-level failures reported by an otherwise successful search
    pub fn shard_failures(&self) -> &[ShardFailure] {
        &self.body.shards.failures
    }

    /// True when any shard failed, even if no failure details were sent
    pub fn has_shard_failures(&self) -> bool {
        self.body.shards.failed > 0 || !self.body.shards.failures.is_empty()
    }

    /// Value of a single-value metric aggregation (`min`, `max`, ...)
    ///
    /// Returns `None` when the aggregation is absent or had no documents.
    pub fn metric_value(&self, name: &str) -> Option<f64> {
        self.body
            .aggregations
            .get(name)
            .and_then(|agg| agg.get("value"))
            .and_then(Value::as_f64)
    }
}

/// The parts of a `_search` response body the extraction core reads
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponseBody {
    #[serde(rename = "_shards", default)]
    pub shards: ShardStats,
    #[serde(default)]
    pub hits: Hits,
    #[serde(default)]
    pub aggregations: HashMap<String, Value>,
    #[serde(default)]
    pub timed_out: bool,
    /// Error object returned with non-success statuses
    #[serde(default)]
    pub error: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShardStats {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub successful: u32,
    #[serde(default)]
    pub skipped: u32,
    #[serde(default)]
    pub failed: u32,
    #[serde(default)]
    pub failures: Vec<ShardFailure>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShardFailure {
    #[serde(default)]
    pub shard: Option<i64>,
    #[serde(default)]
    pub index: Option<String>,
    #[serde(default)]
    pub node: Option<String>,
    #[serde(default)]
    pub reason: Value,
}

impl ShardFailure {
    /// Failure reason as a single line
    pub fn reason(&self) -> String {
        match &self.reason {
            Value::String(s) => s.clone(),
            Value::Object(obj) => obj
                .get("reason")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| self.reason.to_string()),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Hits {
    #[serde(default)]
    pub total: TotalHits,
}

/// `hits.total` is a bare number before 7.0 and an object after
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TotalHits {
    Count(u64),
    Object {
        value: u64,
        #[serde(default)]
        relation: String,
    },
}

impl TotalHits {
    pub fn value(&self) -> u64 {
        match self {
            Self::Count(value) | Self::Object { value, .. } => *value,
        }
    }
}

impl Default for TotalHits {
    fn default() -> Self {
        Self::Count(0)
    }
}
