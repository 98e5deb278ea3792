//! Data summary probe
//!
//! A single zero-hit search with `min`/`max` aggregations on the time field
//! tells the planner how many documents a range holds and where they start
//! and end.

use super::ExtractionContext;
use crate::client::{SearchBackend, SearchResponse};
use crate::error::DataExtractionError;
use eyre::Result;
use serde_json::{Value, json};

const EARLIEST_TIME: &str = "earliest_time";
const LATEST_TIME: &str = "latest_time";

/// Document count and observed time bounds of a probed range
///
/// `earliest` and `latest` are `None` when `total_count` is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataSummary {
    pub total_count: u64,
    pub earliest: Option<i64>,
    pub latest: Option<i64>,
}

impl DataSummary {
    pub fn new(total_count: u64, earliest: Option<i64>, latest: Option<i64>) -> Self {
        Self {
            total_count,
            earliest,
            latest,
        }
    }

    pub fn empty() -> Self {
        Self::new(0, None, None)
    }

    pub fn has_data(&self) -> bool {
        self.total_count > 0
    }

    /// Milliseconds between earliest and latest document, zero when unknown
    pub fn time_spread(&self) -> i64 {
        match (self.earliest, self.latest) {
            (Some(earliest), Some(latest)) => latest.saturating_sub(earliest).max(0),
            _ => 0,
        }
    }
}

impl std::fmt::Display for DataSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.earliest, self.latest) {
            (Some(earliest), Some(latest)) => write!(
                f,
                "{} document(s) between {} and {}",
                self.total_count, earliest, latest
            ),
            _ => write!(f, "{} document(s)", self.total_count),
        }
    }
}

/// Source of data summaries for the chunk planner
pub trait SummaryProbe: Send + Sync {
    /// Summarize the documents in `[start, end)`
    fn probe(
        &self,
        start: i64,
        end: i64,
    ) -> impl std::future::Future<Output = Result<DataSummary>> + Send;
}

/// [`SummaryProbe`] that queries a [`SearchBackend`]
pub struct DataSummaryProbe<'a, B> {
    backend: &'a B,
    context: &'a ExtractionContext,
}

impl<'a, B: SearchBackend> DataSummaryProbe<'a, B> {
    pub fn new(backend: &'a B, context: &'a ExtractionContext) -> Self {
        Self { backend, context }
    }

    /// Search body for summarizing `[start, end)`
    ///
    /// `size: 0` and no sort: only the aggregations and the hit count matter.
    pub fn request_body(&self, start: i64, end: i64) -> Value {
        let time_field = self.context.time_field();
        json!({
            "size": 0,
            "track_total_hits": true,
            "query": {
                "bool": {
                    "filter": [
                        self.context.query(),
                        {
                            "range": {
                                time_field: {
                                    "gte": start,
                                    "lt": end,
                                    "format": "epoch_millis"
                                }
                            }
                        }
                    ]
                }
            },
            "aggs": {
                EARLIEST_TIME: {"min": {"field": time_field}},
                LATEST_TIME: {"max": {"field": time_field}}
            }
        })
    }

    /// Fail unless the search fully succeeded
    fn check_search_was_successful(&self, response: &SearchResponse) -> Result<()> {
        if !response.is_success() {
            let body = response
                .body
                .error
                .as_ref()
                .map(Value::to_string)
                .unwrap_or_default();
            return Err(DataExtractionError::Status {
                job_id: self.context.job_id().to_string(),
                status: response.status,
                body,
            }
            .into());
        }
        if response.has_shard_failures() {
            let reasons = match response.shard_failures() {
                [] => format!("{} shard(s) failed", response.body.shards.failed),
                failures => failures
                    .iter()
                    .map(|failure| failure.reason())
                    .collect::<Vec<_>>()
                    .join("; "),
            };
            return Err(DataExtractionError::ShardFailures {
                job_id: self.context.job_id().to_string(),
                reasons,
            }
            .into());
        }
        if response.body.timed_out {
            return Err(DataExtractionError::TimedOut {
                job_id: self.context.job_id().to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl<B: SearchBackend> SummaryProbe for DataSummaryProbe<'_, B> {
    async fn probe(&self, start: i64, end: i64) -> Result<DataSummary> {
        log::debug!(
            "[{}] Requesting data summary for [{}, {})",
            self.context.job_id(),
            start,
            end
        );
        let body = self.request_body(start, end);
        let response = self.backend.search(self.context.indices(), &body).await?;
        self.check_search_was_successful(&response)?;

        let total_count = response.total_hits();
        if total_count == 0 {
            return Ok(DataSummary::empty());
        }
        let earliest = response.metric_value(EARLIEST_TIME).map(|v| v as i64);
        let latest = response.metric_value(LATEST_TIME).map(|v| v as i64);
        Ok(DataSummary::new(total_count, earliest, latest))
    }
}
