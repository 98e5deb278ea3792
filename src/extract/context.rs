//! Immutable configuration for one extraction run

use eyre::Result;
use serde_json::{Value, json};
use std::time::Duration;

/// Default number of documents a sub-extractor fetches per batch
pub const DEFAULT_BATCH_SIZE: u32 = 1000;

/// Configuration for one chunked extraction run
///
/// Times are epoch milliseconds; `start` is inclusive and `end` exclusive.
/// Build with [`ExtractionContext::builder`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionContext {
    job_id: String,
    time_field: String,
    indices: Vec<String>,
    query: Value,
    batch_size: u32,
    start: i64,
    end: i64,
    chunk_span: Option<Duration>,
}

impl ExtractionContext {
    /// Start building a context for `job_id` over documents timestamped by `time_field`
    pub fn builder(
        job_id: impl Into<String>,
        time_field: impl Into<String>,
    ) -> ExtractionContextBuilder {
        ExtractionContextBuilder {
            job_id: job_id.into(),
            time_field: time_field.into(),
            indices: Vec::new(),
            query: json!({"match_all": {}}),
            batch_size: DEFAULT_BATCH_SIZE,
            start: 0,
            end: 0,
            chunk_span: None,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn time_field(&self) -> &str {
        &self.time_field
    }

    pub fn indices(&self) -> &[String] {
        &self.indices
    }

    /// Filter every search is restricted by
    pub fn query(&self) -> &Value {
        &self.query
    }

    pub fn batch_size(&self) -> u32 {
        self.batch_size
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    pub fn chunk_span(&self) -> Option<Duration> {
        self.chunk_span
    }

    /// Fixed chunk span in milliseconds, if configured
    pub fn chunk_span_millis(&self) -> Option<i64> {
        self.chunk_span
            .map(|span| i64::try_from(span.as_millis()).unwrap_or(i64::MAX))
    }
}

/// Builder for [`ExtractionContext`]
#[derive(Debug, Clone)]
pub struct ExtractionContextBuilder {
    job_id: String,
    time_field: String,
    indices: Vec<String>,
    query: Value,
    batch_size: u32,
    start: i64,
    end: i64,
    chunk_span: Option<Duration>,
}

impl ExtractionContextBuilder {
    pub fn indices<I, S>(mut self, indices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.indices = indices.into_iter().map(Into::into).collect();
        self
    }

    pub fn query(mut self, query: Value) -> Self {
        self.query = query;
        self
    }

    pub fn batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Time range as `[start, end)` in epoch milliseconds
    pub fn time_range(mut self, start: i64, end: i64) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn chunk_span(mut self, chunk_span: Option<Duration>) -> Self {
        self.chunk_span = chunk_span;
        self
    }

    /// Validate and build the context
    ///
    /// # Errors
    /// Returns an error if the job id, time field or indices are empty, the
    /// batch size is zero, `start > end`, or the chunk span is under 1 ms.
    pub fn build(self) -> Result<ExtractionContext> {
        if self.job_id.trim().is_empty() {
            eyre::bail!("Job id must not be empty");
        }
        if self.time_field.trim().is_empty() {
            eyre::bail!("[{}] Time field must not be empty", self.job_id);
        }
        if self.indices.is_empty() {
            eyre::bail!("[{}] At least one index is required", self.job_id);
        }
        if self.batch_size == 0 {
            eyre::bail!("[{}] Batch size must be positive", self.job_id);
        }
        if self.start > self.end {
            eyre::bail!(
                "[{}] Start time {} is after end time {}",
                self.job_id,
                self.start,
                self.end
            );
        }
        if let Some(span) = self.chunk_span
            && span.as_millis() == 0
        {
            eyre::bail!(
                "[{}] Chunk span must be at least 1ms, got {:?}",
                self.job_id,
                span
            );
        }

        Ok(ExtractionContext {
            job_id: self.job_id,
            time_field: self.time_field,
            indices: self.indices,
            query: self.query,
            batch_size: self.batch_size,
            start: self.start,
            end: self.end,
            chunk_span: self.chunk_span,
        })
    }
}
