//! Errors raised by the extraction core itself
//!
//! Everything else (factory and sub-extractor failures, transport errors)
//! passes through as a plain `eyre::Report`.

use reqwest::StatusCode;
use thiserror::Error;

/// A search issued on behalf of an extraction job did not succeed
#[derive(Debug, Error)]
pub enum DataExtractionError {
    /// The backend answered with a non-success status
    #[error("[{job_id}] Search request returned status code: {status}. Response was:\n{body}")]
    Status {
        job_id: String,
        status: StatusCode,
        body: String,
    },

    /// The overall status was fine but one or more shards failed
    #[error("[{job_id}] Search request returned shard failures: {reasons}")]
    ShardFailures { job_id: String, reasons: String },

    /// The search hit its timeout and returned partial results
    #[error("[{job_id}] Search request timed out with partial results")]
    TimedOut { job_id: String },
}

impl DataExtractionError {
    /// Job the failed search belonged to
    pub fn job_id(&self) -> &str {
        match self {
            Self::Status { job_id, .. }
            | Self::ShardFailures { job_id, .. }
            | Self::TimedOut { job_id } => job_id,
        }
    }
}
