//! Chunked Extractor
//!
//! Pulls large, time-ordered datasets out of Elasticsearch in memory-bounded,
//! density-sized chunks.

pub mod client;
pub mod config;
pub mod error;
pub mod extract;

// Re-exports for convenience
pub use client::{Auth, ElasticsearchClient, SearchBackend, SearchResponse};
pub use config::{ExtractionConfig, parse_time_value};
pub use error::DataExtractionError;
pub use extract::{
    Chunk, ChunkPlanner, ChunkedDataExtractor, DataExtractor, DataExtractorFactory, DataSummary,
    DataSummaryProbe, ExtractionContext, Payload, SummaryProbe,
};
