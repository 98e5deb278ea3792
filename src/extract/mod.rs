//! Chunked, density-adaptive data extraction
//!
//! [`ChunkedDataExtractor`] composes a [`DataSummaryProbe`], a [`ChunkPlanner`]
//! and a caller-supplied [`DataExtractorFactory`] into one lazy stream of
//! payloads covering `[start, end)`.

mod chunked;
mod context;
mod extractor;
mod planner;
mod summary;

pub use chunked::ChunkedDataExtractor;
pub use context::{DEFAULT_BATCH_SIZE, ExtractionContext, ExtractionContextBuilder};
pub use extractor::{DataExtractor, DataExtractorFactory, Payload};
pub use planner::{CHUNK_SPAN_SCALE, Chunk, ChunkPlanner, MIN_CHUNK_SPAN_MS};
pub use summary::{DataSummary, DataSummaryProbe, SummaryProbe};
