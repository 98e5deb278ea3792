//! Chunked data extractor
//!
//! Flattens a sequence of per-chunk extractors into one lazy stream of
//! payloads. Each chunk is drained completely before the planner is asked
//! for the next one, and cancellation only takes effect between chunks.

use super::{
    Chunk, ChunkPlanner, DataExtractor, DataExtractorFactory, DataSummaryProbe,
    ExtractionContext, Payload,
};
use crate::client::SearchBackend;
use eyre::Result;

/// Sub-extractor for the chunk currently being drained
struct ActiveChunk<E> {
    chunk: Chunk,
    extractor: E,
    produced_data: bool,
}

/// Extracts a time range in density-sized chunks
///
/// # Example
/// ```no_run
/// use chunked_extractor::client::{Auth, ElasticsearchClient};
/// use chunked_extractor::extract::{
///     ChunkedDataExtractor, DataExtractor, DataExtractorFactory, ExtractionContext,
/// };
/// use url::Url;
///
/// # async fn example<F: DataExtractorFactory>(factory: F) -> eyre::Result<()> {
/// let client = ElasticsearchClient::try_new(Url::parse("http://localhost:9200")?, Auth::None)?;
/// let context = ExtractionContext::builder("farequote", "@timestamp")
///     .indices(["farequote-*"])
///     .time_range(1_700_000_000_000, 1_700_086_400_000)
///     .build()?;
///
/// let mut extractor = ChunkedDataExtractor::new(client, factory, context);
/// while extractor.has_next() {
///     if let Some(payload) = extractor.next().await? {
///         println!("{} bytes", payload.len());
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct ChunkedDataExtractor<B, F: DataExtractorFactory> {
    backend: B,
    factory: F,
    context: ExtractionContext,
    planner: ChunkPlanner,
    current: Option<ActiveChunk<F::Extractor>>,
    cancelled: bool,
    done: bool,
    chunks_opened: usize,
}

impl<B, F> ChunkedDataExtractor<B, F>
where
    B: SearchBackend,
    F: DataExtractorFactory,
{
    /// Create an extractor over the context's time range
    ///
    /// Nothing is fetched until the first call to `next()`.
    pub fn new(backend: B, factory: F, context: ExtractionContext) -> Self {
        let planner = ChunkPlanner::new(&context);
        Self {
            backend,
            factory,
            context,
            planner,
            current: None,
            cancelled: false,
            done: false,
            chunks_opened: 0,
        }
    }

    pub fn context(&self) -> &ExtractionContext {
        &self.context
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Chunk whose sub-extractor is currently open
    pub fn current_chunk(&self) -> Option<Chunk> {
        self.current.as_ref().map(|active| active.chunk)
    }

    /// Start of the first chunk not yet known to hold data
    pub fn cursor(&self) -> i64 {
        self.planner.cursor()
    }

    /// Number of data summary searches issued so far
    pub fn probe_count(&self) -> usize {
        self.planner.probe_count()
    }

    /// Number of sub-extractors requested from the factory so far
    pub fn chunks_opened(&self) -> usize {
        self.chunks_opened
    }

    async fn next_payload(&mut self) -> Result<Option<Payload>> {
        loop {
            if self.done {
                return Ok(None);
            }

            if let Some(active) = self.current.as_mut() {
                if active.extractor.has_next()
                    && let Some(payload) = active.extractor.next().await?
                {
                    active.produced_data = true;
                    return Ok(Some(payload));
                }
                if let Some(drained) = self.current.take() {
                    if !drained.produced_data {
                        log::debug!(
                            "[{}] Chunk {} was empty; re-estimating from {}",
                            self.context.job_id(),
                            drained.chunk,
                            drained.chunk.start
                        );
                    }
                    self.planner.report(drained.chunk, drained.produced_data);
                }
            }

            if self.cancelled {
                log::info!(
                    "[{}] Extraction cancelled after {} chunk(s)",
                    self.context.job_id(),
                    self.chunks_opened
                );
                self.done = true;
                return Ok(None);
            }

            let probe = DataSummaryProbe::new(&self.backend, &self.context);
            let Some(chunk) = self.planner.next_chunk(&self.context, &probe).await? else {
                log::info!(
                    "[{}] Extraction complete: {} chunk(s), {} data summary search(es)",
                    self.context.job_id(),
                    self.chunks_opened,
                    self.planner.probe_count()
                );
                self.done = true;
                return Ok(None);
            };

            log::debug!("[{}] Opening chunk {}", self.context.job_id(), chunk);
            let extractor = self.factory.new_extractor(chunk.start, chunk.end)?;
            self.chunks_opened += 1;
            self.current = Some(ActiveChunk {
                chunk,
                extractor,
                produced_data: false,
            });
        }
    }
}

impl<B, F> DataExtractor for ChunkedDataExtractor<B, F>
where
    B: SearchBackend,
    F: DataExtractorFactory,
{
    /// Optimistic before the first fetch; false once finished, or once
    /// cancelled with no open chunk left to drain.
    fn has_next(&self) -> bool {
        if self.done {
            return false;
        }
        if self.cancelled {
            return self
                .current
                .as_ref()
                .is_some_and(|active| active.extractor.has_next());
        }
        true
    }

    async fn next(&mut self) -> Result<Option<Payload>> {
        self.next_payload().await
    }

    /// Stop opening new chunks; the open chunk is still drained
    fn cancel(&mut self) {
        if !self.cancelled {
            log::debug!("[{}] Cancelling extraction", self.context.job_id());
        }
        self.cancelled = true;
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}
