//! Density-adaptive chunk planning
//!
//! The planner walks a cursor from the start of the range to its end, handing
//! out `[cursor, cursor + span)` chunks. The span is either fixed by the
//! context or derived from a data summary so each chunk holds roughly
//! `batch_size * CHUNK_SPAN_SCALE` documents. A chunk that turns out empty
//! triggers a fresh summary from the same cursor instead of advancing.

use super::{DataSummary, ExtractionContext, SummaryProbe};
use eyre::Result;

/// Expected documents per chunk, in multiples of the batch size
pub const CHUNK_SPAN_SCALE: i64 = 10;

/// Smallest adaptive chunk span, in milliseconds
pub const MIN_CHUNK_SPAN_MS: i64 = 60_000;

/// Half-open time interval `[start, end)` in epoch milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub start: i64,
    pub end: i64,
}

impl Chunk {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn span(&self) -> i64 {
        self.end - self.start
    }
}

impl std::fmt::Display for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Chunk boundary state machine for one extraction run
#[derive(Debug, Clone)]
pub struct ChunkPlanner {
    cursor: i64,
    span: Option<i64>,
    needs_reprobe: bool,
    exhausted: bool,
    probe_count: usize,
}

impl ChunkPlanner {
    pub fn new(context: &ExtractionContext) -> Self {
        Self {
            cursor: context.start(),
            span: None,
            needs_reprobe: false,
            exhausted: false,
            probe_count: 0,
        }
    }

    /// Start of the next chunk not yet confirmed to hold data
    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    /// Current chunk span in milliseconds, once seeded
    pub fn span(&self) -> Option<i64> {
        self.span
    }

    pub fn needs_reprobe(&self) -> bool {
        self.needs_reprobe
    }

    /// True once a summary found no data left in the range
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Number of summaries requested so far
    pub fn probe_count(&self) -> usize {
        self.probe_count
    }

    /// Reconfigure from a fresh summary of `[cursor, end)`
    pub fn seed(&mut self, summary: &DataSummary, context: &ExtractionContext) {
        self.needs_reprobe = false;

        if !summary.has_data() {
            log::debug!(
                "[{}] No data in [{}, {})",
                context.job_id(),
                self.cursor,
                context.end()
            );
            self.exhausted = true;
            return;
        }

        // Skip the known-empty prefix
        if let Some(earliest) = summary.earliest {
            self.cursor = self.cursor.max(earliest);
        }

        let span = match context.chunk_span_millis() {
            Some(span) => span,
            None => self.adaptive_span(summary, context),
        };
        self.span = Some(span);

        log::debug!(
            "[{}] Chunked search configured: total hits = {}, data time spread = {} ms, chunk span = {} ms",
            context.job_id(),
            summary.total_count,
            summary.time_spread(),
            span
        );
    }

    fn adaptive_span(&self, summary: &DataSummary, context: &ExtractionContext) -> i64 {
        let spread = summary.time_spread();
        if spread == 0 {
            return context.end() - self.cursor;
        }
        let span = i128::from(spread)
            * i128::from(context.batch_size())
            * i128::from(CHUNK_SPAN_SCALE)
            / i128::from(summary.total_count);
        i64::try_from(span).unwrap_or(i64::MAX).max(MIN_CHUNK_SPAN_MS)
    }

    /// Plan the next chunk, probing first when no usable span is known
    ///
    /// Returns `None` once the range is exhausted. The cursor does not move
    /// until the chunk is [reported](ChunkPlanner::report).
    ///
    /// # Errors
    /// Propagates probe failures unchanged.
    pub async fn next_chunk<P: SummaryProbe>(
        &mut self,
        context: &ExtractionContext,
        probe: &P,
    ) -> Result<Option<Chunk>> {
        let end = context.end();
        if self.exhausted || self.cursor >= end {
            return Ok(None);
        }

        if self.span.is_none() || self.needs_reprobe {
            let summary = probe.probe(self.cursor, end).await?;
            self.probe_count += 1;
            self.seed(&summary, context);
            if self.exhausted || self.cursor >= end {
                return Ok(None);
            }
        }

        let Some(span) = self.span else {
            return Ok(None);
        };
        let chunk_end = self.cursor.saturating_add(span).min(end);
        Ok(Some(Chunk::new(self.cursor, chunk_end)))
    }

    /// Record the outcome of a drained chunk
    ///
    /// A chunk that produced data advances the cursor past it. An empty chunk
    /// leaves the cursor in place and forces a new summary on the next plan.
    pub fn report(&mut self, chunk: Chunk, produced_any_data: bool) {
        if produced_any_data {
            self.cursor = chunk.end;
        } else {
            self.needs_reprobe = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Probe that replays canned summaries and records requested ranges
    struct ScriptedProbe {
        summaries: Mutex<VecDeque<DataSummary>>,
        ranges: Mutex<Vec<(i64, i64)>>,
    }

    impl ScriptedProbe {
        fn new(summaries: Vec<DataSummary>) -> Self {
            Self {
                summaries: Mutex::new(summaries.into()),
                ranges: Mutex::new(Vec::new()),
            }
        }

        fn ranges(&self) -> Vec<(i64, i64)> {
            self.ranges.lock().unwrap().clone()
        }
    }

    impl SummaryProbe for ScriptedProbe {
        async fn probe(&self, start: i64, end: i64) -> Result<DataSummary> {
            self.ranges.lock().unwrap().push((start, end));
            let summary = self.summaries.lock().unwrap().pop_front();
            summary.ok_or_else(|| eyre::eyre!("unexpected probe"))
        }
    }

    fn context(start: i64, end: i64, batch_size: u32, span: Option<Duration>) -> ExtractionContext {
        ExtractionContext::builder("test-job", "time")
            .indices(["index-1"])
            .batch_size(batch_size)
            .time_range(start, end)
            .chunk_span(span)
            .build()
            .unwrap()
    }

    fn summary(total: u64, earliest: i64, latest: i64) -> DataSummary {
        DataSummary::new(total, Some(earliest), Some(latest))
    }

    /// Plan every chunk, reporting each one as having produced data
    async fn plan_all(
        planner: &mut ChunkPlanner,
        context: &ExtractionContext,
        probe: &ScriptedProbe,
    ) -> Vec<(i64, i64)> {
        let mut chunks = Vec::new();
        while let Some(chunk) = planner.next_chunk(context, probe).await.unwrap() {
            chunks.push((chunk.start, chunk.end));
            planner.report(chunk, true);
        }
        chunks
    }

    #[tokio::test]
    async fn test_no_data() {
        let context = context(1000, 2300, 1000, None);
        let probe = ScriptedProbe::new(vec![DataSummary::empty()]);
        let mut planner = ChunkPlanner::new(&context);

        assert_eq!(planner.next_chunk(&context, &probe).await.unwrap(), None);
        assert!(planner.is_exhausted());
        // Exhaustion is sticky and does not probe again
        assert_eq!(planner.next_chunk(&context, &probe).await.unwrap(), None);
        assert_eq!(probe.ranges(), vec![(1000, 2300)]);
    }

    #[tokio::test]
    async fn test_fixed_span() {
        let context = context(1000, 2300, 1000, Some(Duration::from_secs(1)));
        let probe = ScriptedProbe::new(vec![summary(10, 1000, 2200)]);
        let mut planner = ChunkPlanner::new(&context);

        let chunks = plan_all(&mut planner, &context, &probe).await;
        assert_eq!(chunks, vec![(1000, 2000), (2000, 2300)]);
        assert_eq!(planner.probe_count(), 1);
    }

    #[tokio::test]
    async fn test_adaptive_span() {
        // 300K millis * 1000 * 10 / 15K docs = 200000
        let context = context(100_000, 450_000, 1000, None);
        let probe = ScriptedProbe::new(vec![summary(15_000, 100_000, 400_000)]);
        let mut planner = ChunkPlanner::new(&context);

        let chunks = plan_all(&mut planner, &context, &probe).await;
        assert_eq!(chunks, vec![(100_000, 300_000), (300_000, 450_000)]);
        assert_eq!(planner.span(), Some(200_000));
        assert_eq!(probe.ranges().len(), 1);
    }

    #[tokio::test]
    async fn test_adaptive_span_scales_with_batch_size() {
        // 300K millis * 500 * 10 / 15K docs = 100000
        let context = context(100_000, 450_000, 500, None);
        let probe = ScriptedProbe::new(vec![summary(15_000, 100_000, 400_000)]);
        let mut planner = ChunkPlanner::new(&context);

        let chunks = plan_all(&mut planner, &context, &probe).await;
        assert_eq!(
            chunks,
            vec![
                (100_000, 200_000),
                (200_000, 300_000),
                (300_000, 400_000),
                (400_000, 450_000)
            ]
        );
    }

    #[tokio::test]
    async fn test_min_span_clamp() {
        // 300K millis * 1000 * 10 / 150K docs = 20000 < 60000
        let context = context(100_000, 450_000, 1000, None);
        let probe = ScriptedProbe::new(vec![summary(150_000, 100_000, 400_000)]);
        let mut planner = ChunkPlanner::new(&context);

        let chunks = plan_all(&mut planner, &context, &probe).await;
        assert_eq!(chunks[0], (100_000, 160_000));
        assert_eq!(chunks[1], (160_000, 220_000));
        assert_eq!(chunks.last(), Some(&(400_000, 450_000)));
        assert_eq!(planner.span(), Some(MIN_CHUNK_SPAN_MS));
    }

    #[tokio::test]
    async fn test_zero_spread() {
        let context = context(100, 500, 1000, None);
        let probe = ScriptedProbe::new(vec![summary(150_000, 300, 300)]);
        let mut planner = ChunkPlanner::new(&context);

        let chunks = plan_all(&mut planner, &context, &probe).await;
        assert_eq!(chunks, vec![(300, 500)]);
        assert_eq!(planner.probe_count(), 1);
    }

    #[tokio::test]
    async fn test_range_smaller_than_span() {
        // 100 millis * 1000 * 10 / 10 docs = 100000
        let context = context(1, 101, 1000, None);
        let probe = ScriptedProbe::new(vec![summary(10, 1, 101)]);
        let mut planner = ChunkPlanner::new(&context);

        let chunks = plan_all(&mut planner, &context, &probe).await;
        assert_eq!(chunks, vec![(1, 101)]);
    }

    #[tokio::test]
    async fn test_cursor_skips_empty_prefix() {
        let context = context(0, 1_000_000, 1000, Some(Duration::from_secs(300)));
        let probe = ScriptedProbe::new(vec![summary(5, 700_000, 800_000)]);
        let mut planner = ChunkPlanner::new(&context);

        let chunks = plan_all(&mut planner, &context, &probe).await;
        assert_eq!(chunks, vec![(700_000, 1_000_000)]);
    }

    #[tokio::test]
    async fn test_empty_chunk_reprobes_from_same_cursor() {
        // 300K millis * 500 * 10 / 15K docs = 100000
        let context = context(100_000, 400_000, 500, None);
        let probe = ScriptedProbe::new(vec![
            summary(15_000, 100_000, 400_000),
            // 200K millis * 500 * 10 / 5K docs = 200000
            summary(5_000, 200_000, 400_000),
        ]);
        let mut planner = ChunkPlanner::new(&context);

        let first = planner.next_chunk(&context, &probe).await.unwrap().unwrap();
        assert_eq!(first, Chunk::new(100_000, 200_000));
        planner.report(first, true);

        let second = planner.next_chunk(&context, &probe).await.unwrap().unwrap();
        assert_eq!(second, Chunk::new(200_000, 300_000));
        planner.report(second, false);
        assert_eq!(planner.cursor(), 200_000);
        assert!(planner.needs_reprobe());

        let third = planner.next_chunk(&context, &probe).await.unwrap().unwrap();
        assert_eq!(third, Chunk::new(200_000, 400_000));
        assert!(!planner.needs_reprobe());
        planner.report(third, true);

        assert_eq!(planner.next_chunk(&context, &probe).await.unwrap(), None);
        assert_eq!(probe.ranges(), vec![(100_000, 400_000), (200_000, 400_000)]);
    }

    #[tokio::test]
    async fn test_empty_tail_exhausts() {
        let context = context(0, 200_000, 1000, Some(Duration::from_secs(100)));
        let probe = ScriptedProbe::new(vec![summary(10, 0, 199_000), DataSummary::empty()]);
        let mut planner = ChunkPlanner::new(&context);

        let first = planner.next_chunk(&context, &probe).await.unwrap().unwrap();
        planner.report(first, true);
        let second = planner.next_chunk(&context, &probe).await.unwrap().unwrap();
        assert_eq!(second, Chunk::new(100_000, 200_000));
        planner.report(second, false);

        assert_eq!(planner.next_chunk(&context, &probe).await.unwrap(), None);
        assert!(planner.is_exhausted());
        assert_eq!(planner.probe_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_chunk_is_replanned_when_summary_disagrees() {
        let context = context(0, 300_000, 1000, Some(Duration::from_secs(100)));
        let probe = ScriptedProbe::new(vec![summary(10, 0, 250_000), summary(10, 0, 250_000)]);
        let mut planner = ChunkPlanner::new(&context);

        let first = planner.next_chunk(&context, &probe).await.unwrap().unwrap();
        assert_eq!(first, Chunk::new(0, 100_000));
        planner.report(first, false);

        let second = planner.next_chunk(&context, &probe).await.unwrap().unwrap();
        assert_eq!(second, Chunk::new(0, 100_000));
        assert_eq!(planner.cursor(), 0);
        assert_eq!(probe.ranges(), vec![(0, 300_000), (0, 300_000)]);
    }

    #[tokio::test]
    async fn test_adaptive_span_saturates() {
        let context = context(0, 1_000_000, u32::MAX, None);
        let probe = ScriptedProbe::new(vec![summary(1, 0, i64::MAX / 2)]);
        let mut planner = ChunkPlanner::new(&context);

        let chunk = planner.next_chunk(&context, &probe).await.unwrap().unwrap();
        assert_eq!(planner.span(), Some(i64::MAX));
        assert_eq!(chunk, Chunk::new(0, 1_000_000));

        planner.report(chunk, true);
        assert_eq!(planner.next_chunk(&context, &probe).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_empty_range_never_probes() {
        let context = context(5000, 5000, 1000, None);
        let probe = ScriptedProbe::new(vec![]);
        let mut planner = ChunkPlanner::new(&context);

        assert_eq!(planner.next_chunk(&context, &probe).await.unwrap(), None);
        assert!(probe.ranges().is_empty());
    }

    #[tokio::test]
    async fn test_probe_error_propagates() {
        let context = context(0, 1000, 1000, None);
        let probe = ScriptedProbe::new(vec![]);
        let mut planner = ChunkPlanner::new(&context);

        assert!(planner.next_chunk(&context, &probe).await.is_err());
    }

    #[test]
    fn test_chunk_display() {
        let chunk = Chunk::new(1000, 2000);
        assert_eq!(chunk.to_string(), "[1000, 2000)");
        assert_eq!(chunk.span(), 1000);
    }
}
