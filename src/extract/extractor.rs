//! Pull-based data extractor contract

use eyre::Result;

/// Raw bytes of one fetched batch (e.g. a page of serialized documents)
pub type Payload = Vec<u8>;

/// A lazily-fetching source of raw payloads
///
/// Callers drive progress by awaiting [`DataExtractor::next`] until it
/// resolves to `None`. An extractor is single-pass: once exhausted it
/// never yields again.
///
/// # Example
/// ```no_run
/// use chunked_extractor::extract::{DataExtractor, Payload};
/// use eyre::Result;
///
/// struct Fixed {
///     pages: Vec<Payload>,
///     cancelled: bool,
/// }
///
/// impl DataExtractor for Fixed {
///     fn has_next(&self) -> bool {
///         !self.pages.is_empty()
///     }
///
///     async fn next(&mut self) -> Result<Option<Payload>> {
///         Ok(self.pages.pop())
///     }
///
///     fn cancel(&mut self) {
///         self.cancelled = true;
///     }
///
///     fn is_cancelled(&self) -> bool {
///         self.cancelled
///     }
/// }
/// ```
pub trait DataExtractor: Send {
    /// Whether a call to [`DataExtractor::next`] may still produce data
    ///
    /// May be optimistic: `true` followed by `next()` returning `None` is allowed.
    fn has_next(&self) -> bool;

    /// Fetch the next payload, or `None` when there is nothing left
    ///
    /// # Errors
    /// Returns an error if the underlying fetch fails. The extractor must not
    /// be used again after an error.
    fn next(&mut self) -> impl std::future::Future<Output = Result<Option<Payload>>> + Send;

    /// Request cooperative cancellation
    fn cancel(&mut self);

    fn is_cancelled(&self) -> bool;
}

/// Produces a single-chunk extractor for a concrete time interval
pub trait DataExtractorFactory: Send + Sync {
    type Extractor: DataExtractor;

    /// Create an extractor over `[start, end)` (epoch milliseconds)
    ///
    /// # Errors
    /// Returns an error if the extractor cannot be created.
    fn new_extractor(&self, start: i64, end: i64) -> Result<Self::Extractor>;
}
