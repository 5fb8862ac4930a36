//! Store traits and error types

use thiserror::Error;
use url::Url;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// A persistent queue of URLs pending a crawl.
///
/// Implementations must honor FIFO-ish ordering loosely; strict ordering is
/// not required. `take_up_to` consumes the items it returns, so concurrent
/// callers never observe the same URL twice from one store.
pub trait UrlQueue: Send + Sync {
    /// Removes and returns the oldest URL, or `None` if the queue is empty.
    fn take_one(&self) -> StoreResult<Option<Url>>;

    /// Removes and returns up to `n` URLs. Returns fewer than `n` if the
    /// queue is exhausted; never blocks indefinitely.
    fn take_up_to(&self, n: usize) -> StoreResult<Vec<Url>>;

    /// Appends a URL to the queue.
    fn put(&self, url: &Url) -> StoreResult<()>;

    /// Returns the number of URLs currently queued.
    fn count(&self) -> StoreResult<u64>;
}

/// Membership set of canonical URL strings that have already been scheduled
/// or fetched.
///
/// No atomic check-and-set across `contains`/`add` is guaranteed; a narrow
/// race under heavy concurrency can admit a duplicate fetch, which costs
/// wasted work but never wrong output.
pub trait VisitedSet: Send + Sync {
    /// Returns whether the canonical URL string is present.
    fn contains(&self, key: &str) -> StoreResult<bool>;

    /// Inserts the canonical URL string.
    fn add(&self, key: &str) -> StoreResult<()>;
}
