//! Two-tier URL frontier
//!
//! The frontier layers a fast in-memory cache queue over a persistent
//! [`UrlQueue`] backing store. Reads are served from the cache; when it runs
//! dry, one caller at a time pulls a bulk batch from the backing store into
//! the cache. Writes land in the cache synchronously and are written through
//! to the backing store in the background.

use crate::store::UrlQueue;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use url::Url;

/// Number of URLs pulled from the backing store per refill
pub const DEFAULT_REFILL_BATCH: usize = 250;

/// Two-tier work queue of URLs not yet fetched
pub struct Frontier {
    /// Fast cache tier, served FIFO
    cache: Mutex<VecDeque<Url>>,

    /// Single-holder refill guard; acquired with `try_lock` only
    refill_lock: Mutex<()>,

    /// Slow persistent tier
    store: Arc<dyn UrlQueue>,

    /// Batch size for bulk refills from the store
    refill_batch: usize,
}

impl Frontier {
    /// Creates a frontier over the given backing store with the default
    /// refill batch size.
    pub fn new(store: Arc<dyn UrlQueue>) -> Self {
        Self::with_refill_batch(store, DEFAULT_REFILL_BATCH)
    }

    /// Creates a frontier with an explicit refill batch size.
    pub fn with_refill_batch(store: Arc<dyn UrlQueue>, refill_batch: usize) -> Self {
        Self {
            cache: Mutex::new(VecDeque::new()),
            refill_lock: Mutex::new(()),
            store,
            refill_batch,
        }
    }

    /// Removes and returns the next URL to crawl, or `None` if nothing is
    /// available right now.
    ///
    /// The refill is best-effort and non-blocking: when the cache is empty
    /// and another caller already holds the refill lock, this returns `None`
    /// rather than waiting, even though the backing store may hold items.
    /// Callers must treat `None` as "try again later", not as exhaustion.
    pub fn next(&self) -> Option<Url> {
        if let Some(url) = self.pop_cache() {
            return Some(url);
        }

        if let Ok(_refilling) = self.refill_lock.try_lock() {
            // Re-check under the lock: a racing caller may have refilled
            // between our empty pop and acquiring the lock.
            if self.cache.lock().unwrap().is_empty() {
                match self.store.take_up_to(self.refill_batch) {
                    Ok(batch) => {
                        if !batch.is_empty() {
                            tracing::debug!(count = batch.len(), "refilled frontier cache");
                            self.cache.lock().unwrap().extend(batch);
                        }
                    }
                    Err(e) => {
                        // Treat a store failure as "no items this round"
                        tracing::warn!(error = %e, "frontier refill failed");
                    }
                }
            }
        }

        self.pop_cache()
    }

    /// Adds a URL to the frontier.
    ///
    /// The cache write is synchronous so the URL is immediately available to
    /// `next()`; the backing-store write happens in the background and its
    /// failure is reported, never propagated.
    pub fn enqueue(&self, url: &Url) {
        self.cache.lock().unwrap().push_back(url.clone());

        let store = Arc::clone(&self.store);
        let url = url.clone();
        let write_through = move || {
            if let Err(e) = store.put(&url) {
                tracing::error!(url = %url, error = %e, "frontier write-through failed");
            }
        };

        // Outside a runtime (plain unit tests), the write happens inline.
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(write_through);
            }
            Err(_) => write_through(),
        }
    }

    /// Returns the number of URLs in the fast cache tier.
    pub fn count(&self) -> usize {
        self.cache.lock().unwrap().len()
    }

    fn pop_cache(&self) -> Option<Url> {
        self.cache.lock().unwrap().pop_front()
    }
}

impl crate::scraper::UrlSource for Frontier {
    fn next_url(&self) -> Option<Url> {
        self.next()
    }
}
