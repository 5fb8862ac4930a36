//! Process-local store implementations
//!
//! Both are plain collections behind a mutex: good enough for a single
//! process, and the reference implementations for the store traits in tests.

use crate::store::{StoreResult, UrlQueue, VisitedSet};
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use url::Url;

/// FIFO queue of URLs held in memory
#[derive(Debug, Default)]
pub struct MemoryUrlQueue {
    urls: Mutex<VecDeque<Url>>,
}

impl MemoryUrlQueue {
    /// Creates an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a queue pre-loaded with the given URLs, in order
    pub fn with_urls<I: IntoIterator<Item = Url>>(urls: I) -> Self {
        Self {
            urls: Mutex::new(urls.into_iter().collect()),
        }
    }
}

impl UrlQueue for MemoryUrlQueue {
    fn take_one(&self) -> StoreResult<Option<Url>> {
        let mut urls = self.urls.lock().unwrap();
        Ok(urls.pop_front())
    }

    fn take_up_to(&self, n: usize) -> StoreResult<Vec<Url>> {
        let mut urls = self.urls.lock().unwrap();
        let take = n.min(urls.len());
        Ok(urls.drain(..take).collect())
    }

    fn put(&self, url: &Url) -> StoreResult<()> {
        let mut urls = self.urls.lock().unwrap();
        tracing::trace!(url = %url, "enqueuing URL");
        urls.push_back(url.clone());
        Ok(())
    }

    fn count(&self) -> StoreResult<u64> {
        Ok(self.urls.lock().unwrap().len() as u64)
    }
}

/// Visited-URL set held in memory
#[derive(Debug, Default)]
pub struct MemoryVisitedSet {
    keys: Mutex<HashSet<String>>,
}

impl MemoryVisitedSet {
    /// Creates an empty set
    pub fn new() -> Self {
        Self::default()
    }
}

impl VisitedSet for MemoryVisitedSet {
    fn contains(&self, key: &str) -> StoreResult<bool> {
        Ok(self.keys.lock().unwrap().contains(key))
    }

    fn add(&self, key: &str) -> StoreResult<()> {
        self.keys.lock().unwrap().insert(key.to_string());
        Ok(())
    }
}
