//! Backing-store collaborators for the crawl engine
//!
//! The engine only ever talks to the persistent URL queue and the visited-URL
//! set through the traits defined here. Concrete relational or distributed
//! implementations live outside this crate; the in-memory variants below are
//! the process-local ones.

mod memory;
mod traits;

pub use memory::{MemoryUrlQueue, MemoryVisitedSet};
pub use traits::{StoreError, StoreResult, UrlQueue, VisitedSet};
