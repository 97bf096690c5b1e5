//! mplay-store: backing chunked stores.
//!
//! Every store here implements [`mplay_stream::ChunkStore`]: it serves whole
//! chunks by index and nothing else.
//!
//! - [`MemoryStore`]: objects held in memory (tests, benches)
//! - [`FsStore`]: files under a root directory
//! - [`HttpStore`]: objects on an HTTP object server, one ranged GET per fetch
//!
//! Decorators layer client-side policy on top of any store:
//!
//! - [`TimeoutStore`]: bound each fetch
//! - [`RetryStore`]: retry transient failures with back-off
//!
//! ```no_run
//! use std::time::Duration;
//! use mplay_store::{FsStore, RetryPolicy, StoreExt};
//!
//! let store = FsStore::new("/srv/media", 1024 * 1024)
//!     .with_timeout(Duration::from_secs(30))
//!     .with_retry(RetryPolicy::default());
//! ```

mod fs;
mod http;
mod memory;
mod retry;
mod timeout;

pub use fs::FsStore;
pub use http::HttpStore;
pub use memory::MemoryStore;
pub use retry::{RetryPolicy, RetryStore};
pub use timeout::TimeoutStore;

use mplay_stream::ChunkStore;
use std::time::Duration;

/// Decorator constructors for every [`ChunkStore`].
pub trait StoreExt: ChunkStore + Sized {
    /// Fail any single fetch that takes longer than `timeout`.
    fn with_timeout(self, timeout: Duration) -> TimeoutStore<Self> {
        TimeoutStore::new(self, timeout)
    }

    /// Retry transient fetch failures according to `policy`.
    fn with_retry(self, policy: RetryPolicy) -> RetryStore<Self> {
        RetryStore::new(self, policy)
    }
}

impl<S: ChunkStore + Sized> StoreExt for S {}

/// Byte span `[start, end)` covered by `chunk_count` chunks from `chunk_index`.
pub(crate) fn chunk_span(chunk_index: u64, chunk_count: u64, chunk_size: u64) -> (u64, u64) {
    let start = chunk_index.saturating_mul(chunk_size);
    let end = chunk_index
        .saturating_add(chunk_count)
        .saturating_mul(chunk_size);
    (start, end)
}
