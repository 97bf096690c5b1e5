use mplay_common::{Error, Result};
use serde::{Deserialize, Serialize};

/// The chunk size the production store serves (1 MiB).
pub const DEFAULT_CHUNK_SIZE: u64 = 1024 * 1024;

/// Fetch tasks kept in flight behind the fast-start block.
pub const DEFAULT_WORKER_COUNT: usize = 3;

/// Tunables for one [`StreamEngine`](crate::StreamEngine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    /// Granularity of the backing store, in bytes.
    pub chunk_size: u64,
    /// Size of the sequential first fetch. A non-zero multiple of `chunk_size`.
    pub fast_start_bytes: u64,
    /// Width of the sliding window of concurrent fetches.
    pub worker_count: usize,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            fast_start_bytes: DEFAULT_CHUNK_SIZE,
            worker_count: DEFAULT_WORKER_COUNT,
        }
    }
}

impl StreamSettings {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::validation("stream.chunk_size must be greater than 0"));
        }
        if self.worker_count == 0 {
            return Err(Error::validation("stream.worker_count must be at least 1"));
        }
        if self.fast_start_bytes == 0 || self.fast_start_bytes % self.chunk_size != 0 {
            return Err(Error::validation(format!(
                "stream.fast_start_bytes ({}) must be a non-zero multiple of chunk_size ({})",
                self.fast_start_bytes, self.chunk_size
            )));
        }
        Ok(())
    }

    /// Chunks requested by the fast-start fetch.
    pub fn fast_start_chunks(&self) -> u64 {
        (self.fast_start_bytes / self.chunk_size).max(1)
    }
}
