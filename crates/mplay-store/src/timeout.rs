use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use mplay_common::{Error, ObjectRef, Result};
use mplay_stream::ChunkStore;

/// Timeout decorator for chunk stores.
///
/// Bounds each `fetch_chunks` call independently; a stalled fetch becomes
/// [`Error::Timeout`] instead of stalling the stream until the client leaves.
pub struct TimeoutStore<S> {
    inner: S,
    timeout: Duration,
}

impl<S: ChunkStore> TimeoutStore<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl<S: ChunkStore> ChunkStore for TimeoutStore<S> {
    async fn fetch_chunks(
        &self,
        object: &ObjectRef,
        chunk_index: u64,
        chunk_count: u64,
    ) -> Result<Bytes> {
        tokio::time::timeout(
            self.timeout,
            self.inner.fetch_chunks(object, chunk_index, chunk_count),
        )
        .await
        .map_err(|_| Error::Timeout {
            chunk_index,
            after: self.timeout,
        })?
    }

    fn chunk_size(&self) -> Option<u64> {
        self.inner.chunk_size()
    }
}
