//! Collaborator interfaces consumed by the engine.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use mplay_common::{MediaId, MediaReference, ObjectRef, Result, Variant};

/// A backing store that can only hand out whole, fixed-size chunks.
///
/// Implementations must tolerate concurrent calls against the same object:
/// a stream keeps several fetches in flight at once.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Fetch `chunk_count` consecutive chunks starting at `chunk_index`.
    ///
    /// Every chunk except the object's last is exactly the store's chunk size;
    /// the returned bytes are the chunks concatenated.
    async fn fetch_chunks(
        &self,
        object: &ObjectRef,
        chunk_index: u64,
        chunk_count: u64,
    ) -> Result<Bytes>;

    /// Chunk size this store serves, when it knows it.
    ///
    /// Lets the engine refuse to start with a mismatched geometry.
    fn chunk_size(&self) -> Option<u64> {
        None
    }
}

#[async_trait]
impl<S: ChunkStore + ?Sized> ChunkStore for Arc<S> {
    async fn fetch_chunks(
        &self,
        object: &ObjectRef,
        chunk_index: u64,
        chunk_count: u64,
    ) -> Result<Bytes> {
        (**self).fetch_chunks(object, chunk_index, chunk_count).await
    }

    fn chunk_size(&self) -> Option<u64> {
        (**self).chunk_size()
    }
}

/// Metadata lookup from a client-facing id to a backing-store object.
#[async_trait]
pub trait MediaResolver: Send + Sync {
    /// Resolve `id`, failing with [`mplay_common::Error::NotFound`] when the
    /// media or the requested variant does not exist.
    async fn resolve(&self, id: &MediaId, variant: Variant) -> Result<MediaReference>;
}
