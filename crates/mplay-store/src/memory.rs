use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use mplay_common::{Error, ObjectRef, Result};
use mplay_stream::ChunkStore;
use parking_lot::RwLock;

use crate::chunk_span;

/// In-memory chunked store.
pub struct MemoryStore {
    chunk_size: u64,
    objects: RwLock<HashMap<ObjectRef, Bytes>>,
}

impl MemoryStore {
    pub fn new(chunk_size: u64) -> Self {
        Self {
            chunk_size,
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_object(self, object: impl Into<ObjectRef>, data: impl Into<Bytes>) -> Self {
        self.insert(object, data);
        self
    }

    pub fn insert(&self, object: impl Into<ObjectRef>, data: impl Into<Bytes>) {
        self.objects.write().insert(object.into(), data.into());
    }

    pub fn remove(&self, object: &ObjectRef) -> Option<Bytes> {
        self.objects.write().remove(object)
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

#[async_trait]
impl ChunkStore for MemoryStore {
    async fn fetch_chunks(
        &self,
        object: &ObjectRef,
        chunk_index: u64,
        chunk_count: u64,
    ) -> Result<Bytes> {
        let data = self
            .objects
            .read()
            .get(object)
            .cloned()
            .ok_or_else(|| Error::not_found("object", object))?;

        let size = data.len() as u64;
        let (start, end) = chunk_span(chunk_index, chunk_count, self.chunk_size);
        if start >= size {
            return Err(Error::fetch(
                chunk_index,
                format!("chunk past end of {size}-byte object {object}"),
            ));
        }

        Ok(data.slice(start as usize..end.min(size) as usize))
    }

    fn chunk_size(&self) -> Option<u64> {
        Some(self.chunk_size)
    }
}
