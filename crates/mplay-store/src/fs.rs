//! Directory-backed chunked store.

use std::io::{ErrorKind, SeekFrom};
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use mplay_common::{Error, ObjectRef, Result};
use mplay_stream::ChunkStore;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::chunk_span;

/// Serves files under `root`, addressed by relative object keys.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
    chunk_size: u64,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>, chunk_size: u64) -> Self {
        Self {
            root: root.into(),
            chunk_size,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map an object key to a path, refusing anything that leaves `root`.
    fn object_path(&self, object: &ObjectRef) -> Result<PathBuf> {
        let key = Path::new(object.as_str());
        let contained = key.components().next().is_some()
            && key.components().all(|c| matches!(c, Component::Normal(_)));
        if !contained {
            return Err(Error::not_found("object", object));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl ChunkStore for FsStore {
    async fn fetch_chunks(
        &self,
        object: &ObjectRef,
        chunk_index: u64,
        chunk_count: u64,
    ) -> Result<Bytes> {
        let path = self.object_path(object)?;
        let mut file = File::open(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::not_found("object", object),
            _ => Error::from(e),
        })?;

        let size = file
            .metadata()
            .await
            .map_err(|e| Error::fetch(chunk_index, e))?
            .len();
        let (start, end) = chunk_span(chunk_index, chunk_count, self.chunk_size);
        if start >= size {
            return Err(Error::fetch(
                chunk_index,
                format!("chunk past end of {size}-byte object {object}"),
            ));
        }
        let len = end.min(size) - start;

        file.seek(SeekFrom::Start(start))
            .await
            .map_err(|e| Error::fetch(chunk_index, e))?;

        let mut buf = Vec::with_capacity(len as usize);
        file.take(len)
            .read_to_end(&mut buf)
            .await
            .map_err(|e| Error::fetch(chunk_index, e))?;

        tracing::trace!(path = %path.display(), chunk_index, chunk_count, len = buf.len(), "Read chunks");
        Ok(Bytes::from(buf))
    }

    fn chunk_size(&self) -> Option<u64> {
        Some(self.chunk_size)
    }
}
