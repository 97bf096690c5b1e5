use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use mplay_common::{Error, ObjectRef, Result};
use tokio::task::JoinHandle;

use crate::store::ChunkStore;
use crate::trim::Trim;

/// One in-flight request for a contiguous block of chunks.
///
/// The fetch runs on its own tokio task from the moment the `FetchTask` is
/// created; the join handle is the result slot. Dropping a `FetchTask` aborts
/// the fetch if it has not finished.
#[derive(Debug)]
pub struct FetchTask {
    /// Position in the stream; strictly increasing within a session.
    pub sequence_number: u64,
    /// First chunk requested.
    pub chunk_offset: u64,
    /// Number of chunks requested.
    pub chunk_count: u64,
    /// How to cut the fetched block down to the bytes owed.
    pub trim: Trim,
    failed: Arc<AtomicBool>,
    handle: JoinHandle<Result<Bytes>>,
}

impl FetchTask {
    /// Launch the fetch immediately and return the handle to it.
    pub fn spawn(
        store: Arc<dyn ChunkStore>,
        object: ObjectRef,
        sequence_number: u64,
        chunk_offset: u64,
        chunk_count: u64,
        trim: Trim,
    ) -> Self {
        let failed = Arc::new(AtomicBool::new(false));
        let flag = failed.clone();
        let handle = tokio::spawn(async move {
            let result = store
                .fetch_chunks(&object, chunk_offset, chunk_count)
                .await;
            if result.is_err() {
                flag.store(true, Ordering::Release);
            }
            result
        });

        Self {
            sequence_number,
            chunk_offset,
            chunk_count,
            trim,
            failed,
            handle,
        }
    }

    /// Wait for the fetch and return the trimmed bytes.
    ///
    /// Returns immediately if the fetch already completed.
    pub async fn join(mut self) -> Result<Bytes> {
        let block = match (&mut self.handle).await {
            Ok(result) => result?,
            Err(e) if e.is_cancelled() => return Err(Error::Cancelled),
            Err(e) => {
                return Err(Error::Internal(format!(
                    "fetch task for chunk {} panicked: {e}",
                    self.chunk_offset
                )))
            }
        };
        self.trim.apply(self.chunk_offset, block)
    }

    /// Abort the underlying fetch. No-op once it has finished.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// The fetch has finished with an error that [`join`](Self::join) will
    /// surface.
    pub fn has_failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }
}

impl Drop for FetchTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
