//! Per-request streaming state: fast start, then an ordered sliding window.

use std::collections::VecDeque;
use std::sync::Arc;

use bytes::Bytes;
use mplay_common::{Error, ObjectRef, Result};
use tokio_util::sync::CancellationToken;

use crate::geometry::ChunkGeometry;
use crate::range::StreamInterval;
use crate::settings::StreamSettings;
use crate::store::ChunkStore;
use crate::task::FetchTask;
use crate::trim::Trim;

/// State for one response body.
///
/// Owned by exactly one stream; never shared between requests. Blocks come
/// out of [`next_block`](Self::next_block) in ascending byte order no matter
/// in which order the underlying fetches complete, because the window is only
/// ever appended at increasing chunk offsets and only ever drained from the
/// head.
pub struct StreamSession {
    store: Arc<dyn ChunkStore>,
    object: ObjectRef,
    settings: StreamSettings,
    geometry: ChunkGeometry,
    /// Next chunk to schedule.
    current_chunk_offset: u64,
    /// Bytes of the interval not yet assigned to a fetch.
    remaining_bytes: u64,
    next_sequence: u64,
    /// Live fetches, head first.
    window: VecDeque<FetchTask>,
    fast_start_done: bool,
    /// A fetch behind the head failed; nothing more is admitted.
    halted: bool,
    cancel: CancellationToken,
}

impl StreamSession {
    pub fn new(
        store: Arc<dyn ChunkStore>,
        object: ObjectRef,
        interval: StreamInterval,
        settings: StreamSettings,
        cancel: CancellationToken,
    ) -> Self {
        let geometry = ChunkGeometry::map(interval, settings.chunk_size);
        let window = VecDeque::with_capacity(settings.worker_count);

        Self {
            store,
            object,
            settings,
            geometry,
            current_chunk_offset: geometry.start_chunk_index,
            remaining_bytes: interval.len(),
            next_sequence: 0,
            window,
            fast_start_done: false,
            halted: false,
            cancel,
        }
    }

    /// Number of fetches currently in the window.
    pub fn in_flight(&self) -> usize {
        self.window.len()
    }

    /// Produce the next block of the interval, or `None` once it is covered.
    ///
    /// Any error, including cancellation, tears down the whole window before
    /// it is returned.
    pub async fn next_block(&mut self) -> Result<Option<Bytes>> {
        if self.cancel.is_cancelled() {
            self.cancel_all();
            return Err(Error::Cancelled);
        }

        let result = if self.fast_start_done {
            self.drain().await
        } else {
            self.fast_start().await
        };

        if result.is_err() {
            self.cancel_all();
        }
        result
    }

    /// Abort every live fetch and forget about it.
    pub fn cancel_all(&mut self) {
        if self.window.is_empty() {
            return;
        }
        tracing::debug!(
            object = %self.object,
            in_flight = self.window.len(),
            "Cancelling outstanding chunk fetches"
        );
        for task in self.window.drain(..) {
            task.cancel();
        }
    }

    /// Fetch the first block inline so the first bytes do not queue behind
    /// the window, then open the window behind it.
    async fn fast_start(&mut self) -> Result<Option<Bytes>> {
        self.fast_start_done = true;
        if self.remaining_bytes == 0 {
            return Ok(None);
        }

        let chunk_size = self.settings.chunk_size;
        let chunk_index = self.current_chunk_offset;
        let chunk_count = self
            .settings
            .fast_start_chunks()
            .min(self.geometry.chunks_needed);
        let capacity = chunk_count * chunk_size - self.geometry.lead_skip;
        let trim = Trim {
            skip: self.geometry.lead_skip,
            want: capacity.min(self.remaining_bytes),
        };

        tracing::trace!(
            object = %self.object,
            chunk_index,
            chunk_count,
            skip = trim.skip,
            want = trim.want,
            "Fast-start fetch"
        );

        let block = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(Error::Cancelled),
            block = self.store.fetch_chunks(&self.object, chunk_index, chunk_count) => block?,
        };

        self.next_sequence += 1;
        self.current_chunk_offset += chunk_count;
        self.remaining_bytes -= trim.want;

        let bytes = trim.apply(chunk_index, block)?;
        self.fill();
        Ok(Some(bytes))
    }

    /// Pop the head of the window, wait for it, refill, and hand it out.
    async fn drain(&mut self) -> Result<Option<Bytes>> {
        let Some(head) = self.window.pop_front() else {
            debug_assert_eq!(self.remaining_bytes, 0);
            return Ok(None);
        };

        let sequence_number = head.sequence_number;
        let bytes = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(Error::Cancelled),
            bytes = head.join() => bytes?,
        };

        tracing::trace!(
            object = %self.object,
            sequence_number,
            len = bytes.len(),
            "Drained window head"
        );

        self.fill();
        Ok(Some(bytes))
    }

    /// Admit tasks until the window is full or the interval is scheduled.
    ///
    /// Once any queued fetch has failed, the stream cannot get past it, so
    /// everything behind it is dropped and no more tasks are admitted. The
    /// failed task stays queued so its error surfaces in order.
    fn fill(&mut self) {
        if self.halted {
            return;
        }
        if let Some(pos) = self.window.iter().position(FetchTask::has_failed) {
            let sequence_number = self.window[pos].sequence_number;
            self.window.truncate(pos + 1);
            self.halted = true;
            tracing::debug!(
                object = %self.object,
                sequence_number,
                "Fetch failed behind window head; halting refills"
            );
            return;
        }
        while self.window.len() < self.settings.worker_count && self.remaining_bytes > 0 {
            self.admit();
        }
    }

    fn admit(&mut self) {
        let trim = Trim {
            skip: 0,
            want: self.settings.chunk_size.min(self.remaining_bytes),
        };
        let task = FetchTask::spawn(
            Arc::clone(&self.store),
            self.object.clone(),
            self.next_sequence,
            self.current_chunk_offset,
            1,
            trim,
        );

        tracing::trace!(
            object = %self.object,
            sequence_number = task.sequence_number,
            chunk_index = task.chunk_offset,
            want = trim.want,
            "Admitted fetch task"
        );

        self.next_sequence += 1;
        self.current_chunk_offset += 1;
        self.remaining_bytes -= trim.want;
        self.window.push_back(task);
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use assert_matches::assert_matches;

    /// Serves `size` bytes where byte `i` is `i % 251`.
    struct PatternStore {
        size: u64,
        chunk_size: u64,
    }

    #[async_trait]
    impl ChunkStore for PatternStore {
        async fn fetch_chunks(
            &self,
            _object: &ObjectRef,
            chunk_index: u64,
            chunk_count: u64,
        ) -> Result<Bytes> {
            let start = (chunk_index * self.chunk_size).min(self.size);
            let end = ((chunk_index + chunk_count) * self.chunk_size).min(self.size);
            Ok((start..end).map(|i| (i % 251) as u8).collect::<Vec<_>>().into())
        }
    }

    fn session(size: u64, start: u64, end: u64, settings: StreamSettings) -> StreamSession {
        let store = Arc::new(PatternStore {
            size,
            chunk_size: settings.chunk_size,
        });
        StreamSession::new(
            store,
            ObjectRef::new("obj"),
            StreamInterval::new(start, end, size).unwrap(),
            settings,
            CancellationToken::new(),
        )
    }

    fn settings(chunk_size: u64, workers: usize) -> StreamSettings {
        StreamSettings {
            chunk_size,
            fast_start_bytes: chunk_size,
            worker_count: workers,
        }
    }

    async fn collect(mut s: StreamSession) -> Vec<Bytes> {
        let mut blocks = Vec::new();
        while let Some(b) = s.next_block().await.unwrap() {
            blocks.push(b);
        }
        blocks
    }

    #[tokio::test]
    async fn test_blocks_concatenate_to_interval() {
        let blocks = collect(session(1000, 37, 911, settings(64, 3))).await;
        let body: Vec<u8> = blocks.iter().flat_map(|b| b.iter().copied()).collect();
        let expected: Vec<u8> = (37..=911u64).map(|i| (i % 251) as u8).collect();
        assert_eq!(body, expected);
    }

    #[tokio::test]
    async fn test_first_block_is_trimmed_fast_start() {
        let blocks = collect(session(1000, 10, 999, settings(100, 2))).await;
        assert_eq!(blocks[0].len(), 90);
        assert!(blocks[1..].iter().all(|b| b.len() == 100));
        assert_eq!(blocks.len(), 10);
    }

    #[tokio::test]
    async fn test_window_fills_after_fast_start() {
        let mut s = session(1000, 0, 999, settings(100, 3));
        assert_eq!(s.in_flight(), 0);
        s.next_block().await.unwrap().unwrap();
        assert_eq!(s.in_flight(), 3);
    }

    #[tokio::test]
    async fn test_window_never_over_schedules_short_interval() {
        let mut s = session(1000, 0, 149, settings(100, 4));
        s.next_block().await.unwrap().unwrap();
        assert_eq!(s.in_flight(), 1);
        assert_eq!(s.next_block().await.unwrap().unwrap().len(), 50);
        assert!(s.next_block().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cancelled_session_errors_and_empties_window() {
        let mut s = session(1000, 0, 999, settings(100, 3));
        s.next_block().await.unwrap().unwrap();
        s.cancel.cancel();
        assert_matches!(s.next_block().await, Err(Error::Cancelled));
        assert_eq!(s.in_flight(), 0);
    }

    /// Fails every fetch of `bad_chunk`; everything else is a zero block.
    struct FailingStore {
        bad_chunk: u64,
    }

    #[async_trait]
    impl ChunkStore for FailingStore {
        async fn fetch_chunks(
            &self,
            object: &ObjectRef,
            chunk_index: u64,
            chunk_count: u64,
        ) -> Result<Bytes> {
            if chunk_index == self.bad_chunk {
                return Err(Error::fetch(chunk_index, format!("{object} unavailable")));
            }
            Ok(Bytes::from(vec![0u8; (chunk_count * 100) as usize]))
        }
    }

    #[tokio::test]
    async fn test_failed_task_behind_head_truncates_window() {
        let store = Arc::new(FailingStore { bad_chunk: 2 });
        let mut s = StreamSession::new(
            store,
            ObjectRef::new("obj"),
            StreamInterval::full(10_000).unwrap(),
            settings(100, 4),
            CancellationToken::new(),
        );

        s.next_block().await.unwrap().unwrap();
        assert_eq!(s.in_flight(), 4);
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        // Chunk 1 is fine; refilling after it finds chunk 2 already failed.
        s.next_block().await.unwrap().unwrap();
        assert!(s.halted);
        assert_eq!(s.in_flight(), 1);
        assert_matches!(s.next_block().await, Err(Error::Fetch { .. }));
        assert_eq!(s.in_flight(), 0);
    }
}
