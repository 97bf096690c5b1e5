//! Stream lifecycle: one cancellable unit of work per response body.

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use bytes::Bytes;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use mplay_common::{Error, MediaReference, ObjectRef, Result};
use tokio_util::sync::CancellationToken;

use crate::range::StreamInterval;
use crate::session::StreamSession;
use crate::settings::StreamSettings;
use crate::store::ChunkStore;

/// How a stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Still producing blocks.
    Streaming,
    /// Every byte of the interval was handed out.
    Completed,
    /// A fetch failed; the stream is truncated.
    Failed,
    /// The consumer went away or the stream was cancelled from outside.
    Cancelled,
}

/// Factory for [`MediaStream`]s sharing one store and one set of settings.
#[derive(Clone)]
pub struct StreamEngine {
    store: Arc<dyn ChunkStore>,
    settings: StreamSettings,
}

impl fmt::Debug for StreamEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamEngine")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl StreamEngine {
    /// Validate `settings` against each other and against the store.
    pub fn new(store: Arc<dyn ChunkStore>, settings: StreamSettings) -> Result<Self> {
        settings.validate()?;
        if let Some(served) = store.chunk_size() {
            if served != settings.chunk_size {
                return Err(Error::validation(format!(
                    "store serves {served}-byte chunks but stream.chunk_size is {}",
                    settings.chunk_size
                )));
            }
        }
        Ok(Self { store, settings })
    }

    pub fn settings(&self) -> &StreamSettings {
        &self.settings
    }

    /// Start streaming `interval` of `media`.
    ///
    /// The stream is cancelled when it is dropped, or when `parent` is
    /// cancelled. Nothing is fetched until the stream is first polled.
    pub fn open(
        &self,
        media: &MediaReference,
        interval: StreamInterval,
        parent: &CancellationToken,
    ) -> Result<MediaStream> {
        if interval.end >= media.size {
            return Err(Error::validation(format!(
                "interval {}-{} outside object of {} bytes",
                interval.start, interval.end, media.size
            )));
        }

        let cancel = parent.child_token();
        let session = StreamSession::new(
            Arc::clone(&self.store),
            media.object.clone(),
            interval,
            self.settings.clone(),
            cancel.clone(),
        );

        Ok(MediaStream::new(session, media.object.clone(), interval, cancel))
    }
}

/// Ordered byte stream for one interval of one object.
///
/// Yields trimmed blocks whose concatenation is exactly the interval. Ends
/// after the first error. Dropping it before the end cancels every fetch
/// still in flight before `drop` returns.
pub struct MediaStream {
    inner: BoxStream<'static, Result<Bytes>>,
    cancel: CancellationToken,
    object: ObjectRef,
    interval: StreamInterval,
    outcome: Outcome,
    emitted: u64,
    blocks: u64,
    started: Instant,
}

impl MediaStream {
    fn new(
        session: StreamSession,
        object: ObjectRef,
        interval: StreamInterval,
        cancel: CancellationToken,
    ) -> Self {
        let inner = stream::unfold(Some(session), |state| async move {
            let mut session = state?;
            match session.next_block().await {
                Ok(Some(bytes)) => Some((Ok(bytes), Some(session))),
                Ok(None) => None,
                // The session is dropped here, its window already emptied.
                Err(e) => Some((Err(e), None)),
            }
        })
        .boxed();

        Self {
            inner,
            cancel,
            object,
            interval,
            outcome: Outcome::Streaming,
            emitted: 0,
            blocks: 0,
            started: Instant::now(),
        }
    }

    pub fn interval(&self) -> StreamInterval {
        self.interval
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Bytes handed to the consumer so far.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Token that cancels this stream (and only this stream).
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    fn finish(&mut self, outcome: Outcome, error: Option<&Error>) {
        self.outcome = outcome;
        let elapsed_ms = self.started.elapsed().as_millis() as u64;

        match (outcome, error) {
            (Outcome::Completed, _) => tracing::debug!(
                object = %self.object,
                start = self.interval.start,
                end = self.interval.end,
                bytes = self.emitted,
                blocks = self.blocks,
                elapsed_ms,
                "Stream completed"
            ),
            (Outcome::Cancelled, _) => tracing::info!(
                object = %self.object,
                start = self.interval.start,
                end = self.interval.end,
                bytes = self.emitted,
                owed = self.interval.len() - self.emitted,
                elapsed_ms,
                "Stream cancelled"
            ),
            (_, error) => tracing::warn!(
                object = %self.object,
                start = self.interval.start,
                end = self.interval.end,
                bytes = self.emitted,
                owed = self.interval.len() - self.emitted,
                error = error.map(|e| e.to_string()).unwrap_or_default(),
                "Stream failed, response truncated"
            ),
        }
    }
}

impl Stream for MediaStream {
    type Item = Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.outcome != Outcome::Streaming {
            return Poll::Ready(None);
        }

        let polled = self.inner.as_mut().poll_next(cx);
        match &polled {
            Poll::Ready(Some(Ok(bytes))) => {
                self.emitted += bytes.len() as u64;
                self.blocks += 1;
            }
            Poll::Ready(Some(Err(Error::Cancelled))) => self.finish(Outcome::Cancelled, None),
            Poll::Ready(Some(Err(e))) => self.finish(Outcome::Failed, Some(e)),
            Poll::Ready(None) => {
                debug_assert_eq!(self.emitted, self.interval.len());
                self.finish(Outcome::Completed, None);
            }
            Poll::Pending => {}
        }
        polled
    }
}

impl Drop for MediaStream {
    fn drop(&mut self) {
        if self.outcome == Outcome::Streaming {
            self.cancel.cancel();
            self.finish(Outcome::Cancelled, None);
        }
        // `inner` drops after this, taking the session and aborting its
        // window synchronously.
    }
}
