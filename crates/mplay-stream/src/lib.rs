//! mplay-stream: serve byte ranges from a store that only knows chunks.
//!
//! The backing store hands out fixed-size chunks by index, with high latency
//! per call. This crate turns an HTTP `Range` into an ordered stream of bytes
//! that exactly covers the requested interval:
//!
//! 1. [`RangeRequest`] parses the header into a [`StreamInterval`].
//! 2. [`ChunkGeometry`] maps the interval onto chunk indices.
//! 3. [`StreamSession`] fetches the first block sequentially (fast start),
//!    then keeps up to `worker_count` [`FetchTask`]s in flight and drains
//!    them strictly head-first, trimming each block with [`Trim`].
//! 4. [`MediaStream`] owns the session and cancels every outstanding fetch
//!    when the consumer stops reading.
//!
//! ```no_run
//! use std::sync::Arc;
//! use futures::StreamExt;
//! use mplay_common::MediaReference;
//! use mplay_stream::{ChunkStore, RangeRequest, StreamEngine, StreamSettings};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo(store: Arc<dyn ChunkStore>, media: MediaReference) -> mplay_common::Result<()> {
//! let engine = StreamEngine::new(store, StreamSettings::default())?;
//! let range = RangeRequest::parse(Some("bytes=500-"), media.size).unwrap();
//! let mut stream = engine.open(&media, range.interval, &CancellationToken::new())?;
//! while let Some(block) = stream.next().await {
//!     let _bytes = block?;
//! }
//! # Ok(())
//! # }
//! ```

mod controller;
mod geometry;
mod range;
mod session;
mod settings;
mod store;
mod task;
mod trim;

pub use controller::{MediaStream, Outcome, StreamEngine};
pub use geometry::ChunkGeometry;
pub use range::{RangeRequest, StreamInterval};
pub use session::StreamSession;
pub use settings::{StreamSettings, DEFAULT_CHUNK_SIZE, DEFAULT_WORKER_COUNT};
pub use store::{ChunkStore, MediaResolver};
pub use task::FetchTask;
pub use trim::Trim;
