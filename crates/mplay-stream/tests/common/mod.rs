//! Instrumented in-memory chunk store for engine tests.
//!
//! [`FakeStore`] serves a deterministic fixture and records how it was used:
//! total calls, concurrent fetches (current and peak), fetches dropped before
//! completing, and the order in which fetches finished.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use mplay_common::{Error, MediaReference, ObjectRef, Result};
use mplay_stream::{ChunkStore, MediaStream};
use parking_lot::Mutex;

/// Deterministic content where no two nearby chunks look alike.
pub fn fixture(size: u64) -> Bytes {
    (0..size)
        .map(|i| (i ^ (i >> 8) ^ (i >> 16)) as u8)
        .collect::<Vec<_>>()
        .into()
}

pub fn media(size: u64) -> MediaReference {
    MediaReference {
        object: ObjectRef::new("fixture.bin"),
        size,
        mime: "application/octet-stream".to_string(),
        file_name: "fixture.bin".to_string(),
    }
}

type Latency = Box<dyn Fn(u64) -> Duration + Send + Sync>;

pub struct FakeStore {
    data: Bytes,
    chunk_size: u64,
    latency: Latency,
    fail_at: Option<u64>,
    short_at: Option<u64>,
    pub calls: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub dropped: AtomicUsize,
    pub finished: Mutex<Vec<u64>>,
}

impl FakeStore {
    pub fn new(size: u64, chunk_size: u64) -> Self {
        Self {
            data: fixture(size),
            chunk_size,
            latency: Box::new(|_| Duration::ZERO),
            fail_at: None,
            short_at: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            dropped: AtomicUsize::new(0),
            finished: Mutex::new(Vec::new()),
        }
    }

    pub fn with_latency(mut self, f: impl Fn(u64) -> Duration + Send + Sync + 'static) -> Self {
        self.latency = Box::new(f);
        self
    }

    /// Fail any fetch that includes `chunk`.
    pub fn fail_at(mut self, chunk: u64) -> Self {
        self.fail_at = Some(chunk);
        self
    }

    /// Return one byte too few for any fetch that includes `chunk`.
    pub fn short_at(mut self, chunk: u64) -> Self {
        self.short_at = Some(chunk);
        self
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }

    pub fn finished_order(&self) -> Vec<u64> {
        self.finished.lock().clone()
    }
}

struct InFlight<'a> {
    store: &'a FakeStore,
    done: bool,
}

impl<'a> InFlight<'a> {
    fn enter(store: &'a FakeStore) -> Self {
        let now = store.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        store.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self { store, done: false }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.store.in_flight.fetch_sub(1, Ordering::SeqCst);
        if !self.done {
            self.store.dropped.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl ChunkStore for FakeStore {
    async fn fetch_chunks(
        &self,
        _object: &ObjectRef,
        chunk_index: u64,
        chunk_count: u64,
    ) -> Result<Bytes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut guard = InFlight::enter(self);

        let delay = (self.latency)(chunk_index);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        guard.done = true;

        let last = chunk_index + chunk_count - 1;
        if self.fail_at.is_some_and(|c| (chunk_index..=last).contains(&c)) {
            return Err(Error::fetch(chunk_index, "injected failure"));
        }

        let size = self.data.len() as u64;
        let start = (chunk_index * self.chunk_size).min(size);
        let mut end = ((last + 1) * self.chunk_size).min(size);
        if self.short_at.is_some_and(|c| (chunk_index..=last).contains(&c)) {
            end = end.saturating_sub(1).max(start);
        }

        self.finished.lock().push(chunk_index);
        Ok(self.data.slice(start as usize..end as usize))
    }

    fn chunk_size(&self) -> Option<u64> {
        Some(self.chunk_size)
    }
}

pub fn erased(store: &Arc<FakeStore>) -> Arc<dyn ChunkStore> {
    Arc::clone(store) as Arc<dyn ChunkStore>
}

/// Drain a stream, returning the blocks or the first error.
pub async fn collect_blocks(mut stream: MediaStream) -> Result<Vec<Bytes>> {
    let mut blocks = Vec::new();
    while let Some(block) = stream.next().await {
        blocks.push(block?);
    }
    Ok(blocks)
}

pub fn concat(blocks: &[Bytes]) -> Vec<u8> {
    blocks.iter().flat_map(|b| b.iter().copied()).collect()
}
