//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which builds a full [`AppContext`] over an
//! in-memory chunk store and a small catalog. The [`TestHarness::with_server`]
//! constructor starts Axum on a random port for HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use bytes::Bytes;
use mplay::catalog::Catalog;
use mplay::config::{Config, MediaEntry, ObjectEntry, StoreKind};
use mplay::server::{create_router, AppContext};
use mplay_store::MemoryStore;
use mplay_stream::{ChunkStore, MediaResolver, StreamEngine, StreamSettings};

pub const MIB: u64 = 1024 * 1024;

/// Deterministic content where no two nearby chunks look alike.
pub fn fixture(size: u64) -> Bytes {
    (0..size)
        .map(|i| (i ^ (i >> 8) ^ (i >> 16)) as u8)
        .collect::<Vec<_>>()
        .into()
}

fn entry(id: &str, object: &str, size: u64) -> MediaEntry {
    MediaEntry {
        id: id.to_string(),
        object: object_entry(object, size),
        audio: None,
        video: None,
    }
}

fn object_entry(object: &str, size: u64) -> ObjectEntry {
    ObjectEntry {
        object: object.to_string(),
        size,
        mime: None,
        file_name: None,
    }
}

/// Catalog served by every harness:
///
/// - `song-1`: 10 MB mp3, with a 500 KB audio and a 3 MB video variant
/// - `small`: 500 KB mp3
/// - `empty`: zero-byte object
/// - `missing`: catalogued but absent from the store
/// - `truncated`: catalogued as 3 MiB, stored as 1.5 MiB
pub fn catalog_entries() -> Vec<MediaEntry> {
    let mut song = entry("song-1", "songs/song-1.mp3", 10_000_000);
    song.audio = Some(object_entry("audio/song-1.m4a", 500_000));
    song.video = Some(object_entry("videos/song-1.mp4", 3_000_000));

    vec![
        song,
        entry("small", "songs/small.mp3", 500_000),
        entry("empty", "songs/empty.mp3", 0),
        entry("missing", "songs/gone.mp3", 1_000),
        entry("truncated", "songs/short.mp3", 3 * MIB),
    ]
}

/// Test harness wrapping a fully-constructed [`AppContext`] backed by an
/// in-memory store.
pub struct TestHarness {
    pub ctx: AppContext,
    pub store: Arc<MemoryStore>,
}

impl TestHarness {
    /// Create a new harness with default stream settings.
    pub fn new() -> Self {
        Self::with_settings(StreamSettings::default())
    }

    /// Create a new harness with custom stream settings.
    pub fn with_settings(settings: StreamSettings) -> Self {
        let store = Arc::new(
            MemoryStore::new(settings.chunk_size)
                .with_object("songs/song-1.mp3", fixture(10_000_000))
                .with_object("audio/song-1.m4a", fixture(500_000))
                .with_object("videos/song-1.mp4", fixture(3_000_000))
                .with_object("songs/small.mp3", fixture(500_000))
                .with_object("songs/short.mp3", fixture(3 * MIB / 2)),
        );

        let mut config = Config::default();
        config.store.kind = StoreKind::Memory;
        config.stream = settings.clone();
        config.media = catalog_entries();

        let chunk_store: Arc<dyn ChunkStore> = store.clone();
        let engine = StreamEngine::new(chunk_store, settings).expect("invalid stream settings");
        let resolver: Arc<dyn MediaResolver> = Arc::new(Catalog::from_entries(&config.media));

        Self {
            ctx: AppContext::new(config, engine, resolver),
            store,
        }
    }

    pub fn router(&self) -> Router {
        create_router(self.ctx.clone())
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::serve(Self::new()).await
    }

    /// Start an Axum server with custom stream settings on a random port.
    pub async fn with_server_settings(settings: StreamSettings) -> (Self, SocketAddr) {
        Self::serve(Self::with_settings(settings)).await
    }

    async fn serve(harness: Self) -> (Self, SocketAddr) {
        let app = harness.router();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }
}
