use crate::catalog::Catalog;
use crate::config::{Config, StoreConfig, StoreKind};
use crate::streaming;
use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use mplay_store::{FsStore, HttpStore, MemoryStore, StoreExt};
use mplay_stream::{ChunkStore, MediaResolver, StreamEngine};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

mod error;

pub use error::AppError;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub engine: StreamEngine,
    pub resolver: Arc<dyn MediaResolver>,
    /// Cancelled on shutdown; every open stream holds a child of it
    pub shutdown: CancellationToken,
}

impl AppContext {
    /// Build a context from config: the configured store, engine, and catalog.
    pub fn from_config(config: Config) -> Result<Self> {
        let store = build_store(&config.store, config.stream.chunk_size)?;
        let engine = StreamEngine::new(store, config.stream.clone())
            .context("Invalid stream settings")?;
        let resolver: Arc<dyn MediaResolver> = Arc::new(Catalog::from_entries(&config.media));

        Ok(Self::new(config, engine, resolver))
    }

    pub fn new(config: Config, engine: StreamEngine, resolver: Arc<dyn MediaResolver>) -> Self {
        Self {
            config: Arc::new(config),
            engine,
            resolver,
            shutdown: CancellationToken::new(),
        }
    }
}

/// Build the configured backing store with its timeout and retry layers.
pub fn build_store(config: &StoreConfig, chunk_size: u64) -> Result<Arc<dyn ChunkStore>> {
    match config.kind {
        StoreKind::Fs => {
            let root = config
                .root
                .as_ref()
                .context("store.kind = \"fs\" requires store.root")?;
            Ok(layered(FsStore::new(root.clone(), chunk_size), config))
        }
        StoreKind::Http => {
            let base_url = config
                .base_url
                .as_ref()
                .context("store.kind = \"http\" requires store.base_url")?;
            Ok(layered(HttpStore::new(base_url.clone(), chunk_size), config))
        }
        StoreKind::Memory => Ok(layered(MemoryStore::new(chunk_size), config)),
    }
}

fn layered<S: ChunkStore + 'static>(store: S, config: &StoreConfig) -> Arc<dyn ChunkStore> {
    // Timeout sits inside retry so each attempt gets the full budget.
    let store: Arc<dyn ChunkStore> = match config.fetch_timeout_secs {
        Some(secs) => Arc::new(store.with_timeout(Duration::from_secs(secs))),
        None => Arc::new(store),
    };
    if config.retry.is_enabled() {
        Arc::new(store.with_retry(config.retry.clone()))
    } else {
        store
    }
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allow_origin(&ctx.config.server.cors_origins))
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([header::RANGE, header::CONTENT_TYPE])
        .expose_headers([
            header::CONTENT_RANGE,
            header::ACCEPT_RANGES,
            header::CONTENT_LENGTH,
            header::CONTENT_TYPE,
        ]);

    Router::new()
        .route("/health", get(health_check))
        .nest("/stream", streaming::stream_router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

fn allow_origin(origins: &[String]) -> AllowOrigin {
    if origins.is_empty() {
        return Any.into();
    }
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    AllowOrigin::list(parsed)
}

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let ctx = AppContext::from_config(config)?;
    tracing::info!(
        chunk_size = ctx.engine.settings().chunk_size,
        worker_count = ctx.engine.settings().worker_count,
        media = ctx.config.media.len(),
        "Stream engine ready"
    );

    let shutdown = ctx.shutdown.clone();
    let app = create_router(ctx);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            // Open streams would otherwise keep the graceful shutdown waiting.
            shutdown.cancel();
        })
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
