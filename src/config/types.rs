use mplay_store::RetryPolicy;
use mplay_stream::StreamSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub stream: StreamSettings,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub media: Vec<MediaEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed by CORS (empty = any)
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Files under `root`
    #[default]
    Fs,
    /// Objects under `base_url` on an HTTP object server
    Http,
    /// Empty in-memory store (testing)
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub kind: StoreKind,

    #[serde(default)]
    pub root: Option<PathBuf>,

    #[serde(default)]
    pub base_url: Option<String>,

    /// Per-fetch timeout; unset means a stalled fetch stalls its stream
    #[serde(default)]
    pub fetch_timeout_secs: Option<u64>,

    #[serde(default = "RetryPolicy::disabled")]
    pub retry: RetryPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::default(),
            root: None,
            base_url: None,
            fetch_timeout_secs: None,
            retry: RetryPolicy::disabled(),
        }
    }
}

/// One streamable media item.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MediaEntry {
    pub id: String,

    #[serde(flatten)]
    pub object: ObjectEntry,

    /// Audio-only rendition, served for `?type=audio`
    #[serde(default)]
    pub audio: Option<ObjectEntry>,

    /// Video rendition, served for `?type=video`
    #[serde(default)]
    pub video: Option<ObjectEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObjectEntry {
    /// Backing-store key
    pub object: String,

    /// Size in bytes
    pub size: u64,

    /// Guessed from the object key when absent
    #[serde(default)]
    pub mime: Option<String>,

    #[serde(default)]
    pub file_name: Option<String>,
}
