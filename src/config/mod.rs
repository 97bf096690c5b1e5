mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config = parse_config(&content)
        .with_context(|| format!("Failed to load config file: {:?}", path))?;

    Ok(config)
}

/// Parse and validate configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("Failed to parse config")?;
    validate_config(&config)?;
    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./mplay.toml",
        "./config.toml",
        "~/.config/mplay/config.toml",
        "/etc/mplay/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    config.stream.validate()?;

    match config.store.kind {
        StoreKind::Fs => match &config.store.root {
            None => anyhow::bail!("store.kind = \"fs\" requires store.root"),
            Some(root) if !root.exists() => {
                tracing::warn!("Store root does not exist: {:?}", root);
            }
            Some(_) => {}
        },
        StoreKind::Http => {
            if config.store.base_url.as_deref().unwrap_or("").is_empty() {
                anyhow::bail!("store.kind = \"http\" requires store.base_url");
            }
        }
        StoreKind::Memory => {}
    }

    if config.store.fetch_timeout_secs == Some(0) {
        anyhow::bail!("store.fetch_timeout_secs cannot be 0");
    }

    let mut seen = HashSet::new();
    for entry in &config.media {
        if entry.id.is_empty() {
            anyhow::bail!("Media entry for object '{}' has an empty id", entry.object.object);
        }
        if !seen.insert(entry.id.as_str()) {
            anyhow::bail!("Duplicate media id '{}'", entry.id);
        }
    }

    Ok(())
}
