mod cli;

use mplay::{config, server};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&std::path::Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting mplay server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    server::start_server(config).await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "mplay=trace,mplay_stream=trace,mplay_store=debug,tower_http=debug".to_string()
        } else {
            "mplay=info,mplay_stream=info,mplay_store=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Validate { path } => validate_config(path.or(cli.config).as_deref()),
        Commands::Version => {
            println!("mplay {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn validate_config(config_path: Option<&std::path::Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    println!("Configuration is valid!");
    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!(
        "  Stream: {} byte chunks, {} byte fast start, {} workers",
        config.stream.chunk_size, config.stream.fast_start_bytes, config.stream.worker_count
    );
    println!("  Store: {:?}", config.store.kind);
    println!("  Media: {} entries", config.media.len());

    Ok(())
}
