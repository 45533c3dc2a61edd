//! News content server.
//!
//! Serves category datasets (`<category>.csv`, pipe-delimited) as paginated
//! JSON arrays over a minimal line-based protocol.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request          ┌──────────────────────────────────────────────┐
//!     ────────────────────────┼─▶ net::Listener ──▶ http::server (per conn)  │
//!                             │                       │                      │
//!                             │        http::request ◀┘ parse                │
//!                             │        http::policy     GET only             │
//!                             │        store::RecordStore  [start, start+n)  │
//!     Client Response         │        http::response   envelope             │
//!     ◀───────────────────────┼───────────────────────────┘                  │
//!                             │                                              │
//!                             │  config · observability · lifecycle          │
//!                             └──────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```bash
//! news-server run --data-dir ./data --verbose
//! news-server run --config ./news-server.toml --bind 0.0.0.0:9999
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use news_server::config::{apply_env_overrides, load_config, validate_config, ServerConfig};
use news_server::lifecycle::{signals, Shutdown};
use news_server::net::Listener;
use news_server::observability::{logging, metrics};
use news_server::ContentServer;

#[derive(Parser)]
#[command(name = "news-server")]
#[command(about = "Serve paginated news datasets as JSON", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the listener and serve requests until interrupted
    Run(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// TOML config file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 127.0.0.1:9999
    #[arg(short, long)]
    bind: Option<String>,

    /// Directory holding the category dataset files
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Log every connection, request and reply
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run(args).await,
    }
}

async fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    apply_env_overrides(&mut config);
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }
    if let Some(dir) = args.data_dir {
        config.dataset.data_dir = dir;
    }
    validate_config(&config).map_err(|errors| {
        errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    })?;

    logging::init_logging(args.verbose, &config.observability.log_level)?;

    tracing::info!("news-server v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        data_dir = %config.dataset.data_dir.display(),
        max_connections = config.listener.max_connections,
        read_buffer_bytes = config.listener.read_buffer_bytes,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = Listener::bind(&config.listener).await?;

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let server = ContentServer::new(&config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
