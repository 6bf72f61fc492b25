//! Signature debugger HTTP server.
//!
//! # Usage
//!
//! ```bash
//! # Default config (config.toml in the current directory)
//! cargo run -p ethsig-debugger --release
//!
//! # Custom config path and port
//! ethsig-debugger --config /etc/ethsig.toml --port 9000
//!
//! # Verbose logging
//! RUST_LOG=ethsig_evm=debug,info ethsig-debugger
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` - path to the TOML configuration file (default: `config.toml`)
//! - `HOST` / `PORT` - override the bind address from the file
//! - `RUST_LOG` - log filter (default: `info`)
//!
//! A `.env` file in the working directory is loaded first.

mod util;

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use axum::http::Method;
use clap::Parser;
use ethsig_debugger::config::DebuggerConfig;
use ethsig_debugger::handlers::{DebuggerState, debugger_router};
use ethsig_evm::SignatureVerifier;
use tower_http::cors;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::util::SigDown;

/// Validate and debug Ethereum signatures over HTTP.
#[derive(Debug, Parser)]
#[command(name = "ethsig-debugger", version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, env = "CONFIG", default_value = "config.toml")]
    config: PathBuf,

    /// Bind address, overriding the configuration.
    #[arg(long)]
    host: Option<IpAddr>,

    /// Bind port, overriding the configuration.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        tracing::error!("Debugger failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = DebuggerConfig::load_from(&cli.config)?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    let registry = config.registry()?;
    let validator = config.universal_validator()?;
    tracing::info!(
        config = %cli.config.display(),
        networks = registry.len(),
        validator = ?config.validator,
        "Loaded configuration"
    );
    if registry.is_empty() {
        tracing::warn!("No networks configured, every validation will fail");
    }

    let verifier = SignatureVerifier::connect(&registry, &config.transport(), validator)?;
    let state: DebuggerState = Arc::new(verifier);

    let app = debugger_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            cors::CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(cors::Any),
        );

    let sig_down = SigDown::try_new()?;
    let shutdown = sig_down.cancellation_token();

    let addr = SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Debugger listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    sig_down.recv().await;
    tracing::info!("Debugger shut down gracefully");
    Ok(())
}
