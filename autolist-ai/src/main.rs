//! autolist-ai - Vehicle photo analysis service
//!
//! Serves the listing assistant API: photo analysis, price recalculation,
//! description regeneration, photo advice and generation lookup.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use autolist_ai::agents::AgentSet;
use autolist_ai::AppState;
use autolist_common::config::TomlConfig;

/// Command-line arguments for autolist-ai
#[derive(Parser, Debug)]
#[command(name = "autolist-ai")]
#[command(about = "Vehicle photo analysis service")]
#[command(version)]
struct Args {
    /// Config file (defaults to ~/.config/autolist/autolist-ai.toml)
    #[arg(short, long, env = "AUTOLIST_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on, overriding config and environment
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Priority: CLI > environment > TOML > compiled defaults
    let mut config = TomlConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;
    config.apply_env_overrides();
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }
    config.validate().context("Invalid configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting autolist-ai v{}", env!("CARGO_PKG_VERSION"));

    let agents = AgentSet::from_config(&config).context("Failed to build agents")?;
    let app = autolist_ai::build_router(AppState::new(&agents, &config));

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server.bind_address))?;
    info!("Listening on http://{}", config.server.bind_address);
    info!("Health check: http://{}/api/health", config.server.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
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

    info!("Shutdown signal received");
}
