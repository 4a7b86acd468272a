//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging and metrics
//! - Compile the route table and the upstream client
//! - Bind the listener and serve until a stop signal
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when ready)

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{self, ConfigError};
use crate::http::{HttpServer, ServerError};
use crate::lifecycle::{signals, Shutdown};
use crate::observability::{logging, metrics};

/// Command-line level choices that outrank configuration.
#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    pub config_path: Option<PathBuf>,
    pub port: Option<u16>,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("server: {0}")]
    Server(#[from] ServerError),

    #[error("metrics: {0}")]
    Metrics(String),

    #[error("listener: {0}")]
    Io(#[from] std::io::Error),
}

/// Boot the gateway and serve until SIGINT/SIGTERM.
pub async fn start(options: StartupOptions) -> Result<(), StartupError> {
    let mut config = config::load_config(options.config_path.as_deref())?;
    if let Some(port) = options.port {
        config.listener.port = port;
    }

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "campus-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address(),
        services = config.services.len(),
        connect_timeout_secs = config.timeouts.connect_secs,
        read_idle_timeout_secs = config.timeouts.read_idle_secs,
        "Configuration loaded"
    );
    for (service, url) in &config.services {
        tracing::debug!(service = %service, url = %url, "Upstream configured");
    }

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|e| StartupError::Metrics(format!("{e}")))?;
        metrics::init_metrics(addr).map_err(|e| StartupError::Metrics(e.to_string()))?;
    }

    let bind_address = config.listener.bind_address();
    let server = HttpServer::new(config)?;
    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let stop = shutdown.subscribe();
    signals::spawn_signal_listener(shutdown);

    server.run(listener, stop).await?;
    tracing::info!("Shutdown complete");
    Ok(())
}
