//! HTTP front end for the engine
//!
//! Routes:
//! - `GET /health` - liveness
//! - `GET /connectors` - every registered connector descriptor
//! - `GET /pipelines` / `POST /pipelines` - list and create definitions
//! - `POST /pipelines/{name}/run` - run a pipeline, always answering with a run result

mod routes;

use crate::etl::Engine;
use axum::{
    Router,
    routing::{get, post},
};
use eyre::{Context, Result};
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Default listening port when neither a flag nor `PORT` is set
pub const DEFAULT_PORT: u16 = 8080;

/// Resolved server settings
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
    /// Cancel runs that take longer than this
    pub run_timeout: Option<Duration>,
    /// Manifest used to seed the store at start-up
    pub pipelines: Option<std::path::PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            run_timeout: None,
            pipelines: None,
        }
    }
}

/// Shared handler state
pub struct AppState {
    engine: Arc<Engine>,
    shutdown: CancellationToken,
    run_timeout: Option<Duration>,
}

impl AppState {
    /// Create state whose runs are all children of `shutdown`
    pub fn new(engine: Arc<Engine>, shutdown: CancellationToken) -> Self {
        Self {
            engine,
            shutdown,
            run_timeout: None,
        }
    }

    pub fn with_run_timeout(mut self, run_timeout: Option<Duration>) -> Self {
        self.run_timeout = run_timeout;
        self
    }
}

/// Build the router over the given state
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/connectors", get(routes::connectors))
        .route(
            "/pipelines",
            get(routes::list_pipelines).post(routes::create_pipeline),
        )
        .route("/pipelines/{name}/run", post(routes::run_pipeline))
        .with_state(Arc::new(state))
}

/// Serve until Ctrl-C, cancelling in-flight runs on the way out
pub async fn serve(engine: Arc<Engine>, config: &ServerConfig) -> Result<()> {
    let shutdown = CancellationToken::new();
    let state = AppState::new(engine, shutdown.clone()).with_run_timeout(config.run_timeout);

    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    log::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for Ctrl-C: {}", e);
                return;
            }
            log::info!("Shutting down, cancelling in-flight runs");
            shutdown.cancel();
        })
        .await
        .context("Server error")?;

    Ok(())
}
