//! taskvault-server: todo CRUD API with a vault-backed database credential.
//!
//! Handlers stay thin: they ask the session manager for a connection (which
//! lazily rebuilds it from the vault after a failure) and run one query.

pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod session;

use std::net::SocketAddr;

use anyhow::Context;
use axum::http::HeaderValue;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub use routes::AppState;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// The single origin allowed to call the API (the deployed frontend).
    pub allowed_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            allowed_origin: "http://localhost:5173".to_string(),
        }
    }
}

/// Assemble the router with tracing and the single-origin CORS layer.
pub fn build_app(state: AppState, config: &ServerConfig) -> anyhow::Result<Router> {
    let origin: HeaderValue = config
        .allowed_origin
        .parse()
        .with_context(|| format!("invalid CORS origin {:?}", config.allowed_origin))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any);

    Ok(routes::build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors))
}

/// Run the HTTP server until Ctrl+C / SIGTERM.
pub async fn run_server(state: AppState, config: ServerConfig) -> anyhow::Result<()> {
    let app = build_app(state, &config)?;

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!("taskvault-server listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            info!("received SIGTERM, starting shutdown");
        }
    }
}
