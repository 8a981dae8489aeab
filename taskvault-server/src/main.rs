//! taskvault-server binary entry point.
//!
//! Startup order: env file, logging, vault configuration, credential
//! discovery, one eager connect attempt (never fatal), then the HTTP server.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use taskvault_core::config::VaultConfig;
use taskvault_core::credentials::default_credential;
use taskvault_core::keyvault::{KeyVaultClient, SecretSource};
use taskvault_server::db::SqlxConnector;
use taskvault_server::session::SessionManager;
use taskvault_server::{run_server, AppState, ServerConfig};

#[derive(Parser, Debug)]
#[command(
    name = "taskvault-server",
    about = "Todo API backed by a vault-held database credential"
)]
struct Args {
    /// Bind address
    #[arg(long, default_value = "127.0.0.1")]
    bind: IpAddr,

    /// Port to listen on
    #[arg(short, long, default_value = "8000")]
    port: u16,

    /// Origin allowed to call the API
    #[arg(long, default_value = "http://localhost:5173")]
    allow_origin: String,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.debug)?;

    let vault = VaultConfig::from_env();
    info!(
        vault = %vault.vault_name,
        secret = %vault.secret_name,
        "vault configuration loaded"
    );

    let credential = default_credential();
    let secrets: Arc<dyn SecretSource> =
        Arc::new(KeyVaultClient::new(vault.vault_url(), credential));
    let session = Arc::new(SessionManager::new(
        secrets.clone(),
        Arc::new(SqlxConnector),
        vault.secret_name.clone(),
    ));

    // One eager attempt; a failure is recorded and retried on demand.
    if session.ensure_connected().await {
        info!("database session established at startup");
    } else {
        warn!(
            reason = ?session.last_error().await,
            "starting without a database session"
        );
    }

    let state = AppState {
        session,
        secrets,
        secret_name: vault.secret_name,
    };
    let config = ServerConfig {
        bind_addr: SocketAddr::new(args.bind, args.port),
        allowed_origin: args.allow_origin,
    };

    run_server(state, config).await
}

fn init_tracing(debug: bool) -> Result<()> {
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(debug)
        .compact()
        .try_init()
        .map_err(|err| anyhow::anyhow!(err))
}
