//! Web3 Login Server
//!
//! Issues sign-in nonces for wallet addresses and verifies the signed
//! messages that come back, setting a session cookie on success.

use std::sync::Arc;

use anyhow::Context;
use tokio::signal;

use web3_login_server::auth::{
    spawn_nonce_sweeper, AuthService, AuthSettings, EthereumSignatureVerifier,
    InMemoryNonceStore, NonceStore,
};
use web3_login_server::config::Config;
use web3_login_server::routes::create_router;
use web3_login_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    tracing::info!(
        environment = config.environment.as_str(),
        message_mode = ?config.message_mode,
        nonce_ttl_secs = config.nonce_ttl.as_secs(),
        "Starting auth server"
    );

    if config.environment.is_production() && !config.session_cookie_secure {
        tracing::warn!("Session cookie is not marked Secure in production");
    }

    let nonce_store: Arc<dyn NonceStore> = Arc::new(InMemoryNonceStore::new(config.nonce_ttl));
    let sweeper = spawn_nonce_sweeper(nonce_store.clone(), config.nonce_sweep_interval);

    let auth_service = Arc::new(AuthService::new(
        nonce_store,
        Arc::new(EthereumSignatureVerifier::new()),
        AuthSettings::from(&config),
    ));

    let app_state = AppState::new(
        auth_service,
        config.environment,
        config.session_cookie_secure,
    );

    let app = create_router(app_state, &config);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Auth server listening on http://{}", addr);
    tracing::info!(origins = ?config.cors_allowed_origins, "CORS allow-list");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    sweeper.abort();
    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
