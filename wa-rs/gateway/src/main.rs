//! Main entry point for the webhook gateway server

use anyhow::Context;
use std::process;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::error;
use tracing::info;
use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use wa_webhook_gateway::config::GatewayConfig;
use wa_webhook_gateway::error::GatewayError;
use wa_webhook_gateway::error::GatewayResult;
use wa_webhook_gateway::router::create_router;
use wa_webhook_gateway::state::AppState;

/// Main entry point
#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Server failed to start: {}", e);
        process::exit(1);
    }
}

/// Main server execution function
async fn run() -> GatewayResult<()> {
    // A missing .env is normal in production
    let dotenv = dotenvy::dotenv();

    init_tracing()?;

    match dotenv {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("Ignoring unreadable .env file: {}", e),
    }

    info!("Starting WhatsApp webhook gateway");

    let config = GatewayConfig::from_env();
    info!("Configuration loaded: {:?}", config);

    info!("Auto-reply active: {}", config.auto_reply_active());
    if config.whatsapp.uses_default_verify_token() {
        warn!("VERIFY_TOKEN not set - using the insecure default token");
    }

    let state = AppState::new(config.clone())?;
    let app = create_router(state);

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| GatewayError::ServerStart(format!("Failed to bind to {addr}: {e}")))?;

    info!("Server listening on {}", addr);

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| GatewayError::ServerStart(format!("Server error: {e}")))?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize structured logging with tracing subscriber
fn init_tracing() -> GatewayResult<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wa_webhook_gateway=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(_) => info!("Received Ctrl+C, initiating graceful shutdown"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                if stream.recv().await.is_some() {
                    info!("Received SIGTERM, initiating graceful shutdown");
                }
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
