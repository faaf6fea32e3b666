//! Optin Web Server - Messenger webhook receiver.
//!
//! This binary provides a thin web server that:
//! - Answers the Messenger webhook subscription handshake
//! - Verifies delivery signatures when an app secret is configured
//! - Extracts optin events into normalized messages

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use reqwest::Client;
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use optin_driver::web::{facebook_webhook, health, verify_subscription, AppState};
use optin_driver::ServerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    // Load configuration
    let config = ServerConfig::from_env();
    info!(
        port = config.port,
        token_configured = config.driver.token().is_some(),
        app_secret_configured = config.driver.app_secret().is_some(),
        verification_configured = config.driver.verification.is_some(),
        graph_api_url = %config.driver.graph_api_url,
        "config_loaded"
    );

    // Outbound client for Graph API replies
    let client = Client::builder()
        .timeout(Duration::from_millis(config.request_timeout_ms))
        .build()
        .context("Failed to build HTTP client")?;

    let state = AppState::new(config.driver.clone(), client);

    // Build the router
    let app = Router::new()
        .route("/health", get(health))
        .route(
            "/webhooks/facebook",
            get(verify_subscription).post(facebook_webhook),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
