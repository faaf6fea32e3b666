//! Webhook endpoint handlers.
//!
//! Facebook retries any delivery that does not get a 200, so payloads that
//! are not optins are acknowledged and ignored rather than rejected. Only a
//! bad signature (when an app secret is configured) returns an error status.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::DriverConfig;
use crate::driver::{Driver, InboundRequest, IncomingMessage};
use crate::facebook::FacebookOptinDriver;
use crate::web::signature::{verify_signature, SIGNATURE_HEADER};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<DriverConfig>,
    pub client: Client,
}

impl AppState {
    pub fn new(config: DriverConfig, client: Client) -> Self {
        Self {
            config: Arc::new(config),
            client,
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Subscription Handshake
// =============================================================================

/// Query sent by Facebook when the webhook URL is registered.
#[derive(Debug, Deserialize)]
pub struct SubscriptionQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Webhook verification endpoint.
///
/// Echoes `hub.challenge` back when the verify token matches the configured
/// one.
pub async fn verify_subscription(
    State(state): State<AppState>,
    Query(query): Query<SubscriptionQuery>,
) -> impl IntoResponse {
    let expected = state.config.verification.as_deref().filter(|v| !v.is_empty());

    match (query.mode.as_deref(), query.verify_token.as_deref(), expected) {
        (Some("subscribe"), Some(provided), Some(expected)) if provided == expected => {
            info!("webhook_subscription_verified");
            (StatusCode::OK, query.challenge.unwrap_or_default())
        }
        (_, _, None) => {
            warn!("webhook_verification_not_configured");
            (StatusCode::FORBIDDEN, String::new())
        }
        _ => {
            warn!(mode = ?query.mode, "webhook_subscription_rejected");
            (StatusCode::FORBIDDEN, String::new())
        }
    }
}

// =============================================================================
// Optin Webhook
// =============================================================================

/// Webhook response.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<IncomingMessage>,
}

impl WebhookResponse {
    fn bare(status: &'static str) -> Self {
        Self {
            status,
            driver: None,
            messages: Vec::new(),
        }
    }
}

/// Messenger webhook endpoint.
///
/// This endpoint:
/// 1. Verifies the body signature (if an app secret is configured)
/// 2. Runs the optin driver over the delivery
/// 3. Returns the extracted messages
pub async fn facebook_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    info!(body_length = body.len(), "facebook_webhook_received");

    let request = InboundRequest::new(body, headers);

    // Verify signature if an app secret is configured
    if let Some(secret) = state.config.app_secret() {
        if !verify_signature(secret, request.body(), request.header(SIGNATURE_HEADER)) {
            warn!("facebook_signature_invalid");
            return (
                StatusCode::UNAUTHORIZED,
                Json(WebhookResponse::bare("unauthorized")),
            );
        }
    }

    let driver = FacebookOptinDriver::new(request, (*state.config).clone(), state.client.clone());

    if !driver.matches_request() {
        info!("facebook_webhook_ignored");
        return (StatusCode::OK, Json(WebhookResponse::bare("ignored")));
    }

    if !driver.is_configured() {
        warn!(driver = driver.name(), "driver_not_configured");
    }

    let messages = driver.messages();

    info!(
        driver = driver.name(),
        message_count = messages.len(),
        "facebook_webhook_accepted"
    );

    (
        StatusCode::OK,
        Json(WebhookResponse {
            status: "accepted",
            driver: Some(driver.name().to_string()),
            messages,
        }),
    )
}
