//! Web server module for Messenger webhooks.
//!
//! This module provides a thin web server that:
//! - Answers the webhook subscription handshake
//! - Verifies delivery signatures when an app secret is configured
//! - Runs the optin driver and returns the extracted messages

pub mod handlers;
pub mod signature;

pub use handlers::{
    facebook_webhook, health, verify_subscription, AppState, HealthResponse, SubscriptionQuery,
    WebhookResponse,
};
pub use signature::{parse_signature_header, verify_signature, SIGNATURE_HEADER};
