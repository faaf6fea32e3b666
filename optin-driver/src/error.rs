//! Error type shared by the fallible edges of the driver.

use thiserror::Error;

/// Errors raised outside of request matching.
///
/// Matching and message extraction never fail; these only surface from
/// outbound replies, signature checks and configuration parsing.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("driver is not configured: missing {0}")]
    NotConfigured(&'static str),

    #[error("invalid signature header: {0}")]
    InvalidSignature(&'static str),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("graph api returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid driver config: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}
