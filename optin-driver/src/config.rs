//! Configuration module.
//!
//! The driver itself takes a plain key/value mapping (`DriverConfig::from_value`),
//! while the web server reads everything from environment variables.

use std::env;

use serde::{Deserialize, Deserializer};
use tracing::warn;

use crate::error::DriverError;

/// Default Graph API endpoint used for outbound replies.
pub const DEFAULT_GRAPH_API_URL: &str = "https://graph.facebook.com/v2.6";

/// Static driver configuration.
///
/// Keys may be given bare (`token`) or with the `facebook_` prefix used by
/// shared bot configuration files (`facebook_token`). When both are set the
/// bare key wins unless it is empty.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "RawDriverConfig")]
pub struct DriverConfig {
    /// Page access token
    pub token: Option<String>,

    /// App secret used to sign webhook deliveries
    pub app_secret: Option<String>,

    /// Token echoed back during the webhook subscription handshake
    pub verification: Option<String>,

    /// Base URL of the Graph API
    pub graph_api_url: String,
}

/// Mapping as written by the user, before merging prefixed keys.
#[derive(Deserialize)]
struct RawDriverConfig {
    #[serde(default, deserialize_with = "optional_string")]
    token: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    facebook_token: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    app_secret: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    facebook_app_secret: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    verification: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    facebook_verification: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    graph_api_url: Option<String>,
}

impl From<RawDriverConfig> for DriverConfig {
    fn from(raw: RawDriverConfig) -> Self {
        Self {
            token: prefer(raw.token, raw.facebook_token),
            app_secret: prefer(raw.app_secret, raw.facebook_app_secret),
            verification: prefer(raw.verification, raw.facebook_verification),
            graph_api_url: raw
                .graph_api_url
                .map(|v| v.trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(default_graph_api_url),
        }
    }
}

fn prefer(bare: Option<String>, prefixed: Option<String>) -> Option<String> {
    bare.filter(|v| !v.is_empty()).or(prefixed)
}

/// Strings pass through; `null` and values of any other type count as unset.
fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    })
}

fn default_graph_api_url() -> String {
    DEFAULT_GRAPH_API_URL.to_string()
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            token: None,
            app_secret: None,
            verification: None,
            graph_api_url: default_graph_api_url(),
        }
    }
}

impl DriverConfig {
    /// Build a config from a JSON mapping. Unknown keys are ignored, and
    /// `null` or non-string values behave like absent keys. Only a value that
    /// is not a mapping at all is rejected.
    pub fn from_value(value: serde_json::Value) -> Result<Self, DriverError> {
        if !value.is_object() {
            return Err(DriverError::InvalidConfig(serde::de::Error::custom(
                "expected a key/value mapping",
            )));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Load the driver configuration from environment variables.
    pub fn from_env() -> Self {
        DriverConfig {
            token: non_empty_var("FACEBOOK_TOKEN"),
            app_secret: non_empty_var("FACEBOOK_APP_SECRET"),
            verification: non_empty_var("FACEBOOK_VERIFICATION"),
            graph_api_url: env::var("GRAPH_API_URL")
                .ok()
                .map(|v| v.trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(default_graph_api_url),
        }
    }

    /// The access token, if one is set and not blank.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }

    /// The app secret, if one is set and not blank.
    pub fn app_secret(&self) -> Option<&str> {
        self.app_secret.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// Web server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port for the web server to listen on
    pub port: u16,

    /// HTTP request timeout for outbound Graph API calls
    pub request_timeout_ms: u64,

    pub driver: DriverConfig,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        ServerConfig {
            port: parse_var("PORT", 8080),
            request_timeout_ms: parse_var("REQUEST_TIMEOUT_MS", 8000),
            driver: DriverConfig::from_env(),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Parse a numeric variable, falling back to `default` when unset or invalid.
fn parse_var<T: std::str::FromStr + Copy>(name: &str, default: T) -> T {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid numeric value, using default");
            default
        }
    }
}
