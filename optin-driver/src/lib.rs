//! Facebook Messenger optin driver.
//!
//! Recognizes optin webhook deliveries (checkbox plugin, send-to-messenger)
//! and exposes them through the generic `Driver` interface:
//! - a thin web server for receiving webhooks (`optin-web`)
//! - `FacebookOptinDriver` for matching and message extraction
//!
//! ## Flow
//!
//! ```text
//! POST /webhooks/facebook → signature check → FacebookOptinDriver → IncomingMessage[]
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod facebook;
pub mod web;

// Re-export commonly used types
pub use config::{DriverConfig, ServerConfig};
pub use driver::{Driver, InboundRequest, IncomingMessage};
pub use error::DriverError;
pub use facebook::{FacebookOptinDriver, ParsedOptin};
pub use web::AppState;
