//! Facebook Messenger optin support.
//!
//! ```text
//! webhook body → ParsedOptin::parse() → FacebookOptinDriver::messages() → IncomingMessage
//! ```

pub mod optin;
pub mod payload;
pub mod reply;

pub use optin::{FacebookOptinDriver, DRIVER_NAME};
pub use payload::{OptinEvent, ParsedOptin, UnmatchedReason, WebhookPayload};
pub use reply::build_reply_payload;
