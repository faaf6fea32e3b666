//! Generic bot driver interface.
//!
//! A driver inspects one inbound webhook request and, if it recognizes the
//! payload, turns it into a list of `IncomingMessage`s for the bot to route.

pub mod message;
pub mod request;

pub use message::IncomingMessage;
pub use request::InboundRequest;

/// A platform driver bound to a single inbound request.
pub trait Driver {
    /// Stable identifier of the driver.
    fn name(&self) -> &str;

    /// Whether the bound request carries a payload this driver understands.
    fn matches_request(&self) -> bool;

    /// Messages extracted from the bound request.
    ///
    /// Never empty: when nothing matches, a single message with empty fields
    /// is returned.
    fn messages(&self) -> Vec<IncomingMessage>;

    /// Whether the request was sent by a bot rather than a person.
    fn is_bot(&self) -> bool;

    /// Whether the driver has the credentials it needs.
    fn is_configured(&self) -> bool;
}
