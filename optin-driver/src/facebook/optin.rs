//! Driver for Messenger optin deliveries.
//!
//! An optin arrives when a user ticks the checkbox plugin or clicks a
//! send-to-messenger button. The `ref` passed to the plugin becomes the
//! message text and the `user_ref` becomes the channel replies go to.

use reqwest::Client;
use tracing::{debug, info};

use crate::config::DriverConfig;
use crate::driver::{Driver, InboundRequest, IncomingMessage};
use crate::facebook::payload::{OptinEvent, ParsedOptin, UnmatchedReason};

pub const DRIVER_NAME: &str = "FacebookOptin";

/// Optin driver bound to one inbound request.
pub struct FacebookOptinDriver {
    request: InboundRequest,
    config: DriverConfig,
    client: Client,
}

impl FacebookOptinDriver {
    /// The client is only used for outbound replies; matching and message
    /// extraction never touch the network.
    pub fn new(request: InboundRequest, config: DriverConfig, client: Client) -> Self {
        Self {
            request,
            config,
            client,
        }
    }

    pub fn request(&self) -> &InboundRequest {
        &self.request
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    /// Parse the bound body. Parsing is repeated on every call so the driver
    /// holds no derived state.
    pub fn parse(&self) -> ParsedOptin {
        ParsedOptin::parse(&self.request.content())
    }
}

impl From<&OptinEvent> for IncomingMessage {
    fn from(event: &OptinEvent) -> Self {
        IncomingMessage::new(
            event.reference.clone(),
            event.page_id.clone(),
            event.user_ref.clone(),
        )
    }
}

impl Driver for FacebookOptinDriver {
    fn name(&self) -> &str {
        DRIVER_NAME
    }

    fn matches_request(&self) -> bool {
        match self.parse() {
            ParsedOptin::Matched(events) => {
                debug!(
                    driver = DRIVER_NAME,
                    matched = true,
                    optin_count = events.len(),
                    "driver_match_checked"
                );
                true
            }
            ParsedOptin::Unmatched(reason) => {
                let stray_optins = match &reason {
                    UnmatchedReason::OptinNotLeading(events) => events.len(),
                    _ => 0,
                };
                debug!(
                    driver = DRIVER_NAME,
                    matched = false,
                    reason = reason.as_str(),
                    stray_optins = stray_optins,
                    "driver_match_checked"
                );
                false
            }
        }
    }

    fn messages(&self) -> Vec<IncomingMessage> {
        let parsed = self.parse();
        let messages: Vec<IncomingMessage> =
            parsed.events().iter().map(IncomingMessage::from).collect();

        if messages.is_empty() {
            debug!(driver = DRIVER_NAME, "optin_no_messages");
            return vec![IncomingMessage::default()];
        }

        info!(
            driver = DRIVER_NAME,
            message_count = messages.len(),
            "optin_messages_extracted"
        );

        messages
    }

    // No heuristic for optins; echoes are not delivered as optin events.
    fn is_bot(&self) -> bool {
        false
    }

    fn is_configured(&self) -> bool {
        self.config.token().is_some()
    }
}
