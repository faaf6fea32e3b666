//! Normalized inbound message.

use serde::Serialize;

/// A message as seen by the bot, independent of the source platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IncomingMessage {
    /// Message text (for optins, the referral `ref`)
    pub text: String,
    /// Sender identifier
    pub user_id: String,
    /// Conversation identifier replies are addressed to
    pub channel_id: String,
}

impl IncomingMessage {
    pub fn new(
        text: impl Into<String>,
        user_id: impl Into<String>,
        channel_id: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            user_id: user_id.into(),
            channel_id: channel_id.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn user(&self) -> &str {
        &self.user_id
    }

    pub fn channel(&self) -> &str {
        &self.channel_id
    }

    /// True for the placeholder message emitted when nothing matched.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.user_id.is_empty() && self.channel_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        assert!(IncomingMessage::default().is_empty());
        assert!(!IncomingMessage::new("hi", "", "").is_empty());
    }

    #[test]
    fn test_serialization() {
        let message = IncomingMessage::new("optin", "111", "1234");
        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(json["text"], "optin");
        assert_eq!(json["user_id"], "111");
        assert_eq!(json["channel_id"], "1234");
    }
}
