//! Outbound replies through the Messenger Send API.
//!
//! Users who opted in have not messaged the page yet, so the first reply must
//! be addressed by `user_ref` instead of a page-scoped id.

use serde_json::{json, Value};
use tracing::{error, info};

use crate::driver::IncomingMessage;
use crate::error::DriverError;
use crate::facebook::optin::FacebookOptinDriver;

/// Build the Send API body for a text reply to an optin.
pub fn build_reply_payload(message: &IncomingMessage, text: &str) -> Value {
    json!({
        "recipient": { "user_ref": message.channel() },
        "message": { "text": text },
    })
}

impl FacebookOptinDriver {
    /// Send a text reply to the user behind an optin message.
    pub async fn reply(&self, message: &IncomingMessage, text: &str) -> Result<(), DriverError> {
        let token = self
            .config()
            .token()
            .ok_or(DriverError::NotConfigured("token"))?;

        let url = format!("{}/me/messages", self.config().graph_api_url);
        let payload = build_reply_payload(message, text);

        info!(
            user_ref = %message.channel(),
            text_length = text.len(),
            "optin_reply_sending"
        );

        let response = self
            .client()
            .post(&url)
            .query(&[("access_token", token)])
            .json(&payload)
            .send()
            .await
            .inspect_err(|e| error!(error = %e, "optin_reply_request_failed"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(
                status_code = status.as_u16(),
                body_preview = %body.chars().take(200).collect::<String>(),
                "optin_reply_rejected"
            );
            return Err(DriverError::Api {
                status: status.as_u16(),
                body,
            });
        }

        info!(user_ref = %message.channel(), "optin_reply_sent");

        Ok(())
    }
}
