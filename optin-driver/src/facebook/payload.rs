//! Typed model of Messenger webhook deliveries.
//!
//! Decoding is tolerant field by field: a value of the wrong type becomes
//! `None` (or an empty list) instead of failing the whole delivery, and a
//! malformed entry or messaging item keeps its position as an empty item.
//! Other event kinds (messages, postbacks, deliveries) decode and are skipped.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

/// Top-level webhook body.
#[derive(Debug, Default, Deserialize)]
pub struct WebhookPayload {
    /// Subscription object, `"page"` for Messenger
    #[serde(default, deserialize_with = "lenient_string")]
    pub object: Option<String>,
    #[serde(default, deserialize_with = "lenient_items")]
    pub entry: Vec<Entry>,
}

/// One page entry in a batched delivery.
#[derive(Debug, Default, Deserialize)]
pub struct Entry {
    /// Page id
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub time: Option<i64>,
    #[serde(default, deserialize_with = "lenient_items")]
    pub messaging: Vec<MessagingEvent>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MessagingEvent {
    #[serde(default, deserialize_with = "lenient_object")]
    pub sender: Option<Participant>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub recipient: Option<Participant>,
    #[serde(default, deserialize_with = "lenient")]
    pub timestamp: Option<i64>,
    /// Present only when the value is a JSON object
    #[serde(default, deserialize_with = "lenient_object")]
    pub optin: Option<Optin>,
}

#[derive(Debug, Deserialize)]
pub struct Participant {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
}

/// The optin object sent by the checkbox and send-to-messenger plugins.
#[derive(Debug, Deserialize)]
pub struct Optin {
    /// Data-ref passed through the plugin
    #[serde(default, rename = "ref", deserialize_with = "lenient_string")]
    pub reference: Option<String>,
    /// Reference to a user who has not messaged the page yet
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_ref: Option<String>,
}

/// An optin extracted from a delivery, flattened with its page entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptinEvent {
    pub page_id: String,
    pub reference: String,
    pub user_ref: String,
    pub timestamp: Option<i64>,
}

/// Why a body did not match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnmatchedReason {
    /// Body was empty or whitespace
    Empty,
    /// Body was not a JSON object
    InvalidJson,
    /// No optin anywhere in the delivery
    NoOptin,
    /// The first messaging item is not an optin, but later ones are
    OptinNotLeading(Vec<OptinEvent>),
}

impl UnmatchedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnmatchedReason::Empty => "empty",
            UnmatchedReason::InvalidJson => "invalid_json",
            UnmatchedReason::NoOptin => "no_optin",
            UnmatchedReason::OptinNotLeading(_) => "optin_not_leading",
        }
    }
}

/// Result of inspecting a webhook body for optin events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedOptin {
    /// The first messaging item of the first entry is an optin
    Matched(Vec<OptinEvent>),
    Unmatched(UnmatchedReason),
}

impl ParsedOptin {
    pub fn parse(body: &str) -> Self {
        if body.trim().is_empty() {
            return ParsedOptin::Unmatched(UnmatchedReason::Empty);
        }

        let value: Value = match serde_json::from_str(body) {
            Ok(v) => v,
            Err(e) => {
                debug!(
                    error = %e,
                    body_length = body.len(),
                    "optin_payload_parse_failed"
                );
                return ParsedOptin::Unmatched(UnmatchedReason::InvalidJson);
            }
        };

        if !value.is_object() {
            debug!(body_length = body.len(), "optin_payload_not_an_object");
            return ParsedOptin::Unmatched(UnmatchedReason::InvalidJson);
        }

        let payload = WebhookPayload::deserialize(value).unwrap_or_default();

        let events = payload.optin_events();

        if payload.has_leading_optin() {
            ParsedOptin::Matched(events)
        } else if events.is_empty() {
            ParsedOptin::Unmatched(UnmatchedReason::NoOptin)
        } else {
            ParsedOptin::Unmatched(UnmatchedReason::OptinNotLeading(events))
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, ParsedOptin::Matched(_))
    }

    /// All optin events found, whether or not the body matched.
    pub fn events(&self) -> &[OptinEvent] {
        match self {
            ParsedOptin::Matched(events)
            | ParsedOptin::Unmatched(UnmatchedReason::OptinNotLeading(events)) => events,
            ParsedOptin::Unmatched(_) => &[],
        }
    }
}

impl WebhookPayload {
    fn has_leading_optin(&self) -> bool {
        self.entry
            .first()
            .and_then(|entry| entry.messaging.first())
            .is_some_and(|event| event.optin.is_some())
    }

    fn optin_events(&self) -> Vec<OptinEvent> {
        self.entry
            .iter()
            .flat_map(|entry| {
                entry.messaging.iter().filter_map(move |event| {
                    let optin = event.optin.as_ref()?;
                    Some(OptinEvent {
                        page_id: entry.id.clone().unwrap_or_default(),
                        reference: optin.reference.clone().unwrap_or_default(),
                        user_ref: optin.user_ref.clone().unwrap_or_default(),
                        timestamp: event.timestamp,
                    })
                })
            })
            .collect()
    }
}

/// Decode a field, falling back to its default when the value has the wrong type.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Decode a list item by item. A malformed item becomes a default item so
/// the positions of the others are kept; a non-list becomes an empty list.
fn lenient_items<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };

    Ok(items
        .into_iter()
        .map(|item| from_object(item).unwrap_or_default())
        .collect())
}

/// Decode a nested object; anything that is not a JSON object becomes `None`.
fn lenient_object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(from_object(Value::deserialize(deserializer)?))
}

fn from_object<T: DeserializeOwned>(value: Value) -> Option<T> {
    if !value.is_object() {
        return None;
    }
    serde_json::from_value(value).ok()
}

/// Graph ids and refs are strings, but some tools post them as bare numbers.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const OPTIN: &str = r#"{"object":"page","entry":[{"id":"111899832631525","time":1480279487271,"messaging":[{"recipient":{"id":"111899832631525"},"timestamp":1480279487147,"optin": {"ref":"optin","user_ref":"1234"}}]}]}"#;

    #[test]
    fn test_parse_optin() {
        let parsed = ParsedOptin::parse(OPTIN);

        assert!(parsed.is_match());
        assert_eq!(
            parsed.events(),
            &[OptinEvent {
                page_id: "111899832631525".to_string(),
                reference: "optin".to_string(),
                user_ref: "1234".to_string(),
                timestamp: Some(1480279487147),
            }]
        );
    }

    #[test]
    fn test_parse_empty_and_invalid() {
        assert_eq!(
            ParsedOptin::parse(""),
            ParsedOptin::Unmatched(UnmatchedReason::Empty)
        );
        assert_eq!(
            ParsedOptin::parse("   \n"),
            ParsedOptin::Unmatched(UnmatchedReason::Empty)
        );
        assert_eq!(
            ParsedOptin::parse("not json"),
            ParsedOptin::Unmatched(UnmatchedReason::InvalidJson)
        );
        assert_eq!(
            ParsedOptin::parse("[1, 2]"),
            ParsedOptin::Unmatched(UnmatchedReason::InvalidJson)
        );
    }

    #[test]
    fn test_parse_no_optin() {
        assert_eq!(
            ParsedOptin::parse("{}"),
            ParsedOptin::Unmatched(UnmatchedReason::NoOptin)
        );

        let body = json!({
            "object": "page",
            "entry": [{
                "id": "1",
                "messaging": [{
                    "sender": { "id": "2" },
                    "recipient": { "id": "1" },
                    "message": { "mid": "m1", "text": "hello" }
                }]
            }]
        });
        assert_eq!(
            ParsedOptin::parse(&body.to_string()),
            ParsedOptin::Unmatched(UnmatchedReason::NoOptin)
        );
    }

    #[test]
    fn test_parse_optin_not_leading() {
        let body = json!({
            "entry": [{
                "id": "1",
                "messaging": [
                    { "message": { "text": "hello" } },
                    { "optin": { "ref": "later", "user_ref": "9" } }
                ]
            }]
        });

        let parsed = ParsedOptin::parse(&body.to_string());

        assert!(!parsed.is_match());
        assert_eq!(parsed.events().len(), 1);
        assert_eq!(parsed.events()[0].reference, "later");
    }

    #[test]
    fn test_parse_multiple_entries_in_order() {
        let body = json!({
            "object": "page",
            "entry": [
                {
                    "id": "page-a",
                    "messaging": [
                        { "optin": { "ref": "first", "user_ref": "u1" } },
                        { "delivery": { "watermark": 1 } },
                        { "optin": { "ref": "second", "user_ref": "u2" } }
                    ]
                },
                {
                    "id": 42,
                    "messaging": [{ "optin": { "user_ref": "u3" } }]
                }
            ]
        });

        let parsed = ParsedOptin::parse(&body.to_string());
        let events = parsed.events();

        assert!(parsed.is_match());
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].reference, "first");
        assert_eq!(events[1].reference, "second");
        assert_eq!(events[1].page_id, "page-a");
        assert_eq!(events[2].page_id, "42");
        assert_eq!(events[2].reference, "");
        assert_eq!(events[2].user_ref, "u3");
    }

    #[test]
    fn test_parse_tolerates_null_messaging_in_sibling_entry() {
        let body = r#"{"entry":[{"id":"1","messaging":[{"optin":{"ref":"a","user_ref":"u"}}]},{"id":"2","messaging":null}]}"#;

        let parsed = ParsedOptin::parse(body);

        assert!(parsed.is_match());
        assert_eq!(parsed.events().len(), 1);
        assert_eq!(parsed.events()[0].reference, "a");
        assert_eq!(parsed.events()[0].user_ref, "u");
    }

    #[test]
    fn test_parse_tolerates_bad_timestamps() {
        let body = json!({
            "entry": [{
                "id": "1",
                "time": "yesterday",
                "messaging": [
                    { "timestamp": 1.5, "optin": { "ref": "a", "user_ref": "u1" } },
                    { "timestamp": 1.5, "sender": "nobody", "message": { "text": "hi" } }
                ]
            }]
        });

        let parsed = ParsedOptin::parse(&body.to_string());

        assert!(parsed.is_match());
        assert_eq!(parsed.events()[0].timestamp, None);
        assert_eq!(parsed.events()[0].user_ref, "u1");
    }

    #[test]
    fn test_parse_numeric_refs() {
        let body = json!({
            "entry": [{
                "id": "1",
                "messaging": [{ "optin": { "ref": 7, "user_ref": 1234 } }]
            }]
        });

        let parsed = ParsedOptin::parse(&body.to_string());

        assert!(parsed.is_match());
        assert_eq!(parsed.events()[0].reference, "7");
        assert_eq!(parsed.events()[0].user_ref, "1234");
    }

    #[test]
    fn test_parse_optin_must_be_object() {
        for optin in [json!("optin"), json!([{ "ref": "a" }]), json!(null)] {
            let body = json!({ "entry": [{ "id": "1", "messaging": [{ "optin": optin }] }] });
            assert_eq!(
                ParsedOptin::parse(&body.to_string()),
                ParsedOptin::Unmatched(UnmatchedReason::NoOptin)
            );
        }

        let body = json!({ "entry": [{ "id": "1", "messaging": [{ "optin": {} }] }] });
        assert!(ParsedOptin::parse(&body.to_string()).is_match());
    }

    #[test]
    fn test_parse_malformed_entry_keeps_position() {
        let body = json!({
            "entry": [
                5,
                { "id": "2", "messaging": [{ "optin": { "ref": "b", "user_ref": "u" } }] }
            ]
        });

        let parsed = ParsedOptin::parse(&body.to_string());

        assert!(!parsed.is_match());
        assert_eq!(parsed.events().len(), 1);
        assert_eq!(parsed.events()[0].page_id, "2");
    }

    #[test]
    fn test_unmatched_reason_as_str() {
        assert_eq!(UnmatchedReason::Empty.as_str(), "empty");
        assert_eq!(UnmatchedReason::InvalidJson.as_str(), "invalid_json");
        assert_eq!(UnmatchedReason::NoOptin.as_str(), "no_optin");
        assert_eq!(
            UnmatchedReason::OptinNotLeading(Vec::new()).as_str(),
            "optin_not_leading"
        );
    }
}
