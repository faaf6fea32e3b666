//! Minimal view of an inbound HTTP request.

use axum::body::Bytes;
use axum::http::HeaderMap;

/// The raw body and headers of one webhook delivery.
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    body: Bytes,
    headers: HeaderMap,
}

impl InboundRequest {
    pub fn new(body: impl Into<Bytes>, headers: HeaderMap) -> Self {
        Self {
            body: body.into(),
            headers,
        }
    }

    /// Request with a body and no headers.
    pub fn from_body(body: impl Into<Bytes>) -> Self {
        Self::new(body, HeaderMap::new())
    }

    /// Raw body bytes, as signed by the sender.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn content(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Value of a header, if present and printable.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}
