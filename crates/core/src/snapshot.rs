//! Immutable response snapshots.
//!
//! A snapshot is what the cache store keeps and what the worker hands back
//! to the application: status, headers and body. The body is a `Bytes`
//! buffer, so cloning a snapshot gives the caller and the store independent,
//! fully readable copies without copying the payload.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Content type used by synthetic offline responses.
pub const OFFLINE_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Status code used by synthetic offline responses.
pub const OFFLINE_STATUS: u16 = 503;

/// A response captured from the network, the store, or synthesized offline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSnapshot {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl ResponseSnapshot {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<Bytes>) -> Self {
        Self { status, headers, body: body.into() }
    }

    /// Build the plaintext 503 returned when neither network nor cache can serve a request.
    pub fn offline(message: &'static str) -> Self {
        Self {
            status: OFFLINE_STATUS,
            headers: vec![("content-type".to_string(), OFFLINE_CONTENT_TYPE.to_string())],
            body: Bytes::from_static(message.as_bytes()),
        }
    }

    /// True for 2xx statuses, the only responses the store accepts.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header value matching `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Body decoded as UTF-8, if it is valid text.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }
}
