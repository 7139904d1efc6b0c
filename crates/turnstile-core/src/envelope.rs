//! The canonical response envelope.
//!
//! Every helper-built response carries the same structure:
//!
//! ```json
//! {
//!   "code": 1,
//!   "msg": "saved",
//!   "time": 1700000000,
//!   "data": {},
//!   "url": "/home",
//!   "wait": 3
//! }
//! ```
//!
//! `time` is present on data responses, `url` and `wait` on jump responses.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The canonical result structure produced by the response helpers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Application-level result code (not the HTTP status).
    pub code: i64,

    /// Localized message; empty when there is nothing to say.
    pub msg: String,

    /// Server time the request was received, as a Unix timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,

    /// Response payload.
    #[serde(default)]
    pub data: Value,

    /// Location the client should move to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Seconds to wait before moving to `url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait: Option<u64>,
}

impl ResponseEnvelope {
    /// Builds an envelope from its parts.
    ///
    /// The message is taken as given; localization happens before this call.
    ///
    /// # Example
    ///
    /// ```
    /// use turnstile_core::ResponseEnvelope;
    /// use serde_json::json;
    ///
    /// let envelope = ResponseEnvelope::build(1, "saved", json!({"id": 7}), Some("/home".into()), Some(3));
    /// assert_eq!(envelope.code, 1);
    /// assert_eq!(envelope.url.as_deref(), Some("/home"));
    /// assert!(envelope.time.is_none());
    /// ```
    #[must_use]
    pub fn build(
        code: i64,
        msg: impl Into<String>,
        data: Value,
        url: Option<String>,
        wait: Option<u64>,
    ) -> Self {
        Self {
            code,
            msg: msg.into(),
            time: None,
            data,
            url,
            wait,
        }
    }

    /// Stamps the envelope with a server timestamp.
    #[must_use]
    pub fn with_time(mut self, time: i64) -> Self {
        self.time = Some(time);
        self
    }

    /// Serializes the envelope as JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parses an envelope from JSON.
    pub fn from_json(body: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(body)
    }
}
