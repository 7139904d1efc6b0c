//! Output formats for terminated responses.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The serialization format of a terminated response.
///
/// Interactive calls negotiate the configured page-render format (HTML by
/// default); background calls negotiate the configured background format
/// (JSON by default).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// The envelope is rendered through a template.
    Html,
    /// The envelope is serialized as JSON.
    Json,
    /// The envelope is serialized as JSON wrapped in a callback invocation.
    Jsonp,
}

impl ResponseFormat {
    /// Returns the lowercase format name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Json => "json",
            Self::Jsonp => "jsonp",
        }
    }

    /// Returns the `Content-Type` header value for this format.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Html => "text/html; charset=utf-8",
            Self::Json => "application/json; charset=utf-8",
            Self::Jsonp => "application/javascript; charset=utf-8",
        }
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown format name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown response format: {0}")]
pub struct UnknownFormat(pub String);

impl FromStr for ResponseFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "json" => Ok(Self::Json),
            "jsonp" => Ok(Self::Jsonp),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}
