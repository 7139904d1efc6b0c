//! Response-cache keys.

use serde_json::Value;
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Write as _;
use turnstile_core::RequestContext;

/// Cache key for one request: a SHA-1 over the method, the route key and the
/// parameters with object keys sorted.
///
/// Parameter order never affects the fingerprint.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use turnstile_core::{RequestContext, RouteIdentifier};
/// use turnstile_middleware::Fingerprint;
///
/// let route = RouteIdentifier::new("index", "user", "list");
/// let a = RequestContext::new(route.clone())
///     .with_param("page", json!(2))
///     .with_param("size", json!(10));
/// let b = RequestContext::new(route)
///     .with_param("size", json!(10))
///     .with_param("page", json!(2));
///
/// assert_eq!(Fingerprint::of(&a), Fingerprint::of(&b));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Computes the fingerprint of a request.
    #[must_use]
    pub fn of(ctx: &RequestContext) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(ctx.method().as_str().as_bytes());
        hasher.update(b"|");
        hasher.update(ctx.route().key().as_bytes());
        hasher.update(b"|");

        let params: BTreeMap<&str, Value> = ctx
            .params()
            .iter()
            .map(|(k, v)| (k.as_str(), canonical(v)))
            .collect();
        // A map of strings to Values always serializes.
        hasher.update(serde_json::to_string(&params).unwrap_or_default().as_bytes());

        let mut hex = String::with_capacity(40);
        for byte in hasher.finalize().iter() {
            let _ = write!(hex, "{byte:02x}");
        }
        Self(hex)
    }

    /// Wraps a precomputed key, e.g. one read back from an external store.
    #[must_use]
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// Returns the hex string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Rebuilds nested objects with sorted keys.
fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<&String, Value> =
                map.iter().map(|(k, v)| (k, canonical(v))).collect();
            Value::Object(
                sorted
                    .into_iter()
                    .map(|(k, v)| (k.clone(), v))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        other => other.clone(),
    }
}
