//! Request context types.
//!
//! The [`RequestContext`] carries the resolved route, the inbound parameters
//! and the per-request response preferences through every pipeline stage and
//! into the handler.

use crate::format::ResponseFormat;
use crate::route::RouteIdentifier;
use chrono::{DateTime, Utc};
use http::Method;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use uuid::Uuid;

/// Inbound request parameters, in the order the router supplied them.
pub type Params = IndexMap<String, Value>;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps log correlation cheap.
///
/// # Example
///
/// ```
/// use turnstile_core::RequestId;
///
/// let id = RequestId::new();
/// println!("Request ID: {}", id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Per-request context handed to every pipeline stage.
///
/// Built once by the dispatcher after routing. Stages only ever see it by
/// shared reference; the single mutable field is the output-format override,
/// which the owner may set before invoking the pipeline or the handler.
///
/// # Example
///
/// ```
/// use turnstile_core::{RequestContext, RouteIdentifier, ResponseFormat};
/// use serde_json::json;
///
/// let ctx = RequestContext::new(RouteIdentifier::new("index", "user", "login"))
///     .with_param("name", json!("alice"))
///     .with_background(true);
///
/// assert_eq!(ctx.route().key(), "index/user/login");
/// assert!(ctx.is_background());
/// assert_eq!(ctx.format_override(), None);
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    method: Method,
    route: RouteIdentifier,
    params: Params,
    background: bool,
    format: Option<ResponseFormat>,
    referer: Option<String>,
    request_time: DateTime<Utc>,
    started_at: Instant,
}

impl RequestContext {
    /// Creates a context for an interactive `GET` request with no parameters.
    #[must_use]
    pub fn new(route: RouteIdentifier) -> Self {
        Self {
            request_id: RequestId::new(),
            method: Method::GET,
            route,
            params: Params::new(),
            background: false,
            format: None,
            referer: None,
            request_time: Utc::now(),
            started_at: Instant::now(),
        }
    }

    /// Sets a specific request ID (e.g. one propagated by a client).
    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// Sets the HTTP method.
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Replaces all parameters.
    #[must_use]
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Adds a single parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: Value) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    /// Marks the request as a background (AJAX-style) call.
    #[must_use]
    pub fn with_background(mut self, background: bool) -> Self {
        self.background = background;
        self
    }

    /// Sets the output-format override.
    #[must_use]
    pub fn with_format(mut self, format: ResponseFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Sets the referring location.
    #[must_use]
    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    /// Sets the time the request was received.
    #[must_use]
    pub fn with_request_time(mut self, request_time: DateTime<Utc>) -> Self {
        self.request_time = request_time;
        self
    }

    /// Sets or clears the output-format override.
    pub fn set_format(&mut self, format: Option<ResponseFormat>) {
        self.format = format;
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the resolved route.
    #[must_use]
    pub fn route(&self) -> &RouteIdentifier {
        &self.route
    }

    /// Returns all inbound parameters.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Returns a single parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// Returns true for background (AJAX-style) calls.
    #[must_use]
    pub fn is_background(&self) -> bool {
        self.background
    }

    /// Returns the output-format override, if any.
    #[must_use]
    pub fn format_override(&self) -> Option<ResponseFormat> {
        self.format
    }

    /// Returns the referring location, if the client sent one.
    #[must_use]
    pub fn referer(&self) -> Option<&str> {
        self.referer.as_deref()
    }

    /// Returns when the request was received.
    #[must_use]
    pub fn request_time(&self) -> DateTime<Utc> {
        self.request_time
    }

    /// Returns the time spent on this request since the context was created.
    ///
    /// Clones share the original start.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn route() -> RouteIdentifier {
        RouteIdentifier::new("index", "user", "login")
    }

    #[test]
    fn test_defaults() {
        let ctx = RequestContext::new(route());
        assert_eq!(*ctx.method(), Method::GET);
        assert!(ctx.params().is_empty());
        assert!(!ctx.is_background());
        assert!(ctx.format_override().is_none());
        assert!(ctx.referer().is_none());
    }

    #[test]
    fn test_params_keep_insertion_order() {
        let ctx = RequestContext::new(route())
            .with_param("b", json!(2))
            .with_param("a", json!(1));

        let keys: Vec<_> = ctx.params().keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(ctx.param("a"), Some(&json!(1)));
        assert_eq!(ctx.param("missing"), None);
    }

    #[test]
    fn test_set_format() {
        let mut ctx = RequestContext::new(route()).with_format(ResponseFormat::Json);
        assert_eq!(ctx.format_override(), Some(ResponseFormat::Json));

        ctx.set_format(None);
        assert_eq!(ctx.format_override(), None);
    }

    #[test]
    fn test_elapsed_counts_from_creation() {
        let ctx = RequestContext::new(route());
        std::thread::sleep(std::time::Duration::from_millis(2));
        let copy = ctx.clone();

        assert!(ctx.elapsed() >= std::time::Duration::from_millis(2));
        assert!(copy.elapsed() >= std::time::Duration::from_millis(2));
    }

    #[test]
    fn test_request_ids_are_unique() {
        let a = RequestContext::new(route());
        let b = RequestContext::new(route());
        assert_ne!(a.request_id(), b.request_id());
    }
}
