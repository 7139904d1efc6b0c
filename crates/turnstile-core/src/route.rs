//! Route identifiers.
//!
//! A [`RouteIdentifier`] names the `(module, controller, action)` tuple the
//! upstream router resolved a request to. Its [`key`](RouteIdentifier::key)
//! (`module/controller/action`) is the lookup key into every explicit
//! configuration map.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The resolved target of a request, lower-cased on construction.
///
/// # Example
///
/// ```
/// use turnstile_core::RouteIdentifier;
///
/// let route = RouteIdentifier::new("Index", "User", "Login");
/// assert_eq!(route.key(), "index/user/login");
/// assert_eq!(route.action(), "login");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteIdentifier {
    module: String,
    controller: String,
    action: String,
    key: String,
}

impl RouteIdentifier {
    /// Creates a route identifier, lower-casing every segment.
    #[must_use]
    pub fn new(
        module: impl AsRef<str>,
        controller: impl AsRef<str>,
        action: impl AsRef<str>,
    ) -> Self {
        let module = module.as_ref().to_lowercase();
        let controller = controller.as_ref().to_lowercase();
        let action = action.as_ref().to_lowercase();
        let key = format!("{module}/{controller}/{action}");

        Self {
            module,
            controller,
            action,
            key,
        }
    }

    /// Parses a `module/controller/action` key.
    ///
    /// Returns `None` unless the key has exactly three non-empty segments.
    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        let mut parts = key.split('/');
        let (module, controller, action) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() || [module, controller, action].iter().any(|s| s.is_empty()) {
            return None;
        }
        Some(Self::new(module, controller, action))
    }

    /// Returns the module segment.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Returns the controller segment.
    #[must_use]
    pub fn controller(&self) -> &str {
        &self.controller
    }

    /// Returns the action segment.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Returns the `module/controller/action` lookup key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for RouteIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_are_lowercased() {
        let route = RouteIdentifier::new("Admin", "OrderItem", "ListAll");
        assert_eq!(route.module(), "admin");
        assert_eq!(route.controller(), "orderitem");
        assert_eq!(route.action(), "listall");
        assert_eq!(route.key(), "admin/orderitem/listall");
        assert_eq!(route.to_string(), "admin/orderitem/listall");
    }

    #[test]
    fn test_parse_valid_key() {
        let route = RouteIdentifier::parse("index/user/login").unwrap();
        assert_eq!(route, RouteIdentifier::new("index", "user", "login"));
    }

    #[test]
    fn test_parse_rejects_malformed_keys() {
        assert!(RouteIdentifier::parse("index/user").is_none());
        assert!(RouteIdentifier::parse("index/user/login/extra").is_none());
        assert!(RouteIdentifier::parse("index//login").is_none());
        assert!(RouteIdentifier::parse("").is_none());
    }
}
