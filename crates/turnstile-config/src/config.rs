//! Main configuration types.
//!
//! This module provides the top-level [`PipelineConfig`] struct and its builder.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use turnstile_core::RouteIdentifier;

use crate::{
    CacheConfig, ConfigError, LoggingConfig, MiddlewareConfig, MiddlewareRule, ResponseConfig,
    ValidateRule,
};

/// Complete pipeline configuration.
///
/// Built once at startup and shared read-only by every request. Use
/// [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use turnstile_config::{PipelineConfig, ValidateRule};
///
/// let config = PipelineConfig::builder()
///     .validate("index/user/login", ValidateRule::new("user").scene("login"))
///     .code_message(404, "resource not found")
///     .build();
///
/// assert_eq!(config.validation_rule("index/user/login").unwrap().rule_set, "user");
/// assert_eq!(config.code_message(404), Some("resource not found"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Response formatting.
    #[serde(default)]
    pub response: ResponseConfig,

    /// Explicit validation entries keyed by route key.
    #[serde(default)]
    pub validate: IndexMap<String, ValidateRule>,

    /// Middleware hooks.
    #[serde(default)]
    pub middleware: MiddlewareConfig,

    /// Default messages keyed by result code (as a string).
    #[serde(default)]
    pub code: IndexMap<String, String>,

    /// Response cache.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PipelineConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::new()
    }

    /// Returns the explicit validation entry for an exact route key.
    #[must_use]
    pub fn validation_rule(&self, route_key: &str) -> Option<&ValidateRule> {
        self.validate.get(route_key)
    }

    /// Returns the explicit `before` middleware entry for an exact route key.
    #[must_use]
    pub fn before_middleware(&self, route_key: &str) -> Option<&MiddlewareRule> {
        self.middleware.before.get(route_key)
    }

    /// Returns the default message configured for a result code.
    #[must_use]
    pub fn code_message(&self, code: i64) -> Option<&str> {
        self.code.get(code.to_string().as_str()).map(String::as_str)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// - `ConfigError::RouteKey` if a validation or middleware key is not a
    ///   lower-case `module/controller/action` key
    /// - `ConfigError::BlankName` if a rule-set, scene, target, method or
    ///   JSONP handler name is blank
    /// - `ConfigError::CodeKey` if a code-table key is not written the way
    ///   [`code_message`](Self::code_message) looks it up (`"404"`, `"-1"`)
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, rule) in &self.validate {
            check_route_key("validate", key)?;
            if rule.rule_set.trim().is_empty() {
                return Err(ConfigError::blank_name(format!("validate.{key}"), "rule set"));
            }
            if rule.scene.as_deref().is_some_and(|s| s.trim().is_empty()) {
                return Err(ConfigError::blank_name(format!("validate.{key}"), "scene"));
            }
        }

        for (key, rule) in &self.middleware.before {
            check_route_key("middleware.before", key)?;
            if rule.target.trim().is_empty() {
                return Err(ConfigError::blank_name(
                    format!("middleware.before.{key}"),
                    "target",
                ));
            }
            if rule.method.trim().is_empty() {
                return Err(ConfigError::blank_name(
                    format!("middleware.before.{key}"),
                    "method",
                ));
            }
        }

        if let Some(key) = self.code.keys().find(|k| !is_canonical_code(k)) {
            return Err(ConfigError::CodeKey { key: key.clone() });
        }

        if self.response.jsonp_handler.trim().is_empty() {
            return Err(ConfigError::blank_name("response.jsonp_handler", "handler"));
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// Pretty, debug-level logs and no response cache.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config.logging.format = crate::LogFormat::Pretty;
        config.logging.include_location = true;
        config.cache.enabled = false;
        config
    }

    /// Create a production configuration preset.
    ///
    /// JSON, info-level logs and the response cache enabled.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging.level = "info".to_string();
        config.logging.format = crate::LogFormat::Json;
        config.cache.enabled = true;
        config
    }
}

// Config keys are compared verbatim against lower-cased route keys, so a
// key that does not round-trip through RouteIdentifier can never match.
fn check_route_key(section: &'static str, key: &str) -> Result<(), ConfigError> {
    match RouteIdentifier::parse(key) {
        Some(route) if route.key() == key => Ok(()),
        _ => Err(ConfigError::route_key(section, key)),
    }
}

// "0404" and "+404" parse as integers but never equal `code.to_string()`.
fn is_canonical_code(key: &str) -> bool {
    key.parse::<i64>().is_ok_and(|code| code.to_string() == key)
}

/// Builder for [`PipelineConfig`].
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the response section.
    #[must_use]
    pub fn response(mut self, response: ResponseConfig) -> Self {
        self.config.response = response;
        self
    }

    /// Add an explicit validation entry.
    #[must_use]
    pub fn validate(mut self, route_key: impl Into<String>, rule: ValidateRule) -> Self {
        self.config.validate.insert(route_key.into(), rule);
        self
    }

    /// Add an explicit `before` middleware entry.
    #[must_use]
    pub fn before(mut self, route_key: impl Into<String>, rule: MiddlewareRule) -> Self {
        self.config.middleware.before.insert(route_key.into(), rule);
        self
    }

    /// Add a code-table message.
    #[must_use]
    pub fn code_message(mut self, code: i64, message: impl Into<String>) -> Self {
        self.config.code.insert(code.to_string(), message.into());
        self
    }

    /// Set the cache section.
    #[must_use]
    pub fn cache(mut self, cache: CacheConfig) -> Self {
        self.config.cache = cache;
        self
    }

    /// Set the logging section.
    #[must_use]
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.config.logging = logging;
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> PipelineConfig {
        self.config
    }
}
