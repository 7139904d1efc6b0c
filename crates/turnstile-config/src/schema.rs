//! Configuration schema types.
//!
//! This module defines the structure of every configuration section.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use turnstile_core::ResponseFormat;

/// Response formatting section.
///
/// # Example
///
/// ```
/// use turnstile_config::ResponseConfig;
/// use turnstile_core::ResponseFormat;
///
/// let config = ResponseConfig::default();
/// assert_eq!(config.format_for(false), ResponseFormat::Html);
/// assert_eq!(config.format_for(true), ResponseFormat::Json);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ResponseConfig {
    /// Format negotiated for interactive calls.
    #[serde(default = "default_return_type")]
    pub default_return_type: ResponseFormat,

    /// Format negotiated for background (AJAX-style) calls.
    #[serde(default = "default_ajax_return")]
    pub default_ajax_return: ResponseFormat,

    /// Callback name used for JSONP output when the request names none.
    #[serde(default = "default_jsonp_handler")]
    pub jsonp_handler: String,

    /// Request parameter that overrides the JSONP callback name.
    #[serde(default = "default_jsonp_callback_param")]
    pub jsonp_callback_param: String,

    /// Template rendered for `succeed` in HTML format.
    #[serde(default = "default_jump_template")]
    pub success_template: String,

    /// Template rendered for `fail` in HTML format.
    #[serde(default = "default_jump_template")]
    pub error_template: String,

    /// Default jump wait time in seconds.
    #[serde(default = "default_wait")]
    pub default_wait: u64,
}

impl ResponseConfig {
    /// Returns the configured format for a background or interactive call.
    #[must_use]
    pub fn format_for(&self, background: bool) -> ResponseFormat {
        if background {
            self.default_ajax_return
        } else {
            self.default_return_type
        }
    }
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            default_return_type: default_return_type(),
            default_ajax_return: default_ajax_return(),
            jsonp_handler: default_jsonp_handler(),
            jsonp_callback_param: default_jsonp_callback_param(),
            success_template: default_jump_template(),
            error_template: default_jump_template(),
            default_wait: default_wait(),
        }
    }
}

fn default_return_type() -> ResponseFormat {
    ResponseFormat::Html
}

fn default_ajax_return() -> ResponseFormat {
    ResponseFormat::Json
}

fn default_jsonp_handler() -> String {
    "jsonpReturn".to_string()
}

fn default_jsonp_callback_param() -> String {
    "callback".to_string()
}

fn default_jump_template() -> String {
    "dispatch_jump".to_string()
}

const fn default_wait() -> u64 {
    3
}

/// Raw form of a two-part configuration entry.
///
/// Either `["name"]`, `["name", "second"]` or a table form.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PairForm {
    /// List form.
    List(Vec<String>),
    /// Table form.
    Table {
        /// The rule set or target name.
        #[serde(alias = "rule_set", alias = "target")]
        name: String,
        /// The scene or method name.
        #[serde(default, alias = "scene", alias = "method")]
        second: Option<String>,
    },
}

impl PairForm {
    fn into_pair(self) -> Result<(String, Option<String>), String> {
        match self {
            Self::List(items) => {
                let mut items = items.into_iter();
                let name = items
                    .next()
                    .ok_or_else(|| "expected at least one entry".to_string())?;
                let second = items.next();
                if items.next().is_some() {
                    return Err("expected at most two entries".to_string());
                }
                Ok((name, second))
            }
            Self::Table { name, second } => Ok((name, second)),
        }
    }
}

/// An explicit validation entry: a rule set and an optional scene.
///
/// Accepts `["user", "login"]`, `["user"]` or `{ rule_set = "user", scene = "login" }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "PairForm")]
pub struct ValidateRule {
    /// Registered rule-set name.
    pub rule_set: String,
    /// Scene to check instead of the full rule set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene: Option<String>,
}

impl ValidateRule {
    /// Creates a rule without a scene.
    #[must_use]
    pub fn new(rule_set: impl Into<String>) -> Self {
        Self {
            rule_set: rule_set.into(),
            scene: None,
        }
    }

    /// Sets the scene.
    #[must_use]
    pub fn scene(mut self, scene: impl Into<String>) -> Self {
        self.scene = Some(scene.into());
        self
    }
}

impl TryFrom<PairForm> for ValidateRule {
    type Error = String;

    fn try_from(form: PairForm) -> Result<Self, Self::Error> {
        let (rule_set, scene) = form.into_pair()?;
        Ok(Self { rule_set, scene })
    }
}

/// An explicit middleware entry: a target and the method to invoke.
///
/// Accepts `["auth", "check"]`, `["auth"]` (method `before`) or
/// `{ target = "auth", method = "check" }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "PairForm")]
pub struct MiddlewareRule {
    /// Registered target name.
    pub target: String,
    /// Method invoked on the target.
    pub method: String,
}

impl MiddlewareRule {
    /// The method used when none is configured.
    pub const DEFAULT_METHOD: &'static str = "before";

    /// Creates a rule.
    #[must_use]
    pub fn new(target: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            method: method.into(),
        }
    }
}

impl TryFrom<PairForm> for MiddlewareRule {
    type Error = String;

    fn try_from(form: PairForm) -> Result<Self, Self::Error> {
        let (target, method) = form.into_pair()?;
        Ok(Self {
            target,
            method: method.unwrap_or_else(|| Self::DEFAULT_METHOD.to_string()),
        })
    }
}

/// Middleware section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct MiddlewareConfig {
    /// Hooks run before the handler, keyed by route key.
    ///
    /// When this map is empty the middleware stage is skipped entirely,
    /// convention targets included.
    #[serde(default)]
    pub before: IndexMap<String, MiddlewareRule>,
}

/// Response cache section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Consult the response cache before dispatch.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level or filter directive (e.g. "info", "turnstile=debug").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_true() -> bool {
    true
}
