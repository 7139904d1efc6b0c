//! Errors raised while loading or checking a [`PipelineConfig`](crate::PipelineConfig).

use std::path::PathBuf;
use thiserror::Error;

/// A configuration that could not be loaded or does not describe a usable
/// pipeline.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("no configuration file at {path}")]
    Missing {
        /// Path that was requested.
        path: PathBuf,
    },

    /// The configuration file exists but could not be read.
    #[error("cannot read configuration file {path}")]
    Unreadable {
        /// Path that was requested.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The source is neither TOML nor JSON.
    #[error("unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    /// TOML source did not match the schema.
    #[error("malformed TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON source did not match the schema.
    #[error("malformed JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// A `[validate]` or `[middleware.before]` key is not a lower-case
    /// `module/controller/action` route key.
    #[error("{section}.{key}: expected a lower-case module/controller/action route key")]
    RouteKey {
        /// Config section holding the key.
        section: &'static str,
        /// The offending key.
        key: String,
    },

    /// A rule-set, scene, target, method or handler name is blank.
    #[error("{entry}: {what} name is blank")]
    BlankName {
        /// Dotted path of the entry.
        entry: String,
        /// Which name is blank.
        what: &'static str,
    },

    /// A `[code]` key is not the canonical decimal form of an integer.
    #[error("code.{key}: result codes must be written as plain integers")]
    CodeKey {
        /// The offending key.
        key: String,
    },

    /// An environment override has a value of the wrong type.
    #[error("environment override {var}: expected {expected}")]
    EnvOverride {
        /// Variable name.
        var: String,
        /// What the value should look like.
        expected: &'static str,
    },
}

impl ConfigError {
    pub(crate) fn route_key(section: &'static str, key: impl Into<String>) -> Self {
        Self::RouteKey {
            section,
            key: key.into(),
        }
    }

    pub(crate) fn blank_name(entry: impl Into<String>, what: &'static str) -> Self {
        Self::BlankName {
            entry: entry.into(),
            what,
        }
    }

    pub(crate) fn env_override(var: impl Into<String>, expected: &'static str) -> Self {
        Self::EnvOverride {
            var: var.into(),
            expected,
        }
    }

    /// Returns true if the configuration parsed but describes an unusable
    /// pipeline.
    #[must_use]
    pub const fn is_invalid_entry(&self) -> bool {
        matches!(
            self,
            Self::RouteKey { .. } | Self::BlankName { .. } | Self::CodeKey { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_key_message_names_section_and_key() {
        let err = ConfigError::route_key("validate", "index/user");
        assert_eq!(
            err.to_string(),
            "validate.index/user: expected a lower-case module/controller/action route key"
        );
        assert!(err.is_invalid_entry());
    }

    #[test]
    fn test_blank_name_message() {
        let err = ConfigError::blank_name("middleware.before.index/user/login", "method");
        assert_eq!(
            err.to_string(),
            "middleware.before.index/user/login: method name is blank"
        );
    }

    #[test]
    fn test_env_override_is_not_an_entry_error() {
        let err = ConfigError::env_override("TURNSTILE__CACHE__ENABLED", "a boolean");
        assert!(err.to_string().contains("TURNSTILE__CACHE__ENABLED"));
        assert!(!err.is_invalid_entry());
    }
}
