//! Error types for Turnstile.
//!
//! Two classes of failure exist in the pipeline:
//!
//! | Class | Type | Handling |
//! |---|---|---|
//! | Deployment defect | [`ConfigurationError`] | Fatal, propagates to the dispatcher |
//! | Request-level rejection | (none) | Reported as a code-400 envelope via the termination signal |
//!
//! [`PipelineError`] wraps everything fatal, including collaborator failures
//! while building a response.

use std::fmt;
use thiserror::Error;

/// Result type alias using [`PipelineError`].
pub type PipelineResult<T> = Result<T, PipelineError>;

/// What kind of configured target failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    /// A validation rule set.
    RuleSet,
    /// A middleware target.
    Middleware,
    /// A method on a resolved middleware target.
    MiddlewareMethod,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::RuleSet => "rule set class",
            Self::Middleware => "middleware class",
            Self::MiddlewareMethod => "middleware method",
        })
    }
}

/// An explicitly configured target does not exist.
///
/// Raised only for explicit configuration entries; a missing convention
/// target is a silent skip.
///
/// # Example
///
/// ```
/// use turnstile_core::{ConfigurationError, TargetKind};
///
/// let err = ConfigurationError::new(TargetKind::RuleSet, "user", "index/user/login");
/// assert_eq!(err.to_string(), "rule set class not found: user (route index/user/login)");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} not found: {name} (route {route})")]
pub struct ConfigurationError {
    kind: TargetKind,
    name: String,
    route: String,
}

impl ConfigurationError {
    /// Creates a configuration error for the given target.
    #[must_use]
    pub fn new(kind: TargetKind, name: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            route: route.into(),
        }
    }

    /// Returns the kind of target that failed to resolve.
    #[must_use]
    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    /// Returns the configured target name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the route key the entry was configured for.
    #[must_use]
    pub fn route(&self) -> &str {
        &self.route
    }
}

/// Fatal pipeline errors.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// An explicitly configured target does not resolve.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The envelope could not be serialized.
    #[error("failed to serialize response: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The template renderer failed.
    #[error("failed to render template {template}")]
    Render {
        /// The template that was being rendered.
        template: String,
        /// The renderer's error.
        #[source]
        source: anyhow::Error,
    },

    /// The HTTP response could not be assembled.
    #[error("failed to build response: {0}")]
    Http(#[from] http::Error),
}

impl PipelineError {
    /// Creates a render error.
    #[must_use]
    pub fn render(template: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Render {
            template: template.into(),
            source,
        }
    }

    /// Returns true if this is a configuration (deployment) defect.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}
