//! # Turnstile
//!
//! **Pre-dispatch pipeline for controller frameworks**
//!
//! Turnstile runs between the router and a controller action:
//!
//! - **Validation** - Rule sets resolved from explicit configuration or by
//!   `(module, controller)` convention, with per-action scenes
//! - **Middleware** - `before` hooks resolved the same way
//! - **Response Cache** - Stored responses answered before the handler runs
//! - **Jump Helpers** - `succeed`, `fail`, `redirect`, `respond_data` and
//!   `respond_raw` build an HTML, JSON or JSONP response and stop the request
//!
//! ## Quick Start
//!
//! ```no_run
//! use turnstile::prelude::*;
//!
//! # fn main() -> Result<(), turnstile::TurnstileError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_optional_file("turnstile.toml")?
//!     .with_env_prefix("TURNSTILE")
//!     .load()?;
//!
//! let pipeline = turnstile::init(config)?
//!     .target("auth", FnTarget::new().method("check", |ctx, jump| {
//!         match ctx.param("token") {
//!             Some(_) => Ok(()),
//!             None => Err(jump.redirect("/login", 302)),
//!         }
//!     }))
//!     .build();
//!
//! let ctx = RequestContext::new(RouteIdentifier::new("index", "user", "profile"));
//! let response = pipeline.dispatch(&ctx, |_ctx, jump| Err(jump.succeed("welcome")))?;
//! # let _ = response;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! RequestContext → Validation → Middleware → ResponseCache → Handler
//!                      │             │             │            │
//!                      └─────────────┴──── Interrupt ───────────┴──→ Response
//! ```

#![doc(html_root_url = "https://docs.rs/turnstile/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use thiserror::Error;

// Re-export core types
pub use turnstile_core as core;

// Re-export configuration types
pub use turnstile_config as config;

// Re-export pipeline types
pub use turnstile_middleware as middleware;

// Re-export logging setup
pub use turnstile_telemetry as telemetry;

/// Errors raised while starting up or dispatching.
#[derive(Debug, Error)]
pub enum TurnstileError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] turnstile_config::ConfigError),

    /// Logging could not be initialized.
    #[error(transparent)]
    Telemetry(#[from] turnstile_telemetry::TelemetryError),

    /// A request was aborted by a fatal pipeline error.
    #[error(transparent)]
    Pipeline(#[from] turnstile_core::PipelineError),
}

/// Validates `config`, installs logging from its `[logging]` section and
/// returns a pipeline builder carrying it.
///
/// Register rule sets, middleware targets and collaborators on the
/// returned builder before calling `build`.
pub fn init(
    config: turnstile_config::PipelineConfig,
) -> Result<turnstile_middleware::PipelineBuilder, TurnstileError> {
    config.validate()?;
    turnstile_telemetry::init_logging(&turnstile_telemetry::LogConfig::from(&config.logging))?;
    Ok(turnstile_middleware::Pipeline::builder().config(config))
}

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use turnstile::prelude::*;
/// ```
pub mod prelude {
    pub use turnstile_core::{
        ConfigurationError, Flow, Interrupt, Params, PipelineError, RequestContext, RequestId,
        Response, ResponseEnvelope, ResponseFormat, RouteIdentifier, Termination,
    };

    pub use turnstile_config::{
        ConfigError, ConfigLoader, MiddlewareRule, PipelineConfig, ValidateRule,
    };

    pub use turnstile_middleware::{
        Fingerprint, FnTarget, Jump, JumpOptions, MemoryResponseCache, MiddlewareTarget,
        Pipeline, PipelineBuilder, RuleSet, TemplateRenderer, Translator, UrlBuilder,
    };

    pub use crate::TurnstileError;
}
