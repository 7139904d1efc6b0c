//! Typed configuration for the Turnstile pipeline.
//!
//! Every stage reads one immutable [`PipelineConfig`], built once at startup:
//!
//! - [`ResponseConfig`] - Format defaults, JSONP callback, jump templates
//! - `validate` - Explicit `routeKey -> [ruleSet, scene?]` entries
//! - [`MiddlewareConfig`] - Explicit `routeKey -> [target, method]` hooks
//! - `code` - Default messages keyed by result code
//! - [`CacheConfig`] - Response cache toggle
//! - [`LoggingConfig`] - Log level and format
//!
//! # Example
//!
//! ```no_run
//! use turnstile_config::ConfigLoader;
//!
//! # fn main() -> Result<(), turnstile_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_file("turnstile.toml")?
//!     .with_env_prefix("TURNSTILE")
//!     .load()?;
//!
//! println!("background calls answer with {}", config.response.default_ajax_return);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [response]
//! default_return_type = "html"
//! default_ajax_return = "json"
//!
//! [validate]
//! "index/user/login" = ["user", "login"]
//!
//! [middleware.before]
//! "index/user/profile" = ["auth", "check"]
//!
//! [code]
//! "404" = "resource not found"
//!
//! [cache]
//! enabled = true
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Scalar values can be overridden with `PREFIX__SECTION__KEY`:
//!
//! - `TURNSTILE__RESPONSE__DEFAULT_AJAX_RETURN=jsonp`
//! - `TURNSTILE__CACHE__ENABLED=false`
//! - `TURNSTILE__LOGGING__LEVEL=debug`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::*;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
