//! Observability for Turnstile.
//!
//! The pipeline emits `tracing` events at every stage boundary. This crate
//! installs the subscriber that formats them:
//!
//! - JSON output for production, pretty output for development
//! - `EnvFilter` level directives (`info`, `turnstile_middleware=debug`, ...)
//! - Standard field names in [`logging::fields`]
//!
//! # Example
//!
//! ```rust,ignore
//! use turnstile_config::PipelineConfig;
//! use turnstile_telemetry::{init_logging, LogConfig};
//!
//! let config = PipelineConfig::production();
//! init_logging(&LogConfig::from(&config.logging))?;
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
