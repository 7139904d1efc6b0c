//! # Turnstile Core
//!
//! Core types for the Turnstile pre-dispatch pipeline.
//!
//! This crate provides the types shared by every stage and by handler code:
//!
//! - [`RouteIdentifier`] - The resolved `(module, controller, action)` tuple
//! - [`RequestContext`] - Per-request parameters, flags and format preference
//! - [`ResponseEnvelope`] - The canonical `{code, msg, time, data, url, wait}` result
//! - [`ResponseFormat`] - HTML, JSON or JSONP output
//! - [`Interrupt`] / [`Termination`] / [`Flow`] - The termination signal
//! - [`PipelineError`] / [`ConfigurationError`] - Fatal errors

#![doc(html_root_url = "https://docs.rs/turnstile-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod envelope;
mod error;
mod format;
mod route;
mod termination;

pub use context::{Params, RequestContext, RequestId};
pub use envelope::ResponseEnvelope;
pub use error::{ConfigurationError, PipelineError, PipelineResult, TargetKind};
pub use format::{ResponseFormat, UnknownFormat};
pub use route::RouteIdentifier;
pub use termination::{Flow, Interrupt, Payload, RedirectTarget, Response, Termination};
