//! # Turnstile Middleware
//!
//! The pre-dispatch pipeline: everything a routed request passes through
//! before its controller action runs, plus the jump helpers that stop a
//! request early with a formatted response.
//!
//! ## Pipeline Stages
//!
//! ```text
//! RequestContext → Validation → Middleware → ResponseCache → Handler
//!                      │             │             │            │
//!                      └─────────────┴──── Interrupt ───────────┴──→ Response
//! ```
//!
//! | Stage | Purpose |
//! |-------|---------|
//! | 1 Validation | Check parameters against the route's rule set; fail with code 400 |
//! | 2 Middleware | Invoke the route's `before` hook |
//! | 3 Response Cache | Answer with a stored body for the request fingerprint |
//!
//! ## Resolution
//!
//! Validation rule sets and middleware targets are looked up in explicit
//! configuration by exact route key first, then in the registry by
//! `(module, controller)` convention. A missing explicit target is a
//! [`ConfigurationError`](turnstile_core::ConfigurationError); a missing
//! convention target means the stage does nothing.
//!
//! ## Example
//!
//! ```
//! use turnstile_middleware::pipeline::Stage;
//!
//! let stages = Stage::all();
//! assert_eq!(stages.len(), 3);
//! assert_eq!(stages[0].name(), "validation");
//! assert_eq!(stages[2].name(), "response_cache");
//! ```

#![doc(html_root_url = "https://docs.rs/turnstile-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod fingerprint;
pub mod jump;
pub mod normalize;
pub mod pipeline;
pub mod registry;
pub mod services;
pub mod stages;

// Re-export main types at crate root
pub use fingerprint::Fingerprint;
pub use jump::{Jump, JumpOptions, Message, RedirectParams};
pub use pipeline::{Pipeline, PipelineBuilder, PipelineStage, Stage};
pub use registry::{
    FnTarget, HookFn, MiddlewareTarget, RuleSet, RuleSetFactory, RuleSetRegistry, TargetRegistry,
};
pub use services::{
    IdentityTranslator, JumpPage, MapTranslator, MemoryResponseCache, NoCache, PassthroughUrls,
    ResponseCache, Services, TemplateRenderer, Translator, UrlBuilder,
};
