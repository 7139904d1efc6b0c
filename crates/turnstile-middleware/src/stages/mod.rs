//! The three pre-dispatch stages.
//!
//! Run in a fixed order by [`Pipeline`](crate::Pipeline):
//!
//! 1. [`validation`] - Check request parameters against a rule set
//! 2. [`middleware`] - Invoke the route's `before` hook
//! 3. [`response_cache`] - Answer from a stored response

pub mod middleware;
pub mod response_cache;
pub mod validation;

pub use middleware::MiddlewareStage;
pub use response_cache::ResponseCacheStage;
pub use validation::ValidationStage;
