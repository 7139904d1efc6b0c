//! Before-action middleware.
//!
//! Skipped outright when `[middleware.before]` is empty. Otherwise an entry
//! for the exact route key names a registered target and the method to call;
//! an unregistered target or missing method is a configuration error. With
//! no entry, the target registered by convention for the route's controller
//! gets its `before` method called, if it has one.
//!
//! Hooks stop the request by returning an interrupt built with the jump
//! helpers they receive.

use crate::jump::Jump;
use crate::pipeline::{PipelineStage, Stage};
use tracing::{debug, error};
use turnstile_config::MiddlewareRule;
use turnstile_core::{ConfigurationError, Flow, RequestContext, TargetKind};

/// Invokes the route's before hook.
#[derive(Debug, Clone, Copy, Default)]
pub struct MiddlewareStage;

impl PipelineStage for MiddlewareStage {
    fn stage(&self) -> Stage {
        Stage::Middleware
    }

    fn run(&self, ctx: &RequestContext, jump: &Jump<'_>) -> Flow {
        let config = jump.config();
        if config.middleware.before.is_empty() {
            debug!("no before middleware configured");
            return Ok(());
        }

        let route = ctx.route();
        let targets = jump.services().targets();

        if let Some(rule) = config.before_middleware(route.key()) {
            let Some(target) = targets.resolve(&rule.target) else {
                error!(target = %rule.target, "configured middleware is not registered");
                return Err(
                    ConfigurationError::new(TargetKind::Middleware, &rule.target, route.key())
                        .into(),
                );
            };

            debug!(target = %rule.target, method = %rule.method, "invoking middleware");
            return target.call(&rule.method, ctx, jump).unwrap_or_else(|| {
                error!(target = %rule.target, method = %rule.method, "middleware method not found");
                Err(ConfigurationError::new(
                    TargetKind::MiddlewareMethod,
                    format!("{}.{}", rule.target, rule.method),
                    route.key(),
                )
                .into())
            });
        }

        let Some(target) = targets.resolve_convention(route) else {
            debug!("no middleware for route");
            return Ok(());
        };

        debug!("invoking convention middleware");
        target
            .call(MiddlewareRule::DEFAULT_METHOD, ctx, jump)
            .unwrap_or_else(|| {
                debug!("convention middleware has no before method");
                Ok(())
            })
    }
}
