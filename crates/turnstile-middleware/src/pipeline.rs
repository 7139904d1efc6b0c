//! Fixed-order pre-dispatch pipeline.
//!
//! Every request passes through the same stages in the same order before
//! its handler runs:
//!
//! 1. **Validation** - Check parameters against the route's rule set
//! 2. **Middleware** - Invoke the route's `before` hook
//! 3. **Response Cache** - Answer from a stored response
//!
//! The order cannot be changed. A stage succeeds by returning `Ok(())`,
//! which only means it did not stop the request. The first stage to return
//! an [`Interrupt`] ends the pipeline; later stages and the handler never
//! run. Middleware therefore still runs for requests that end up being
//! served from the cache.

use crate::jump::Jump;
use crate::registry::{MiddlewareTarget, RuleSet, RuleSetRegistry, TargetRegistry};
use crate::services::{ResponseCache, Services, TemplateRenderer, Translator, UrlBuilder};
use crate::stages::{MiddlewareStage, ResponseCacheStage, ValidationStage};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, info_span};
use turnstile_config::PipelineConfig;
use turnstile_core::{Flow, Interrupt, PipelineResult, RequestContext, Response};

/// A pipeline stage.
pub trait PipelineStage: Send + Sync {
    /// Which fixed slot this stage fills.
    fn stage(&self) -> Stage;

    /// Runs the stage for one request.
    ///
    /// Returns `Ok(())` to let the request continue.
    fn run(&self, ctx: &RequestContext, jump: &Jump<'_>) -> Flow;
}

/// The pre-dispatch pipeline.
///
/// Holds the configuration and collaborators for the lifetime of the
/// application; requests only borrow it.
///
/// # Example
///
/// ```
/// use turnstile_config::{PipelineConfig, ValidateRule};
/// use turnstile_core::{Params, RequestContext, RouteIdentifier};
/// use turnstile_middleware::{Pipeline, RuleSet};
///
/// struct NeedsName(String);
///
/// impl RuleSet for NeedsName {
///     fn has_scene(&self, _scene: &str) -> bool { false }
///     fn check(&mut self, params: &Params) -> bool {
///         self.0 = "name is required".into();
///         params.contains_key("name")
///     }
///     fn check_scene(&mut self, _scene: &str, params: &Params) -> bool { self.check(params) }
///     fn last_error(&self) -> String { self.0.clone() }
/// }
///
/// let pipeline = Pipeline::builder()
///     .config(
///         PipelineConfig::builder()
///             .validate("index/user/save", ValidateRule::new("user"))
///             .build(),
///     )
///     .rule_set("user", || NeedsName(String::new()))
///     .build();
///
/// let ctx = RequestContext::new(RouteIdentifier::new("index", "user", "save"))
///     .with_background(true);
/// let response = pipeline
///     .dispatch(&ctx, |_ctx, jump| Err(jump.succeed("saved")))
///     .unwrap();
///
/// assert!(std::str::from_utf8(response.body()).unwrap().contains("\"code\":400"));
/// ```
pub struct Pipeline {
    config: Arc<PipelineConfig>,
    services: Services,
    stages: Vec<Box<dyn PipelineStage>>,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Creates a pipeline with default collaborators.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self::builder().config(config).build()
    }

    /// The configuration shared by every request.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The collaborators shared by every request.
    #[must_use]
    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Jump helpers bound to a request, for handler code.
    #[must_use]
    pub fn jump<'a>(&'a self, ctx: &'a RequestContext) -> Jump<'a> {
        Jump::new(ctx, &self.config, &self.services)
    }

    /// Runs every stage for a request.
    ///
    /// `Ok(())` means the handler should run next. An
    /// [`Interrupt::Terminate`] carries the request's final response; an
    /// [`Interrupt::Fatal`] aborts the request.
    pub fn run(&self, ctx: &RequestContext) -> Flow {
        let span = info_span!(
            "pipeline",
            request_id = %ctx.request_id(),
            route = ctx.route().key(),
        );
        let _guard = span.enter();

        let jump = self.jump(ctx);
        for stage in &self.stages {
            let name = stage.stage().name();
            if let Err(interrupt) = stage.run(ctx, &jump) {
                log_interrupt(name, ctx, &interrupt);
                return Err(interrupt);
            }
            debug!(stage = name, "stage passed");
        }
        debug!(elapsed_us = elapsed_us(ctx), "stages passed");
        Ok(())
    }

    /// Runs the stages and then the handler, producing the final response.
    ///
    /// A termination from any stage or from the handler becomes the
    /// response. Fatal errors are returned as `Err`.
    pub fn dispatch<F>(&self, ctx: &RequestContext, handler: F) -> PipelineResult<Response>
    where
        F: FnOnce(&RequestContext, &Jump<'_>) -> Flow<Response>,
    {
        if let Err(interrupt) = self.run(ctx) {
            return interrupt.into_response();
        }

        match handler(ctx, &self.jump(ctx)) {
            Ok(response) => Ok(response),
            Err(interrupt) => {
                let _guard = info_span!(
                    "handler",
                    request_id = %ctx.request_id(),
                    route = ctx.route().key(),
                )
                .entered();
                log_interrupt("handler", ctx, &interrupt);
                interrupt.into_response()
            }
        }
    }

    /// Returns the names of the active stages in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.stage().name()).collect()
    }

    /// Returns the number of active stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

fn log_interrupt(stage: &'static str, ctx: &RequestContext, interrupt: &Interrupt) {
    let elapsed_us = elapsed_us(ctx);
    match interrupt {
        Interrupt::Terminate(termination) => info!(
            stage,
            elapsed_us,
            status = termination.response().status().as_u16(),
            code = termination.envelope().map(|e| e.code),
            "request terminated"
        ),
        Interrupt::Fatal(err) => error!(stage, elapsed_us, error = %err, "request aborted"),
    }
}

fn elapsed_us(ctx: &RequestContext) -> u64 {
    u64::try_from(ctx.elapsed().as_micros()).unwrap_or(u64::MAX)
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .field("services", &self.services)
            .finish_non_exhaustive()
    }
}

/// Builder for constructing a [`Pipeline`].
///
/// Stages are fixed; the builder only supplies configuration and
/// collaborators.
pub struct PipelineBuilder {
    config: PipelineConfig,
    rule_sets: RuleSetRegistry,
    targets: TargetRegistry,
    cache: Arc<dyn ResponseCache>,
    renderer: Arc<dyn TemplateRenderer>,
    urls: Arc<dyn UrlBuilder>,
    translator: Arc<dyn Translator>,
}

impl PipelineBuilder {
    /// Creates a builder with the default configuration and collaborators.
    #[must_use]
    pub fn new() -> Self {
        let Services {
            cache,
            renderer,
            urls,
            translator,
            ..
        } = Services::default();

        Self {
            config: PipelineConfig::default(),
            rule_sets: RuleSetRegistry::new(),
            targets: TargetRegistry::new(),
            cache,
            renderer,
            urls,
            translator,
        }
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the rule-set registry.
    #[must_use]
    pub fn rule_sets(mut self, registry: RuleSetRegistry) -> Self {
        self.rule_sets = registry;
        self
    }

    /// Registers a named rule set.
    #[must_use]
    pub fn rule_set<R, F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        R: RuleSet + 'static,
        F: Fn() -> R + Send + Sync + 'static,
    {
        self.rule_sets.register(name, factory);
        self
    }

    /// Registers the convention rule set for a controller.
    #[must_use]
    pub fn convention_rule_set<R, F>(mut self, module: &str, controller: &str, factory: F) -> Self
    where
        R: RuleSet + 'static,
        F: Fn() -> R + Send + Sync + 'static,
    {
        self.rule_sets.register_convention(module, controller, factory);
        self
    }

    /// Replaces the middleware target registry.
    #[must_use]
    pub fn targets(mut self, registry: TargetRegistry) -> Self {
        self.targets = registry;
        self
    }

    /// Registers a named middleware target.
    #[must_use]
    pub fn target(mut self, name: impl Into<String>, target: impl MiddlewareTarget + 'static) -> Self {
        self.targets.register(name, target);
        self
    }

    /// Registers the convention middleware target for a controller.
    #[must_use]
    pub fn convention_target(
        mut self,
        module: &str,
        controller: &str,
        target: impl MiddlewareTarget + 'static,
    ) -> Self {
        self.targets.register_convention(module, controller, target);
        self
    }

    /// Sets the response-cache store.
    #[must_use]
    pub fn cache(mut self, cache: Arc<dyn ResponseCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Sets the template renderer.
    #[must_use]
    pub fn renderer(mut self, renderer: impl TemplateRenderer + 'static) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }

    /// Sets the URL builder.
    #[must_use]
    pub fn urls(mut self, urls: impl UrlBuilder + 'static) -> Self {
        self.urls = Arc::new(urls);
        self
    }

    /// Sets the translator.
    #[must_use]
    pub fn translator(mut self, translator: impl Translator + 'static) -> Self {
        self.translator = Arc::new(translator);
        self
    }

    /// Builds the pipeline.
    ///
    /// The response-cache stage is left out when `[cache] enabled = false`.
    #[must_use]
    pub fn build(self) -> Pipeline {
        let mut stages: Vec<Box<dyn PipelineStage>> =
            vec![Box::new(ValidationStage), Box::new(MiddlewareStage)];
        if self.config.cache.enabled {
            stages.push(Box::new(ResponseCacheStage));
        } else {
            debug!("response cache disabled");
        }

        Pipeline {
            config: Arc::new(self.config),
            services: Services {
                rule_sets: Arc::new(self.rule_sets),
                targets: Arc::new(self.targets),
                cache: self.cache,
                renderer: self.renderer,
                urls: self.urls,
                translator: self.translator,
            },
            stages,
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Pipeline stage marker.
///
/// This enum represents the fixed order of the stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Stage {
    /// Stage 1: Parameter validation
    Validation = 1,
    /// Stage 2: Before-action middleware
    Middleware = 2,
    /// Stage 3: Response cache lookup
    ResponseCache = 3,
}

impl Stage {
    /// Returns the stage name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Middleware => "middleware",
            Self::ResponseCache => "response_cache",
        }
    }

    /// Returns all stages in order.
    #[must_use]
    pub const fn all() -> [Stage; 3] {
        [Self::Validation, Self::Middleware, Self::ResponseCache]
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FnTarget;
    use bytes::Bytes;
    use http::StatusCode;
    use turnstile_config::{CacheConfig, MiddlewareRule};
    use turnstile_core::{ConfigurationError, RouteIdentifier, TargetKind};

    fn ctx() -> RequestContext {
        RequestContext::new(RouteIdentifier::new("index", "user", "home")).with_background(true)
    }

    fn ok_response() -> Response {
        http::Response::builder()
            .status(StatusCode::OK)
            .body(Bytes::from_static(b"handler"))
            .unwrap()
    }

    #[test]
    fn test_stage_order() {
        let stages = Stage::all();
        assert_eq!(stages[0], Stage::Validation);
        assert_eq!(stages[2].name(), "response_cache");
        assert!(Stage::Validation < Stage::Middleware);
        assert!(Stage::Middleware < Stage::ResponseCache);
    }

    #[test]
    fn test_default_pipeline_has_all_stages() {
        let pipeline = Pipeline::new(PipelineConfig::default());
        assert_eq!(
            pipeline.stage_names(),
            vec!["validation", "middleware", "response_cache"]
        );
    }

    #[test]
    fn test_disabled_cache_drops_stage() {
        let config = PipelineConfig::builder()
            .cache(CacheConfig { enabled: false })
            .build();
        let pipeline = Pipeline::new(config);
        assert_eq!(pipeline.stage_count(), 2);
        assert!(!pipeline.stage_names().contains(&"response_cache"));
    }

    #[test]
    fn test_elapsed_is_measured_from_context_creation() {
        let ctx = ctx();
        std::thread::sleep(std::time::Duration::from_millis(1));
        let pipeline = Pipeline::builder().build();
        assert!(pipeline.run(&ctx).is_ok());
        assert!(elapsed_us(&ctx) >= 1_000);
    }

    #[test]
    fn test_dispatch_runs_handler_when_nothing_terminates() {
        let pipeline = Pipeline::new(PipelineConfig::default());
        let response = pipeline.dispatch(&ctx(), |_, _| Ok(ok_response())).unwrap();
        assert_eq!(response.body().as_ref(), b"handler");
    }

    #[test]
    fn test_handler_termination_becomes_response() {
        let pipeline = Pipeline::new(PipelineConfig::default());
        let response = pipeline
            .dispatch(&ctx(), |_, jump| Err(jump.respond_data(serde_json::json!([]), 1, "ok")))
            .unwrap();
        assert!(std::str::from_utf8(response.body()).unwrap().contains("\"msg\":\"ok\""));
    }

    #[test]
    fn test_fatal_error_propagates() {
        let pipeline = Pipeline::new(PipelineConfig::default());
        let err = pipeline
            .dispatch(&ctx(), |ctx, _| {
                Err(ConfigurationError::new(TargetKind::Middleware, "x", ctx.route().key()).into())
            })
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_termination_stops_later_stages() {
        let config = PipelineConfig::builder()
            .before("index/user/home", MiddlewareRule::new("gate", "before"))
            .build();
        let pipeline = Pipeline::builder()
            .config(config)
            .target(
                "gate",
                FnTarget::new().method("before", |_, jump| Err(jump.redirect("/login", 302))),
            )
            .build();

        let mut handler_ran = false;
        let response = pipeline
            .dispatch(&ctx(), |_, _| {
                handler_ran = true;
                Ok(ok_response())
            })
            .unwrap();

        assert!(!handler_ran);
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[http::header::LOCATION], "/login");
    }
}
