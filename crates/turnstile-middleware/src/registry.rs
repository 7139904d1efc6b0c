//! Rule-set and middleware-target registries.
//!
//! Targets are registered once at startup under two kinds of key:
//!
//! - a **name**, referenced by explicit `[validate]` / `[middleware.before]`
//!   configuration entries
//! - a **convention** `(module, controller)` pair, consulted when a route has
//!   no explicit entry
//!
//! A missing name is a deployment defect; a missing convention pair simply
//! means nothing is configured for that controller.

use crate::jump::Jump;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use turnstile_core::{Flow, Params, RequestContext, RouteIdentifier};

/// A set of validation rules over request parameters.
///
/// Created fresh for every request, so implementations may keep the last
/// error message in `self`.
pub trait RuleSet {
    /// Returns true if the rule set declares a scene with this name.
    fn has_scene(&self, scene: &str) -> bool;

    /// Runs every rule. Returns false if the parameters are invalid.
    fn check(&mut self, params: &Params) -> bool;

    /// Runs only the rules of one scene. Returns false if the parameters
    /// are invalid.
    fn check_scene(&mut self, scene: &str, params: &Params) -> bool;

    /// The message describing the most recent failure.
    fn last_error(&self) -> String;
}

/// Creates a fresh rule set for one request.
pub type RuleSetFactory = Arc<dyn Fn() -> Box<dyn RuleSet> + Send + Sync>;

type ConventionKey = (String, String);

fn convention_key(module: &str, controller: &str) -> ConventionKey {
    (module.to_lowercase(), controller.to_lowercase())
}

/// Rule sets by name and by `(module, controller)`.
///
/// # Example
///
/// ```
/// use turnstile_core::{Params, RouteIdentifier};
/// use turnstile_middleware::{RuleSet, RuleSetRegistry};
///
/// struct AcceptAll;
///
/// impl RuleSet for AcceptAll {
///     fn has_scene(&self, _scene: &str) -> bool { false }
///     fn check(&mut self, _params: &Params) -> bool { true }
///     fn check_scene(&mut self, _scene: &str, _params: &Params) -> bool { true }
///     fn last_error(&self) -> String { String::new() }
/// }
///
/// let mut registry = RuleSetRegistry::new();
/// registry.register("user", || AcceptAll);
/// registry.register_convention("index", "user", || AcceptAll);
///
/// assert!(registry.resolve("user").is_some());
/// assert!(registry.resolve_convention(&RouteIdentifier::new("index", "user", "login")).is_some());
/// assert!(registry.resolve_convention(&RouteIdentifier::new("admin", "user", "login")).is_none());
/// ```
#[derive(Default)]
pub struct RuleSetRegistry {
    named: HashMap<String, RuleSetFactory>,
    conventions: HashMap<ConventionKey, RuleSetFactory>,
}

impl RuleSetRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a rule set under a name used by explicit configuration.
    pub fn register<R, F>(&mut self, name: impl Into<String>, factory: F)
    where
        R: RuleSet + 'static,
        F: Fn() -> R + Send + Sync + 'static,
    {
        self.named.insert(name.into(), boxed(factory));
    }

    /// Registers the convention rule set for a controller.
    pub fn register_convention<R, F>(&mut self, module: &str, controller: &str, factory: F)
    where
        R: RuleSet + 'static,
        F: Fn() -> R + Send + Sync + 'static,
    {
        self.conventions
            .insert(convention_key(module, controller), boxed(factory));
    }

    /// Instantiates the rule set registered under `name`.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<Box<dyn RuleSet>> {
        self.named.get(name).map(|factory| factory())
    }

    /// Instantiates the convention rule set for a route's controller.
    #[must_use]
    pub fn resolve_convention(&self, route: &RouteIdentifier) -> Option<Box<dyn RuleSet>> {
        self.conventions
            .get(&convention_key(route.module(), route.controller()))
            .map(|factory| factory())
    }
}

fn boxed<R, F>(factory: F) -> RuleSetFactory
where
    R: RuleSet + 'static,
    F: Fn() -> R + Send + Sync + 'static,
{
    Arc::new(move || Box::new(factory()) as Box<dyn RuleSet>)
}

impl fmt::Debug for RuleSetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSetRegistry")
            .field("named", &self.named.keys().collect::<Vec<_>>())
            .field("conventions", &self.conventions.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A middleware object exposing named methods.
pub trait MiddlewareTarget: Send + Sync {
    /// Invokes `method` for the current request.
    ///
    /// Returns `None` if the target has no such method. Otherwise the hook
    /// either lets the request continue with `Ok(())` or stops it by
    /// returning an interrupt built with `jump`.
    fn call(&self, method: &str, ctx: &RequestContext, jump: &Jump<'_>) -> Option<Flow>;
}

/// A hook method.
pub type HookFn = Arc<dyn Fn(&RequestContext, &Jump<'_>) -> Flow + Send + Sync>;

/// A middleware target assembled from closures.
///
/// # Example
///
/// ```
/// use turnstile_middleware::FnTarget;
///
/// let auth = FnTarget::new()
///     .method("before", |_ctx, _jump| Ok(()))
///     .method("check", |ctx, jump| {
///         if ctx.param("token").is_none() {
///             return Err(jump.fail("login required"));
///         }
///         Ok(())
///     });
///
/// assert!(auth.has_method("check"));
/// ```
#[derive(Clone, Default)]
pub struct FnTarget {
    methods: IndexMap<String, HookFn>,
}

impl FnTarget {
    /// Creates a target with no methods.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a method.
    #[must_use]
    pub fn method<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&RequestContext, &Jump<'_>) -> Flow + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Arc::new(hook));
        self
    }

    /// Returns true if a method with this name exists.
    #[must_use]
    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }
}

impl MiddlewareTarget for FnTarget {
    fn call(&self, method: &str, ctx: &RequestContext, jump: &Jump<'_>) -> Option<Flow> {
        self.methods.get(method).map(|hook| hook(ctx, jump))
    }
}

impl fmt::Debug for FnTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTarget")
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Middleware targets by name and by `(module, controller)`.
#[derive(Default)]
pub struct TargetRegistry {
    named: HashMap<String, Arc<dyn MiddlewareTarget>>,
    conventions: HashMap<ConventionKey, Arc<dyn MiddlewareTarget>>,
}

impl TargetRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a target under a name used by explicit configuration.
    pub fn register(&mut self, name: impl Into<String>, target: impl MiddlewareTarget + 'static) {
        self.named.insert(name.into(), Arc::new(target));
    }

    /// Registers the convention target for a controller.
    pub fn register_convention(
        &mut self,
        module: &str,
        controller: &str,
        target: impl MiddlewareTarget + 'static,
    ) {
        self.conventions
            .insert(convention_key(module, controller), Arc::new(target));
    }

    /// Returns the target registered under `name`.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&dyn MiddlewareTarget> {
        self.named.get(name).map(|target| &**target)
    }

    /// Returns the convention target for a route's controller.
    #[must_use]
    pub fn resolve_convention(&self, route: &RouteIdentifier) -> Option<&dyn MiddlewareTarget> {
        self.conventions
            .get(&convention_key(route.module(), route.controller()))
            .map(|target| &**target)
    }
}

impl fmt::Debug for TargetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetRegistry")
            .field("named", &self.named.keys().collect::<Vec<_>>())
            .field("conventions", &self.conventions.keys().collect::<Vec<_>>())
            .finish()
    }
}
