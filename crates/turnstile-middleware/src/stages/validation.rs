//! Parameter validation.
//!
//! Resolution order for a route `m/c/a`:
//!
//! 1. An explicit `[validate]` entry for `m/c/a` names a registered rule set
//!    and optionally a scene. An unregistered name is a configuration error.
//! 2. Otherwise the rule set registered by convention for `(m, c)` is used,
//!    with the action name as the scene.
//! 3. Otherwise nothing is validated.
//!
//! A scene the rule set does not declare falls back to the full check.
//! Invalid parameters stop the request with a code-400 raw response carrying
//! the rule set's error message.

use crate::jump::Jump;
use crate::pipeline::{PipelineStage, Stage};
use tracing::{debug, error, warn};
use turnstile_core::{ConfigurationError, Flow, RequestContext, TargetKind};

/// Result code of a validation failure.
pub const VALIDATION_FAILED: i64 = 400;

/// Validates request parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationStage;

impl PipelineStage for ValidationStage {
    fn stage(&self) -> Stage {
        Stage::Validation
    }

    fn run(&self, ctx: &RequestContext, jump: &Jump<'_>) -> Flow {
        let route = ctx.route();
        let rule_sets = jump.services().rule_sets();

        let (mut rules, scene) = if let Some(rule) = jump.config().validation_rule(route.key()) {
            let Some(rules) = rule_sets.resolve(&rule.rule_set) else {
                error!(rule_set = %rule.rule_set, "configured rule set is not registered");
                return Err(
                    ConfigurationError::new(TargetKind::RuleSet, &rule.rule_set, route.key())
                        .into(),
                );
            };
            (rules, rule.scene.as_deref())
        } else if let Some(rules) = rule_sets.resolve_convention(route) {
            (rules, Some(route.action()))
        } else {
            debug!("no validation configured");
            return Ok(());
        };

        let valid = match scene {
            Some(scene) if rules.has_scene(scene) => {
                debug!(scene, "checking scene");
                rules.check_scene(scene, ctx.params())
            }
            _ => rules.check(ctx.params()),
        };
        if valid {
            return Ok(());
        }

        let message = rules.last_error();
        warn!(error = %message, "validation failed");
        Err(jump.fail_with_code(VALIDATION_FAILED, &message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RuleSet;
    use crate::services::Services;
    use std::sync::{Arc, Mutex};
    use turnstile_config::{PipelineConfig, ValidateRule};
    use turnstile_core::{Params, RouteIdentifier};

    type Log = Arc<Mutex<Vec<String>>>;

    struct Recording {
        scenes: Vec<&'static str>,
        valid: bool,
        log: Log,
    }

    impl RuleSet for Recording {
        fn has_scene(&self, scene: &str) -> bool {
            self.scenes.contains(&scene)
        }

        fn check(&mut self, _params: &Params) -> bool {
            self.log.lock().unwrap().push("full".to_string());
            self.valid
        }

        fn check_scene(&mut self, scene: &str, _params: &Params) -> bool {
            self.log.lock().unwrap().push(format!("scene:{scene}"));
            self.valid
        }

        fn last_error(&self) -> String {
            "name required".to_string()
        }
    }

    fn services(valid: bool, log: &Log) -> Services {
        let mut services = Services::default();
        let mut registry = crate::registry::RuleSetRegistry::new();
        let (named, convention) = (log.clone(), log.clone());
        registry.register("user", move || Recording {
            scenes: vec!["login"],
            valid,
            log: named.clone(),
        });
        registry.register_convention("index", "user", move || Recording {
            scenes: vec!["login"],
            valid,
            log: convention.clone(),
        });
        services.rule_sets = Arc::new(registry);
        services
    }

    fn run(config: &PipelineConfig, services: &Services, action: &str) -> Flow {
        let ctx = RequestContext::new(RouteIdentifier::new("index", "user", action))
            .with_background(true);
        ValidationStage.run(&ctx, &Jump::new(&ctx, config, services))
    }

    #[test]
    fn test_explicit_scene_runs_scene_check() {
        let log = Log::default();
        let config = PipelineConfig::builder()
            .validate("index/user/save", ValidateRule::new("user").scene("login"))
            .build();

        assert!(run(&config, &services(true, &log), "save").is_ok());
        assert_eq!(*log.lock().unwrap(), vec!["scene:login"]);
    }

    #[test]
    fn test_unknown_scene_falls_back_to_full_check() {
        let log = Log::default();
        let config = PipelineConfig::builder()
            .validate("index/user/save", ValidateRule::new("user").scene("missing"))
            .build();

        assert!(run(&config, &services(true, &log), "save").is_ok());
        assert_eq!(*log.lock().unwrap(), vec!["full"]);
    }

    #[test]
    fn test_convention_uses_action_as_scene() {
        let log = Log::default();
        let config = PipelineConfig::default();
        let services = services(true, &log);

        assert!(run(&config, &services, "login").is_ok());
        assert!(run(&config, &services, "logout").is_ok());
        assert_eq!(*log.lock().unwrap(), vec!["scene:login", "full"]);
    }

    #[test]
    fn test_failure_returns_400() {
        let log = Log::default();
        let config = PipelineConfig::default();

        let interrupt = run(&config, &services(false, &log), "login").unwrap_err();
        let envelope = interrupt.termination().unwrap().envelope().unwrap();
        assert_eq!(envelope.code, 400);
        assert_eq!(envelope.msg, "name required");
    }

    #[test]
    fn test_unregistered_rule_set_is_fatal() {
        let config = PipelineConfig::builder()
            .validate("index/user/save", ValidateRule::new("ghost"))
            .build();

        let interrupt = run(&config, &Services::default(), "save").unwrap_err();
        let error = interrupt.error().unwrap();
        assert!(error.is_configuration());
        assert!(error.to_string().contains("rule set class not found: ghost"));
    }

    #[test]
    fn test_nothing_configured_is_a_no_op() {
        assert!(run(&PipelineConfig::default(), &Services::default(), "save").is_ok());
    }
}
