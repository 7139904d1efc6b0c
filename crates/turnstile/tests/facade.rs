//! Startup through the facade: config text to a dispatched request.

use bytes::Bytes;
use serde_json::json;
use turnstile::prelude::*;

const CONFIG: &str = r#"
[response]
default_ajax_return = "json"

[middleware.before]
"index/user/profile" = ["auth", "check"]

[code]
"401" = "login required"

[logging]
enabled = false
"#;

fn load() -> PipelineConfig {
    ConfigLoader::new()
        .with_defaults()
        .with_string(CONFIG, "toml")
        .unwrap()
        .load()
        .unwrap()
}

fn pipeline() -> Pipeline {
    turnstile::init(load())
        .unwrap()
        .target(
            "auth",
            FnTarget::new().method("check", |ctx, jump| match ctx.param("token") {
                Some(_) => Ok(()),
                None => Err(jump.fail_with_code(401, "")),
            }),
        )
        .build()
}

#[test]
fn test_init_rejects_invalid_config() {
    let mut config = load();
    config.code.insert("abc".to_string(), "x".to_string());
    assert!(matches!(
        turnstile::init(config),
        Err(TurnstileError::Config(_))
    ));
}

#[test]
fn test_configured_middleware_rejects_anonymous_request() {
    let ctx = RequestContext::new(RouteIdentifier::new("index", "user", "profile"))
        .with_background(true);

    let response = pipeline()
        .dispatch(&ctx, |_, _| unreachable!("handler must not run"))
        .unwrap();
    let envelope = ResponseEnvelope::from_json(response.body()).unwrap();
    assert_eq!(envelope.code, 401);
    assert_eq!(envelope.msg, "login required");
}

#[test]
fn test_authorized_request_reaches_handler() {
    let ctx = RequestContext::new(RouteIdentifier::new("index", "user", "profile"))
        .with_background(true)
        .with_param("token", json!("t0k3n"));

    let response = pipeline()
        .dispatch(&ctx, |_, _| {
            Ok(http::Response::new(Bytes::from_static(b"profile page")))
        })
        .unwrap();
    assert_eq!(response.body().as_ref(), b"profile page");
}
