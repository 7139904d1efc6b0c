//! Jump helpers.
//!
//! Each helper builds a complete response and hands it back wrapped in an
//! [`Interrupt`]. Returning that interrupt through a [`Flow`] stops the
//! request: the dispatcher skips every remaining stage and the handler, and
//! sends the carried response as is.
//!
//! | Helper | Envelope | Default code | Format |
//! |---|---|---|---|
//! | [`Jump::succeed`] | `code, msg, data, url, wait` | 1 | negotiated, HTML via template |
//! | [`Jump::fail`] | `code, msg, data, url, wait` | 0 | negotiated, HTML via template |
//! | [`Jump::respond_data`] | `code, msg, time, data` | caller's | negotiated |
//! | [`Jump::respond_raw`] | `code, msg, time, data` (stringified) | 200 | background |
//! | [`Jump::redirect`] | none, `Location` header | 302 | none |
//!
//! # Example
//!
//! ```
//! use turnstile_core::{Flow, RequestContext};
//! use turnstile_middleware::Jump;
//!
//! fn save(ctx: &RequestContext, jump: &Jump<'_>) -> Flow {
//!     if ctx.param("title").is_none() {
//!         return Err(jump.fail("title is required"));
//!     }
//!     Err(jump.succeed("saved"))
//! }
//! ```
//!
//! [`Flow`]: turnstile_core::Flow

use crate::normalize::stringify_data;
use crate::services::Services;
use bytes::Bytes;
use http::header::{CONTENT_TYPE, LOCATION};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};
use turnstile_config::PipelineConfig;
use turnstile_core::{
    Interrupt, Params, Payload, PipelineError, PipelineResult, RedirectTarget, RequestContext,
    Response, ResponseEnvelope, ResponseFormat, Termination,
};

const HISTORY_BACK: &str = "javascript:history.back(-1);";

/// A helper message: text to localize, or a bare result code.
///
/// Integers, and strings that parse as integers (`"42"`, `" -3 "`), become
/// the envelope code with an empty message. Envelope codes are integral, so
/// decimal or exponent strings such as `"2.5"` or `"1e3"` stay message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Message text, localized before use.
    Text(String),
    /// A result code standing in for the message.
    Code(i64),
}

impl Message {
    /// Splits into `(code, text)`, using `default_code` for plain text.
    #[must_use]
    pub fn into_parts(self, default_code: i64) -> (i64, String) {
        match self {
            Self::Code(code) => (code, String::new()),
            Self::Text(text) => match text.trim().parse::<i64>() {
                Ok(code) => (code, String::new()),
                Err(_) => (default_code, text),
            },
        }
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<i64> for Message {
    fn from(code: i64) -> Self {
        Self::Code(code)
    }
}

impl From<i32> for Message {
    fn from(code: i32) -> Self {
        Self::Code(i64::from(code))
    }
}

/// Optional arguments of [`Jump::succeed_with`] and [`Jump::fail_with`].
#[derive(Debug, Clone, Default)]
pub struct JumpOptions {
    url: Option<String>,
    data: Option<Value>,
    wait: Option<u64>,
}

impl JumpOptions {
    /// No url, empty data, configured wait.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Target url. An empty string keeps the url empty.
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Envelope data.
    #[must_use]
    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Seconds before the jump page follows the url.
    #[must_use]
    pub fn wait(mut self, seconds: u64) -> Self {
        self.wait = Some(seconds);
        self
    }
}

/// Second argument of [`Jump::redirect`]: query parameters, or a status
/// code in their place.
#[derive(Debug, Clone, PartialEq)]
pub enum RedirectParams {
    /// Query parameters appended to the target.
    Query(Params),
    /// Redirect status code; the query stays empty.
    Code(u16),
}

impl Default for RedirectParams {
    fn default() -> Self {
        Self::Query(Params::new())
    }
}

impl From<Params> for RedirectParams {
    fn from(params: Params) -> Self {
        Self::Query(params)
    }
}

impl From<u16> for RedirectParams {
    fn from(code: u16) -> Self {
        Self::Code(code)
    }
}

impl From<i32> for RedirectParams {
    fn from(code: i32) -> Self {
        // Out-of-range codes are rejected later and fall back to 302.
        Self::Code(u16::try_from(code).unwrap_or_default())
    }
}

/// Response builder bound to one request.
///
/// Cheap to clone. [`format`](Self::format) and [`header`](Self::header)
/// return a modified copy for a single call:
///
/// ```ignore
/// Err(jump.clone().format(ResponseFormat::Json).header(CACHE_CONTROL, no_store).succeed("ok"))
/// ```
#[derive(Debug, Clone)]
pub struct Jump<'a> {
    ctx: &'a RequestContext,
    config: &'a PipelineConfig,
    services: &'a Services,
    format: Option<ResponseFormat>,
    headers: HeaderMap,
}

impl<'a> Jump<'a> {
    /// Binds the helpers to a request.
    #[must_use]
    pub fn new(ctx: &'a RequestContext, config: &'a PipelineConfig, services: &'a Services) -> Self {
        Self {
            ctx,
            config,
            services,
            format: None,
            headers: HeaderMap::new(),
        }
    }

    /// Forces the output format for responses built from this copy.
    #[must_use]
    pub fn format(mut self, format: ResponseFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Adds a header to responses built from this copy.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Adds several headers to responses built from this copy.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    /// The request being answered.
    #[must_use]
    pub fn context(&self) -> &'a RequestContext {
        self.ctx
    }

    /// The pipeline configuration.
    #[must_use]
    pub fn config(&self) -> &'a PipelineConfig {
        self.config
    }

    /// The collaborators.
    #[must_use]
    pub fn services(&self) -> &'a Services {
        self.services
    }

    /// The output format for envelope responses.
    ///
    /// A per-call format wins, then the context's override, then the
    /// configured default for background or interactive calls.
    #[must_use]
    pub fn negotiated_format(&self) -> ResponseFormat {
        self.format
            .or_else(|| self.ctx.format_override())
            .unwrap_or_else(|| self.config.response.format_for(self.ctx.is_background()))
    }

    // Raw responses ignore the interactive default.
    fn raw_format(&self) -> ResponseFormat {
        self.format
            .or_else(|| self.ctx.format_override())
            .unwrap_or(self.config.response.default_ajax_return)
    }

    /// Localizes a message. Empty input stays empty, as does a lookup that
    /// yields no text.
    #[must_use]
    pub fn localize(&self, message: &str) -> String {
        if message.is_empty() {
            return String::new();
        }
        self.services
            .translator()
            .translate(message)
            .unwrap_or_default()
    }

    /// Success jump with default options.
    #[must_use]
    pub fn succeed(&self, message: impl Into<Message>) -> Interrupt {
        self.succeed_with(message, JumpOptions::new())
    }

    /// Success jump.
    ///
    /// Code 1 unless the message is numeric. Without a url the referer is
    /// used, or the URL builder's root when there is none.
    #[must_use]
    pub fn succeed_with(&self, message: impl Into<Message>, options: JumpOptions) -> Interrupt {
        let (code, msg) = message.into().into_parts(1);
        let url = match options.url.as_deref() {
            None => self
                .ctx
                .referer()
                .map_or_else(|| self.services.urls().build(""), str::to_string),
            Some(url) => self.resolve_url(url),
        };
        let template = self.config.response.success_template.as_str();
        interrupt(self.jump_termination(code, &msg, url, options, template))
    }

    /// Failure jump with default options.
    #[must_use]
    pub fn fail(&self, message: impl Into<Message>) -> Interrupt {
        self.fail_with(message, JumpOptions::new())
    }

    /// Failure jump.
    ///
    /// Code 0 unless the message is numeric. Without a url, background
    /// calls get an empty url and interactive calls a history-back link.
    #[must_use]
    pub fn fail_with(&self, message: impl Into<Message>, options: JumpOptions) -> Interrupt {
        let (code, msg) = message.into().into_parts(0);
        let url = match options.url.as_deref() {
            None if self.ctx.is_background() => String::new(),
            None => HISTORY_BACK.to_string(),
            Some(url) => self.resolve_url(url),
        };
        let template = self.config.response.error_template.as_str();
        interrupt(self.jump_termination(code, &msg, url, options, template))
    }

    /// Redirect with status 302 and no carry-over data.
    ///
    /// `params` is either a query map or a status code:
    ///
    /// ```ignore
    /// Err(jump.redirect("/home", 301))
    /// ```
    #[must_use]
    pub fn redirect(&self, url: &str, params: impl Into<RedirectParams>) -> Interrupt {
        self.redirect_with(url, params, 302, Params::new())
    }

    /// Redirect.
    ///
    /// A code passed as `params` replaces `code`. Codes outside 3xx fall
    /// back to 302. `with` rides on the termination for the dispatcher to
    /// carry into the next request.
    #[must_use]
    pub fn redirect_with(
        &self,
        url: &str,
        params: impl Into<RedirectParams>,
        code: u16,
        with: Params,
    ) -> Interrupt {
        let (params, code) = match params.into() {
            RedirectParams::Code(code) => (Params::new(), code),
            RedirectParams::Query(params) => (params, code),
        };
        let status = match StatusCode::from_u16(code) {
            Ok(status) if status.is_redirection() => status,
            _ => {
                warn!(code, "redirect code is not 3xx; using 302");
                StatusCode::FOUND
            }
        };

        let location = self.redirect_location(url, &params);
        debug!(%location, status = status.as_u16(), "redirect built");

        interrupt(
            self.build_response(status, LOCATION, &location, Bytes::new())
                .map(|response| {
                    let target = RedirectTarget {
                        location,
                        status,
                        with,
                    };
                    Termination::new(response, Payload::Redirect(target))
                }),
        )
    }

    /// Data response stamped with the request time.
    #[must_use]
    pub fn respond_data(&self, data: Value, code: i64, message: &str) -> Interrupt {
        let envelope = ResponseEnvelope::build(code, self.localize(message), data, None, None)
            .with_time(self.ctx.request_time().timestamp());
        let format = data_format(self.negotiated_format());
        interrupt(self.envelope_termination(envelope, format))
    }

    /// Error response with empty data. See [`respond_raw`](Self::respond_raw).
    #[must_use]
    pub fn fail_with_code(&self, code: i64, message: &str) -> Interrupt {
        self.respond_raw(Value::Array(Vec::new()), code, Some(message))
    }

    /// Raw response in the background format.
    ///
    /// Without a message, code 200 says `success`. Any other code without
    /// a message takes its text from the `[code]` table, or stays empty.
    /// Scalars in `data` are stringified.
    #[must_use]
    pub fn respond_raw(&self, data: Value, code: i64, message: Option<&str>) -> Interrupt {
        let message = match message {
            Some(text) if !text.is_empty() => text.to_string(),
            _ if code != 200 => self
                .config
                .code_message(code)
                .unwrap_or_default()
                .to_string(),
            None => "success".to_string(),
            Some(_) => String::new(),
        };

        let envelope = ResponseEnvelope::build(
            code,
            self.localize(&message),
            stringify_data(data),
            None,
            None,
        )
        .with_time(self.ctx.request_time().timestamp());
        let format = data_format(self.raw_format());
        interrupt(self.envelope_termination(envelope, format))
    }

    /// Emits a previously serialized body unchanged.
    #[must_use]
    pub fn respond_cached(&self, body: Bytes) -> Interrupt {
        let format = data_format(self.raw_format());
        interrupt(
            self.build_response(StatusCode::OK, CONTENT_TYPE, format.content_type(), body)
                .map(|response| Termination::new(response, Payload::Cached)),
        )
    }

    fn jump_termination(
        &self,
        code: i64,
        msg: &str,
        url: String,
        options: JumpOptions,
        template: &str,
    ) -> PipelineResult<Termination> {
        let envelope = ResponseEnvelope::build(
            code,
            self.localize(msg),
            options
                .data
                .unwrap_or_else(|| Value::String(String::new())),
            Some(url),
            Some(options.wait.unwrap_or(self.config.response.default_wait)),
        );

        let format = self.negotiated_format();
        if format != ResponseFormat::Html {
            return self.envelope_termination(envelope, format);
        }

        let page = self
            .services
            .renderer()
            .render(template, &envelope)
            .map_err(|source| PipelineError::render(template, source))?;
        let response = self.build_response(
            StatusCode::OK,
            CONTENT_TYPE,
            format.content_type(),
            Bytes::from(page),
        )?;
        debug!(code, template, "jump page rendered");
        Ok(Termination::new(response, Payload::Envelope(envelope)))
    }

    fn envelope_termination(
        &self,
        envelope: ResponseEnvelope,
        format: ResponseFormat,
    ) -> PipelineResult<Termination> {
        let json = envelope.to_json()?;
        let body = match format {
            ResponseFormat::Jsonp => format!("{}({json});", self.jsonp_callback()),
            ResponseFormat::Json | ResponseFormat::Html => json,
        };
        let response = self.build_response(
            StatusCode::OK,
            CONTENT_TYPE,
            format.content_type(),
            Bytes::from(body),
        )?;
        debug!(code = envelope.code, %format, "envelope serialized");
        Ok(Termination::new(response, Payload::Envelope(envelope)))
    }

    fn build_response(
        &self,
        status: StatusCode,
        name: HeaderName,
        value: &str,
        body: Bytes,
    ) -> PipelineResult<Response> {
        let mut response = http::Response::builder()
            .status(status)
            .header(name, value)
            .body(body)?;
        response.headers_mut().extend(self.headers.clone());
        Ok(response)
    }

    // The request may name its own callback; anything that is not a plain
    // identifier path falls back to the configured handler.
    fn jsonp_callback(&self) -> &str {
        self.ctx
            .param(&self.config.response.jsonp_callback_param)
            .and_then(Value::as_str)
            .filter(|name| is_callback_name(name))
            .unwrap_or(self.config.response.jsonp_handler.as_str())
    }

    fn resolve_url(&self, url: &str) -> String {
        if url.is_empty() || is_absolute(url) {
            url.to_string()
        } else {
            self.services.urls().build(url)
        }
    }

    fn redirect_location(&self, url: &str, params: &Params) -> String {
        let base = if is_absolute(url) {
            url.to_string()
        } else {
            self.services.urls().build(url)
        };
        if params.is_empty() {
            return base;
        }

        let query = params
            .iter()
            .map(|(name, value)| {
                format!(
                    "{}={}",
                    urlencoding::encode(name),
                    urlencoding::encode(&query_value(value))
                )
            })
            .collect::<Vec<_>>()
            .join("&");
        let separator = if base.contains('?') { '&' } else { '?' };
        format!("{base}{separator}{query}")
    }
}

fn interrupt(result: PipelineResult<Termination>) -> Interrupt {
    match result {
        Ok(termination) => Interrupt::terminate(termination),
        Err(error) => Interrupt::Fatal(error),
    }
}

// Data envelopes are never templated.
fn data_format(format: ResponseFormat) -> ResponseFormat {
    match format {
        ResponseFormat::Html => ResponseFormat::Json,
        other => other,
    }
}

fn is_absolute(url: &str) -> bool {
    url.contains("://") || url.starts_with('/')
}

fn is_callback_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '.'))
}

fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{MapTranslator, TemplateRenderer, Translator};
    use chrono::{TimeZone, Utc};
    use http::header::CACHE_CONTROL;
    use serde_json::json;
    use std::sync::Arc;
    use turnstile_core::RouteIdentifier;

    fn ctx() -> RequestContext {
        RequestContext::new(RouteIdentifier::new("index", "user", "save"))
    }

    fn ajax() -> RequestContext {
        ctx().with_background(true)
    }

    fn body(interrupt: &Interrupt) -> String {
        let response = interrupt.termination().unwrap().response();
        String::from_utf8(response.body().to_vec()).unwrap()
    }

    fn envelope(interrupt: &Interrupt) -> &ResponseEnvelope {
        interrupt.termination().unwrap().envelope().unwrap()
    }

    fn content_type(interrupt: &Interrupt) -> &str {
        interrupt.termination().unwrap().response().headers()[CONTENT_TYPE]
            .to_str()
            .unwrap()
    }

    #[test]
    fn test_numeric_message_becomes_code() {
        let (config, services) = (PipelineConfig::default(), Services::default());
        let ctx = ajax();
        let jump = Jump::new(&ctx, &config, &services);

        let result = jump.succeed(42);
        assert_eq!(envelope(&result).code, 42);
        assert_eq!(envelope(&result).msg, "");

        let result = jump.fail("17");
        assert_eq!(envelope(&result).code, 17);
        assert_eq!(envelope(&result).msg, "");
    }

    #[test]
    fn test_decimal_message_stays_text() {
        assert_eq!(Message::from("2.5").into_parts(1), (1, "2.5".to_string()));
        assert_eq!(Message::from("1e3").into_parts(0), (0, "1e3".to_string()));
        assert_eq!(Message::from(" -3 ").into_parts(1), (-3, String::new()));
    }

    #[test]
    fn test_succeed_localizes_message() {
        let config = PipelineConfig::default();
        let services = Services {
            translator: Arc::new(MapTranslator::new().with("done", "Fertig")),
            ..Services::default()
        };
        let ctx = ajax();
        let jump = Jump::new(&ctx, &config, &services);

        let result = jump.succeed("done");
        assert_eq!(envelope(&result).code, 1);
        assert_eq!(envelope(&result).msg, "Fertig");
        assert_eq!(envelope(&result).data, json!(""));
        assert_eq!(envelope(&result).wait, Some(3));
    }

    #[test]
    fn test_non_text_translation_becomes_empty() {
        struct Opaque;
        impl Translator for Opaque {
            fn translate(&self, _key: &str) -> Option<String> {
                None
            }
        }

        let config = PipelineConfig::default();
        let services = Services {
            translator: Arc::new(Opaque),
            ..Services::default()
        };
        let ctx = ajax();
        let jump = Jump::new(&ctx, &config, &services);

        assert_eq!(envelope(&jump.succeed("done")).msg, "");
    }

    #[test]
    fn test_succeed_url_resolution() {
        let (config, services) = (PipelineConfig::default(), Services::default());

        let with_referer = ajax().with_referer("https://example.com/list");
        let jump = Jump::new(&with_referer, &config, &services);
        assert_eq!(
            envelope(&jump.succeed("ok")).url.as_deref(),
            Some("https://example.com/list")
        );

        let ctx = ajax();
        let jump = Jump::new(&ctx, &config, &services);
        assert_eq!(envelope(&jump.succeed("ok")).url.as_deref(), Some("/"));

        let relative = jump.succeed_with("ok", JumpOptions::new().url("index/user/list"));
        assert_eq!(envelope(&relative).url.as_deref(), Some("/index/user/list"));

        let absolute = jump.succeed_with("ok", JumpOptions::new().url("http://a.test/x"));
        assert_eq!(envelope(&absolute).url.as_deref(), Some("http://a.test/x"));

        let empty = jump.succeed_with("ok", JumpOptions::new().url(""));
        assert_eq!(envelope(&empty).url.as_deref(), Some(""));
    }

    #[test]
    fn test_fail_url_defaults() {
        let (config, services) = (PipelineConfig::default(), Services::default());

        let background = ajax();
        let jump = Jump::new(&background, &config, &services);
        assert_eq!(envelope(&jump.fail("no")).url.as_deref(), Some(""));
        assert_eq!(envelope(&jump.fail("no")).code, 0);

        let interactive = ctx().with_format(ResponseFormat::Json);
        let jump = Jump::new(&interactive, &config, &services);
        assert_eq!(envelope(&jump.fail("no")).url.as_deref(), Some(HISTORY_BACK));
    }

    #[test]
    fn test_interactive_calls_render_template() {
        struct Recorder;
        impl TemplateRenderer for Recorder {
            fn render(&self, template: &str, envelope: &ResponseEnvelope) -> anyhow::Result<String> {
                Ok(format!("{template}:{}:{}", envelope.code, envelope.msg))
            }
        }

        let mut config = PipelineConfig::default();
        config.response.error_template = "error_page".to_string();
        let services = Services {
            renderer: Arc::new(Recorder),
            ..Services::default()
        };
        let ctx = ctx();
        let jump = Jump::new(&ctx, &config, &services);

        let ok = jump.succeed("saved");
        assert_eq!(body(&ok), "dispatch_jump:1:saved");
        assert_eq!(content_type(&ok), "text/html; charset=utf-8");

        let err = jump.fail("broken");
        assert_eq!(body(&err), "error_page:0:broken");
        assert_eq!(envelope(&err).msg, "broken");
    }

    #[test]
    fn test_render_failure_is_fatal() {
        struct Broken;
        impl TemplateRenderer for Broken {
            fn render(&self, template: &str, _: &ResponseEnvelope) -> anyhow::Result<String> {
                anyhow::bail!("template {template} missing")
            }
        }

        let config = PipelineConfig::default();
        let services = Services {
            renderer: Arc::new(Broken),
            ..Services::default()
        };
        let ctx = ctx();
        let jump = Jump::new(&ctx, &config, &services);

        let result = jump.succeed("ok");
        assert!(matches!(result.error(), Some(PipelineError::Render { .. })));
    }

    #[test]
    fn test_jsonp_callback() {
        let (config, services) = (PipelineConfig::default(), Services::default());

        let ctx = ajax().with_format(ResponseFormat::Jsonp);
        let jump = Jump::new(&ctx, &config, &services);
        let result = jump.respond_data(json!({"id": 1}), 1, "");
        assert!(body(&result).starts_with("jsonpReturn({"));
        assert!(body(&result).ends_with("});"));
        assert_eq!(content_type(&result), "application/javascript; charset=utf-8");

        let named = ctx.clone().with_param("callback", json!("cb.done"));
        let jump = Jump::new(&named, &config, &services);
        assert!(body(&jump.respond_data(json!(1), 1, "")).starts_with("cb.done("));

        let hostile = ctx.with_param("callback", json!("alert(1)//"));
        let jump = Jump::new(&hostile, &config, &services);
        assert!(body(&jump.respond_data(json!(1), 1, "")).starts_with("jsonpReturn("));
    }

    #[test]
    fn test_redirect_code_reinterpretation() {
        let (config, services) = (PipelineConfig::default(), Services::default());
        let ctx = ctx();
        let jump = Jump::new(&ctx, &config, &services);

        let result = jump.redirect("/home", 301);
        let termination = result.termination().unwrap();
        let target = termination.redirect().unwrap();
        assert_eq!(target.location, "/home");
        assert_eq!(target.status, StatusCode::MOVED_PERMANENTLY);
        assert!(target.with.is_empty());
        assert_eq!(termination.response().headers()[LOCATION], "/home");
        assert_eq!(termination.response().status(), StatusCode::MOVED_PERMANENTLY);
    }

    #[test]
    fn test_redirect_query_and_carry_over() {
        let (config, services) = (PipelineConfig::default(), Services::default());
        let ctx = ctx();
        let jump = Jump::new(&ctx, &config, &services);

        let mut params = Params::new();
        params.insert("q".to_string(), json!("a b&c"));
        params.insert("page".to_string(), json!(2));
        let mut with = Params::new();
        with.insert("flash".to_string(), json!("saved"));

        let result = jump.redirect_with("index/post/list", params, 303, with);
        let target = result.termination().unwrap().redirect().unwrap();
        assert_eq!(target.location, "/index/post/list?q=a%20b%26c&page=2");
        assert_eq!(target.status, StatusCode::SEE_OTHER);
        assert_eq!(target.with["flash"], json!("saved"));
    }

    #[test]
    fn test_redirect_rejects_non_redirect_codes() {
        let (config, services) = (PipelineConfig::default(), Services::default());
        let ctx = ctx();
        let jump = Jump::new(&ctx, &config, &services);

        let result = jump.redirect("https://a.test/?x=1", 200);
        let target = result.termination().unwrap().redirect().unwrap();
        assert_eq!(target.status, StatusCode::FOUND);
        assert_eq!(target.location, "https://a.test/?x=1");
    }

    #[test]
    fn test_respond_data_stamps_request_time() {
        let (config, services) = (PipelineConfig::default(), Services::default());
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let ctx = ajax().with_request_time(at);
        let jump = Jump::new(&ctx, &config, &services);

        let result = jump.respond_data(json!({"n": 1}), 0, "");
        let env = envelope(&result);
        assert_eq!(env.time, Some(at.timestamp()));
        assert_eq!(env.data, json!({"n": 1}));
        assert_eq!(env.url, None);
        assert_eq!(content_type(&result), "application/json; charset=utf-8");
    }

    #[test]
    fn test_respond_raw_messages() {
        let config = PipelineConfig::builder()
            .code_message(404, "resource not found")
            .build();
        let services = Services::default();
        let ctx = ctx();
        let jump = Jump::new(&ctx, &config, &services);

        assert_eq!(envelope(&jump.respond_raw(json!([]), 200, None)).msg, "success");
        assert_eq!(envelope(&jump.respond_raw(json!([]), 200, Some(""))).msg, "");
        assert_eq!(
            envelope(&jump.respond_raw(json!([]), 404, None)).msg,
            "resource not found"
        );
        assert_eq!(envelope(&jump.fail_with_code(500, "")).msg, "");
        assert_eq!(envelope(&jump.fail_with_code(404, "gone")).msg, "gone");
    }

    #[test]
    fn test_respond_raw_uses_background_format_and_stringifies() {
        let (config, services) = (PipelineConfig::default(), Services::default());
        let ctx = ctx();
        let jump = Jump::new(&ctx, &config, &services);

        let result = jump.respond_raw(json!({"id": 7, "ok": true}), 200, None);
        assert_eq!(content_type(&result), "application/json; charset=utf-8");
        assert_eq!(envelope(&result).data, json!({"id": "7", "ok": "1"}));
        assert_eq!(envelope(&result).code, 200);
    }

    #[test]
    fn test_per_call_format_and_headers() {
        let (config, services) = (PipelineConfig::default(), Services::default());
        let ctx = ctx();
        let jump = Jump::new(&ctx, &config, &services);
        assert_eq!(jump.negotiated_format(), ResponseFormat::Html);

        let json = jump
            .clone()
            .format(ResponseFormat::Json)
            .header(CACHE_CONTROL, HeaderValue::from_static("no-store"));
        assert_eq!(json.negotiated_format(), ResponseFormat::Json);

        let result = json.succeed("ok");
        let response = result.termination().unwrap().response();
        assert_eq!(response.headers()[CACHE_CONTROL], "no-store");
        assert_eq!(content_type(&result), "application/json; charset=utf-8");
    }

    #[test]
    fn test_respond_cached_passes_body_through() {
        let (config, services) = (PipelineConfig::default(), Services::default());
        let ctx = ctx();
        let jump = Jump::new(&ctx, &config, &services);

        let result = jump.respond_cached(Bytes::from_static(b"{\"code\":1,\"msg\":\"hit\"}"));
        assert_eq!(body(&result), "{\"code\":1,\"msg\":\"hit\"}");
        assert_eq!(
            result.termination().unwrap().payload(),
            &Payload::Cached
        );
    }
}
