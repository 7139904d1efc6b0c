//! External collaborators consulted by the pipeline.
//!
//! Everything the pipeline does not own sits behind a trait here: the
//! response-cache store, the template renderer, the URL builder and the
//! localization lookup. [`Services`] bundles them together with the rule-set
//! and middleware registries so stages and jump helpers can reach them
//! through a single reference.

use crate::fingerprint::Fingerprint;
use crate::registry::{RuleSetRegistry, TargetRegistry};
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use turnstile_core::ResponseEnvelope;

/// Read access to stored response bodies.
///
/// The pipeline only ever reads; writing and invalidation belong to the
/// store's owner.
pub trait ResponseCache: Send + Sync {
    /// Returns the serialized body stored for a fingerprint.
    fn get(&self, fingerprint: &Fingerprint) -> Option<Bytes>;
}

/// A cache that never hits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl ResponseCache for NoCache {
    fn get(&self, _fingerprint: &Fingerprint) -> Option<Bytes> {
        None
    }
}

/// In-process response store.
///
/// Reads take a shared lock, so concurrent requests do not contend unless
/// the owner is writing.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use turnstile_middleware::{Fingerprint, MemoryResponseCache, ResponseCache};
///
/// let cache = MemoryResponseCache::new();
/// let key = Fingerprint::from_hex("abc");
/// cache.insert(key.clone(), Bytes::from_static(b"{\"code\":1}"));
///
/// assert_eq!(cache.get(&key).unwrap().as_ref(), b"{\"code\":1}");
/// ```
#[derive(Debug, Default)]
pub struct MemoryResponseCache {
    entries: RwLock<HashMap<Fingerprint, Bytes>>,
}

impl MemoryResponseCache {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a body, replacing any previous entry.
    pub fn insert(&self, fingerprint: Fingerprint, body: impl Into<Bytes>) {
        self.entries.write().insert(fingerprint, body.into());
    }

    /// Removes an entry, returning its body.
    pub fn remove(&self, fingerprint: &Fingerprint) -> Option<Bytes> {
        self.entries.write().remove(fingerprint)
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl ResponseCache for MemoryResponseCache {
    fn get(&self, fingerprint: &Fingerprint) -> Option<Bytes> {
        self.entries.read().get(fingerprint).cloned()
    }
}

/// Renders a jump envelope into an HTML page.
pub trait TemplateRenderer: Send + Sync {
    /// Renders `template` with the envelope's fields in scope.
    fn render(&self, template: &str, envelope: &ResponseEnvelope) -> anyhow::Result<String>;
}

/// Built-in jump page: the message plus a timed refresh to the target url.
#[derive(Debug, Clone, Copy, Default)]
pub struct JumpPage;

impl TemplateRenderer for JumpPage {
    fn render(&self, _template: &str, envelope: &ResponseEnvelope) -> anyhow::Result<String> {
        let url = envelope.url.as_deref().unwrap_or_default();
        let refresh = if url.is_empty() || url.starts_with("javascript:") {
            String::new()
        } else {
            format!(
                "<meta http-equiv=\"refresh\" content=\"{};url={}\">",
                envelope.wait.unwrap_or_default(),
                escape_html(url)
            )
        };
        let class = if envelope.code == 0 { "error" } else { "success" };

        Ok(format!(
            "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">{refresh}</head>\
             <body><p class=\"{class}\">{}</p></body></html>\n",
            escape_html(&envelope.msg)
        ))
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Turns a route expression into a URL.
pub trait UrlBuilder: Send + Sync {
    /// Builds the URL for a route expression such as `index/user/login`.
    fn build(&self, expression: &str) -> String;
}

/// Prefixes the expression with `/` and otherwise leaves it alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughUrls;

impl UrlBuilder for PassthroughUrls {
    fn build(&self, expression: &str) -> String {
        format!("/{}", expression.trim_start_matches('/'))
    }
}

/// Localization lookup for messages.
pub trait Translator: Send + Sync {
    /// Translates a message key.
    ///
    /// `None` means the lookup produced something other than text; callers
    /// treat it as an empty message.
    fn translate(&self, key: &str) -> Option<String>;
}

/// Returns every key unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTranslator;

impl Translator for IdentityTranslator {
    fn translate(&self, key: &str) -> Option<String> {
        Some(key.to_string())
    }
}

/// Table-backed translator; unknown keys pass through unchanged.
#[derive(Debug, Clone, Default)]
pub struct MapTranslator {
    messages: HashMap<String, String>,
}

impl MapTranslator {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a translation.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, message: impl Into<String>) -> Self {
        self.messages.insert(key.into(), message.into());
        self
    }
}

impl<K, V> FromIterator<(K, V)> for MapTranslator
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            messages: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl Translator for MapTranslator {
    fn translate(&self, key: &str) -> Option<String> {
        Some(
            self.messages
                .get(key)
                .cloned()
                .unwrap_or_else(|| key.to_string()),
        )
    }
}

/// Every collaborator the pipeline talks to.
///
/// Cheap to clone; all members are shared.
#[derive(Clone)]
pub struct Services {
    pub(crate) rule_sets: Arc<RuleSetRegistry>,
    pub(crate) targets: Arc<TargetRegistry>,
    pub(crate) cache: Arc<dyn ResponseCache>,
    pub(crate) renderer: Arc<dyn TemplateRenderer>,
    pub(crate) urls: Arc<dyn UrlBuilder>,
    pub(crate) translator: Arc<dyn Translator>,
}

impl Services {
    /// Returns the rule-set registry.
    #[must_use]
    pub fn rule_sets(&self) -> &RuleSetRegistry {
        &self.rule_sets
    }

    /// Returns the middleware target registry.
    #[must_use]
    pub fn targets(&self) -> &TargetRegistry {
        &self.targets
    }

    /// Returns the response-cache store.
    #[must_use]
    pub fn cache(&self) -> &dyn ResponseCache {
        self.cache.as_ref()
    }

    /// Returns the template renderer.
    #[must_use]
    pub fn renderer(&self) -> &dyn TemplateRenderer {
        self.renderer.as_ref()
    }

    /// Returns the URL builder.
    #[must_use]
    pub fn urls(&self) -> &dyn UrlBuilder {
        self.urls.as_ref()
    }

    /// Returns the translator.
    #[must_use]
    pub fn translator(&self) -> &dyn Translator {
        self.translator.as_ref()
    }
}

impl Default for Services {
    fn default() -> Self {
        Self {
            rule_sets: Arc::new(RuleSetRegistry::new()),
            targets: Arc::new(TargetRegistry::new()),
            cache: Arc::new(NoCache),
            renderer: Arc::new(JumpPage),
            urls: Arc::new(PassthroughUrls),
            translator: Arc::new(IdentityTranslator),
        }
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("rule_sets", &self.rule_sets)
            .field("targets", &self.targets)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_no_cache_never_hits() {
        assert!(NoCache.get(&Fingerprint::from_hex("abc")).is_none());
    }

    #[test]
    fn test_memory_cache_insert_remove() {
        let cache = MemoryResponseCache::new();
        let key = Fingerprint::from_hex("k1");
        assert!(cache.is_empty());

        cache.insert(key.clone(), "body");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&key).unwrap(), Bytes::from_static(b"body"));

        assert!(cache.remove(&key).is_some());
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn test_jump_page_escapes_message() {
        let envelope = ResponseEnvelope::build(
            1,
            "<b>saved</b>",
            Value::Null,
            Some("/home".into()),
            Some(3),
        );
        let page = JumpPage.render("dispatch_jump", &envelope).unwrap();

        assert!(page.contains("&lt;b&gt;saved&lt;/b&gt;"));
        assert!(page.contains("content=\"3;url=/home\""));
        assert!(page.contains("class=\"success\""));
    }

    #[test]
    fn test_jump_page_skips_refresh_for_history_back() {
        let envelope = ResponseEnvelope::build(
            0,
            "nope",
            Value::Null,
            Some("javascript:history.back(-1);".into()),
            Some(3),
        );
        let page = JumpPage.render("dispatch_jump", &envelope).unwrap();
        assert!(!page.contains("refresh"));
        assert!(page.contains("class=\"error\""));
    }

    #[test]
    fn test_passthrough_urls() {
        assert_eq!(PassthroughUrls.build("index/user/login"), "/index/user/login");
        assert_eq!(PassthroughUrls.build("/a"), "/a");
        assert_eq!(PassthroughUrls.build(""), "/");
    }

    #[test]
    fn test_map_translator_falls_back_to_key() {
        let translator = MapTranslator::new().with("saved", "Gespeichert");
        assert_eq!(translator.translate("saved").as_deref(), Some("Gespeichert"));
        assert_eq!(translator.translate("other").as_deref(), Some("other"));
    }
}
