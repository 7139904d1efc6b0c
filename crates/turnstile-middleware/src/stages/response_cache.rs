//! Response cache lookup.
//!
//! Last stage before the handler. A non-empty stored body for the request's
//! [`Fingerprint`] is sent back unchanged and the handler never runs.

use crate::fingerprint::Fingerprint;
use crate::jump::Jump;
use crate::pipeline::{PipelineStage, Stage};
use tracing::debug;
use turnstile_core::{Flow, RequestContext};

/// Answers from the response cache.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseCacheStage;

impl PipelineStage for ResponseCacheStage {
    fn stage(&self) -> Stage {
        Stage::ResponseCache
    }

    fn run(&self, ctx: &RequestContext, jump: &Jump<'_>) -> Flow {
        let fingerprint = Fingerprint::of(ctx);
        match jump.services().cache().get(&fingerprint) {
            Some(body) if !body.is_empty() => {
                debug!(%fingerprint, bytes = body.len(), "response cache hit");
                Err(jump.respond_cached(body))
            }
            _ => {
                debug!(%fingerprint, "response cache miss");
                Ok(())
            }
        }
    }
}
