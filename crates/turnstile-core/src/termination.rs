//! The termination signal.
//!
//! Stages and handlers stop a request early by returning
//! [`Interrupt::Terminate`] through the ordinary `Result` channel. The
//! dispatcher checks the result after every stage; once a termination is
//! returned nothing downstream runs and the carried [`Response`] becomes the
//! request's only output.
//!
//! ```text
//! Validation ──Ok──▶ Middleware ──Ok──▶ ResponseCache ──Ok──▶ Handler
//!     │                  │                   │                   │
//!     └──Err(Terminate)──┴───────────────────┴───────────────────┴──▶ Response
//! ```

use crate::context::Params;
use crate::envelope::ResponseEnvelope;
use crate::error::{ConfigurationError, PipelineError};
use bytes::Bytes;
use http::StatusCode;

/// The response type carried by a termination.
pub type Response = http::Response<Bytes>;

/// Result of a stage, helper or handler.
///
/// `Ok` means "proceed"; `Err` means the request is finished, either
/// deliberately ([`Interrupt::Terminate`]) or fatally ([`Interrupt::Fatal`]).
pub type Flow<T = ()> = Result<T, Interrupt>;

/// Where a redirect sends the client.
#[derive(Debug, Clone, PartialEq)]
pub struct RedirectTarget {
    /// Final `Location` header value, query string included.
    pub location: String,
    /// Redirect status code.
    pub status: StatusCode,
    /// Data to carry over to the next request.
    pub with: Params,
}

/// What produced a terminated response.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A helper-built envelope.
    Envelope(ResponseEnvelope),
    /// A redirect.
    Redirect(RedirectTarget),
    /// A stored body replayed from the response cache.
    Cached,
}

/// A fully built response that ends the request.
#[derive(Debug)]
pub struct Termination {
    response: Response,
    payload: Payload,
}

impl Termination {
    /// Wraps a built response.
    #[must_use]
    pub fn new(response: Response, payload: Payload) -> Self {
        Self { response, payload }
    }

    /// Returns the response that will be sent.
    #[must_use]
    pub fn response(&self) -> &Response {
        &self.response
    }

    /// Returns what produced the response.
    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Returns the envelope, for helper-built responses.
    #[must_use]
    pub fn envelope(&self) -> Option<&ResponseEnvelope> {
        match &self.payload {
            Payload::Envelope(envelope) => Some(envelope),
            _ => None,
        }
    }

    /// Returns the redirect target, for redirects.
    #[must_use]
    pub fn redirect(&self) -> Option<&RedirectTarget> {
        match &self.payload {
            Payload::Redirect(target) => Some(target),
            _ => None,
        }
    }

    /// Consumes the termination, returning the response.
    #[must_use]
    pub fn into_response(self) -> Response {
        self.response
    }
}

/// Why a request stopped before (or instead of) returning normally.
#[derive(Debug)]
pub enum Interrupt {
    /// Deliberate early exit carrying the final response.
    Terminate(Box<Termination>),
    /// Unrecoverable error; the request is aborted.
    Fatal(PipelineError),
}

impl Interrupt {
    /// Creates a termination interrupt.
    #[must_use]
    pub fn terminate(termination: Termination) -> Self {
        Self::Terminate(Box::new(termination))
    }

    /// Returns the termination, if this is a deliberate exit.
    #[must_use]
    pub fn termination(&self) -> Option<&Termination> {
        match self {
            Self::Terminate(t) => Some(t),
            Self::Fatal(_) => None,
        }
    }

    /// Returns the fatal error, if any.
    #[must_use]
    pub fn error(&self) -> Option<&PipelineError> {
        match self {
            Self::Terminate(_) => None,
            Self::Fatal(e) => Some(e),
        }
    }

    /// Resolves the interrupt the way a dispatcher does: a termination
    /// yields its response, a fatal error is returned as-is.
    pub fn into_response(self) -> Result<Response, PipelineError> {
        match self {
            Self::Terminate(t) => Ok(t.into_response()),
            Self::Fatal(e) => Err(e),
        }
    }
}

impl From<PipelineError> for Interrupt {
    fn from(error: PipelineError) -> Self {
        Self::Fatal(error)
    }
}

impl From<ConfigurationError> for Interrupt {
    fn from(error: ConfigurationError) -> Self {
        Self::Fatal(PipelineError::Configuration(error))
    }
}
