//! Client error types.
//!
//! Cancellation is deliberately not represented here: an engine-initiated
//! cancel resolves a request with `Ok(None)`, distinct from failure.

use std::time::Duration;

use thiserror::Error;

/// Errors from building or executing a request.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Two body sources were set on one request. Reported before any
    /// engine activity.
    #[error("conflicting body sources: {first} and {second}")]
    BodyConflict {
        first: &'static str,
        second: &'static str,
    },

    /// The deadline passed first. The in-flight request has already been
    /// handed a best-effort cancel; nobody waits for its acknowledgement.
    #[error("request timed out after {after:?}")]
    Timeout { after: Duration },

    /// The engine reported the request as failed; the message is carried
    /// through verbatim.
    #[error("request failed: {0}")]
    Engine(String),

    #[error("submission rejected: {0}")]
    Submit(#[from] slipwire_cronet::EngineError),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response body is not valid utf-8")]
    BodyNotUtf8(#[from] std::str::Utf8Error),
}

pub type ClientResult<T> = Result<T, ClientError>;
