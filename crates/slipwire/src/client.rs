//! Async client.
//!
//! Suspends instead of blocking: `send` races the handoff against a
//! timer and the first to finish wins. A timer win cancels the request
//! best-effort and drops the receive future; a handoff win drops the
//! timer. Either way the loser stops existing with the race.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use tracing::debug;

use crate::body::Body;
use crate::collector::Collector;
use crate::config::ClientConfig;
use crate::engine::NetEngine;
use crate::error::{ClientError, ClientResult};
use crate::handoff::Handoff;
use crate::request::RequestParts;
use crate::response::Response;

/// Async HTTP client over a shared engine.
///
/// Cheap to clone; clones share the engine and configuration.
#[derive(Clone)]
pub struct Client {
    engine: Arc<dyn NetEngine>,
    config: ClientConfig,
}

impl Client {
    pub fn new(engine: Arc<dyn NetEngine>) -> Self {
        Self::with_config(engine, ClientConfig::default())
    }

    pub fn with_config(engine: Arc<dyn NetEngine>, config: ClientConfig) -> Self {
        Self { engine, config }
    }

    /// Starts a request with an arbitrary method.
    pub fn request(&self, method: &str, url: &str) -> RequestBuilder<'_> {
        RequestBuilder {
            client: self,
            parts: RequestParts::new(method, url),
        }
    }

    pub fn get(&self, url: &str) -> RequestBuilder<'_> {
        self.request("GET", url)
    }

    pub fn post(&self, url: &str) -> RequestBuilder<'_> {
        self.request("POST", url)
    }

    pub fn put(&self, url: &str) -> RequestBuilder<'_> {
        self.request("PUT", url)
    }

    pub fn patch(&self, url: &str) -> RequestBuilder<'_> {
        self.request("PATCH", url)
    }

    pub fn delete(&self, url: &str) -> RequestBuilder<'_> {
        self.request("DELETE", url)
    }

    pub fn head(&self, url: &str) -> RequestBuilder<'_> {
        self.request("HEAD", url)
    }

    async fn execute(&self, parts: RequestParts) -> ClientResult<Option<Response>> {
        let prepared = parts.finish(&self.config)?;
        let handoff = Arc::new(Handoff::default());
        let collector = Collector::new(
            Arc::clone(&handoff),
            prepared.spec.url.clone(),
            prepared.follow_redirects,
        );
        let handle = self.engine.submit(prepared.spec, Box::new(collector))?;
        match tokio::time::timeout(prepared.timeout, handoff.recv()).await {
            Ok(outcome) => outcome.into_result(),
            Err(_elapsed) => {
                debug!(handle, timeout = ?prepared.timeout, "deadline expired, cancelling");
                self.engine.cancel(handle);
                Err(ClientError::Timeout {
                    after: prepared.timeout,
                })
            }
        }
    }
}

/// One request under construction. Finish with [`RequestBuilder::send`].
pub struct RequestBuilder<'c> {
    client: &'c Client,
    parts: RequestParts,
}

impl RequestBuilder<'_> {
    /// Appends one query pair to the URL.
    pub fn query(mut self, name: &str, value: &str) -> Self {
        self.parts.push_query(name, value);
        self
    }

    /// Appends one request header.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.parts.push_header(name, value);
        self
    }

    /// Sends raw bytes as the body.
    pub fn body(mut self, bytes: impl Into<Bytes>) -> Self {
        self.parts.set_body(Body::Raw(bytes.into()));
        self
    }

    /// Sends a urlencoded form as the body.
    pub fn form(mut self, pairs: &[(&str, &str)]) -> Self {
        self.parts.set_body(Body::Form(
            pairs
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
        ));
        self
    }

    /// Serializes `value` as the JSON body.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        self.parts.set_json(value);
        self
    }

    /// Whether redirects are followed transparently. When disabled, the
    /// first redirect response is returned as the result.
    pub fn allow_redirects(mut self, follow: bool) -> Self {
        self.parts.follow_redirects = follow;
        self
    }

    /// Deadline for this request, overriding the client default.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.parts.timeout = Some(timeout);
        self
    }

    /// Runs the request to completion without blocking the runtime.
    ///
    /// `Ok(None)` means the engine cancelled the request out of band;
    /// every other ending is a response or an error.
    pub async fn send(self) -> ClientResult<Option<Response>> {
        self.client.execute(self.parts).await
    }
}
