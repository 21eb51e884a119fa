//! Request assembly shared by the blocking and async builders.

use std::time::Duration;

use serde::Serialize;
use url::Url;

use slipwire_cronet::RequestSpec;

use crate::body::Body;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::header::HeaderMap;

/// Everything a builder collects before submission.
///
/// Caller mistakes (a second body source, a JSON value that will not
/// serialize) are recorded here and surfaced by [`RequestParts::finish`],
/// so a bad request never reaches an engine.
#[derive(Debug)]
pub(crate) struct RequestParts {
    method: String,
    url: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Option<Body>,
    pub(crate) follow_redirects: bool,
    pub(crate) timeout: Option<Duration>,
    error: Option<ClientError>,
}

impl RequestParts {
    pub(crate) fn new(method: &str, url: &str) -> Self {
        Self {
            method: method.to_string(),
            url: url.to_string(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            follow_redirects: true,
            timeout: None,
            error: None,
        }
    }

    pub(crate) fn push_query(&mut self, name: &str, value: &str) {
        self.query.push((name.to_string(), value.to_string()));
    }

    pub(crate) fn push_header(&mut self, name: &str, value: &str) {
        self.headers.append(name, value);
    }

    pub(crate) fn set_body(&mut self, body: Body) {
        match &self.body {
            Some(existing) => {
                if self.error.is_none() {
                    self.error = Some(ClientError::BodyConflict {
                        first: existing.kind(),
                        second: body.kind(),
                    });
                }
            }
            None => self.body = Some(body),
        }
    }

    pub(crate) fn set_json<T: Serialize>(&mut self, value: &T) {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.set_body(Body::Json(bytes)),
            Err(error) => {
                if self.error.is_none() {
                    self.error = Some(ClientError::Json(error));
                }
            }
        }
    }

    /// Validates and assembles the request. The first recorded caller
    /// error wins; URL parsing happens here so `InvalidUrl` also
    /// precedes any submission.
    pub(crate) fn finish(self, config: &ClientConfig) -> ClientResult<PreparedRequest> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let mut url = Url::parse(&self.url)?;
        if !self.query.is_empty() {
            // Appends after any pairs already on the URL.
            let mut pairs = url.query_pairs_mut();
            for (name, value) in &self.query {
                pairs.append_pair(name, value);
            }
        }

        let mut headers = self.headers;
        let body = self.body.map(|body| {
            let (bytes, implied_type) = body.encode();
            if let Some(content_type) = implied_type {
                headers.set_default("Content-Type", content_type);
            }
            bytes
        });
        if let Some(agent) = &config.user_agent {
            headers.set_default("User-Agent", agent);
        }

        Ok(PreparedRequest {
            follow_redirects: self.follow_redirects,
            timeout: self.timeout.unwrap_or(config.default_timeout),
            spec: RequestSpec {
                method: self.method,
                url: url.to_string(),
                headers: headers.into_pairs(),
                body,
            },
        })
    }
}

/// A validated request, ready for an engine.
#[derive(Debug)]
pub(crate) struct PreparedRequest {
    pub(crate) spec: RequestSpec,
    pub(crate) follow_redirects: bool,
    pub(crate) timeout: Duration,
}
