//! The terminal value of a completed exchange.

use std::sync::OnceLock;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::error::ClientResult;
use crate::header::HeaderMap;

/// A finished HTTP response.
///
/// Exists only after the engine has delivered a terminal event: the
/// body is fully accumulated, nothing streams. `url` is where the
/// exchange ended, which is the final URL when redirects were followed
/// and the requested URL when a redirect was suppressed.
#[derive(Debug)]
pub struct Response {
    status: u16,
    headers: HeaderMap,
    url: String,
    body: Bytes,
    text: OnceLock<String>,
}

impl Response {
    pub(crate) fn new(status: u16, headers: HeaderMap, url: String, body: Bytes) -> Self {
        Self {
            status,
            headers,
            url,
            body,
            text: OnceLock::new(),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body decoded as UTF-8. Decoded once, then served from cache.
    pub fn text(&self) -> ClientResult<&str> {
        if let Some(text) = self.text.get() {
            return Ok(text.as_str());
        }
        let decoded = std::str::from_utf8(&self.body)?;
        Ok(self.text.get_or_init(|| decoded.to_owned()).as_str())
    }

    /// Body deserialized as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> ClientResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}
