//! Request body sources.

use bytes::Bytes;

/// A request carries at most one body source.
///
/// Form and JSON bodies imply a `Content-Type`; the implied value is
/// only applied when the caller has not set that header themselves.
#[derive(Debug, Clone)]
pub(crate) enum Body {
    /// Raw bytes, sent as-is with no implied `Content-Type`.
    Raw(Bytes),
    /// Name/value pairs, percent-encoded as `application/x-www-form-urlencoded`.
    Form(Vec<(String, String)>),
    /// Pre-serialized JSON, sent as `application/json`.
    Json(Vec<u8>),
}

impl Body {
    /// Label used in conflict reports when two sources collide.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Body::Raw(_) => "raw",
            Body::Form(_) => "form",
            Body::Json(_) => "json",
        }
    }

    /// Encodes to wire bytes plus the `Content-Type` this source implies.
    pub(crate) fn encode(self) -> (Vec<u8>, Option<&'static str>) {
        match self {
            Body::Raw(bytes) => (bytes.to_vec(), None),
            Body::Form(pairs) => {
                let mut encoded = url::form_urlencoded::Serializer::new(String::new());
                for (name, value) in &pairs {
                    encoded.append_pair(name, value);
                }
                (
                    encoded.finish().into_bytes(),
                    Some("application/x-www-form-urlencoded"),
                )
            }
            Body::Json(bytes) => (bytes, Some("application/json")),
        }
    }
}
