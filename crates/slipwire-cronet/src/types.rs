//! Safe types shared between the engine wrapper and its callers.

/// Errors from engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine startup failed: {0}")]
    Startup(String),

    #[error("request submission failed: {0}")]
    Submit(String),

    #[error("cronet library not available in this build")]
    NotAvailable,
}

/// Engine-level settings applied once at startup.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Value sent as the default `User-Agent`.
    pub user_agent: String,
    /// Enable QUIC (default: off).
    pub enable_quic: bool,
    /// Enable HTTP/2 (default: on).
    pub enable_http2: bool,
    /// Enable the HTTP cache (default: off; responses are never served
    /// from disk or memory).
    pub enable_http_cache: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            user_agent: "slipwire".to_string(),
            enable_quic: false,
            enable_http2: true,
            enable_http_cache: false,
        }
    }
}

impl EngineConfig {
    /// Builder method: set the default user agent.
    pub fn with_user_agent(self, user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            ..self
        }
    }

    /// Builder method: toggle QUIC.
    pub fn with_quic(self, enable: bool) -> Self {
        Self {
            enable_quic: enable,
            ..self
        }
    }

    /// Builder method: toggle HTTP/2.
    pub fn with_http2(self, enable: bool) -> Self {
        Self {
            enable_http2: enable,
            ..self
        }
    }

    /// Builder method: toggle the HTTP cache.
    pub fn with_http_cache(self, enable: bool) -> Self {
        Self {
            enable_http_cache: enable,
            ..self
        }
    }
}

/// Everything the engine needs to start one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestSpec {
    /// HTTP method verb, e.g. `GET`.
    pub method: String,
    /// Absolute request URL.
    pub url: String,
    /// Header pairs in send order.
    pub headers: Vec<(String, String)>,
    /// Upload body, if any.
    pub body: Option<Vec<u8>>,
}

/// Response metadata as reported by the engine: the URL the status line
/// came from, the status code, and the raw header list in wire order.
#[derive(Debug, Clone, Default)]
pub struct ResponseHead {
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
}

/// What to do with a redirect the engine just reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectAction {
    /// Follow it; the request continues toward the new location.
    Follow,
    /// Stop here; the engine cancels the request and finishes the
    /// callback sequence with `on_canceled`.
    Stop,
}

/// Per-request event callbacks, invoked on the engine's executor thread.
///
/// The engine delivers, in order: zero or more `on_redirect_received`,
/// then at most one `on_response_started`, then zero or more
/// `on_read_completed` (chunks may be empty), then exactly one of
/// `on_succeeded` / `on_failed` / `on_canceled`. After the terminal
/// call the engine destroys the request and drops this box.
///
/// Implementations must not block; every request sharing the engine
/// waits behind the executor thread.
pub trait RequestCallbacks: Send {
    /// A redirect response arrived. `head` describes the redirect itself
    /// (its status, its headers, the URL that was asked for);
    /// `new_location` is where it points.
    fn on_redirect_received(&mut self, new_location: &str, head: ResponseHead) -> RedirectAction;

    /// Final (non-redirect) status line and headers arrived.
    fn on_response_started(&mut self, head: ResponseHead);

    /// One chunk of the response body arrived.
    fn on_read_completed(&mut self, chunk: &[u8]);

    /// The request finished cleanly; no further calls follow.
    fn on_succeeded(&mut self);

    /// The request failed; `message` is the engine's description.
    fn on_failed(&mut self, message: String);

    /// The request was cancelled before completion.
    fn on_canceled(&mut self);
}
