//! Boundary between the clients and whichever engine runs the wire.

use slipwire_cronet::{Engine, EngineError, RequestCallbacks, RequestSpec};

/// What the clients require of a network engine: start a request with
/// its events routed into `callbacks`, and cancel one by handle.
///
/// [`slipwire_cronet::Engine`] is the production implementation; tests
/// substitute scripted engines.
pub trait NetEngine: Send + Sync {
    /// Begins one request. The engine owns `callbacks` until it has
    /// delivered a terminal event (or dropped the box, which the sink
    /// treats as failure).
    fn submit(
        &self,
        spec: RequestSpec,
        callbacks: Box<dyn RequestCallbacks>,
    ) -> Result<u64, EngineError>;

    /// Best-effort cancel. Unknown or already-finished handles are
    /// ignored.
    fn cancel(&self, handle: u64);
}

impl NetEngine for Engine {
    fn submit(
        &self,
        spec: RequestSpec,
        callbacks: Box<dyn RequestCallbacks>,
    ) -> Result<u64, EngineError> {
        Engine::submit(self, spec, callbacks)
    }

    fn cancel(&self, handle: u64) {
        Engine::cancel(self, handle);
    }
}
