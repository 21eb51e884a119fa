//! Blocking and async HTTP clients over a callback-driven engine.
//!
//! The engine underneath ([`slipwire_cronet`]) reports each request as
//! a stream of callbacks on its own thread: redirects, a response
//! start, body chunks, then exactly one terminal event. This crate
//! adapts that protocol into two call-and-return APIs that share all
//! of their plumbing.
//!
//! # Completion Model
//!
//! Every request gets a private handoff cell: a single-assignment
//! slot the callback sink publishes into exactly once. The
//! blocking client parks its thread on the cell with a deadline; the
//! async client races the cell against a `tokio` timer. In both, a
//! deadline win cancels the request best-effort and reports a timeout
//! immediately, and whatever the engine publishes afterwards is
//! dropped. The first publish always wins, so a request can time out,
//! be cancelled, and still complete underneath without anyone
//! observing more than one outcome.
//!
//! # Cancellation
//!
//! An engine-initiated cancel is not an error. `send` resolves it to
//! `Ok(None)`, keeping the error type for things that actually went
//! wrong.

pub mod blocking;
mod body;
mod client;
mod collector;
mod config;
mod engine;
mod error;
mod handoff;
mod header;
mod request;
mod response;

pub use client::{Client, RequestBuilder};
pub use config::ClientConfig;
pub use engine::NetEngine;
pub use error::{ClientError, ClientResult};
pub use header::HeaderMap;
pub use response::Response;

// Engine-side types callers need to stand up an engine or implement
// their own.
pub use slipwire_cronet::{
    Engine, EngineConfig, EngineError, RedirectAction, RequestCallbacks, RequestSpec, ResponseHead,
};
