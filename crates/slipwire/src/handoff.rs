//! One-shot handoff from the engine's callback thread to a waiting caller.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Condvar, Mutex};
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{ClientError, ClientResult};
use crate::response::Response;

/// Terminal result of one request.
#[derive(Debug)]
pub(crate) enum Outcome {
    /// The exchange finished with a response, including a synthesized
    /// response for a suppressed redirect.
    Completed(Response),
    /// The engine reported failure, message verbatim.
    Failed(String),
    /// The engine cancelled the request out of band.
    Canceled,
}

impl Outcome {
    fn kind(&self) -> &'static str {
        match self {
            Outcome::Completed(_) => "completed",
            Outcome::Failed(_) => "failed",
            Outcome::Canceled => "canceled",
        }
    }

    /// Maps to the caller-facing result. Cancellation is not an error;
    /// it resolves to `Ok(None)`.
    pub(crate) fn into_result(self) -> ClientResult<Option<Response>> {
        match self {
            Outcome::Completed(response) => Ok(Some(response)),
            Outcome::Failed(message) => Err(ClientError::Engine(message)),
            Outcome::Canceled => Ok(None),
        }
    }
}

#[derive(Default)]
struct State {
    outcome: Option<Outcome>,
    /// Set by the first publish and never cleared, even after the
    /// outcome is taken. Late publishes check this, not `outcome`.
    published: bool,
    waker: Option<Waker>,
}

/// Single-assignment outcome cell.
///
/// The callback sink publishes into it from the engine thread; one
/// caller consumes, either blocking with [`Handoff::wait`] or awaiting
/// [`Handoff::recv`]. The first publish wins and every later one is
/// dropped, so a request that times out, gets cancelled, and then
/// completes anyway never disturbs anyone.
#[derive(Default)]
pub(crate) struct Handoff {
    state: Mutex<State>,
    ready: Condvar,
}

impl Handoff {
    /// Stores `outcome` if nothing was published yet, then wakes the
    /// consumer. Later publishes are dropped.
    pub(crate) fn publish(&self, outcome: Outcome) {
        let waker = {
            let mut state = self.state.lock().unwrap();
            if state.published {
                debug!(dropped = outcome.kind(), "late outcome dropped");
                return;
            }
            state.published = true;
            state.outcome = Some(outcome);
            state.waker.take()
        };
        self.ready.notify_one();
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    /// Blocks until an outcome is published or the deadline expires.
    /// Returns `None` on deadline; the outcome stays in the cell if it
    /// arrives later.
    pub(crate) fn wait(&self, deadline: Option<Duration>) -> Option<Outcome> {
        let limit = deadline.map(|d| Instant::now() + d);
        let mut state = self.state.lock().unwrap();
        loop {
            if let Some(outcome) = state.outcome.take() {
                return Some(outcome);
            }
            state = match limit {
                Some(limit) => {
                    let now = Instant::now();
                    if now >= limit {
                        return None;
                    }
                    self.ready.wait_timeout(state, limit - now).unwrap().0
                }
                None => self.ready.wait(state).unwrap(),
            };
        }
    }

    /// Resolves when an outcome is published. Safe to race against a
    /// timer: dropping the future before completion leaves the cell
    /// intact.
    pub(crate) fn recv(&self) -> Recv<'_> {
        Recv { cell: self }
    }
}

pub(crate) struct Recv<'a> {
    cell: &'a Handoff,
}

impl Future for Recv<'_> {
    type Output = Outcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.cell.state.lock().unwrap();
        if let Some(outcome) = state.outcome.take() {
            return Poll::Ready(outcome);
        }
        // Single consumer; the most recent poll owns the wake.
        state.waker = Some(cx.waker().clone());
        Poll::Pending
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use bytes::Bytes;

    use super::*;
    use crate::header::HeaderMap;

    fn completed(marker: &str) -> Outcome {
        Outcome::Completed(Response::new(
            200,
            HeaderMap::new(),
            format!("http://test.local/{marker}"),
            Bytes::new(),
        ))
    }

    fn url_of(outcome: Outcome) -> String {
        match outcome {
            Outcome::Completed(response) => response.url().to_string(),
            other => panic!("expected completed, got {other:?}"),
        }
    }

    #[test]
    fn publish_then_wait_delivers() {
        let cell = Handoff::default();
        cell.publish(completed("a"));
        let outcome = cell.wait(Some(Duration::from_millis(10))).unwrap();
        assert_eq!(url_of(outcome), "http://test.local/a");
    }

    #[test]
    fn first_publish_wins() {
        let cell = Handoff::default();
        cell.publish(completed("first"));
        cell.publish(Outcome::Failed("late".to_string()));
        let outcome = cell.wait(None).unwrap();
        assert_eq!(url_of(outcome), "http://test.local/first");
    }

    #[test]
    fn wait_returns_none_on_deadline() {
        let cell = Handoff::default();
        assert!(cell.wait(Some(Duration::from_millis(20))).is_none());
    }

    #[test]
    fn publish_wakes_a_blocked_waiter() {
        let cell = Arc::new(Handoff::default());
        let publisher = Arc::clone(&cell);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            publisher.publish(completed("woken"));
        });
        let outcome = cell.wait(Some(Duration::from_secs(5))).unwrap();
        assert_eq!(url_of(outcome), "http://test.local/woken");
        handle.join().unwrap();
    }

    #[test]
    fn outcome_survives_an_expired_wait() {
        let cell = Handoff::default();
        assert!(cell.wait(Some(Duration::from_millis(5))).is_none());
        cell.publish(completed("kept"));
        // A publish after the cell was abandoned is still first, so a
        // later wait can observe it.
        let outcome = cell.wait(Some(Duration::from_millis(5))).unwrap();
        assert_eq!(url_of(outcome), "http://test.local/kept");
    }

    #[tokio::test]
    async fn recv_resolves_on_publish_from_another_thread() {
        let cell = Arc::new(Handoff::default());
        let publisher = Arc::clone(&cell);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            publisher.publish(completed("async"));
        });
        let outcome = cell.recv().await;
        assert_eq!(url_of(outcome), "http://test.local/async");
    }

    #[tokio::test]
    async fn dropped_recv_leaves_the_cell_intact() {
        let cell = Arc::new(Handoff::default());
        let timed = tokio::time::timeout(Duration::from_millis(20), cell.recv()).await;
        assert!(timed.is_err());
        cell.publish(completed("later"));
        let outcome = cell.recv().await;
        assert_eq!(url_of(outcome), "http://test.local/later");
    }
}
