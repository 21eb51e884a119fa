//! Callback sink: turns one request's event stream into one outcome.

use std::sync::Arc;

use bytes::Bytes;
use slipwire_cronet::{RedirectAction, RequestCallbacks, ResponseHead};
use tracing::trace;

use crate::handoff::{Handoff, Outcome};
use crate::header::HeaderMap;
use crate::response::Response;

/// Accumulates the response for a single request and publishes exactly
/// one outcome into the handoff.
///
/// The engine delivers events strictly in order: redirects, then at
/// most one response start, then body chunks, then one terminal event.
/// Chunks are appended in arrival order, so the final body is the
/// exact concatenation.
///
/// With redirects suppressed, the redirect itself is the answer: its
/// status and headers are published immediately with an empty body and
/// the URL the caller requested. The engine still winds the transfer
/// down afterwards, and the handoff drops that late outcome.
pub(crate) struct Collector {
    handoff: Arc<Handoff>,
    follow_redirects: bool,
    /// URL the caller asked for, reported when a redirect is suppressed.
    request_url: String,
    status: u16,
    headers: HeaderMap,
    url: String,
    body: Vec<u8>,
    done: bool,
}

impl Collector {
    pub(crate) fn new(handoff: Arc<Handoff>, request_url: String, follow_redirects: bool) -> Self {
        Self {
            handoff,
            follow_redirects,
            request_url,
            status: 0,
            headers: HeaderMap::new(),
            url: String::new(),
            body: Vec::new(),
            done: false,
        }
    }

    fn publish(&mut self, outcome: Outcome) {
        self.done = true;
        self.handoff.publish(outcome);
    }
}

impl RequestCallbacks for Collector {
    fn on_redirect_received(&mut self, new_location: &str, head: ResponseHead) -> RedirectAction {
        if self.follow_redirects {
            trace!(location = %new_location, "following redirect");
            return RedirectAction::Follow;
        }
        // The redirect is the terminal answer. Report the URL that was
        // asked for, not where the redirect points.
        trace!(status = head.status, location = %new_location, "redirect suppressed");
        let headers: HeaderMap = head.headers.into_iter().collect();
        let response = Response::new(head.status, headers, self.request_url.clone(), Bytes::new());
        self.publish(Outcome::Completed(response));
        RedirectAction::Stop
    }

    fn on_response_started(&mut self, head: ResponseHead) {
        trace!(status = head.status, url = %head.url, "response started");
        self.status = head.status;
        self.url = head.url;
        self.headers = head.headers.into_iter().collect();
    }

    fn on_read_completed(&mut self, chunk: &[u8]) {
        self.body.extend_from_slice(chunk);
    }

    fn on_succeeded(&mut self) {
        let response = Response::new(
            self.status,
            std::mem::take(&mut self.headers),
            std::mem::take(&mut self.url),
            Bytes::from(std::mem::take(&mut self.body)),
        );
        self.publish(Outcome::Completed(response));
    }

    fn on_failed(&mut self, message: String) {
        self.publish(Outcome::Failed(message));
    }

    fn on_canceled(&mut self) {
        self.publish(Outcome::Canceled);
    }
}

impl Drop for Collector {
    fn drop(&mut self) {
        // An engine that drops the sink without a terminal event must
        // not leave the consumer waiting forever.
        if !self.done {
            self.handoff
                .publish(Outcome::Failed("request dropped before completion".to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::ClientError;

    const SHORT: Option<Duration> = Some(Duration::from_millis(10));

    fn head(status: u16, url: &str, headers: &[(&str, &str)]) -> ResponseHead {
        ResponseHead {
            url: url.to_string(),
            status,
            headers: headers
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn collector(handoff: &Arc<Handoff>, follow_redirects: bool) -> Collector {
        Collector::new(
            Arc::clone(handoff),
            "http://test.local/start".to_string(),
            follow_redirects,
        )
    }

    fn take_response(handoff: &Handoff) -> Response {
        match handoff.wait(SHORT) {
            Some(Outcome::Completed(response)) => response,
            other => panic!("expected a completed outcome, got {other:?}"),
        }
    }

    #[test]
    fn chunks_accumulate_in_arrival_order() {
        let handoff = Arc::new(Handoff::default());
        let mut sink = collector(&handoff, true);
        sink.on_response_started(head(200, "http://test.local/start", &[]));
        sink.on_read_completed(b"AB");
        sink.on_read_completed(b"");
        sink.on_read_completed(b"CD");
        sink.on_succeeded();

        let response = take_response(&handoff);
        assert_eq!(response.status(), 200);
        assert_eq!(&response.body()[..], b"ABCD");
    }

    #[test]
    fn suppressed_redirect_reports_the_requested_url() {
        let handoff = Arc::new(Handoff::default());
        let mut sink = collector(&handoff, false);
        let action = sink.on_redirect_received(
            "http://test.local/elsewhere",
            head(
                301,
                "http://test.local/start",
                &[("Location", "http://test.local/elsewhere")],
            ),
        );
        assert_eq!(action, RedirectAction::Stop);

        let response = take_response(&handoff);
        assert_eq!(response.status(), 301);
        assert_eq!(response.url(), "http://test.local/start");
        assert_eq!(
            response.headers().get("location"),
            Some("http://test.local/elsewhere")
        );
        assert!(response.body().is_empty());
    }

    #[test]
    fn events_after_a_suppressed_redirect_are_dropped() {
        let handoff = Arc::new(Handoff::default());
        let mut sink = collector(&handoff, false);
        sink.on_redirect_received("http://test.local/elsewhere", head(302, "", &[]));
        // The engine's wind-down still delivers a terminal event.
        sink.on_canceled();

        let response = take_response(&handoff);
        assert_eq!(response.status(), 302);
        assert!(handoff.wait(SHORT).is_none());
    }

    #[test]
    fn redirects_are_followed_by_default() {
        let handoff = Arc::new(Handoff::default());
        let mut sink = collector(&handoff, true);
        let action = sink.on_redirect_received("http://test.local/elsewhere", head(301, "", &[]));
        assert_eq!(action, RedirectAction::Follow);
        assert!(handoff.wait(SHORT).is_none());
    }

    #[test]
    fn repeated_headers_reach_the_response() {
        let handoff = Arc::new(Handoff::default());
        let mut sink = collector(&handoff, true);
        sink.on_response_started(head(
            200,
            "http://test.local/start",
            &[("Set-Cookie", "a=1"), ("Set-Cookie", "b=2")],
        ));
        sink.on_succeeded();

        let response = take_response(&handoff);
        assert_eq!(response.headers().get_all("set-cookie"), vec!["a=1", "b=2"]);
    }

    #[test]
    fn failure_message_passes_through_verbatim() {
        let handoff = Arc::new(Handoff::default());
        let mut sink = collector(&handoff, true);
        sink.on_failed("net::ERR_CONNECTION_REFUSED".to_string());

        match handoff.wait(SHORT) {
            Some(outcome) => match outcome.into_result() {
                Err(ClientError::Engine(message)) => {
                    assert_eq!(message, "net::ERR_CONNECTION_REFUSED");
                }
                other => panic!("expected an engine error, got {other:?}"),
            },
            None => panic!("no outcome published"),
        }
    }

    #[test]
    fn cancellation_resolves_to_none() {
        let handoff = Arc::new(Handoff::default());
        let mut sink = collector(&handoff, true);
        sink.on_canceled();

        assert!(matches!(handoff.wait(SHORT), Some(Outcome::Canceled)));
    }

    #[test]
    fn dropping_an_unfinished_sink_publishes_failure() {
        let handoff = Arc::new(Handoff::default());
        let mut sink = collector(&handoff, true);
        sink.on_response_started(head(200, "http://test.local/start", &[]));
        drop(sink);

        match handoff.wait(SHORT) {
            Some(Outcome::Failed(message)) => {
                assert_eq!(message, "request dropped before completion");
            }
            other => panic!("expected a failure outcome, got {other:?}"),
        }
    }

    #[test]
    fn dropping_a_finished_sink_publishes_nothing_new() {
        let handoff = Arc::new(Handoff::default());
        let mut sink = collector(&handoff, true);
        sink.on_succeeded();
        drop(sink);

        assert!(matches!(handoff.wait(SHORT), Some(Outcome::Completed(_))));
        assert!(handoff.wait(SHORT).is_none());
    }
}
