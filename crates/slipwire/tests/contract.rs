//! End-to-end tests for the blocking client against a scripted engine.
//!
//! These tests validate the callback-to-return adaptation:
//! - body accumulation across chunked reads
//! - terminal-event mapping (success, failure, cancel)
//! - exactly-once delivery when the engine double-fires
//! - deadline expiry with best-effort cancel
//! - redirect suppression
//! - caller errors stopping short of submission

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::thread;
use std::time::Duration;

use slipwire::blocking::Client;
use slipwire::{
    ClientError, EngineError, NetEngine, RedirectAction, RequestCallbacks, RequestSpec,
    ResponseHead,
};

// ── Tracing setup ────────────────────────────────────────────────────

static TRACING_INIT: Once = Once::new();

/// Initialize tracing subscriber for debug output in CI.
/// Controlled by `RUST_LOG` (e.g. `RUST_LOG=slipwire=debug`).
/// Safe to call more than once; only the first call takes effect.
fn init_tracing() {
    TRACING_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init()
            .ok();
    });
}

// ── Scripted engine ──────────────────────────────────────────────────

/// One event fed to the sink after submission.
enum Event {
    Delay(Duration),
    Redirect {
        location: &'static str,
        head: ResponseHead,
    },
    Started(ResponseHead),
    Chunk(&'static [u8]),
    Succeeded,
    Failed(&'static str),
    Canceled,
}

/// What one submission does: play a list of events on a worker thread,
/// or park the sink and never answer.
enum Script {
    Events(Vec<Event>),
    Hang,
}

struct ScriptedEngine {
    scripts: Mutex<Vec<Script>>,
    submitted: Mutex<Vec<RequestSpec>>,
    cancels: Mutex<Vec<u64>>,
    redirect_actions: Arc<Mutex<Vec<RedirectAction>>>,
    parked: Mutex<Vec<Box<dyn RequestCallbacks>>>,
    next_handle: AtomicU64,
}

impl ScriptedEngine {
    fn new(scripts: Vec<Script>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts),
            submitted: Mutex::new(Vec::new()),
            cancels: Mutex::new(Vec::new()),
            redirect_actions: Arc::new(Mutex::new(Vec::new())),
            parked: Mutex::new(Vec::new()),
            next_handle: AtomicU64::new(1),
        })
    }

    fn single(events: Vec<Event>) -> Arc<Self> {
        Self::new(vec![Script::Events(events)])
    }

    fn submissions(&self) -> Vec<RequestSpec> {
        self.submitted.lock().unwrap().clone()
    }

    fn cancels(&self) -> Vec<u64> {
        self.cancels.lock().unwrap().clone()
    }

    fn redirect_actions(&self) -> Vec<RedirectAction> {
        self.redirect_actions.lock().unwrap().clone()
    }
}

impl NetEngine for ScriptedEngine {
    fn submit(
        &self,
        spec: RequestSpec,
        mut callbacks: Box<dyn RequestCallbacks>,
    ) -> Result<u64, EngineError> {
        self.submitted.lock().unwrap().push(spec);
        let handle = self.next_handle.fetch_add(1, Ordering::SeqCst);
        let mut scripts = self.scripts.lock().unwrap();
        assert!(!scripts.is_empty(), "no script for this submission");
        match scripts.remove(0) {
            Script::Hang => self.parked.lock().unwrap().push(callbacks),
            Script::Events(events) => {
                let actions = Arc::clone(&self.redirect_actions);
                thread::spawn(move || {
                    for event in events {
                        match event {
                            Event::Delay(pause) => thread::sleep(pause),
                            Event::Redirect { location, head } => {
                                let action = callbacks.on_redirect_received(location, head);
                                actions.lock().unwrap().push(action);
                            }
                            Event::Started(head) => callbacks.on_response_started(head),
                            Event::Chunk(chunk) => callbacks.on_read_completed(chunk),
                            Event::Succeeded => callbacks.on_succeeded(),
                            Event::Failed(message) => callbacks.on_failed(message.to_string()),
                            Event::Canceled => callbacks.on_canceled(),
                        }
                    }
                });
            }
        }
        Ok(handle)
    }

    fn cancel(&self, handle: u64) {
        self.cancels.lock().unwrap().push(handle);
    }
}

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

// ── Completion paths ─────────────────────────────────────────────────

#[test]
fn body_accumulates_across_chunks() {
    let engine = ScriptedEngine::single(vec![
        Event::Started(head(200, "http://test.local/echo", &[("X-Served-By", "t1")])),
        Event::Chunk(b"AB"),
        Event::Chunk(b""),
        Event::Chunk(b"CD"),
        Event::Succeeded,
    ]);
    let client = Client::new(engine.clone());

    let response = client
        .get("http://test.local/echo")
        .send()
        .expect("send failed")
        .expect("engine cancelled");

    assert_eq!(response.status(), 200);
    assert_eq!(response.url(), "http://test.local/echo");
    assert_eq!(&response.body()[..], b"ABCD");
    assert_eq!(response.text().unwrap(), "ABCD");
    assert_eq!(response.headers().get("x-served-by"), Some("t1"));
}

#[test]
fn second_terminal_event_is_ignored() {
    let engine = ScriptedEngine::single(vec![
        Event::Started(head(200, "http://test.local/echo", &[])),
        Event::Chunk(b"first"),
        Event::Succeeded,
        Event::Failed("late boom"),
    ]);
    let client = Client::new(engine);

    // The success lands first; the stray failure after it is dropped.
    let response = client
        .get("http://test.local/echo")
        .send()
        .expect("send failed")
        .expect("engine cancelled");
    assert_eq!(response.status(), 200);
    assert_eq!(&response.body()[..], b"first");
}

#[test]
fn engine_failure_surfaces_verbatim() {
    let engine = ScriptedEngine::single(vec![Event::Failed("net::ERR_CONNECTION_REFUSED")]);
    let client = Client::new(engine);

    match client.get("http://test.local/down").send() {
        Err(ClientError::Engine(message)) => {
            assert_eq!(message, "net::ERR_CONNECTION_REFUSED");
        }
        other => panic!("expected an engine error, got {other:?}"),
    }
}

#[test]
fn engine_cancel_resolves_to_none() {
    let engine = ScriptedEngine::single(vec![Event::Canceled]);
    let client = Client::new(engine);

    let outcome = client.get("http://test.local/gone").send().expect("send failed");
    assert!(outcome.is_none());
}

#[test]
fn repeated_response_headers_survive() {
    let engine = ScriptedEngine::single(vec![
        Event::Started(head(
            200,
            "http://test.local/cookies",
            &[("Set-Cookie", "a=1"), ("Set-Cookie", "b=2")],
        )),
        Event::Succeeded,
    ]);
    let client = Client::new(engine);

    let response = client
        .get("http://test.local/cookies")
        .send()
        .unwrap()
        .unwrap();
    assert_eq!(response.headers().get_all("set-cookie"), vec!["a=1", "b=2"]);
}

// ── Deadlines ────────────────────────────────────────────────────────

#[test]
fn deadline_expiry_cancels_the_submitted_handle() {
    init_tracing();
    let engine = ScriptedEngine::new(vec![Script::Hang]);
    let client = Client::new(engine.clone());

    let result = client
        .get("http://test.local/slow")
        .timeout(Duration::from_millis(50))
        .send();

    match result {
        Err(ClientError::Timeout { after }) => assert_eq!(after, Duration::from_millis(50)),
        other => panic!("expected a timeout, got {other:?}"),
    }
    assert_eq!(engine.cancels(), vec![1]);
}

#[test]
fn completion_after_the_deadline_is_dropped() {
    init_tracing();
    let engine = ScriptedEngine::single(vec![
        Event::Delay(Duration::from_millis(150)),
        Event::Started(head(200, "http://test.local/slow", &[])),
        Event::Succeeded,
    ]);
    let client = Client::new(engine.clone());

    let result = client
        .get("http://test.local/slow")
        .timeout(Duration::from_millis(30))
        .send();
    assert!(matches!(result, Err(ClientError::Timeout { .. })));
    assert_eq!(engine.cancels(), vec![1]);

    // The late success lands in an abandoned cell; nothing to observe,
    // nothing to crash.
    thread::sleep(Duration::from_millis(200));
}

// ── Redirects ────────────────────────────────────────────────────────

#[test]
fn suppressed_redirect_is_the_response() {
    let engine = ScriptedEngine::single(vec![
        Event::Redirect {
            location: "http://test.local/elsewhere",
            head: head(
                301,
                "http://test.local/redirect",
                &[("Location", "http://test.local/elsewhere")],
            ),
        },
        // The engine's wind-down; must not disturb the published result.
        Event::Canceled,
    ]);
    let client = Client::new(engine.clone());

    let response = client
        .get("http://test.local/redirect")
        .allow_redirects(false)
        .send()
        .unwrap()
        .unwrap();

    assert_eq!(response.status(), 301);
    assert_eq!(response.url(), "http://test.local/redirect");
    assert_eq!(
        response.headers().get("location"),
        Some("http://test.local/elsewhere")
    );
    assert!(response.body().is_empty());

    // The result is published from inside the redirect callback, so the
    // worker may still be recording the returned action; give it a beat.
    for _ in 0..200 {
        if !engine.redirect_actions().is_empty() {
            break;
        }
        thread::sleep(Duration::from_millis(2));
    }
    assert_eq!(engine.redirect_actions(), vec![RedirectAction::Stop]);
}

#[test]
fn followed_redirect_reports_the_final_url() {
    let engine = ScriptedEngine::single(vec![
        Event::Redirect {
            location: "http://test.local/final",
            head: head(302, "http://test.local/hop", &[]),
        },
        Event::Started(head(200, "http://test.local/final", &[])),
        Event::Chunk(b"landed"),
        Event::Succeeded,
    ]);
    let client = Client::new(engine.clone());

    let response = client
        .get("http://test.local/hop")
        .send()
        .unwrap()
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.url(), "http://test.local/final");
    assert_eq!(&response.body()[..], b"landed");
    assert_eq!(engine.redirect_actions(), vec![RedirectAction::Follow]);
}

// ── Caller errors stop before the engine ─────────────────────────────

#[test]
fn conflicting_bodies_never_reach_the_engine() {
    let engine = ScriptedEngine::new(Vec::new());
    let client = Client::new(engine.clone());

    let result = client
        .post("http://test.local/submit")
        .body(&b"raw"[..])
        .json(&serde_json::json!({"k": 1}))
        .send();

    assert!(matches!(result, Err(ClientError::BodyConflict { .. })));
    assert!(engine.submissions().is_empty());
}

#[test]
fn invalid_urls_never_reach_the_engine() {
    let engine = ScriptedEngine::new(Vec::new());
    let client = Client::new(engine.clone());

    let result = client.get("not a url").send();
    assert!(matches!(result, Err(ClientError::InvalidUrl(_))));
    assert!(engine.submissions().is_empty());
}

// ── Request assembly reaches the engine ──────────────────────────────

#[test]
fn query_headers_and_method_reach_the_spec() {
    let engine = ScriptedEngine::single(vec![
        Event::Started(head(200, "http://test.local/echo", &[])),
        Event::Succeeded,
    ]);
    let client = Client::new(engine.clone());

    client
        .request("DELETE", "http://test.local/echo?test1=1")
        .query("test2", "2")
        .header("X-Trace", "abc")
        .send()
        .unwrap();

    let specs = engine.submissions();
    assert_eq!(specs.len(), 1);
    assert_eq!(specs[0].method, "DELETE");
    assert_eq!(specs[0].url, "http://test.local/echo?test1=1&test2=2");
    assert!(specs[0]
        .headers
        .contains(&("X-Trace".to_string(), "abc".to_string())));
}

#[test]
fn form_bodies_arrive_encoded_and_typed() {
    let engine = ScriptedEngine::single(vec![
        Event::Started(head(200, "http://test.local/submit", &[])),
        Event::Succeeded,
    ]);
    let client = Client::new(engine.clone());

    client
        .post("http://test.local/submit")
        .form(&[("a", "b c")])
        .send()
        .unwrap();

    let specs = engine.submissions();
    assert_eq!(specs[0].body.as_deref(), Some(b"a=b+c".as_slice()));
    assert!(specs[0].headers.contains(&(
        "Content-Type".to_string(),
        "application/x-www-form-urlencoded".to_string()
    )));
}
