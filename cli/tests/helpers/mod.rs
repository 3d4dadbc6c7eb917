//! Reusable test helpers for relay integration tests.
//!
//! - [`spawn_test_server()`] binds an axum router on an ephemeral port.
//! - [`capture_router()`] records every request it receives, standing in for
//!   the developer's local webhook endpoint.
//! - [`FakeSource`] is an in-memory [`EventSource`] with scripted polls.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::Router;
use chrono::{DateTime, Duration, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

use volley_cli::api::{
    ApiError, ApiResult, Connection, DeliveryAttempt, Event, HeaderMultimap, Source,
    SourceWithProject,
};
use volley_cli::relay::{EventSource, FetchPolicy, Forwarder, MonitoredConnection, Relay, Session};

// ============================================================================
// Test servers
// ============================================================================

/// A running test server.
pub struct TestServer {
    pub addr: SocketAddr,
    pub url: String,
    _handle: JoinHandle<()>,
}

impl TestServer {
    pub fn url_for(&self, path: &str) -> Url {
        Url::parse(&format!("{}{path}", self.url)).expect("valid test URL")
    }
}

/// Spawn `router` on `127.0.0.1:0`.
pub async fn spawn_test_server(router: Router) -> TestServer {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let addr = listener.local_addr().expect("Failed to get local addr");
    let url = format!("http://{addr}");

    let handle = tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("Test server failed");
    });

    TestServer {
        addr,
        url,
        _handle: handle,
    }
}

/// A URL nothing listens on.
pub async fn unreachable_url() -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get local addr");
    drop(listener);
    Url::parse(&format!("http://{addr}/webhook")).expect("valid URL")
}

// ============================================================================
// Capturing endpoint
// ============================================================================

/// Request header that makes the capture endpoint answer 500.
pub const FAIL_HEADER: &str = "x-test-fail";

/// One request received by the capture endpoint.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl CapturedRequest {
    /// All values of `name`, in received order.
    pub fn header_values(&self, name: &str) -> Vec<String> {
        self.headers
            .get_all(name)
            .iter()
            .map(|v| v.to_str().expect("ascii header").to_string())
            .collect()
    }

    pub fn event_id(&self) -> String {
        self.header_values("x-volley-event-id")
            .into_iter()
            .next()
            .unwrap_or_default()
    }
}

pub type Captured = Arc<Mutex<Vec<CapturedRequest>>>;

async fn capture(
    State(captured): State<Captured>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let fail = headers.contains_key(FAIL_HEADER);
    captured.lock().unwrap().push(CapturedRequest {
        method,
        headers,
        body,
    });
    if fail {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    }
}

/// Router that records every request to `/webhook`.
pub fn capture_router() -> (Router, Captured) {
    let captured: Captured = Arc::default();
    let router = Router::new()
        .route("/webhook", axum::routing::any(capture))
        .with_state(captured.clone());
    (router, captured)
}

/// Spawn a capture endpoint; returns the server and its request log.
pub async fn spawn_capture_server() -> (TestServer, Captured) {
    let (router, captured) = capture_router();
    (spawn_test_server(router).await, captured)
}

// ============================================================================
// Events and attempts
// ============================================================================

pub const PROJECT_ID: u64 = 7;
pub const SOURCE_ID: u64 = 42;
pub const CONNECTION_ID: u64 = 900;

pub fn attempt_at(event_id: &str, created_at: DateTime<Utc>) -> DeliveryAttempt {
    DeliveryAttempt {
        event_id: event_id.to_string(),
        status: "success".into(),
        created_at: Some(created_at.to_rfc3339()),
        ..Default::default()
    }
}

pub fn offset(start: DateTime<Utc>, secs: i64) -> DateTime<Utc> {
    start + Duration::seconds(secs)
}

pub fn event_with(event_id: &str, body: &[u8], headers: HeaderMultimap) -> Event {
    Event {
        event_id: event_id.to_string(),
        source_id: SOURCE_ID,
        source_slug: "stripe".into(),
        raw_body: body.to_vec(),
        headers,
        created_at: None,
    }
}

pub fn simple_event(event_id: &str) -> Event {
    event_with(
        event_id,
        format!(r#"{{"id":"{event_id}"}}"#).as_bytes(),
        [("Stripe-Signature", "t=1,v1=abc")].into_iter().collect(),
    )
}

// ============================================================================
// Fake event source
// ============================================================================

/// One scripted poll result.
#[derive(Debug, Clone)]
pub enum Poll {
    Attempts(Vec<DeliveryAttempt>),
    Fail,
}

/// In-memory event source.
///
/// Polls are served from a script; once it runs out, the last entry repeats.
#[derive(Default)]
pub struct FakeSource {
    pub connections: Vec<Connection>,
    polls: Mutex<VecDeque<Poll>>,
    last_poll: Mutex<Option<Poll>>,
    events: Mutex<HashMap<String, Event>>,
    pub fetch_calls: Mutex<Vec<String>>,
    pub poll_calls: Mutex<u32>,
    /// Cancelled on the first event fetch, to simulate a signal mid-tick.
    pub cancel_on_fetch: Option<CancellationToken>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self {
            connections: vec![Connection {
                id: CONNECTION_ID,
                name: "local-dev".into(),
                source_id: SOURCE_ID,
                source_slug: "stripe".into(),
                destination_id: 1,
                destination_url: "https://example.com/hook".into(),
                status: "active".into(),
                source_eps: 0,
                destination_eps: 0,
            }],
            ..Default::default()
        }
    }

    pub fn with_polls(self, polls: impl IntoIterator<Item = Poll>) -> Self {
        self.polls.lock().unwrap().extend(polls);
        self
    }

    pub fn with_event(self, event: Event) -> Self {
        self.events
            .lock()
            .unwrap()
            .insert(event.event_id.clone(), event);
        self
    }

    pub fn fetches(&self) -> Vec<String> {
        self.fetch_calls.lock().unwrap().clone()
    }
}

impl EventSource for FakeSource {
    async fn resolve_source(&self, ingestion_id: &str) -> ApiResult<SourceWithProject> {
        if ingestion_id != "ing_test" {
            return Err(ApiError::NotFound(format!("source '{ingestion_id}'")));
        }
        Ok(SourceWithProject {
            source: Source {
                id: SOURCE_ID,
                slug: "stripe".into(),
                ingestion_id: ingestion_id.to_string(),
                eps: 0,
                status: "active".into(),
            },
            project_id: PROJECT_ID,
        })
    }

    async fn connections_for_source(&self, source_id: u64) -> ApiResult<Vec<Connection>> {
        Ok(self
            .connections
            .iter()
            .filter(|c| c.source_id == source_id)
            .cloned()
            .collect())
    }

    async fn delivery_attempts(
        &self,
        _connection_id: u64,
        limit: usize,
    ) -> ApiResult<Vec<DeliveryAttempt>> {
        *self.poll_calls.lock().unwrap() += 1;

        let next = self.polls.lock().unwrap().pop_front();
        let poll = match next {
            Some(poll) => {
                *self.last_poll.lock().unwrap() = Some(poll.clone());
                poll
            }
            None => self
                .last_poll
                .lock()
                .unwrap()
                .clone()
                .unwrap_or(Poll::Attempts(Vec::new())),
        };

        match poll {
            Poll::Attempts(mut attempts) => {
                attempts.truncate(limit);
                Ok(attempts)
            }
            Poll::Fail => Err(ApiError::Status {
                status: 503,
                body: "unavailable".into(),
            }),
        }
    }

    async fn event(&self, event_id: &str, project_id: u64) -> ApiResult<Event> {
        self.fetch_calls.lock().unwrap().push(event_id.to_string());
        if let Some(token) = &self.cancel_on_fetch {
            token.cancel();
        }

        assert_eq!(project_id, PROJECT_ID);
        self.events
            .lock()
            .unwrap()
            .get(event_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("event '{event_id}'")))
    }
}

// ============================================================================
// Relay construction
// ============================================================================

/// Fast retries so exhausted fetches do not slow tests down.
pub const FAST_FETCH: FetchPolicy = FetchPolicy {
    max_attempts: 2,
    backoff_step: std::time::Duration::from_millis(5),
};

pub fn monitored() -> MonitoredConnection {
    MonitoredConnection {
        project_id: PROJECT_ID,
        source_id: SOURCE_ID,
        source_slug: "stripe".into(),
        connection_id: CONNECTION_ID,
        connection_name: "local-dev".into(),
    }
}

/// Relay over `source` forwarding to `target`, session started at `start`.
pub fn relay_at(source: FakeSource, target: Url, start: DateTime<Utc>) -> Relay<FakeSource> {
    let forwarder = Forwarder::new(target.clone()).expect("forwarder");
    let session = Session::start(target, monitored()).with_started_at(start);
    Relay::new(source, forwarder, session).with_fetch_policy(FAST_FETCH)
}
