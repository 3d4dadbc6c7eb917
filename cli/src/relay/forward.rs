//! Forwarder
//!
//! Replays one event against the local target as a single POST. The raw body
//! goes out untouched and the original headers are copied before anything
//! else, because webhook signatures are computed over exactly those bytes.

use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::api::{self, Event};

/// Client-side timeout for one forward.
pub const FORWARD_TIMEOUT: Duration = Duration::from_secs(10);

/// Content type used when the original delivery carried none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Tracking headers, always set by the relay. Sent title-cased on the wire.
pub const EVENT_ID_HEADER: &str = "x-volley-event-id";
pub const SOURCE_ID_HEADER: &str = "x-volley-source-id";
pub const SOURCE_SLUG_HEADER: &str = "x-volley-source-slug";

/// Headers owned by the HTTP transport. The original values describe the
/// connection to Volley, not to the local target, so they are not copied.
const TRANSPORT_HEADERS: [&str; 5] = [
    "host",
    "content-length",
    "transfer-encoding",
    "connection",
    "keep-alive",
];

/// A forward that reached the target and got a status below 400.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardOutcome {
    pub status: u16,
    pub latency: Duration,
}

/// Forwarding errors.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("local endpoint returned {0}")]
    Status(u16),
}

/// Sends events to the local target.
#[derive(Debug, Clone)]
pub struct Forwarder {
    http: Client,
    target: Url,
}

impl Forwarder {
    pub fn new(target: Url) -> Result<Self, ForwardError> {
        // No default user agent: it is only added when the original lacks one.
        let http = Client::builder()
            .timeout(FORWARD_TIMEOUT)
            .http1_title_case_headers()
            .build()
            .map_err(ForwardError::Client)?;

        Ok(Self { http, target })
    }

    pub const fn target(&self) -> &Url {
        &self.target
    }

    /// Forward `event` once. Status >= 400 is a failure; nothing is retried.
    pub async fn forward(&self, event: &Event) -> Result<ForwardOutcome, ForwardError> {
        let headers = build_headers(event);

        let start = Instant::now();
        let response = self
            .http
            .post(self.target.clone())
            .headers(headers)
            .body(event.raw_body.clone())
            .send()
            .await?;
        let latency = start.elapsed();

        let status = response.status().as_u16();
        debug!(
            event_id = %event.event_id,
            status,
            latency_ms = latency.as_millis() as u64,
            "Local endpoint responded"
        );

        if status >= 400 {
            return Err(ForwardError::Status(status));
        }
        Ok(ForwardOutcome { status, latency })
    }
}

/// Outbound headers for `event`.
///
/// 1. every original name/value pair, in order and multiplicity
/// 2. `Content-Type` and `User-Agent` defaults, only if missing
/// 3. the `X-Volley-*` tracking headers, replacing only themselves
pub fn build_headers(event: &Event) -> HeaderMap {
    let mut headers = HeaderMap::new();

    for (name, value) in event.headers.pairs() {
        if TRANSPORT_HEADERS
            .iter()
            .any(|h| h.eq_ignore_ascii_case(name))
        {
            continue;
        }

        let Ok(header_name) = HeaderName::from_bytes(name.as_bytes()) else {
            warn!(event_id = %event.event_id, header = name, "Skipping invalid header name");
            continue;
        };
        let Ok(header_value) = HeaderValue::from_bytes(value.as_bytes()) else {
            warn!(event_id = %event.event_id, header = name, "Skipping invalid header value");
            continue;
        };
        headers.append(header_name, header_value);
    }

    if !headers.contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    }
    if !headers.contains_key(USER_AGENT) {
        headers.insert(USER_AGENT, HeaderValue::from_static(api::USER_AGENT));
    }

    set_tracking(&mut headers, EVENT_ID_HEADER, &event.event_id);
    set_tracking(&mut headers, SOURCE_ID_HEADER, &event.source_id.to_string());
    set_tracking(&mut headers, SOURCE_SLUG_HEADER, &event.source_slug);

    headers
}

fn set_tracking(headers: &mut HeaderMap, name: &'static str, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(v) => {
            headers.insert(HeaderName::from_static(name), v);
        }
        Err(_) => warn!(header = name, "Skipping tracking header with invalid value"),
    }
}
