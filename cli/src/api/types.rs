//! API Types
//!
//! Response shapes of the Volley API and the domain types built from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::headers::HeaderMultimap;

/// A project owned by the authenticated organization.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Project {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProjectsResponse {
    #[serde(default)]
    pub projects: Vec<Project>,
}

/// An inbound webhook source.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Source {
    pub id: u64,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub ingestion_id: String,
    #[serde(default)]
    pub eps: i64,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SourcesResponse {
    #[serde(default)]
    pub sources: Vec<Source>,
}

/// A source together with the project that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceWithProject {
    pub source: Source,
    pub project_id: u64,
}

/// Binding between a source and a destination.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Connection {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub source_id: u64,
    #[serde(default)]
    pub source_slug: String,
    #[serde(default)]
    pub destination_id: u64,
    #[serde(default)]
    pub destination_url: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub source_eps: i64,
    #[serde(default)]
    pub destination_eps: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConnectionsResponse {
    #[serde(default)]
    pub connections: Vec<Connection>,
}

/// One historical delivery try of an event to a connection.
///
/// `created_at` is kept as the raw RFC3339 text the API sent; it may be
/// absent, empty, or malformed, and the relay decides what that means.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct DeliveryAttempt {
    pub event_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub response_code: i64,
    #[serde(default)]
    pub error_reason: String,
    #[serde(default)]
    pub duration_ms: i64,
    #[serde(default)]
    pub entry_time: Option<String>,
    #[serde(default)]
    pub exit_time: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AttemptsResponse {
    #[serde(default)]
    pub attempts: Vec<DeliveryAttempt>,
}

/// A received webhook, exactly as it reached Volley.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub event_id: String,
    pub source_id: u64,
    pub source_slug: String,
    /// Body bytes as received. Never re-encoded.
    pub raw_body: Vec<u8>,
    pub headers: HeaderMultimap,
    pub created_at: Option<DateTime<Utc>>,
}

/// One row of the project request log, as returned by the search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RequestRecord {
    #[serde(default)]
    pub event_id: String,
    #[serde(default)]
    pub source_id: u64,
    #[serde(default)]
    pub source_slug: String,
    #[serde(default)]
    pub raw_body: String,
    #[serde(default)]
    pub headers: HeaderMultimap,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RequestsResponse {
    #[serde(default)]
    pub requests: Vec<RequestRecord>,
}

impl From<RequestRecord> for Event {
    fn from(r: RequestRecord) -> Self {
        Self {
            created_at: r.created_at.as_deref().and_then(parse_timestamp),
            event_id: r.event_id,
            source_id: r.source_id,
            source_slug: r.source_slug,
            raw_body: r.raw_body.into_bytes(),
            headers: r.headers,
        }
    }
}

/// Parse an RFC3339 timestamp into UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Authenticated user.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserResponse {
    pub user: User,
}

/// Organization the credential is currently scoped to.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Organization {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

/// Start of the CLI pairing-code login flow.
#[derive(Debug, Clone, Deserialize)]
pub struct CliAuthStart {
    pub pairing_code: String,
    pub device_code: String,
    pub auth_url: String,
    #[serde(default)]
    pub expires_in: u64,
}

/// One poll of the pairing-code login flow.
#[derive(Debug, Clone, Deserialize)]
pub struct CliAuthPoll {
    pub status: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl CliAuthPoll {
    pub fn is_complete(&self) -> bool {
        self.status == "complete"
    }

    /// The pairing was rejected or timed out on the server side.
    pub fn is_terminal_failure(&self) -> bool {
        matches!(self.status.as_str(), "expired" | "denied")
    }
}
