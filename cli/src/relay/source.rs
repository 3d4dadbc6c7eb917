//! Remote Event Source
//!
//! The narrow slice of the Volley API the relay depends on. [`ApiClient`]
//! is the production implementation; tests substitute in-memory sources.

use crate::api::{ApiClient, ApiResult, Connection, DeliveryAttempt, Event, SourceWithProject};

/// Where the relay discovers delivery attempts and loads event payloads.
///
/// The relay drives a source from a single task, so implementations need
/// not be `Send`.
#[allow(async_fn_in_trait)]
pub trait EventSource {
    /// Resolve a source by ingestion id, with its owning project.
    async fn resolve_source(&self, ingestion_id: &str) -> ApiResult<SourceWithProject>;

    /// Connections fed by `source_id`.
    async fn connections_for_source(&self, source_id: u64) -> ApiResult<Vec<Connection>>;

    /// Most recent attempts for a connection, newest first (treated as a hint).
    async fn delivery_attempts(
        &self,
        connection_id: u64,
        limit: usize,
    ) -> ApiResult<Vec<DeliveryAttempt>>;

    /// Full payload of one event. Must be idempotent.
    async fn event(&self, event_id: &str, project_id: u64) -> ApiResult<Event>;
}

impl EventSource for ApiClient {
    async fn resolve_source(&self, ingestion_id: &str) -> ApiResult<SourceWithProject> {
        self.find_source(ingestion_id).await
    }

    async fn connections_for_source(&self, source_id: u64) -> ApiResult<Vec<Connection>> {
        Self::connections_for_source(self, source_id).await
    }

    async fn delivery_attempts(
        &self,
        connection_id: u64,
        limit: usize,
    ) -> ApiResult<Vec<DeliveryAttempt>> {
        Self::delivery_attempts(self, connection_id, limit).await
    }

    async fn event(&self, event_id: &str, project_id: u64) -> ApiResult<Event> {
        self.find_event(event_id, project_id).await
    }
}
