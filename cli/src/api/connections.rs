//! Connections and Delivery Attempts

use tracing::debug;

use super::client::ApiClient;
use super::error::ApiResult;
use super::types::{AttemptsResponse, Connection, ConnectionsResponse, DeliveryAttempt};

impl ApiClient {
    /// List the connections of one project.
    pub async fn list_connections(&self, project_id: u64) -> ApiResult<Vec<Connection>> {
        let resp: ConnectionsResponse = self
            .get_json(&format!("/api/projects/{project_id}/connections"))
            .await?;
        Ok(resp.connections)
    }

    /// All connections fed by `source_id`, across every project.
    ///
    /// Projects whose connection listing fails are skipped.
    pub async fn connections_for_source(&self, source_id: u64) -> ApiResult<Vec<Connection>> {
        let projects = self.list_projects().await?;

        let mut matching = Vec::new();
        for project in projects {
            match self.list_connections(project.id).await {
                Ok(connections) => {
                    matching.extend(connections.into_iter().filter(|c| c.source_id == source_id));
                }
                Err(e) => {
                    debug!(project_id = project.id, error = %e, "Skipping project, failed to list connections");
                }
            }
        }
        Ok(matching)
    }

    /// Most recent delivery attempts for a connection, newest first.
    ///
    /// The endpoint has no limit parameter; the list is truncated client-side.
    pub async fn delivery_attempts(
        &self,
        connection_id: u64,
        limit: usize,
    ) -> ApiResult<Vec<DeliveryAttempt>> {
        let resp: AttemptsResponse = self
            .get_json(&format!("/api/connections/{connection_id}/attempts"))
            .await?;

        let mut attempts = resp.attempts;
        if limit > 0 {
            attempts.truncate(limit);
        }
        Ok(attempts)
    }
}
