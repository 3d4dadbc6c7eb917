//! Event Lookup

use super::client::ApiClient;
use super::error::{ApiError, ApiResult};
use super::types::{Event, RequestsResponse};

/// Page size of the request-log search.
const SEARCH_LIMIT: u32 = 50;

impl ApiClient {
    /// Fetch one event, with its raw body and original headers, by id.
    ///
    /// The request log search is a substring match, so the exact `event_id`
    /// is picked out of the results. Safe to call repeatedly.
    pub async fn find_event(&self, event_id: &str, project_id: u64) -> ApiResult<Event> {
        let resp: RequestsResponse = self
            .get_json_with_query(
                &format!("/api/projects/{project_id}/requests"),
                &[
                    ("search", event_id.to_string()),
                    ("limit", SEARCH_LIMIT.to_string()),
                ],
            )
            .await?;

        resp.requests
            .into_iter()
            .find(|r| r.event_id == event_id)
            .map(Event::from)
            .ok_or_else(|| ApiError::NotFound(format!("event '{event_id}'")))
    }
}
