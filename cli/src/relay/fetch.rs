//! Payload Fetcher
//!
//! A delivery attempt can become visible before its payload is searchable, so
//! event lookups are retried a bounded number of times with linearly growing
//! waits (1s, 2s, 3s, 4s by default). The first success wins; there is no wait
//! after the final attempt.

use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use super::source::EventSource;
use crate::api::{ApiError, Event};

/// Retry bounds for event lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Total lookups, including the first one.
    pub max_attempts: u32,
    /// Wait after the n-th failed lookup is `n * backoff_step`.
    pub backoff_step: Duration,
}

impl FetchPolicy {
    pub const DEFAULT: Self = Self {
        max_attempts: 5,
        backoff_step: Duration::from_secs(1),
    };

    /// Wait after the failed lookup number `attempt` (1-based), or `None`
    /// when it was the last one.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        (attempt < self.max_attempts).then(|| self.backoff_step * attempt)
    }

    /// Sum of all waits when every lookup fails.
    pub fn total_max_wait(&self) -> Duration {
        (1..self.max_attempts.max(1))
            .filter_map(|attempt| self.delay_after(attempt))
            .sum()
    }
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Event could not be loaded within the retry bound.
#[derive(Debug, Error)]
#[error("event {event_id} not found after {attempts} attempts: {last_error}")]
pub struct FetchError {
    pub event_id: String,
    pub attempts: u32,
    #[source]
    pub last_error: ApiError,
}

/// Load `event_id`, retrying per `policy`.
pub async fn fetch_event<S: EventSource>(
    source: &S,
    event_id: &str,
    project_id: u64,
    policy: FetchPolicy,
) -> Result<Event, FetchError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        match source.event(event_id, project_id).await {
            Ok(event) => return Ok(event),
            Err(e) => {
                debug!(event_id, attempt, error = %e, "Event lookup failed");
                last_error = Some(e);
            }
        }

        if let Some(delay) = policy.delay_after(attempt) {
            tokio::time::sleep(delay).await;
        }
    }

    Err(FetchError {
        event_id: event_id.to_string(),
        attempts: max_attempts,
        last_error: last_error
            .unwrap_or_else(|| ApiError::NotFound(format!("event '{event_id}'"))),
    })
}
