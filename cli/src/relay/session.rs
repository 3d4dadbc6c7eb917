//! Relay Session State

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use url::Url;

/// Interval between polls of the delivery-attempt list.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Number of most recent attempts inspected per poll.
pub const ATTEMPT_WINDOW: usize = 20;

/// The upstream connection a relay watches, resolved at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoredConnection {
    pub project_id: u64,
    pub source_id: u64,
    pub source_slug: String,
    pub connection_id: u64,
    pub connection_name: String,
}

/// Everything one listening session needs, fixed for its lifetime.
#[derive(Debug, Clone)]
pub struct Session {
    /// Attempts created at or before this instant are historical.
    pub started_at: DateTime<Utc>,
    pub forward_url: Url,
    pub target: MonitoredConnection,
    pub poll_interval: Duration,
    pub attempt_window: usize,
}

impl Session {
    /// Start a session now.
    pub fn start(forward_url: Url, target: MonitoredConnection) -> Self {
        Self {
            started_at: Utc::now(),
            forward_url,
            target,
            poll_interval: DEFAULT_POLL_INTERVAL,
            attempt_window: ATTEMPT_WINDOW,
        }
    }

    #[must_use]
    pub const fn with_started_at(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = started_at;
        self
    }

    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// Lifecycle of the relay loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Initializing,
    Polling,
    Processing,
    ShuttingDown,
    Terminated,
}

impl fmt::Display for RelayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initializing => "initializing",
            Self::Polling => "polling",
            Self::Processing => "processing",
            Self::ShuttingDown => "shutting_down",
            Self::Terminated => "terminated",
        };
        f.write_str(name)
    }
}
