//! Relay Loop
//!
//! Drives one listening session: every tick it polls the delivery attempts of
//! the monitored connection, filters them, then fetches and forwards the
//! survivors one after another. Tick work runs to completion on the calling
//! task; shutdown is only observed between ticks.

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use super::fetch::{fetch_event, FetchError, FetchPolicy};
use super::filter::select_new_attempts;
use super::forward::{ForwardError, Forwarder};
use super::ledger::DedupLedger;
use super::session::{MonitoredConnection, RelayState, Session};
use super::source::EventSource;
use crate::api::{ApiError, DeliveryAttempt};

/// Fatal startup errors.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("failed to get source: {0}")]
    Source(#[source] ApiError),

    #[error("failed to get connections: {0}")]
    Connections(#[source] ApiError),

    #[error("no connections found for source '{0}'. Please create a connection first")]
    NoConnection(String),

    #[error(transparent)]
    Forwarder(#[from] ForwardError),
}

/// What happened to one event during a tick.
#[derive(Debug)]
pub enum EventOutcome {
    Forwarded { status: u16 },
    FetchFailed(FetchError),
    ForwardFailed(ForwardError),
}

/// Summary of one tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub poll_failed: bool,
    pub polled: usize,
    pub skipped: usize,
    pub forwarded: usize,
    pub failed: usize,
}

/// Totals over the lifetime of a relay.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RelayStats {
    pub ticks: u64,
    pub poll_failures: u64,
    pub skipped: u64,
    pub forwarded: u64,
    pub failed: u64,
}

impl RelayStats {
    fn record(&mut self, tick: &TickReport) {
        self.ticks += 1;
        self.poll_failures += u64::from(tick.poll_failed);
        self.skipped += tick.skipped as u64;
        self.forwarded += tick.forwarded as u64;
        self.failed += tick.failed as u64;
    }
}

/// A relay instance. Owns its session and dedup ledger.
pub struct Relay<S> {
    source: S,
    forwarder: Forwarder,
    session: Session,
    ledger: DedupLedger,
    fetch_policy: FetchPolicy,
    state: RelayState,
    stats: RelayStats,
}

impl<S: EventSource> Relay<S> {
    /// Resolve the monitored connection for `ingestion_id` and start a session.
    ///
    /// The first connection of the source is watched; having none is fatal.
    pub async fn initialize(
        source: S,
        ingestion_id: &str,
        forward_url: Url,
    ) -> Result<Self, RelayError> {
        let resolved = source
            .resolve_source(ingestion_id)
            .await
            .map_err(RelayError::Source)?;

        let connections = source
            .connections_for_source(resolved.source.id)
            .await
            .map_err(RelayError::Connections)?;
        let Some(connection) = connections.into_iter().next() else {
            return Err(RelayError::NoConnection(ingestion_id.to_string()));
        };

        let target = MonitoredConnection {
            project_id: resolved.project_id,
            source_id: resolved.source.id,
            source_slug: resolved.source.slug,
            connection_id: connection.id,
            connection_name: connection.name,
        };
        let forwarder = Forwarder::new(forward_url.clone())?;

        Ok(Self::new(source, forwarder, Session::start(forward_url, target)))
    }

    pub fn new(source: S, forwarder: Forwarder, session: Session) -> Self {
        Self {
            source,
            forwarder,
            session,
            ledger: DedupLedger::new(),
            fetch_policy: FetchPolicy::DEFAULT,
            state: RelayState::Initializing,
            stats: RelayStats::default(),
        }
    }

    #[must_use]
    pub const fn with_fetch_policy(mut self, policy: FetchPolicy) -> Self {
        self.fetch_policy = policy;
        self
    }

    pub const fn source(&self) -> &S {
        &self.source
    }

    pub const fn session(&self) -> &Session {
        &self.session
    }

    pub const fn ledger(&self) -> &DedupLedger {
        &self.ledger
    }

    pub const fn state(&self) -> RelayState {
        self.state
    }

    pub const fn stats(&self) -> RelayStats {
        self.stats
    }

    fn transition(&mut self, next: RelayState) {
        if self.state != next {
            debug!(from = %self.state, to = %next, "Relay state change");
            self.state = next;
        }
    }

    /// Run until `shutdown` is cancelled.
    ///
    /// The first poll happens one interval after start. When a tick and the
    /// shutdown are both ready, shutdown wins.
    pub async fn run(mut self, shutdown: CancellationToken) -> RelayStats {
        let period = self.session.poll_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            connection_id = self.session.target.connection_id,
            forward_url = %self.session.forward_url,
            started_at = %self.session.started_at,
            "Relay started"
        );
        self.transition(RelayState::Polling);

        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }

        self.transition(RelayState::ShuttingDown);
        println!("\n✓ Shutting down...");
        self.transition(RelayState::Terminated);

        debug!(
            ticks = self.stats.ticks,
            forwarded = self.stats.forwarded,
            failed = self.stats.failed,
            "Relay stopped"
        );
        self.stats
    }

    /// Poll once and process every new attempt.
    pub async fn tick(&mut self) -> TickReport {
        self.transition(RelayState::Polling);
        let mut report = TickReport::default();

        let attempts = match self
            .source
            .delivery_attempts(self.session.target.connection_id, self.session.attempt_window)
            .await
        {
            Ok(attempts) => attempts,
            Err(e) => {
                warn!(
                    connection_id = self.session.target.connection_id,
                    error = %e,
                    "Failed to get delivery attempts"
                );
                report.poll_failed = true;
                self.stats.record(&report);
                return report;
            }
        };
        report.polled = attempts.len();

        self.transition(RelayState::Processing);
        let selection = select_new_attempts(&attempts, &mut self.ledger, self.session.started_at);
        report.skipped = selection.skipped;

        for attempt in selection.fresh {
            match self.process(attempt).await {
                EventOutcome::Forwarded { .. } => report.forwarded += 1,
                EventOutcome::FetchFailed(_) | EventOutcome::ForwardFailed(_) => {
                    report.failed += 1;
                }
            }
        }

        self.stats.record(&report);
        self.transition(RelayState::Polling);
        report
    }

    /// Fetch and forward one attempt, reporting the result to the user.
    async fn process(&self, attempt: &DeliveryAttempt) -> EventOutcome {
        let event_id = attempt.event_id.as_str();

        let event = match fetch_event(
            &self.source,
            event_id,
            self.session.target.project_id,
            self.fetch_policy,
        )
        .await
        {
            Ok(event) => event,
            Err(e) => {
                eprintln!("✗ Failed to fetch event {event_id}: {e}");
                return EventOutcome::FetchFailed(e);
            }
        };

        match self.forwarder.forward(&event).await {
            Ok(outcome) => {
                println!(
                    "✓ Forwarded event {event_id} -> {}",
                    self.forwarder.target()
                );
                EventOutcome::Forwarded {
                    status: outcome.status,
                }
            }
            Err(e) => {
                eprintln!("✗ Failed to forward event {event_id}: {e}");
                EventOutcome::ForwardFailed(e)
            }
        }
    }
}
