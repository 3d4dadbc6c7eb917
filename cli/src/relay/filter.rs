//! Attempt Filter
//!
//! Narrows a polled window of delivery attempts to the ones this session has
//! not handled yet and that were created after it started. Every attempt that
//! is looked at gets marked in the ledger, so nothing is reconsidered on a
//! later tick, including attempts that are skipped.

use chrono::{DateTime, Utc};
use tracing::warn;

use super::ledger::DedupLedger;
use crate::api::{parse_timestamp, DeliveryAttempt};

/// Result of filtering one polled window.
#[derive(Debug, Default)]
pub struct Selection<'a> {
    /// Attempts to fetch and forward, oldest first.
    pub fresh: Vec<&'a DeliveryAttempt>,
    /// Attempts marked handled without being forwarded.
    pub skipped: usize,
}

/// Select new, in-scope attempts from a newest-first window.
///
/// The window is walked oldest to newest so forwarding follows creation
/// order. Selected attempts are marked handled before they are returned.
pub fn select_new_attempts<'a>(
    attempts: &'a [DeliveryAttempt],
    ledger: &mut DedupLedger,
    started_at: DateTime<Utc>,
) -> Selection<'a> {
    let mut selection = Selection::default();

    for attempt in attempts.iter().rev() {
        if !ledger.mark_handled(&attempt.event_id) {
            continue;
        }

        let raw = match attempt.created_at.as_deref() {
            Some(raw) if !raw.is_empty() => raw,
            _ => {
                selection.skipped += 1;
                continue;
            }
        };

        let Some(created_at) = parse_timestamp(raw) else {
            warn!(
                event_id = %attempt.event_id,
                created_at = raw,
                "Failed to parse attempt timestamp, skipping"
            );
            selection.skipped += 1;
            continue;
        };

        if created_at <= started_at {
            selection.skipped += 1;
            continue;
        }

        selection.fresh.push(attempt);
    }

    selection
}
