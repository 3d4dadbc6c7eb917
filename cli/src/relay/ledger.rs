//! Dedup Ledger
//!
//! Event ids this relay instance has already handled. Owned by one relay,
//! grows for the lifetime of the process and is never persisted or evicted.

use std::collections::HashSet;

#[derive(Debug, Default, Clone)]
pub struct DedupLedger {
    handled: HashSet<String>,
}

impl DedupLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, event_id: &str) -> bool {
        self.handled.contains(event_id)
    }

    /// Mark `event_id` as handled. Returns `false` if it already was.
    pub fn mark_handled(&mut self, event_id: &str) -> bool {
        if self.handled.contains(event_id) {
            return false;
        }
        self.handled.insert(event_id.to_string())
    }

    pub fn len(&self) -> usize {
        self.handled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handled.is_empty()
    }
}
