//! Webhook Relay
//!
//! Polls Volley for new delivery attempts on one connection and replays each
//! new event against a local endpoint, byte-for-byte.
//!
//! Flow per tick: poll attempts -> [`filter`] -> [`fetch`] -> [`forward`].
//! Delivery is at-least-once upstream and at-most-once here: an event id is
//! marked in the [`ledger`] before its payload is fetched, whatever happens
//! next.

pub mod fetch;
pub mod filter;
pub mod forward;
pub mod ledger;
pub mod listener;
pub mod session;
pub mod source;

pub use fetch::{fetch_event, FetchError, FetchPolicy};
pub use filter::{select_new_attempts, Selection};
pub use forward::{build_headers, ForwardError, ForwardOutcome, Forwarder};
pub use ledger::DedupLedger;
pub use listener::{EventOutcome, Relay, RelayError, RelayStats, TickReport};
pub use session::{MonitoredConnection, RelayState, Session, ATTEMPT_WINDOW, DEFAULT_POLL_INTERVAL};
pub use source::EventSource;
