//! Volley CLI
//!
//! Forwards webhooks received by Volley to a locally running endpoint,
//! reproducing the original request byte-for-byte so that signature
//! verification keeps working during local development.

pub mod api;
pub mod commands;
pub mod config;
pub mod relay;
