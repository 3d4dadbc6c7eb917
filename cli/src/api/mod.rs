//! Volley API Client
//!
//! Thin typed wrapper over the REST endpoints the CLI needs: resource lookup
//! by name, delivery attempts, event payloads, and the pairing login flow.

pub mod auth;
pub mod client;
pub mod connections;
pub mod error;
pub mod events;
pub mod headers;
pub mod sources;
pub mod types;

pub use client::{ApiClient, DEFAULT_API_URL, REQUEST_TIMEOUT, USER_AGENT};
pub use error::{ApiError, ApiResult};
pub use headers::HeaderMultimap;
pub use types::*;
