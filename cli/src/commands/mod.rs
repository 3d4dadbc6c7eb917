//! CLI Commands

pub mod auth;
pub mod listen;

pub use listen::ListenArgs;
