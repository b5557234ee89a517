//! Shared types, error definitions, and the hook event bus used across all plume crates.

pub mod error;
pub mod hooks;
pub mod types;

pub use {
    error::{Error, FromMessage, Result},
    types::ConnectionId,
};
