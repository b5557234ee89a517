use thiserror::Error;

use crate::validate::RejectReason;

#[derive(Debug, Error)]
pub enum Error {
    /// The outbound channel refused the packet.
    #[error(transparent)]
    Channel(#[from] plume_channels::Error),

    #[error("hook dispatch failed: {0}")]
    Hook(#[from] anyhow::Error),

    #[error("chat message rejected: {0}")]
    Rejected(RejectReason),

    #[error("chat message cancelled by hook: {reason}")]
    Cancelled { reason: String },
}

impl Error {
    /// True when the connection is gone and further sends will fail too.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Channel(e) if e.is_unavailable())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
