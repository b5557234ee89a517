/// Crate-wide result type for channel operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed errors raised by outbound channels.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The connection is closed or was never opened.
    #[error("channel unavailable: {message}")]
    Unavailable { message: String },
}

impl Error {
    #[must_use]
    pub fn unavailable(message: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            message: message.to_string(),
        }
    }

    /// True when the failure means the connection is gone.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}
