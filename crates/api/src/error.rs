//! API error types

/// API result type
pub type Result<T> = std::result::Result<T, Error>;

/// API errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] rollcall_core::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Invalid check-in link: {0}")]
    InvalidLink(String),
}

impl Error {
    /// Stable machine-readable code reported to callers
    pub fn code(&self) -> &'static str {
        use rollcall_core::Error as Core;

        match self {
            Error::Core(Core::SessionNotFound(_)) => "SESSION_NOT_FOUND",
            Error::Core(Core::SessionClosed(_)) => "SESSION_CLOSED",
            Error::Core(Core::InvalidDuration(_)) => "INVALID_DURATION",
            Error::Core(Core::InvalidInput(_)) => "INVALID_INPUT",
            Error::Core(e) if e.is_transient() => "STORE_UNAVAILABLE",
            Error::Core(_) => "INTERNAL",
            Error::Protocol(_) => "BAD_REQUEST",
            Error::InvalidLink(_) => "INVALID_LINK",
        }
    }
}
