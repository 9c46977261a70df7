use thiserror::Error;

/// Main error type for probe operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UaError {
    #[error("Invalid security policy or mode (policy: {policy}, mode: {mode})")]
    InvalidSecurity { policy: String, mode: String },

    #[error("Security is enabled but username/password is missing")]
    MissingCredentials,

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Invalid node id: {0}")]
    InvalidNodeId(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Connection timed out")]
    Timeout,

    #[error("Session rejected: {0}")]
    Session(String),

    #[error("Read failed: {0}")]
    Read(String),

    #[error("Teardown failed: {0}")]
    Teardown(String),

    #[error("Unexpected failure: {0}")]
    Internal(String),
}

/// Coarse classification of a [`UaError`]
///
/// Decides whether an error is a local misconfiguration (reported as `error`)
/// or a runtime failure against the server (reported as `failed`), and which
/// errors the connect strategy may retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Detected locally before any network call
    Configuration,
    /// Unreachable endpoint, timeout, reset
    Transport,
    /// Session rejected by the server
    Authentication,
    /// Verification read rejected or unavailable
    Read,
    /// Faults that are not part of the protocol contract
    Internal,
}

impl UaError {
    pub fn class(&self) -> ErrorClass {
        match self {
            UaError::InvalidSecurity { .. } | UaError::MissingCredentials => ErrorClass::Configuration,
            UaError::InvalidEndpoint(_) | UaError::Connection(_) | UaError::Timeout => {
                ErrorClass::Transport
            }
            UaError::Session(_) => ErrorClass::Authentication,
            UaError::InvalidNodeId(_) | UaError::Read(_) => ErrorClass::Read,
            UaError::Teardown(_) | UaError::Internal(_) => ErrorClass::Internal,
        }
    }

    /// Only transport errors are worth another connect attempt.
    ///
    /// A malformed endpoint never becomes valid by waiting, so it is excluded.
    pub fn is_retryable(&self) -> bool {
        matches!(self, UaError::Connection(_) | UaError::Timeout)
    }
}

impl From<std::io::Error> for UaError {
    fn from(err: std::io::Error) -> Self {
        UaError::Connection(err.to_string())
    }
}

/// Result type alias for probe operations
pub type UaResult<T> = Result<T, UaError>;
