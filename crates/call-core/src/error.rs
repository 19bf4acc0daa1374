//! Error types for the call-core library
//!
//! All failures crossing the controller boundary are normalized into
//! [`ClientError`] with human-readable messages; raw collaborator errors
//! (provider, directory, channel service) never escape this crate.

use thiserror::Error;

/// Result type for call-core operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur while driving a call session
#[derive(Debug, Error)]
pub enum ClientError {
    /// No verified caller ID is available for this account.
    ///
    /// Raised locally, before any provider call is made. Never retried
    /// automatically: the account has to verify a number first.
    #[error("Call initiation failed: no verified caller ID available")]
    NoVerifiedCallerId,

    /// The telephony provider rejected or failed the initiation request
    #[error("Call initiation failed: {reason}")]
    InitiationFailed { reason: String },

    /// Joining the realtime channel for the call failed.
    ///
    /// Distinct from [`ClientError::InitiationFailed`]: the call may
    /// already exist at the provider even though realtime visibility
    /// failed, so the session is retained for diagnostics.
    #[error("Channel join failed: {reason}")]
    ChannelJoinFailed { reason: String },

    /// The telephony provider failed to terminate the call
    #[error("Call termination failed: {reason}")]
    TerminationFailed { reason: String },

    /// Fetching verified caller IDs or the caller-ID preference failed
    #[error("Caller ID lookup failed: {reason}")]
    DirectoryFailed { reason: String },

    /// A call is already in flight on this controller.
    ///
    /// Calls are not queued; the second start attempt is rejected.
    #[error("Call initiation failed: a call is already active")]
    CallAlreadyActive,

    /// A remote operation did not complete within its deadline
    #[error("{operation} timed out after {seconds} seconds")]
    Timeout { operation: String, seconds: u64 },

    /// The requested operation is not valid in the current session state
    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    /// Internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ClientError {
    /// Create an initiation error from any displayable cause
    pub fn initiation_failed(reason: impl Into<String>) -> Self {
        Self::InitiationFailed {
            reason: reason.into(),
        }
    }

    /// Create a channel join error
    pub fn channel_join_failed(reason: impl Into<String>) -> Self {
        Self::ChannelJoinFailed {
            reason: reason.into(),
        }
    }

    /// Create a termination error
    pub fn termination_failed(reason: impl Into<String>) -> Self {
        Self::TerminationFailed {
            reason: reason.into(),
        }
    }

    /// Create a directory lookup error
    pub fn directory_failed(reason: impl Into<String>) -> Self {
        Self::DirectoryFailed {
            reason: reason.into(),
        }
    }

    /// Create a timeout error for the named operation
    pub fn timeout(operation: impl Into<String>, seconds: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            seconds,
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
