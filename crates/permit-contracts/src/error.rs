//! Error types for the PERMIT client.
//!
//! Lookup failures (`Transport`, `Status`, `MalformedBody`) never reach a
//! caller of `PermissionChecker::can`; the checker logs them and answers
//! `false`. Only configuration problems and a missing installation surface
//! as errors.

use thiserror::Error;

/// The unified error type for the PERMIT crates.
#[derive(Debug, Error)]
pub enum PermitError {
    /// The request never produced an HTTP response (connect, DNS, timeout).
    #[error("transport failure: {reason}")]
    Transport { reason: String },

    /// The remote authority answered with a non-success status code.
    #[error("remote authority returned status {status}")]
    Status { status: u16 },

    /// The response body could not be read as JSON.
    #[error("malformed response body: {reason}")]
    MalformedBody { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// The permissions service was accessed before it was installed.
    ///
    /// This is a programming error in the host, not a runtime denial.
    #[error("permissions service not installed")]
    NotInstalled,
}

impl PermitError {
    /// Return true if retrying the same lookup later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Status { .. } | Self::MalformedBody { .. }
        )
    }
}

/// Convenience alias used throughout the PERMIT crates.
pub type PermitResult<T> = Result<T, PermitError>;
