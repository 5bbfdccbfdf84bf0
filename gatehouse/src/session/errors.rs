//! Session error types.

use std::time::Duration;

use thiserror::Error;

use crate::db::timeouts::TimeoutError;

/// Session storage errors
///
/// A missing or expired session is not an error: resolution falls back to a
/// fresh anonymous session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Session store did not answer in time
    #[error("Database operation timed out after {0:?}")]
    Timeout(Duration),

    /// Stored session payload could not be encoded or decoded
    #[error("Session payload error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<TimeoutError> for SessionError {
    fn from(err: TimeoutError) -> Self {
        match err {
            TimeoutError::Timeout(duration) => SessionError::Timeout(duration),
            TimeoutError::Database(e) => SessionError::Database(e),
        }
    }
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;
