//! Authentication error types.

use std::time::Duration;

use thiserror::Error;

use crate::db::timeouts::TimeoutError;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Credential store did not answer in time
    #[error("Database operation timed out after {0:?}")]
    Timeout(Duration),

    /// Password hashing failed
    #[error("Password hashing failed")]
    HashingFailed,

    /// No user with that username
    #[error("username not found")]
    UserNotFound,

    /// Password did not match the stored hash
    #[error("incorrect password")]
    PasswordMismatch,

    /// Username already exists (compared case-insensitively)
    #[error("Username already exists")]
    UsernameTaken,

    /// Invalid username format
    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    /// Password rejected by validation
    #[error("Invalid password: {0}")]
    WeakPassword(String),
}

impl AuthError {
    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Storage and hashing failures collapse into a generic message so the
    /// caller never learns about the database or the hash algorithm.
    pub fn client_message(&self) -> String {
        match self {
            AuthError::Database(_) | AuthError::Timeout(_) | AuthError::HashingFailed => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Whether this error is an expected outcome of user input rather than a fault.
    ///
    /// These are the failures that get reported back to the user, usually
    /// through the flash channel.
    pub fn is_credential_failure(&self) -> bool {
        matches!(
            self,
            AuthError::UserNotFound
                | AuthError::PasswordMismatch
                | AuthError::UsernameTaken
                | AuthError::InvalidUsername(_)
                | AuthError::WeakPassword(_)
        )
    }
}

impl From<TimeoutError> for AuthError {
    fn from(err: TimeoutError) -> Self {
        match err {
            TimeoutError::Timeout(duration) => AuthError::Timeout(duration),
            TimeoutError::Database(e) => AuthError::Database(e),
        }
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;
