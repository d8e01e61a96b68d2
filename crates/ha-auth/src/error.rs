//! Error types for the auth store

use thiserror::Error;

/// Result type for auth store operations
pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    /// The store could not be read
    #[error("auth store unavailable: {0}")]
    Unavailable(String),

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("user already exists: {0}")]
    DuplicateUser(String),
}
