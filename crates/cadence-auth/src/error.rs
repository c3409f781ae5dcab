//! Error types for credential operations.

use thiserror::Error;

/// Credential operation errors.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Unknown email or wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Token could not be decoded or its signature does not match.
    #[error("Invalid or malformed token")]
    InvalidToken,

    /// Token signature is valid but it has expired.
    #[error("Token has expired")]
    TokenExpired,

    /// An access token was presented where a refresh token is required, or the reverse.
    #[error("Wrong token type: expected {expected}")]
    WrongTokenKind { expected: &'static str },

    /// Token or API key refers to an account that no longer exists.
    #[error("User not found")]
    UnknownUser,

    #[error("Username already registered")]
    UsernameTaken,

    #[error("Email already registered")]
    EmailTaken,

    /// Token signing secret missing from the environment.
    #[error("AUTH_TOKEN_SECRET is not set")]
    MissingSecret,

    /// Token signing secret shorter than the minimum.
    #[error("AUTH_TOKEN_SECRET too short (minimum {0} characters required)")]
    SecretTooShort(usize),

    /// Password hashing failed.
    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

/// Result type for credential operations.
pub type AuthResult<T> = Result<T, AuthError>;

impl From<AuthError> for cadence_core::Error {
    fn from(e: AuthError) -> Self {
        use cadence_core::Error;
        match e {
            AuthError::InvalidCredentials
            | AuthError::InvalidToken
            | AuthError::TokenExpired
            | AuthError::WrongTokenKind { .. }
            | AuthError::UnknownUser => Error::Unauthorized(e.to_string()),
            AuthError::UsernameTaken | AuthError::EmailTaken => Error::Conflict(e.to_string()),
            AuthError::MissingSecret | AuthError::SecretTooShort(_) => Error::Config(e.to_string()),
            AuthError::Hashing(_) => Error::Internal(e.to_string()),
        }
    }
}
