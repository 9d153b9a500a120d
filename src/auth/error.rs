//! Authentication error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    /// Token was valid but the user no longer exists.
    #[error("Unknown user")]
    UnknownUser,

    /// Unknown email or wrong password; deliberately indistinguishable.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Admin privileges required")]
    Forbidden,

    #[error("Password hashing failed")]
    PasswordHash,

    #[error("Token signing failed: {0}")]
    Signing(String),
}
