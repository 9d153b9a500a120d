//! Authentication: password hashing, bearer tokens and request extractors.

mod error;
mod extract;
mod token;

pub use error::AuthError;
pub use extract::{AdminUser, CurrentUser};
pub use token::{Claims, TokenSigner};

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::domain::aggregates::{normalize_email, NewUser, Role, User};
use crate::store::{Store, StoreError};

/// Hash a password using Argon2id.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored PHC hash.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Checks an email/password pair against the store.
pub async fn authenticate(store: &dyn Store, email: &str, password: &str) -> Result<User, crate::error::AppError> {
    let credentials = store.find_credentials(&normalize_email(email)).await?.ok_or(AuthError::InvalidCredentials)?;
    verify_password(password, &credentials.password_hash)?;
    Ok(credentials.user)
}

/// Creates the start-up admin account unless a user with that email exists.
///
/// Returns the created user, or `None` when nothing was done.
pub async fn ensure_admin(store: &dyn Store, email: &str, password: &str) -> Result<Option<User>, crate::error::AppError> {
    if store.find_credentials(&normalize_email(email)).await?.is_some() {
        return Ok(None);
    }
    let hash = hash_password(password)?;
    match store.create_user(NewUser::new(email, "Administrator", hash, Role::Admin)).await {
        Ok(user) => Ok(Some(user)),
        // Raced with another instance
        Err(StoreError::Conflict(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
