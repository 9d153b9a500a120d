//! Bearer-token extractors.
//!
//! ```rust,ignore
//! async fn handler(CurrentUser(user): CurrentUser) -> impl IntoResponse {
//!     format!("Hello, {}!", user.name)
//! }
//! ```

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::AuthError;
use crate::domain::aggregates::User;
use crate::error::AppError;
use crate::state::AppState;

/// Extractor that requires a valid bearer token for an existing user.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Extractor that additionally requires the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

fn bearer(parts: &Parts) -> Result<&str, AuthError> {
    let value = parts.headers.get(AUTHORIZATION).ok_or(AuthError::MissingToken)?;
    let value = value.to_str().map_err(|_| AuthError::InvalidToken)?;
    let (scheme, token) = value.split_once(' ').ok_or(AuthError::InvalidToken)?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return Err(AuthError::InvalidToken);
    }
    Ok(token.trim())
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = state.tokens.verify(bearer(parts)?)?;
        // Role comes from the store, never from the token
        let user = state.store.find_user(claims.sub).await?.ok_or(AuthError::UnknownUser)?;
        Ok(Self(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            tracing::warn!(user_id = %user.id, path = %parts.uri.path(), "Admin route refused");
            return Err(AuthError::Forbidden.into());
        }
        Ok(Self(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/v1/orders");
        if let Some(h) = header {
            builder = builder.header(AUTHORIZATION, h);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_parsing() {
        assert!(matches!(bearer(&parts(None)), Err(AuthError::MissingToken)));
        assert!(matches!(bearer(&parts(Some("Basic abc"))), Err(AuthError::InvalidToken)));
        assert!(matches!(bearer(&parts(Some("Bearer "))), Err(AuthError::InvalidToken)));
        assert_eq!(bearer(&parts(Some("Bearer a.b.c"))).unwrap(), "a.b.c");
        assert_eq!(bearer(&parts(Some("bearer a.b.c"))).unwrap(), "a.b.c");
    }
}
