//! Registration, login and the current-user endpoint.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{not_blank, ValidJson};
use crate::auth::{authenticate, hash_password, CurrentUser};
use crate::domain::aggregates::{NewUser, Role, User};
use crate::error::Result;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 100), custom = "not_blank")]
    pub name: String,
    #[validate(length(min = 8, max = 256))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

pub async fn register(State(s): State<AppState>, ValidJson(r): ValidJson<RegisterRequest>) -> Result<(StatusCode, Json<AuthResponse>)> {
    let hash = hash_password(&r.password)?;
    let user = s.store.create_user(NewUser::new(&r.email, r.name.trim(), hash, Role::Customer)).await?;
    let token = s.tokens.issue(user.id)?;
    tracing::info!(user_id = %user.id, email = %user.email, "User registered");
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

pub async fn login(State(s): State<AppState>, ValidJson(r): ValidJson<LoginRequest>) -> Result<Json<AuthResponse>> {
    let user = authenticate(s.store.as_ref(), &r.email, &r.password).await?;
    let token = s.tokens.issue(user.id)?;
    Ok(Json(AuthResponse { token, user }))
}

pub async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}
