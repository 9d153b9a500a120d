//! Per-user wishlist.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{active_product, ValidJson};
use crate::auth::CurrentUser;
use crate::domain::aggregates::Product;
use crate::error::Result;
use crate::state::AppState;

pub async fn list(State(s): State<AppState>, CurrentUser(user): CurrentUser) -> Result<Json<Vec<Product>>> {
    Ok(Json(s.store.list_wishlist(user.id).await?))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ToggleRequest {
    pub product_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    pub product_id: Uuid,
    pub wishlisted: bool,
}

pub async fn toggle(
    State(s): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidJson(r): ValidJson<ToggleRequest>,
) -> Result<Json<ToggleResponse>> {
    let product = active_product(&s, r.product_id).await?;
    let wishlisted = s.store.toggle_wishlist(user.id, product.id).await?;
    Ok(Json(ToggleResponse { product_id: product.id, wishlisted }))
}

pub async fn remove(State(s): State<AppState>, CurrentUser(user): CurrentUser, Path(product_id): Path<Uuid>) -> Result<StatusCode> {
    s.store.remove_from_wishlist(user.id, product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
