//! Server-side cart with the advisory stock check.
//!
//! Growing a line first compares the requested total with the stock on the
//! shelf. Nothing is reserved: the hard check happens when an order is
//! delivered.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{active_product, color_of, ValidJson};
use crate::auth::CurrentUser;
use crate::domain::aggregates::{CartItem, CartView, Product, Shortfall, StockCheck};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Returned with 200 when the shelf holds fewer units than requested.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockWarning {
    pub warning: String,
    pub available: u32,
    pub requested: u32,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CartResponse {
    Item { item: CartItem },
    Warning(StockWarning),
    Ok { ok: bool },
}

/// `Ok(None)` when the units are available.
fn stock_outcome(product: &Product, in_cart: u32, delta: u32) -> Result<Option<StockWarning>> {
    match product.check_stock(in_cart, delta) {
        StockCheck::Available => Ok(None),
        StockCheck::LowStock { available, requested } => Ok(Some(StockWarning {
            warning: format!("Only {available} of {} left in stock", product.name),
            available,
            requested,
        })),
        StockCheck::OutOfStock { required } => Err(AppError::OutOfStock(Shortfall {
            product_id: product.id,
            product_name: product.name.clone(),
            available: 0,
            required,
        })),
    }
}

pub async fn get_cart(State(s): State<AppState>, CurrentUser(user): CurrentUser) -> Result<Json<CartView>> {
    Ok(Json(s.store.list_cart(user.id).await?.into()))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, max = 999))]
    pub quantity: u32,
    pub color: Option<String>,
}

pub async fn add_to_cart(
    State(s): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidJson(r): ValidJson<AddToCartRequest>,
) -> Result<Json<CartResponse>> {
    let product = active_product(&s, r.product_id).await?;
    let color = color_of(r.color.as_deref());
    let in_cart = s.store.cart_quantity(user.id, product.id, &color).await?;
    if let Some(warning) = stock_outcome(&product, in_cart, r.quantity)? {
        tracing::debug!(product_id = %product.id, in_cart, requested = r.quantity, "Cart add exceeds stock");
        return Ok(Json(CartResponse::Warning(warning)));
    }
    let item = s.store.add_to_cart(user.id, product.id, &color, r.quantity, product.price).await?;
    Ok(Json(CartResponse::Item { item }))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckStockRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, max = 999))]
    pub quantity: u32,
    pub color: Option<String>,
    /// Units the caller already holds; the stored cart line is used when absent.
    pub in_cart: Option<u32>,
}

/// Runs the cart check for a prospective increase without touching the cart.
pub async fn check_stock(
    State(s): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidJson(r): ValidJson<CheckStockRequest>,
) -> Result<Json<CartResponse>> {
    let product = active_product(&s, r.product_id).await?;
    let in_cart = match r.in_cart {
        Some(n) => n,
        None => s.store.cart_quantity(user.id, product.id, &color_of(r.color.as_deref())).await?,
    };
    Ok(Json(match stock_outcome(&product, in_cart, r.quantity)? {
        Some(warning) => CartResponse::Warning(warning),
        None => CartResponse::Ok { ok: true },
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCartItemRequest {
    #[validate(range(min = 1, max = 999))]
    pub quantity: u32,
}

/// Sets the absolute quantity of a line. Only increases are stock-checked.
pub async fn update_item(
    State(s): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(item_id): Path<Uuid>,
    ValidJson(r): ValidJson<UpdateCartItemRequest>,
) -> Result<Json<CartResponse>> {
    let item = s.store.find_cart_item(user.id, item_id).await?.ok_or(AppError::NotFound("Cart item"))?;
    if r.quantity > item.quantity {
        let product = active_product(&s, item.product_id).await?;
        if let Some(warning) = stock_outcome(&product, item.quantity, r.quantity - item.quantity)? {
            return Ok(Json(CartResponse::Warning(warning)));
        }
    }
    let item = s.store.set_cart_quantity(user.id, item_id, r.quantity).await?.ok_or(AppError::NotFound("Cart item"))?;
    Ok(Json(CartResponse::Item { item }))
}

pub async fn remove_item(State(s): State<AppState>, CurrentUser(user): CurrentUser, Path(item_id): Path<Uuid>) -> Result<StatusCode> {
    if !s.store.remove_cart_item(user.id, item_id).await? {
        return Err(AppError::NotFound("Cart item"));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn clear_cart(State(s): State<AppState>, CurrentUser(user): CurrentUser) -> Result<StatusCode> {
    s.store.clear_cart(user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
