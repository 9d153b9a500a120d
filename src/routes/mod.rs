//! HTTP route handlers, one module per resource.

mod admin;
mod auth;
mod cart;
mod catalog;
mod orders;
mod wishlist;

pub use auth::AuthResponse;
pub use cart::{CartResponse, StockWarning};
pub use orders::{OrderList, OrderResponse};
pub use wishlist::ToggleResponse;

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::domain::aggregates::Product;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// All `/api/v1` routes.
pub fn api() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/products", get(catalog::list_products).post(catalog::create_product))
        .route("/products/:id", get(catalog::get_product).put(catalog::update_product).delete(catalog::delete_product))
        .route("/products/:id/reviews", get(catalog::list_reviews).post(catalog::create_review))
        .route("/categories", get(catalog::list_categories).post(catalog::create_category))
        .route("/categories/:id", get(catalog::get_category))
        .route("/cart", get(cart::get_cart).post(cart::add_to_cart).delete(cart::clear_cart))
        .route("/cart/check", post(cart::check_stock))
        .route("/cart/:item_id", put(cart::update_item).delete(cart::remove_item))
        .route("/wishlist", get(wishlist::list).post(wishlist::toggle))
        .route("/wishlist/:product_id", delete(wishlist::remove))
        .route("/orders", get(orders::list_mine).post(orders::create_order))
        .route("/orders/:id", get(orders::get_order).put(orders::update_status))
        .route("/admin/orders", get(admin::list_orders))
        .route("/admin/dashboard", get(admin::dashboard))
}

/// JSON body that is deserialized and then checked with [`Validate`].
/// Malformed bodies and failed validation both surface as 400.
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}

pub(crate) fn not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Loads a product shoppers may see; inactive products read as missing.
pub(crate) async fn active_product(state: &AppState, id: Uuid) -> Result<Product> {
    state
        .store
        .get_product(id)
        .await?
        .filter(|p| p.active)
        .ok_or(AppError::NotFound("Product"))
}

/// Trimmed colour choice; empty when the shopper picked none.
pub(crate) fn color_of(color: Option<&str>) -> String {
    color.map(str::trim).unwrap_or_default().to_string()
}
