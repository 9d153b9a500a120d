//! OpenSASE Apparel - storefront and back office for a clothing retailer
//!
//! ## Features
//! - Product catalog with categories, colours, images and reviews
//! - Per-user cart and wishlist with advisory stock checks
//! - Checkout priced from the catalog
//! - Order fulfilment that consumes inventory exactly once, on delivery
//! - Admin dashboard analytics
//! - Shopper-side session store for cart and wishlist state

pub mod auth;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod routes;
pub mod state;
pub mod store;

use axum::{routing::get, Json, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use error::{AppError, Result};
pub use state::AppState;

/// Builds the full HTTP application.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "opensase-apparel"})) }))
        .nest("/api/v1", routes::api())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
