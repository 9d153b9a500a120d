//! Unified error handling for the HTTP layer.
//!
//! Every handler returns [`Result`]; failures render as
//! `{"error": "<message>", "details": <object|null>}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;
use validator::ValidationErrors;

use crate::auth::AuthError;
use crate::domain::aggregates::{OrderError, Shortfall};
use crate::store::StoreError;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error("Validation failed")]
    Validation(#[from] ValidationErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    /// Cart add for a product with nothing on the shelf.
    #[error("{} is out of stock", .0.product_name)]
    OutOfStock(Shortfall),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn shortfall_details(s: &Shortfall) -> Value {
    json!({
        "productId": s.product_id,
        "productName": s.product_name,
        "available": s.available,
        "required": s.required,
        "shortfall": s.missing(),
    })
}

fn order_parts(e: &OrderError) -> (StatusCode, Option<Value>) {
    match e {
        OrderError::UnknownProduct(id) => (StatusCode::NOT_FOUND, Some(json!({ "productId": id }))),
        OrderError::InvalidQuantity(id) | OrderError::QuantityOverflow(id) => (StatusCode::BAD_REQUEST, Some(json!({ "productId": id }))),
        OrderError::InvalidTransition { from, to } => (StatusCode::BAD_REQUEST, Some(json!({ "from": from, "to": to }))),
        OrderError::InsufficientStock(s) => (StatusCode::BAD_REQUEST, Some(shortfall_details(s))),
        OrderError::NoItems | OrderError::UnknownStatus(_) => (StatusCode::BAD_REQUEST, None),
    }
}

impl AppError {
    fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Internal(_)
                | Self::Store(StoreError::Database(_) | StoreError::Corrupt(_))
                | Self::Auth(AuthError::PasswordHash | AuthError::Signing(_))
        )
    }

    fn status_and_details(&self) -> (StatusCode, Option<Value>) {
        if self.is_server_error() {
            return (StatusCode::INTERNAL_SERVER_ERROR, None);
        }
        match self {
            Self::Store(StoreError::NotFound(_)) | Self::NotFound(_) => (StatusCode::NOT_FOUND, None),
            Self::Store(StoreError::Conflict(_)) => (StatusCode::CONFLICT, None),
            Self::Store(StoreError::Order(e)) | Self::Order(e) => order_parts(e),
            Self::Auth(AuthError::Forbidden) => (StatusCode::FORBIDDEN, None),
            Self::Auth(_) => (StatusCode::UNAUTHORIZED, None),
            Self::Validation(errors) => (StatusCode::BAD_REQUEST, serde_json::to_value(errors).ok()),
            Self::OutOfStock(s) => (StatusCode::BAD_REQUEST, Some(shortfall_details(s))),
            _ => (StatusCode::BAD_REQUEST, None),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, details) = self.status_and_details();

        // Don't expose internal error details to clients outside debug builds
        let (message, details) = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Request failed");
            let details = cfg!(debug_assertions).then(|| json!({ "cause": self.to_string() }));
            ("Internal server error".to_string(), details)
        } else {
            (self.to_string(), details)
        };

        (status, Json(json!({ "error": message, "details": details }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::OrderStatus;
    use uuid::Uuid;

    fn status(err: impl Into<AppError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(status(AppError::NotFound("Order")), StatusCode::NOT_FOUND);
        assert_eq!(status(StoreError::NotFound("Product")), StatusCode::NOT_FOUND);
        assert_eq!(status(StoreError::Conflict("email".into())), StatusCode::CONFLICT);
        assert_eq!(status(AuthError::MissingToken), StatusCode::UNAUTHORIZED);
        assert_eq!(status(AuthError::TokenExpired), StatusCode::UNAUTHORIZED);
        assert_eq!(status(AuthError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(status(AuthError::PasswordHash), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status(OrderError::UnknownProduct(Uuid::nil())), StatusCode::NOT_FOUND);
        assert_eq!(status(StoreError::Order(OrderError::NoItems)), StatusCode::BAD_REQUEST);
        assert_eq!(status(AppError::Internal("boom".into())), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_shortfall_details() {
        let s = Shortfall { product_id: Uuid::nil(), product_name: "Denim Jacket".into(), available: 1, required: 3 };
        let err = AppError::Order(OrderError::InsufficientStock(s));
        assert_eq!(err.to_string(), "Insufficient stock for Denim Jacket");
        let (code, details) = err.status_and_details();
        assert_eq!(code, StatusCode::BAD_REQUEST);
        let details = details.unwrap();
        assert_eq!(details["available"], 1);
        assert_eq!(details["required"], 3);
        assert_eq!(details["shortfall"], 2);
    }

    #[test]
    fn test_invalid_transition_names_both_states() {
        let err = AppError::Order(OrderError::InvalidTransition { from: OrderStatus::Delivered, to: OrderStatus::Pending });
        let (code, details) = err.status_and_details();
        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert_eq!(details.unwrap(), json!({ "from": "DELIVERED", "to": "PENDING" }));
    }
}
