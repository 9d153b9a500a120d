//! Checkout and order fulfilment.

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{color_of, not_blank, ValidJson};
use crate::auth::{AdminUser, CurrentUser};
use crate::domain::aggregates::{LineRequest, NewOrder, Order, OrderStatus, Product, ShippingDetails};
use crate::domain::events::{DomainEvent, OrderEvent, ProductEvent};
use crate::domain::value_objects::Money;
use crate::error::{AppError, Result};
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderResponse {
    pub order: Order,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderList {
    pub orders: Vec<Order>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, max = 999))]
    pub quantity: u32,
    /// Price the shopper saw. Accepted for compatibility, never charged.
    pub price: Option<Decimal>,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[validate]
    #[validate(length(min = 1, max = 100))]
    pub items: Vec<OrderLineRequest>,
    #[validate(length(max = 200), custom = "not_blank")]
    pub shipping_name: String,
    #[validate(length(max = 40), custom = "not_blank")]
    pub shipping_phone: String,
    #[validate(length(max = 500), custom = "not_blank")]
    pub shipping_address: String,
}

pub async fn create_order(
    State(s): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidJson(r): ValidJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>)> {
    let ids: Vec<Uuid> = r.items.iter().map(|l| l.product_id).collect();
    let catalog: HashMap<Uuid, Product> = s.store.get_products(&ids).await?.into_iter().map(|p| (p.id, p)).collect();

    for line in &r.items {
        if let (Some(sent), Some(stored)) = (line.price, catalog.get(&line.product_id)) {
            if Money::new(sent) != stored.price {
                tracing::debug!(product_id = %stored.id, sent = %sent, stored = %stored.price, "Ignoring client price");
            }
        }
    }

    let requests: Vec<LineRequest> = r
        .items
        .iter()
        .map(|l| LineRequest { product_id: l.product_id, quantity: l.quantity, color: color_of(l.color.as_deref()) })
        .collect();
    let shipping = ShippingDetails {
        name: r.shipping_name.trim().to_string(),
        phone: r.shipping_phone.trim().to_string(),
        address: r.shipping_address.trim().to_string(),
    };
    let new_order = NewOrder::price(user.id, shipping, &requests, &catalog)?;
    let order = s.store.create_order(new_order).await?;

    tracing::info!(order_id = %order.id, user_id = %user.id, total = %order.total, lines = order.items.len(), "Order placed");
    s.events
        .publish(DomainEvent::Order(OrderEvent::Placed { order_id: order.id, user_id: user.id, total: order.total }))
        .await;
    Ok((StatusCode::CREATED, Json(OrderResponse { order })))
}

pub async fn list_mine(State(s): State<AppState>, CurrentUser(user): CurrentUser) -> Result<Json<OrderList>> {
    Ok(Json(OrderList { orders: s.store.list_orders_for_user(user.id).await? }))
}

/// Owners and admins may read an order; anyone else gets 404.
pub async fn get_order(State(s): State<AppState>, CurrentUser(user): CurrentUser, Path(id): Path<Uuid>) -> Result<Json<OrderResponse>> {
    let order = s
        .store
        .get_order(id)
        .await?
        .filter(|o| o.user_id == user.id || user.is_admin())
        .ok_or(AppError::NotFound("Order"))?;
    Ok(Json(OrderResponse { order }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStatusRequest {
    #[validate(length(min = 1))]
    pub status: String,
}

/// Moves an order along its lifecycle. The first move into `DELIVERED`
/// consumes stock for every line in the same store transaction.
pub async fn update_status(
    State(s): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    ValidJson(r): ValidJson<UpdateStatusRequest>,
) -> Result<Json<OrderResponse>> {
    let status: OrderStatus = r.status.trim().to_ascii_uppercase().parse()?;
    let change = match s.store.update_order_status(id, status).await {
        Ok(change) => change,
        Err(e) => {
            tracing::warn!(order_id = %id, to = %status, error = %e, "Order status update rejected");
            return Err(e.into());
        }
    };

    let consumed: u32 = change.movements.iter().map(|m| m.quantity).sum();
    tracing::info!(
        order_id = %id,
        admin_id = %admin.id,
        from = %change.from,
        to = %change.order.status,
        stock_consumed = consumed,
        "Order status updated"
    );

    if change.from != change.order.status {
        s.events
            .publish(DomainEvent::Order(OrderEvent::StatusChanged { order_id: id, from: change.from, to: change.order.status }))
            .await;
    }
    for m in &change.movements {
        s.events
            .publish(DomainEvent::Product(ProductEvent::StockConsumed {
                product_id: m.product_id,
                order_id: id,
                quantity: m.quantity,
                remaining: m.remaining,
            }))
            .await;
    }

    Ok(Json(OrderResponse { order: change.order }))
}
