//! Domain events
use crate::domain::aggregates::OrderStatus;
use crate::domain::value_objects::Money;
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DomainEvent {
    Product(ProductEvent),
    Order(OrderEvent),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ProductEvent {
    Created { product_id: Uuid },
    StockConsumed { product_id: Uuid, order_id: Uuid, quantity: u32, remaining: u32 },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum OrderEvent {
    Placed { order_id: Uuid, user_id: Uuid, total: Money },
    StatusChanged { order_id: Uuid, from: OrderStatus, to: OrderStatus },
}

impl DomainEvent {
    /// Message subject the event is published under.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Product(ProductEvent::Created { .. }) => "apparel.product.created",
            Self::Product(ProductEvent::StockConsumed { .. }) => "apparel.product.stock_consumed",
            Self::Order(OrderEvent::Placed { .. }) => "apparel.order.placed",
            Self::Order(OrderEvent::StatusChanged { .. }) => "apparel.order.status_changed",
        }
    }
}
