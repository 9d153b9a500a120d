//! Order Aggregate
//!
//! Orders are priced from stored product prices when they are placed and
//! afterwards change only through status transitions. The first transition
//! into [`OrderStatus::Delivered`] is the one point where inventory is
//! consumed; every other transition leaves stock alone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use crate::domain::aggregates::Product;
use crate::domain::value_objects::Money;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus { #[default] Pending, Processing, Shipped, Delivered, Cancelled }

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [Self::Pending, Self::Processing, Self::Shipped, Self::Delivered, Self::Cancelled];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool { matches!(self, Self::Delivered | Self::Cancelled) }

    fn rank(&self) -> u8 {
        match self { Self::Pending => 0, Self::Processing => 1, Self::Shipped => 2, Self::Delivered => 3, Self::Cancelled => 4 }
    }

    /// Re-setting the current status is always allowed. Otherwise orders only
    /// move forward through the fulfilment chain (skips allowed), and any
    /// non-terminal order may be cancelled.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if *self == next { return true; }
        if self.is_terminal() { return false; }
        match next {
            Self::Cancelled => true,
            _ => next.rank() > self.rank(),
        }
    }

    pub fn plan(&self, next: OrderStatus) -> Result<TransitionPlan, OrderError> {
        if !self.can_transition_to(next) {
            return Err(OrderError::InvalidTransition { from: *self, to: next });
        }
        Ok(TransitionPlan {
            from: *self,
            to: next,
            consumes_stock: next == Self::Delivered && *self != Self::Delivered,
        })
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for OrderStatus {
    type Err = OrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|st| st.as_str() == s).ok_or_else(|| OrderError::UnknownStatus(s.to_string()))
    }
}

/// A validated status change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransitionPlan {
    pub from: OrderStatus,
    pub to: OrderStatus,
    /// True only for the first move into `DELIVERED`.
    pub consumes_stock: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingDetails {
    #[serde(rename = "shippingName")] pub name: String,
    #[serde(rename = "shippingPhone")] pub phone: String,
    #[serde(rename = "shippingAddress")] pub address: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub total: Money,
    #[serde(flatten)]
    pub shipping: ShippingDetails,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub color: String,
    pub quantity: u32,
    /// Price charged when the order was placed.
    pub unit_price: Money,
}

impl OrderItem {
    pub fn line_total(&self) -> Money { self.unit_price.times(self.quantity) }
}

/// Largest quantity a single order or cart line may carry.
pub const MAX_LINE_QUANTITY: u32 = 999;

/// One requested line of a checkout, as submitted by the shopper.
#[derive(Clone, Debug, PartialEq)]
pub struct LineRequest {
    pub product_id: Uuid,
    pub quantity: u32,
    pub color: String,
}

/// Line priced from the stored product.
#[derive(Clone, Debug, PartialEq)]
pub struct PricedLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub color: String,
    pub quantity: u32,
    pub unit_price: Money,
}

/// An order ready to be persisted in `PENDING`.
#[derive(Clone, Debug, PartialEq)]
pub struct NewOrder {
    pub user_id: Uuid,
    pub shipping: ShippingDetails,
    pub lines: Vec<PricedLine>,
    pub total: Money,
}

impl NewOrder {
    /// Prices every line from `catalog`. Whatever price the client sent is
    /// never consulted.
    pub fn price(user_id: Uuid, shipping: ShippingDetails, requests: &[LineRequest], catalog: &HashMap<Uuid, Product>) -> Result<Self, OrderError> {
        if requests.is_empty() { return Err(OrderError::NoItems); }
        let lines = requests
            .iter()
            .map(|r| {
                if !(1..=MAX_LINE_QUANTITY).contains(&r.quantity) { return Err(OrderError::InvalidQuantity(r.product_id)); }
                let product = catalog.get(&r.product_id).filter(|p| p.active).ok_or(OrderError::UnknownProduct(r.product_id))?;
                Ok(PricedLine {
                    product_id: product.id,
                    product_name: product.name.clone(),
                    color: r.color.clone(),
                    quantity: r.quantity,
                    unit_price: product.price,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let total = lines.iter().map(|l| l.unit_price.times(l.quantity)).sum();
        Ok(Self { user_id, shipping, lines, total })
    }

    pub fn into_order(self) -> Order {
        let id = Uuid::now_v7();
        let now = Utc::now();
        let items = self.lines.into_iter().map(|l| OrderItem {
            id: Uuid::now_v7(), order_id: id, product_id: l.product_id, product_name: l.product_name,
            color: l.color, quantity: l.quantity, unit_price: l.unit_price,
        }).collect();
        Order {
            id, user_id: self.user_id, status: OrderStatus::Pending, total: self.total, shipping: self.shipping,
            items, created_at: now, updated_at: now,
        }
    }
}

/// Stock on hand for one product, as read when a delivery is attempted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StockLevel { pub name: String, pub stock: u32 }

/// The first product an order cannot be fulfilled from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Shortfall {
    pub product_id: Uuid,
    pub product_name: String,
    pub available: u32,
    pub required: u32,
}

impl Shortfall {
    pub fn missing(&self) -> u32 { self.required.saturating_sub(self.available) }
}

impl Order {
    pub fn line_total_sum(&self) -> Money { self.items.iter().map(OrderItem::line_total).sum() }

    /// Units needed per product, summing lines that differ only by colour.
    pub fn required_stock(&self) -> Result<BTreeMap<Uuid, (String, u32)>, OrderError> {
        let mut needed: BTreeMap<Uuid, (String, u32)> = BTreeMap::new();
        for item in &self.items {
            let entry = needed.entry(item.product_id).or_insert_with(|| (item.product_name.clone(), 0));
            entry.1 = entry.1.checked_add(item.quantity).ok_or(OrderError::QuantityOverflow(item.product_id))?;
        }
        Ok(needed)
    }

    /// First product whose stock does not cover this order, in product id order.
    /// A product missing from `levels` counts as zero on hand.
    pub fn find_shortfall(&self, levels: &HashMap<Uuid, StockLevel>) -> Result<Option<Shortfall>, OrderError> {
        Ok(self.required_stock()?.into_iter().find_map(|(product_id, (snapshot_name, required))| {
            let (product_name, available) = match levels.get(&product_id) {
                Some(l) => (l.name.clone(), l.stock),
                None => (snapshot_name, 0),
            };
            (available < required).then_some(Shortfall { product_id, product_name, available, required })
        }))
    }

    pub fn apply(&mut self, plan: TransitionPlan) {
        self.status = plan.to;
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("Order has no items")]
    NoItems,
    #[error("Quantity must be between 1 and 999 for product {0}")]
    InvalidQuantity(Uuid),
    #[error("Total quantity of product {0} is too large")]
    QuantityOverflow(Uuid),
    #[error("Product {0} not found")]
    UnknownProduct(Uuid),
    #[error("Unknown order status: {0}")]
    UnknownStatus(String),
    #[error("Cannot change order status from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("Insufficient stock for {}", .0.product_name)]
    InsufficientStock(Shortfall),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::product::sample;
    use rust_decimal::Decimal;
    use OrderStatus::*;

    fn order_with(items: &[(Uuid, &str, u32)]) -> Order {
        let lines = items.iter().map(|(id, name, qty)| PricedLine {
            product_id: *id, product_name: name.to_string(), color: String::new(), quantity: *qty,
            unit_price: Money::new(Decimal::new(10, 0)),
        }).collect();
        NewOrder { user_id: Uuid::now_v7(), shipping: ShippingDetails::default(), lines, total: Money::ZERO }.into_order()
    }

    #[test]
    fn test_transition_table() {
        let allowed = [
            (Pending, Processing), (Pending, Shipped), (Pending, Delivered), (Pending, Cancelled),
            (Processing, Shipped), (Processing, Delivered), (Processing, Cancelled),
            (Shipped, Delivered), (Shipped, Cancelled),
        ];
        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                let expected = from == to || allowed.contains(&(from, to));
                assert_eq!(from.can_transition_to(to), expected, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_only_first_delivery_consumes_stock() {
        assert!(Shipped.plan(Delivered).unwrap().consumes_stock);
        assert!(Pending.plan(Delivered).unwrap().consumes_stock);
        assert!(!Delivered.plan(Delivered).unwrap().consumes_stock);
        assert!(!Pending.plan(Shipped).unwrap().consumes_stock);
        assert_eq!(Delivered.plan(Pending), Err(OrderError::InvalidTransition { from: Delivered, to: Pending }));
        assert!(Cancelled.plan(Delivered).is_err());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("SHIPPED".parse::<OrderStatus>().unwrap(), Shipped);
        assert_eq!("shipped".parse::<OrderStatus>(), Err(OrderError::UnknownStatus("shipped".into())));
    }

    #[test]
    fn test_pricing_ignores_client_price() {
        let shirt = sample("Oxford Shirt", Money::new(Decimal::new(15, 0)), 0);
        let catalog = HashMap::from([(shirt.id, shirt.clone())]);
        let req = [LineRequest { product_id: shirt.id, quantity: 2, color: "blue".into() }];
        let order = NewOrder::price(Uuid::now_v7(), ShippingDetails::default(), &req, &catalog).unwrap();
        assert_eq!(order.total, Money::new(Decimal::new(30, 0)));
        assert_eq!(order.lines[0].unit_price, shirt.price);
    }

    #[test]
    fn test_pricing_rejects_bad_lines() {
        let catalog = HashMap::new();
        let missing = Uuid::now_v7();
        assert_eq!(NewOrder::price(Uuid::now_v7(), ShippingDetails::default(), &[], &catalog), Err(OrderError::NoItems));
        let req = [LineRequest { product_id: missing, quantity: 1, color: String::new() }];
        assert_eq!(NewOrder::price(Uuid::now_v7(), ShippingDetails::default(), &req, &catalog), Err(OrderError::UnknownProduct(missing)));
        let req = [LineRequest { product_id: missing, quantity: 0, color: String::new() }];
        assert_eq!(NewOrder::price(Uuid::now_v7(), ShippingDetails::default(), &req, &catalog), Err(OrderError::InvalidQuantity(missing)));
        let req = [LineRequest { product_id: missing, quantity: MAX_LINE_QUANTITY + 1, color: String::new() }];
        assert_eq!(NewOrder::price(Uuid::now_v7(), ShippingDetails::default(), &req, &catalog), Err(OrderError::InvalidQuantity(missing)));
    }

    #[test]
    fn test_find_shortfall_sums_lines_per_product() {
        let p = Uuid::now_v7();
        let order = order_with(&[(p, "Tee", 2), (p, "Tee", 2)]);
        let levels = HashMap::from([(p, StockLevel { name: "Tee".into(), stock: 3 })]);
        let s = order.find_shortfall(&levels).unwrap().unwrap();
        assert_eq!((s.available, s.required, s.missing()), (3, 4, 1));

        let levels = HashMap::from([(p, StockLevel { name: "Tee".into(), stock: 4 })]);
        assert_eq!(order.find_shortfall(&levels), Ok(None));
    }

    #[test]
    fn test_summed_quantity_overflow_is_an_error() {
        let p = Uuid::now_v7();
        let order = order_with(&[(p, "Tee", u32::MAX), (p, "Tee", 1)]);
        assert_eq!(order.required_stock(), Err(OrderError::QuantityOverflow(p)));
        let levels = HashMap::from([(p, StockLevel { name: "Tee".into(), stock: u32::MAX })]);
        assert_eq!(order.find_shortfall(&levels), Err(OrderError::QuantityOverflow(p)));
    }
}
