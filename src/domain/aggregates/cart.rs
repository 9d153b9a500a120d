//! Cart and wishlist entries held server-side per user

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::value_objects::{Money, Quantity};

/// One cart line. Unique per (user, product, colour); colour is empty when
/// the product has no colour choice.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub color: String,
    pub quantity: u32,
    /// Price shown when the line was added; checkout re-prices.
    pub unit_price: Money,
    pub created_at: DateTime<Utc>,
}

impl CartItem {
    pub fn new(user_id: Uuid, product_id: Uuid, color: &str, quantity: u32, unit_price: Money) -> Self {
        Self { id: Uuid::now_v7(), user_id, product_id, color: color.to_string(), quantity, unit_price, created_at: Utc::now() }
    }
    pub fn same_line(&self, user_id: Uuid, product_id: Uuid, color: &str) -> bool {
        self.user_id == user_id && self.product_id == product_id && self.color == color
    }
}

/// Cart line joined with the live product row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    #[serde(flatten)]
    pub item: CartItem,
    pub product_name: String,
    pub current_price: Money,
    pub stock: Quantity,
}

impl CartLine {
    pub fn line_total(&self) -> Money { self.current_price.times(self.item.quantity) }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub subtotal: Money,
}

impl From<Vec<CartLine>> for CartView {
    fn from(items: Vec<CartLine>) -> Self {
        let subtotal = items.iter().map(CartLine::line_total).sum();
        Self { items, subtotal }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_cart_view_uses_current_price() {
        let user = Uuid::now_v7();
        let product = Uuid::now_v7();
        let item = CartItem::new(user, product, "red", 2, Money::new(Decimal::new(10, 0)));
        assert!(item.same_line(user, product, "red"));
        assert!(!item.same_line(user, product, ""));
        let view = CartView::from(vec![CartLine {
            item, product_name: "Chinos".into(), current_price: Money::new(Decimal::new(15, 0)), stock: Quantity::new(9),
        }]);
        assert_eq!(view.subtotal, Money::new(Decimal::new(30, 0)));
    }
}
