//! Product Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::value_objects::{Money, Quantity, Slug};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub stock: Quantity,
    pub category_id: Option<Uuid>,
    pub images: Vec<String>,
    pub colors: Vec<String>,
    pub featured: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct NewCategory { pub name: String, pub slug: Slug, pub description: Option<String> }

#[derive(Clone, Debug)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub stock: Quantity,
    pub category_id: Option<Uuid>,
    pub images: Vec<String>,
    pub colors: Vec<String>,
    pub featured: bool,
}

/// Partial update; `None` leaves the field as stored.
#[derive(Clone, Debug, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub stock: Option<Quantity>,
    pub category_id: Option<Uuid>,
    pub images: Option<Vec<String>>,
    pub colors: Option<Vec<String>>,
    pub featured: Option<bool>,
}

impl ProductPatch {
    pub fn apply(self, p: &mut Product) {
        if let Some(v) = self.name { p.name = v; }
        if let Some(v) = self.description { p.description = v; }
        if let Some(v) = self.price { p.price = v; }
        if let Some(v) = self.stock { p.stock = v; }
        if let Some(v) = self.category_id { p.category_id = Some(v); }
        if let Some(v) = self.images { p.images = v; }
        if let Some(v) = self.colors { p.colors = v; }
        if let Some(v) = self.featured { p.featured = v; }
        p.updated_at = Utc::now();
    }
}

/// Outcome of the advisory stock check run before a cart line grows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StockCheck {
    Available,
    /// The line would exceed what is on the shelf right now.
    LowStock { available: u32, requested: u32 },
    OutOfStock { required: u32 },
}

impl Product {
    pub fn create(new: NewProduct) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(), name: new.name, description: new.description, price: new.price,
            stock: new.stock, category_id: new.category_id, images: new.images, colors: new.colors,
            featured: new.featured, active: true, created_at: now, updated_at: now,
        }
    }

    pub fn is_in_stock(&self) -> bool { !self.stock.is_zero() }

    /// Checks whether `delta` more units can go on top of `in_cart` already held.
    /// Nothing is reserved.
    pub fn check_stock(&self, in_cart: u32, delta: u32) -> StockCheck {
        let requested = in_cart.saturating_add(delta);
        if !self.is_in_stock() {
            StockCheck::OutOfStock { required: requested }
        } else if !self.stock.covers(requested) {
            StockCheck::LowStock { available: self.stock.value(), requested }
        } else {
            StockCheck::Available
        }
    }

    pub fn remove_inventory(&mut self, qty: u32) -> Option<Quantity> {
        self.stock = self.stock.subtract(qty)?;
        self.updated_at = Utc::now();
        Some(self.stock)
    }
}

#[cfg(test)]
pub(crate) fn sample(name: &str, price: Money, stock: u32) -> Product {
    Product::create(NewProduct {
        name: name.into(), description: String::new(), price, stock: Quantity::new(stock),
        category_id: None, images: vec![], colors: vec![], featured: false,
    })
}
