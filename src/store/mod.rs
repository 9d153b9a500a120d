//! Data access layer.
//!
//! [`Store`] is the seam between route handlers and persistence. [`PgStore`]
//! is the production implementation over PostgreSQL; [`MemoryStore`] keeps
//! everything in process and backs tests and database-less runs. Both give
//! the same guarantees for [`Store::update_order_status`]: the status write
//! and every stock decrement commit together or not at all.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::{
    CartItem, CartLine, Category, Credentials, NewCategory, NewOrder, NewProduct, NewReview, NewUser, Order,
    OrderError, OrderStatus, Product, ProductPatch, Review, User,
};
use crate::domain::reports::{Dashboard, DashboardQuery};
use crate::domain::value_objects::Money;

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Order(#[from] OrderError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> { pub data: Vec<T>, pub total: i64, pub page: u32, pub per_page: u32 }

/// Page number (1-based) and size, clamped to sane bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Paging { pub page: u32, pub per_page: u32 }

impl Paging {
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self { page: page.unwrap_or(1).max(1), per_page: per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE) }
    }
    pub fn offset(&self) -> u64 { u64::from(self.page - 1) * u64::from(self.per_page) }
    pub fn page_of<T>(&self, data: Vec<T>, total: i64) -> Page<T> {
        Page { data, total, page: self.page, per_page: self.per_page }
    }
}

impl Default for Paging { fn default() -> Self { Self::new(None, None) } }

#[derive(Clone, Debug, Default)]
pub struct ProductQuery {
    pub paging: Paging,
    pub category: Option<Uuid>,
    pub featured: Option<bool>,
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

impl ProductQuery {
    /// Filter used by in-process stores; the SQL store expresses the same
    /// predicate in its WHERE clause.
    pub fn matches(&self, p: &Product) -> bool {
        p.active
            && self.category.map_or(true, |c| p.category_id == Some(c))
            && self.featured.map_or(true, |f| p.featured == f)
            && self.min_price.map_or(true, |m| p.price >= Money::new(m))
            && self.max_price.map_or(true, |m| p.price <= Money::new(m))
            && self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()).map_or(true, |s| {
                let needle = s.to_lowercase();
                p.name.to_lowercase().contains(&needle) || p.description.to_lowercase().contains(&needle)
            })
    }
}

#[derive(Clone, Debug, Default)]
pub struct OrderQuery { pub paging: Paging, pub status: Option<OrderStatus> }

/// Units taken off one product by a delivery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StockMovement { pub product_id: Uuid, pub quantity: u32, pub remaining: u32 }

/// Result of a committed status update.
#[derive(Clone, Debug)]
pub struct StatusChange {
    pub order: Order,
    pub from: OrderStatus,
    pub movements: Vec<StockMovement>,
}

#[async_trait]
pub trait Store: Send + Sync + 'static {
    async fn ping(&self) -> StoreResult<()>;

    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_credentials(&self, email: &str) -> StoreResult<Option<Credentials>>;

    async fn list_categories(&self) -> StoreResult<Vec<Category>>;
    async fn get_category(&self, id: Uuid) -> StoreResult<Option<Category>>;
    async fn create_category(&self, category: NewCategory) -> StoreResult<Category>;

    async fn list_products(&self, query: &ProductQuery) -> StoreResult<Page<Product>>;
    /// Returns inactive products too; callers decide visibility.
    async fn get_product(&self, id: Uuid) -> StoreResult<Option<Product>>;
    async fn get_products(&self, ids: &[Uuid]) -> StoreResult<Vec<Product>>;
    async fn create_product(&self, product: NewProduct) -> StoreResult<Product>;
    async fn update_product(&self, id: Uuid, patch: ProductPatch) -> StoreResult<Option<Product>>;
    async fn deactivate_product(&self, id: Uuid) -> StoreResult<bool>;

    async fn list_reviews(&self, product_id: Uuid) -> StoreResult<Vec<Review>>;
    async fn create_review(&self, review: NewReview) -> StoreResult<Review>;

    async fn list_cart(&self, user_id: Uuid) -> StoreResult<Vec<CartLine>>;
    async fn find_cart_item(&self, user_id: Uuid, item_id: Uuid) -> StoreResult<Option<CartItem>>;
    async fn cart_quantity(&self, user_id: Uuid, product_id: Uuid, color: &str) -> StoreResult<u32>;
    /// Adds `quantity` to the (user, product, colour) line, creating it if needed.
    async fn add_to_cart(&self, user_id: Uuid, product_id: Uuid, color: &str, quantity: u32, unit_price: Money) -> StoreResult<CartItem>;
    async fn set_cart_quantity(&self, user_id: Uuid, item_id: Uuid, quantity: u32) -> StoreResult<Option<CartItem>>;
    async fn remove_cart_item(&self, user_id: Uuid, item_id: Uuid) -> StoreResult<bool>;
    async fn clear_cart(&self, user_id: Uuid) -> StoreResult<()>;

    async fn list_wishlist(&self, user_id: Uuid) -> StoreResult<Vec<Product>>;
    /// Returns whether the product is on the wishlist afterwards.
    async fn toggle_wishlist(&self, user_id: Uuid, product_id: Uuid) -> StoreResult<bool>;
    async fn remove_from_wishlist(&self, user_id: Uuid, product_id: Uuid) -> StoreResult<()>;

    /// Persists the order in `PENDING` and empties the owner's cart, atomically.
    async fn create_order(&self, order: NewOrder) -> StoreResult<Order>;
    async fn get_order(&self, id: Uuid) -> StoreResult<Option<Order>>;
    async fn list_orders_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Order>>;
    async fn list_orders(&self, query: &OrderQuery) -> StoreResult<Page<Order>>;
    /// Validates the transition and, for the first move into `DELIVERED`,
    /// decrements stock for every line in the same transaction.
    async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> StoreResult<StatusChange>;

    async fn dashboard(&self, query: &DashboardQuery) -> StoreResult<Dashboard>;
}
