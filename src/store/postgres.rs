//! PostgreSQL store.
//!
//! Queries are checked at runtime (`query_as`) so the crate builds without a
//! live database. Rows are read into `*Row` structs and converted to domain
//! types, rejecting values the schema should never have let through.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::{PgExecutor, PgPool, PgPoolOptions};
use uuid::Uuid;

use super::{OrderQuery, Page, ProductQuery, StatusChange, StockMovement, Store, StoreError, StoreResult};
use crate::domain::aggregates::{
    normalize_email, CartItem, CartLine, Category, Credentials, NewCategory, NewOrder, NewProduct, NewReview,
    NewUser, Order, OrderError, OrderItem, OrderStatus, Product, ProductPatch, Review, Role, ShippingDetails,
    Shortfall, StockLevel, User,
};
use crate::domain::reports::{empty_status_breakdown, fill_days, Dashboard, DashboardQuery, LowStockProduct, TopProduct, TOP_PRODUCTS};
use crate::domain::value_objects::{Money, Quantity};

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &SecretString, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(url.expose_secret())
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self { Self { pool } }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> { MIGRATOR.run(&self.pool).await }
}

fn db_int(v: u32) -> StoreResult<i32> {
    i32::try_from(v).map_err(|_| StoreError::Corrupt(format!("quantity {v} out of range")))
}

fn db_count(v: i32, what: &str) -> StoreResult<u32> {
    u32::try_from(v).map_err(|_| StoreError::Corrupt(format!("negative {what}: {v}")))
}

/// Maps unique violations to `Conflict`, everything else to `Database`.
fn conflict_or(e: sqlx::Error, msg: &str) -> StoreError {
    if let sqlx::Error::Database(ref db) = e {
        if db.is_unique_violation() { return StoreError::Conflict(msg.to_string()); }
        if db.is_foreign_key_violation() { return StoreError::NotFound("Referenced record"); }
    }
    StoreError::Database(e)
}

fn like_pattern(s: &str) -> String {
    let escaped = s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{escaped}%")
}

#[derive(sqlx::FromRow)]
struct UserRow { id: Uuid, email: String, name: String, password_hash: String, role: String, created_at: DateTime<Utc> }

impl UserRow {
    fn into_credentials(self) -> StoreResult<Credentials> {
        let role: Role = self.role.parse().map_err(|e| StoreError::Corrupt(format!("{e}")))?;
        Ok(Credentials {
            user: User { id: self.id, email: self.email, name: self.name, role, created_at: self.created_at },
            password_hash: self.password_hash,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid, name: String, description: String, price: Decimal, stock: i32, category_id: Option<Uuid>,
    images: Vec<String>, colors: Vec<String>, featured: bool, active: bool,
    created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;
    fn try_from(r: ProductRow) -> StoreResult<Self> {
        Ok(Product {
            id: r.id, name: r.name, description: r.description, price: Money::new(r.price),
            stock: Quantity::new(db_count(r.stock, "stock")?), category_id: r.category_id,
            images: r.images, colors: r.colors, featured: r.featured, active: r.active,
            created_at: r.created_at, updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CategoryRow { id: Uuid, name: String, slug: String, description: Option<String>, created_at: DateTime<Utc> }

impl From<CategoryRow> for Category {
    fn from(r: CategoryRow) -> Self {
        Category { id: r.id, name: r.name, slug: r.slug, description: r.description, created_at: r.created_at }
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow { id: Uuid, product_id: Uuid, user_id: Uuid, author_name: String, rating: i16, comment: String, created_at: DateTime<Utc> }

impl TryFrom<ReviewRow> for Review {
    type Error = StoreError;
    fn try_from(r: ReviewRow) -> StoreResult<Self> {
        let rating = u8::try_from(r.rating).map_err(|_| StoreError::Corrupt(format!("rating {}", r.rating)))?;
        Ok(Review { id: r.id, product_id: r.product_id, user_id: r.user_id, author_name: r.author_name, rating, comment: r.comment, created_at: r.created_at })
    }
}

#[derive(sqlx::FromRow)]
struct CartItemRow { id: Uuid, user_id: Uuid, product_id: Uuid, color: String, quantity: i32, unit_price: Decimal, created_at: DateTime<Utc> }

impl TryFrom<CartItemRow> for CartItem {
    type Error = StoreError;
    fn try_from(r: CartItemRow) -> StoreResult<Self> {
        Ok(CartItem {
            id: r.id, user_id: r.user_id, product_id: r.product_id, color: r.color,
            quantity: db_count(r.quantity, "cart quantity")?, unit_price: Money::new(r.unit_price), created_at: r.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CartLineRow {
    #[sqlx(flatten)]
    item: CartItemRow,
    product_name: String,
    current_price: Decimal,
    stock: i32,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = StoreError;
    fn try_from(r: CartLineRow) -> StoreResult<Self> {
        Ok(CartLine {
            item: r.item.try_into()?, product_name: r.product_name, current_price: Money::new(r.current_price),
            stock: Quantity::new(db_count(r.stock, "stock")?),
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid, user_id: Uuid, status: String, total: Decimal,
    shipping_name: String, shipping_phone: String, shipping_address: String,
    created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow { id: Uuid, order_id: Uuid, product_id: Uuid, product_name: String, color: String, quantity: i32, unit_price: Decimal }

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = StoreError;
    fn try_from(r: OrderItemRow) -> StoreResult<Self> {
        Ok(OrderItem {
            id: r.id, order_id: r.order_id, product_id: r.product_id, product_name: r.product_name, color: r.color,
            quantity: db_count(r.quantity, "order quantity")?, unit_price: Money::new(r.unit_price),
        })
    }
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> StoreResult<Order> {
        let status = self.status.parse::<OrderStatus>().map_err(|e| StoreError::Corrupt(e.to_string()))?;
        Ok(Order {
            id: self.id, user_id: self.user_id, status, total: Money::new(self.total),
            shipping: ShippingDetails { name: self.shipping_name, phone: self.shipping_phone, address: self.shipping_address },
            items, created_at: self.created_at, updated_at: self.updated_at,
        })
    }
}

/// Loads line items for `rows` and assembles full orders, keeping row order.
async fn with_items<'e, E: PgExecutor<'e>>(exec: E, rows: Vec<OrderRow>) -> StoreResult<Vec<Order>> {
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let items = sqlx::query_as::<_, OrderItemRow>("SELECT id, order_id, product_id, product_name, color, quantity, unit_price FROM order_items WHERE order_id = ANY($1) ORDER BY order_id, position")
        .bind(&ids)
        .fetch_all(exec)
        .await?;
    let mut by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for row in items {
        by_order.entry(row.order_id).or_default().push(row.try_into()?);
    }
    rows.into_iter().map(|r| {
        let items = by_order.remove(&r.id).unwrap_or_default();
        r.into_order(items)
    }).collect()
}

const PRODUCT_COLUMNS: &str = "id, name, description, price, stock, category_id, images, colors, featured, active, created_at, updated_at";
const PRODUCT_FILTER: &str = "active \
    AND ($1::uuid IS NULL OR category_id = $1) \
    AND ($2::bool IS NULL OR featured = $2) \
    AND ($3::text IS NULL OR name ILIKE $3 OR description ILIKE $3) \
    AND ($4::numeric IS NULL OR price >= $4) \
    AND ($5::numeric IS NULL OR price <= $5)";
const ORDER_COLUMNS: &str = "id, user_id, status, total, shipping_name, shipping_phone, shipping_address, created_at, updated_at";

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>("INSERT INTO users (id, email, name, password_hash, role, created_at) VALUES ($1, $2, $3, $4, $5, NOW()) RETURNING *")
            .bind(Uuid::now_v7()).bind(normalize_email(&new.email)).bind(&new.name).bind(&new.password_hash).bind(new.role.as_str())
            .fetch_one(&self.pool).await.map_err(|e| conflict_or(e, "email already registered"))?;
        Ok(row.into_credentials()?.user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1").bind(id).fetch_optional(&self.pool).await?;
        row.map(|r| r.into_credentials().map(|c| c.user)).transpose()
    }

    async fn find_credentials(&self, email: &str) -> StoreResult<Option<Credentials>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = $1").bind(normalize_email(email)).fetch_optional(&self.pool).await?;
        row.map(UserRow::into_credentials).transpose()
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, CategoryRow>("SELECT * FROM categories ORDER BY name").fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn get_category(&self, id: Uuid) -> StoreResult<Option<Category>> {
        let row = sqlx::query_as::<_, CategoryRow>("SELECT * FROM categories WHERE id = $1").bind(id).fetch_optional(&self.pool).await?;
        Ok(row.map(Category::from))
    }

    async fn create_category(&self, new: NewCategory) -> StoreResult<Category> {
        let msg = format!("category slug {} already exists", new.slug);
        let row = sqlx::query_as::<_, CategoryRow>("INSERT INTO categories (id, name, slug, description, created_at) VALUES ($1, $2, $3, $4, NOW()) RETURNING *")
            .bind(Uuid::now_v7()).bind(&new.name).bind(new.slug.as_str()).bind(&new.description)
            .fetch_one(&self.pool).await.map_err(|e| conflict_or(e, &msg))?;
        Ok(row.into())
    }

    async fn list_products(&self, q: &ProductQuery) -> StoreResult<Page<Product>> {
        let search = q.search.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(like_pattern);
        let rows = sqlx::query_as::<_, ProductRow>(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE {PRODUCT_FILTER} ORDER BY created_at DESC, id DESC LIMIT $6 OFFSET $7"))
            .bind(q.category).bind(q.featured).bind(&search).bind(q.min_price).bind(q.max_price)
            .bind(i64::from(q.paging.per_page)).bind(q.paging.offset() as i64)
            .fetch_all(&self.pool).await?;
        let total: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM products WHERE {PRODUCT_FILTER}"))
            .bind(q.category).bind(q.featured).bind(&search).bind(q.min_price).bind(q.max_price)
            .fetch_one(&self.pool).await?;
        let data = rows.into_iter().map(Product::try_from).collect::<StoreResult<Vec<_>>>()?;
        Ok(q.paging.page_of(data, total.0))
    }

    async fn get_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id).fetch_optional(&self.pool).await?;
        row.map(Product::try_from).transpose()
    }

    async fn get_products(&self, ids: &[Uuid]) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)"))
            .bind(ids).fetch_all(&self.pool).await?;
        rows.into_iter().map(Product::try_from).collect()
    }

    async fn create_product(&self, new: NewProduct) -> StoreResult<Product> {
        let p = Product::create(new);
        let row = sqlx::query_as::<_, ProductRow>(&format!("INSERT INTO products ({PRODUCT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, TRUE, $10, $10) RETURNING {PRODUCT_COLUMNS}"))
            .bind(p.id).bind(&p.name).bind(&p.description).bind(p.price.amount()).bind(db_int(p.stock.value())?)
            .bind(p.category_id).bind(&p.images).bind(&p.colors).bind(p.featured).bind(p.created_at)
            .fetch_one(&self.pool).await.map_err(|e| conflict_or(e, "product already exists"))?;
        row.try_into()
    }

    async fn update_product(&self, id: Uuid, patch: ProductPatch) -> StoreResult<Option<Product>> {
        let stock = patch.stock.map(|s| db_int(s.value())).transpose()?;
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE products SET name = COALESCE($2, name), description = COALESCE($3, description), price = COALESCE($4, price), \
             stock = COALESCE($5, stock), category_id = COALESCE($6, category_id), images = COALESCE($7, images), \
             colors = COALESCE($8, colors), featured = COALESCE($9, featured), updated_at = NOW() \
             WHERE id = $1 AND active RETURNING {PRODUCT_COLUMNS}"))
            .bind(id).bind(&patch.name).bind(&patch.description).bind(patch.price.map(|p| p.amount())).bind(stock)
            .bind(patch.category_id).bind(&patch.images).bind(&patch.colors).bind(patch.featured)
            .fetch_optional(&self.pool).await.map_err(|e| conflict_or(e, "product conflict"))?;
        row.map(Product::try_from).transpose()
    }

    async fn deactivate_product(&self, id: Uuid) -> StoreResult<bool> {
        let r = sqlx::query("UPDATE products SET active = FALSE, updated_at = NOW() WHERE id = $1 AND active").bind(id).execute(&self.pool).await?;
        Ok(r.rows_affected() > 0)
    }

    async fn list_reviews(&self, product_id: Uuid) -> StoreResult<Vec<Review>> {
        let rows = sqlx::query_as::<_, ReviewRow>("SELECT r.id, r.product_id, r.user_id, u.name AS author_name, r.rating, r.comment, r.created_at FROM reviews r JOIN users u ON u.id = r.user_id WHERE r.product_id = $1 ORDER BY r.created_at DESC")
            .bind(product_id).fetch_all(&self.pool).await?;
        rows.into_iter().map(Review::try_from).collect()
    }

    async fn create_review(&self, new: NewReview) -> StoreResult<Review> {
        let row = sqlx::query_as::<_, ReviewRow>(
            "WITH r AS (INSERT INTO reviews (id, product_id, user_id, rating, comment, created_at) VALUES ($1, $2, $3, $4, $5, NOW()) RETURNING *) \
             SELECT r.id, r.product_id, r.user_id, u.name AS author_name, r.rating, r.comment, r.created_at FROM r JOIN users u ON u.id = r.user_id")
            .bind(Uuid::now_v7()).bind(new.product_id).bind(new.user_id).bind(i16::from(new.rating)).bind(&new.comment)
            .fetch_one(&self.pool).await.map_err(|e| conflict_or(e, "product already reviewed"))?;
        row.try_into()
    }

    async fn list_cart(&self, user_id: Uuid) -> StoreResult<Vec<CartLine>> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            "SELECT c.id, c.user_id, c.product_id, c.color, c.quantity, c.unit_price, c.created_at, \
             p.name AS product_name, p.price AS current_price, p.stock \
             FROM cart_items c JOIN products p ON p.id = c.product_id WHERE c.user_id = $1 ORDER BY c.created_at, c.id")
            .bind(user_id).fetch_all(&self.pool).await?;
        rows.into_iter().map(CartLine::try_from).collect()
    }

    async fn find_cart_item(&self, user_id: Uuid, item_id: Uuid) -> StoreResult<Option<CartItem>> {
        let row = sqlx::query_as::<_, CartItemRow>("SELECT * FROM cart_items WHERE id = $1 AND user_id = $2")
            .bind(item_id).bind(user_id).fetch_optional(&self.pool).await?;
        row.map(CartItem::try_from).transpose()
    }

    async fn cart_quantity(&self, user_id: Uuid, product_id: Uuid, color: &str) -> StoreResult<u32> {
        let row: Option<(i32,)> = sqlx::query_as("SELECT quantity FROM cart_items WHERE user_id = $1 AND product_id = $2 AND color = $3")
            .bind(user_id).bind(product_id).bind(color).fetch_optional(&self.pool).await?;
        row.map_or(Ok(0), |(q,)| db_count(q, "cart quantity"))
    }

    async fn add_to_cart(&self, user_id: Uuid, product_id: Uuid, color: &str, quantity: u32, unit_price: Money) -> StoreResult<CartItem> {
        let row = sqlx::query_as::<_, CartItemRow>(
            "INSERT INTO cart_items (id, user_id, product_id, color, quantity, unit_price, created_at) VALUES ($1, $2, $3, $4, $5, $6, NOW()) \
             ON CONFLICT (user_id, product_id, color) DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity, unit_price = EXCLUDED.unit_price \
             RETURNING *")
            .bind(Uuid::now_v7()).bind(user_id).bind(product_id).bind(color).bind(db_int(quantity)?).bind(unit_price.amount())
            .fetch_one(&self.pool).await.map_err(|e| conflict_or(e, "cart conflict"))?;
        row.try_into()
    }

    async fn set_cart_quantity(&self, user_id: Uuid, item_id: Uuid, quantity: u32) -> StoreResult<Option<CartItem>> {
        let row = sqlx::query_as::<_, CartItemRow>("UPDATE cart_items SET quantity = $3 WHERE id = $1 AND user_id = $2 RETURNING *")
            .bind(item_id).bind(user_id).bind(db_int(quantity)?).fetch_optional(&self.pool).await?;
        row.map(CartItem::try_from).transpose()
    }

    async fn remove_cart_item(&self, user_id: Uuid, item_id: Uuid) -> StoreResult<bool> {
        let r = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2").bind(item_id).bind(user_id).execute(&self.pool).await?;
        Ok(r.rows_affected() > 0)
    }

    async fn clear_cart(&self, user_id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM cart_items WHERE user_id = $1").bind(user_id).execute(&self.pool).await?;
        Ok(())
    }

    async fn list_wishlist(&self, user_id: Uuid) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM wishlist_items w JOIN products p ON p.id = w.product_id WHERE w.user_id = $1 ORDER BY w.created_at",
            PRODUCT_COLUMNS.split(", ").map(|c| format!("p.{c}")).collect::<Vec<_>>().join(", ")))
            .bind(user_id).fetch_all(&self.pool).await?;
        rows.into_iter().map(Product::try_from).collect()
    }

    async fn toggle_wishlist(&self, user_id: Uuid, product_id: Uuid) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;
        let removed = sqlx::query("DELETE FROM wishlist_items WHERE user_id = $1 AND product_id = $2")
            .bind(user_id).bind(product_id).execute(&mut *tx).await?;
        if removed.rows_affected() == 0 {
            sqlx::query("INSERT INTO wishlist_items (id, user_id, product_id, created_at) VALUES ($1, $2, $3, NOW()) ON CONFLICT DO NOTHING")
                .bind(Uuid::now_v7()).bind(user_id).bind(product_id).execute(&mut *tx).await.map_err(|e| conflict_or(e, "wishlist conflict"))?;
        }
        tx.commit().await?;
        Ok(removed.rows_affected() == 0)
    }

    async fn remove_from_wishlist(&self, user_id: Uuid, product_id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM wishlist_items WHERE user_id = $1 AND product_id = $2").bind(user_id).bind(product_id).execute(&self.pool).await?;
        Ok(())
    }

    async fn create_order(&self, new: NewOrder) -> StoreResult<Order> {
        let order = new.into_order();
        let mut tx = self.pool.begin().await?;
        sqlx::query(&format!("INSERT INTO orders ({ORDER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)"))
            .bind(order.id).bind(order.user_id).bind(order.status.as_str()).bind(order.total.amount())
            .bind(&order.shipping.name).bind(&order.shipping.phone).bind(&order.shipping.address).bind(order.created_at)
            .execute(&mut *tx).await?;
        for (position, item) in order.items.iter().enumerate() {
            sqlx::query("INSERT INTO order_items (id, order_id, product_id, product_name, color, quantity, unit_price, position) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)")
                .bind(item.id).bind(order.id).bind(item.product_id).bind(&item.product_name).bind(&item.color)
                .bind(db_int(item.quantity)?).bind(item.unit_price.amount()).bind(position as i32)
                .execute(&mut *tx).await.map_err(|e| conflict_or(e, "order item conflict"))?;
        }
        sqlx::query("DELETE FROM cart_items WHERE user_id = $1").bind(order.user_id).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn get_order(&self, id: Uuid) -> StoreResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1")).bind(id).fetch_optional(&self.pool).await?;
        let Some(row) = row else { return Ok(None) };
        Ok(with_items(&self.pool, vec![row]).await?.pop())
    }

    async fn list_orders_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC"))
            .bind(user_id).fetch_all(&self.pool).await?;
        with_items(&self.pool, rows).await
    }

    async fn list_orders(&self, q: &OrderQuery) -> StoreResult<Page<Order>> {
        let status = q.status.map(|s| s.as_str());
        let rows = sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE ($1::text IS NULL OR status = $1) ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"))
            .bind(status).bind(i64::from(q.paging.per_page)).bind(q.paging.offset() as i64)
            .fetch_all(&self.pool).await?;
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE ($1::text IS NULL OR status = $1)").bind(status).fetch_one(&self.pool).await?;
        Ok(q.paging.page_of(with_items(&self.pool, rows).await?, total.0))
    }

    async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> StoreResult<StatusChange> {
        let mut tx = self.pool.begin().await?;
        // Lock the order first so concurrent updates of it queue behind us.
        let row = sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"))
            .bind(id).fetch_optional(&mut *tx).await?.ok_or(StoreError::NotFound("Order"))?;
        let mut order = with_items(&mut *tx, vec![row]).await?.pop().ok_or(StoreError::NotFound("Order"))?;
        let plan = order.status.plan(status)?;

        let mut movements = Vec::new();
        if plan.consumes_stock {
            let needed = order.required_stock()?;
            let ids: Vec<Uuid> = needed.keys().copied().collect();
            let rows: Vec<(Uuid, String, i32)> = sqlx::query_as("SELECT id, name, stock FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE")
                .bind(&ids).fetch_all(&mut *tx).await?;
            let mut levels = HashMap::with_capacity(rows.len());
            for (pid, name, stock) in rows {
                levels.insert(pid, StockLevel { name, stock: db_count(stock, "stock")? });
            }
            if let Some(shortfall) = order.find_shortfall(&levels)? {
                tx.rollback().await?;
                return Err(OrderError::InsufficientStock(shortfall).into());
            }
            for (product_id, (name, qty)) in needed {
                let remaining: Option<(i32,)> = sqlx::query_as("UPDATE products SET stock = stock - $2, updated_at = NOW() WHERE id = $1 AND stock >= $2 RETURNING stock")
                    .bind(product_id).bind(db_int(qty)?).fetch_optional(&mut *tx).await?;
                let Some((remaining,)) = remaining else {
                    tx.rollback().await?;
                    let level = levels.remove(&product_id);
                    return Err(OrderError::InsufficientStock(Shortfall {
                        product_id,
                        product_name: level.as_ref().map_or(name, |l| l.name.clone()),
                        available: level.map_or(0, |l| l.stock),
                        required: qty,
                    }).into());
                };
                movements.push(StockMovement { product_id, quantity: qty, remaining: db_count(remaining, "stock")? });
            }
        }

        let (updated_at,): (DateTime<Utc>,) = sqlx::query_as("UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING updated_at")
            .bind(id).bind(plan.to.as_str()).fetch_one(&mut *tx).await?;
        order.status = plan.to;
        order.updated_at = updated_at;
        tx.commit().await?;
        Ok(StatusChange { order, from: plan.from, movements })
    }

    async fn dashboard(&self, q: &DashboardQuery) -> StoreResult<Dashboard> {
        let (revenue, order_count): (Decimal, i64) = sqlx::query_as(
            "SELECT COALESCE(SUM(total) FILTER (WHERE status <> 'CANCELLED'), 0), COUNT(*) FROM orders")
            .fetch_one(&self.pool).await?;
        let (customers,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = 'CUSTOMER'").fetch_one(&self.pool).await?;
        let (products,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE active").fetch_one(&self.pool).await?;

        let mut orders_by_status = empty_status_breakdown();
        let by_status: Vec<(String, i64)> = sqlx::query_as("SELECT status, COUNT(*) FROM orders GROUP BY status").fetch_all(&self.pool).await?;
        for (s, n) in by_status {
            orders_by_status.insert(s, n.max(0) as u64);
        }

        let top: Vec<(Uuid, String, i64, Decimal)> = sqlx::query_as(
            "SELECT oi.product_id, MIN(oi.product_name), SUM(oi.quantity)::BIGINT, SUM(oi.quantity * oi.unit_price) \
             FROM order_items oi JOIN orders o ON o.id = oi.order_id WHERE o.status <> 'CANCELLED' \
             GROUP BY oi.product_id ORDER BY 3 DESC, 2 ASC LIMIT $1")
            .bind(TOP_PRODUCTS as i64).fetch_all(&self.pool).await?;
        let top_products = top.into_iter()
            .map(|(product_id, name, units, revenue)| TopProduct { product_id, name, units: units.max(0) as u64, revenue: Money::new(revenue) })
            .collect();

        let low: Vec<(Uuid, String, i32)> = sqlx::query_as("SELECT id, name, stock FROM products WHERE active AND stock <= $1 ORDER BY stock, name")
            .bind(db_int(q.low_stock_threshold)?).fetch_all(&self.pool).await?;
        let low_stock = low.into_iter()
            .map(|(product_id, name, stock)| Ok(LowStockProduct { product_id, name, stock: db_count(stock, "stock")? }))
            .collect::<StoreResult<Vec<_>>>()?;

        let now = Utc::now();
        let since = q.since(now);
        let daily: Vec<(NaiveDate, Decimal, i64)> = sqlx::query_as(
            "SELECT (created_at AT TIME ZONE 'UTC')::date AS day, SUM(total), COUNT(*) FROM orders \
             WHERE status <> 'CANCELLED' AND created_at >= $1 GROUP BY day")
            .bind(since.and_time(NaiveTime::MIN).and_utc()).fetch_all(&self.pool).await?;
        let known = daily.into_iter().map(|(d, rev, n)| (d, (Money::new(rev), n.max(0) as u64))).collect();

        Ok(Dashboard {
            revenue: Money::new(revenue),
            order_count: order_count.max(0) as u64,
            customer_count: customers.max(0) as u64,
            product_count: products.max(0) as u64,
            orders_by_status,
            top_products,
            low_stock,
            daily_revenue: fill_days(since, now.date_naive(), known),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn test_row_conversion_rejects_negative_stock() {
        let row = ProductRow {
            id: Uuid::nil(), name: "Tee".into(), description: String::new(), price: Decimal::new(999, 2), stock: -1,
            category_id: None, images: vec![], colors: vec![], featured: false, active: true,
            created_at: Utc::now(), updated_at: Utc::now(),
        };
        assert!(matches!(Product::try_from(row), Err(StoreError::Corrupt(_))));
    }
}
