//! In-process store. One mutex guards every table, so each call is atomic
//! with respect to every other call.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{OrderQuery, Page, ProductQuery, StatusChange, StockMovement, Store, StoreError, StoreResult};
use crate::domain::aggregates::{
    normalize_email, CartItem, CartLine, Category, Credentials, NewCategory, NewOrder, NewProduct, NewReview,
    NewUser, Order, OrderError, OrderStatus, Product, ProductPatch, Review, Role, StockLevel, User, WishlistItem,
};
use crate::domain::reports::{Dashboard, DashboardQuery};
use crate::domain::value_objects::Money;

#[derive(Default)]
struct Tables {
    users: Vec<(User, String)>,
    categories: Vec<Category>,
    products: HashMap<Uuid, Product>,
    reviews: Vec<Review>,
    cart: Vec<CartItem>,
    wishlist: Vec<WishlistItem>,
    orders: Vec<Order>,
}

impl Tables {
    fn user(&self, id: Uuid) -> Option<&User> { self.users.iter().map(|(u, _)| u).find(|u| u.id == id) }

    fn cart_line(&self, item: &CartItem) -> Option<CartLine> {
        let p = self.products.get(&item.product_id)?;
        Some(CartLine { item: item.clone(), product_name: p.name.clone(), current_price: p.price, stock: p.stock })
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }
}

fn newest_first(orders: &mut [Order]) { orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))); }

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> { Ok(()) }

    async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        let mut t = self.tables.lock().await;
        let email = normalize_email(&new.email);
        if t.users.iter().any(|(u, _)| u.email == email) {
            return Err(StoreError::Conflict("email already registered".into()));
        }
        let user = User { id: Uuid::now_v7(), email, name: new.name, role: new.role, created_at: Utc::now() };
        t.users.push((user.clone(), new.password_hash));
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables.lock().await.user(id).cloned())
    }

    async fn find_credentials(&self, email: &str) -> StoreResult<Option<Credentials>> {
        let email = normalize_email(email);
        Ok(self.tables.lock().await.users.iter().find(|(u, _)| u.email == email).map(|(user, hash)| Credentials {
            user: user.clone(),
            password_hash: hash.clone(),
        }))
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let mut cats = self.tables.lock().await.categories.clone();
        cats.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(cats)
    }

    async fn get_category(&self, id: Uuid) -> StoreResult<Option<Category>> {
        Ok(self.tables.lock().await.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn create_category(&self, new: NewCategory) -> StoreResult<Category> {
        let mut t = self.tables.lock().await;
        if t.categories.iter().any(|c| c.slug == new.slug.as_str()) {
            return Err(StoreError::Conflict(format!("category slug {} already exists", new.slug)));
        }
        let c = Category { id: Uuid::now_v7(), name: new.name, slug: new.slug.into_inner(), description: new.description, created_at: Utc::now() };
        t.categories.push(c.clone());
        Ok(c)
    }

    async fn list_products(&self, query: &ProductQuery) -> StoreResult<Page<Product>> {
        let t = self.tables.lock().await;
        let mut hits: Vec<Product> = t.products.values().filter(|p| query.matches(p)).cloned().collect();
        hits.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let total = hits.len() as i64;
        let data = hits.into_iter().skip(query.paging.offset() as usize).take(query.paging.per_page as usize).collect();
        Ok(query.paging.page_of(data, total))
    }

    async fn get_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        Ok(self.tables.lock().await.products.get(&id).cloned())
    }

    async fn get_products(&self, ids: &[Uuid]) -> StoreResult<Vec<Product>> {
        let t = self.tables.lock().await;
        Ok(ids.iter().filter_map(|id| t.products.get(id)).cloned().collect())
    }

    async fn create_product(&self, new: NewProduct) -> StoreResult<Product> {
        let mut t = self.tables.lock().await;
        if let Some(c) = new.category_id {
            if !t.categories.iter().any(|cat| cat.id == c) { return Err(StoreError::NotFound("Category")); }
        }
        let p = Product::create(new);
        t.products.insert(p.id, p.clone());
        Ok(p)
    }

    async fn update_product(&self, id: Uuid, patch: ProductPatch) -> StoreResult<Option<Product>> {
        let mut t = self.tables.lock().await;
        if let Some(c) = patch.category_id {
            if !t.categories.iter().any(|cat| cat.id == c) { return Err(StoreError::NotFound("Category")); }
        }
        Ok(t.products.get_mut(&id).filter(|p| p.active).map(|p| {
            patch.apply(p);
            p.clone()
        }))
    }

    async fn deactivate_product(&self, id: Uuid) -> StoreResult<bool> {
        let mut t = self.tables.lock().await;
        match t.products.get_mut(&id) {
            Some(p) if p.active => {
                p.active = false;
                p.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_reviews(&self, product_id: Uuid) -> StoreResult<Vec<Review>> {
        let mut reviews: Vec<Review> = self.tables.lock().await.reviews.iter().filter(|r| r.product_id == product_id).cloned().collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }

    async fn create_review(&self, new: NewReview) -> StoreResult<Review> {
        let mut t = self.tables.lock().await;
        if t.reviews.iter().any(|r| r.product_id == new.product_id && r.user_id == new.user_id) {
            return Err(StoreError::Conflict("product already reviewed".into()));
        }
        let author_name = t.user(new.user_id).map(|u| u.name.clone()).ok_or(StoreError::NotFound("User"))?;
        let r = Review {
            id: Uuid::now_v7(), product_id: new.product_id, user_id: new.user_id, author_name,
            rating: new.rating, comment: new.comment, created_at: Utc::now(),
        };
        t.reviews.push(r.clone());
        Ok(r)
    }

    async fn list_cart(&self, user_id: Uuid) -> StoreResult<Vec<CartLine>> {
        let t = self.tables.lock().await;
        Ok(t.cart.iter().filter(|i| i.user_id == user_id).filter_map(|i| t.cart_line(i)).collect())
    }

    async fn find_cart_item(&self, user_id: Uuid, item_id: Uuid) -> StoreResult<Option<CartItem>> {
        Ok(self.tables.lock().await.cart.iter().find(|i| i.id == item_id && i.user_id == user_id).cloned())
    }

    async fn cart_quantity(&self, user_id: Uuid, product_id: Uuid, color: &str) -> StoreResult<u32> {
        Ok(self.tables.lock().await.cart.iter().find(|i| i.same_line(user_id, product_id, color)).map_or(0, |i| i.quantity))
    }

    async fn add_to_cart(&self, user_id: Uuid, product_id: Uuid, color: &str, quantity: u32, unit_price: Money) -> StoreResult<CartItem> {
        let mut t = self.tables.lock().await;
        if let Some(existing) = t.cart.iter_mut().find(|i| i.same_line(user_id, product_id, color)) {
            existing.quantity = existing.quantity.saturating_add(quantity);
            existing.unit_price = unit_price;
            return Ok(existing.clone());
        }
        let item = CartItem::new(user_id, product_id, color, quantity, unit_price);
        t.cart.push(item.clone());
        Ok(item)
    }

    async fn set_cart_quantity(&self, user_id: Uuid, item_id: Uuid, quantity: u32) -> StoreResult<Option<CartItem>> {
        let mut t = self.tables.lock().await;
        Ok(t.cart.iter_mut().find(|i| i.id == item_id && i.user_id == user_id).map(|i| {
            i.quantity = quantity;
            i.clone()
        }))
    }

    async fn remove_cart_item(&self, user_id: Uuid, item_id: Uuid) -> StoreResult<bool> {
        let mut t = self.tables.lock().await;
        let before = t.cart.len();
        t.cart.retain(|i| !(i.id == item_id && i.user_id == user_id));
        Ok(t.cart.len() != before)
    }

    async fn clear_cart(&self, user_id: Uuid) -> StoreResult<()> {
        self.tables.lock().await.cart.retain(|i| i.user_id != user_id);
        Ok(())
    }

    async fn list_wishlist(&self, user_id: Uuid) -> StoreResult<Vec<Product>> {
        let t = self.tables.lock().await;
        Ok(t.wishlist.iter().filter(|w| w.user_id == user_id).filter_map(|w| t.products.get(&w.product_id)).cloned().collect())
    }

    async fn toggle_wishlist(&self, user_id: Uuid, product_id: Uuid) -> StoreResult<bool> {
        let mut t = self.tables.lock().await;
        if t.wishlist.iter().any(|w| w.user_id == user_id && w.product_id == product_id) {
            t.wishlist.retain(|w| !(w.user_id == user_id && w.product_id == product_id));
            return Ok(false);
        }
        t.wishlist.push(WishlistItem { id: Uuid::now_v7(), user_id, product_id, created_at: Utc::now() });
        Ok(true)
    }

    async fn remove_from_wishlist(&self, user_id: Uuid, product_id: Uuid) -> StoreResult<()> {
        self.tables.lock().await.wishlist.retain(|w| !(w.user_id == user_id && w.product_id == product_id));
        Ok(())
    }

    async fn create_order(&self, new: NewOrder) -> StoreResult<Order> {
        let mut t = self.tables.lock().await;
        let order = new.into_order();
        t.cart.retain(|i| i.user_id != order.user_id);
        t.orders.push(order.clone());
        Ok(order)
    }

    async fn get_order(&self, id: Uuid) -> StoreResult<Option<Order>> {
        Ok(self.tables.lock().await.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn list_orders_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Order>> {
        let mut orders: Vec<Order> = self.tables.lock().await.orders.iter().filter(|o| o.user_id == user_id).cloned().collect();
        newest_first(&mut orders);
        Ok(orders)
    }

    async fn list_orders(&self, query: &OrderQuery) -> StoreResult<Page<Order>> {
        let mut orders: Vec<Order> = self.tables.lock().await.orders.iter()
            .filter(|o| query.status.map_or(true, |s| o.status == s))
            .cloned()
            .collect();
        newest_first(&mut orders);
        let total = orders.len() as i64;
        let data = orders.into_iter().skip(query.paging.offset() as usize).take(query.paging.per_page as usize).collect();
        Ok(query.paging.page_of(data, total))
    }

    async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> StoreResult<StatusChange> {
        let mut t = self.tables.lock().await;
        let idx = t.orders.iter().position(|o| o.id == id).ok_or(StoreError::NotFound("Order"))?;
        let plan = t.orders[idx].status.plan(status)?;

        let mut movements = Vec::new();
        if plan.consumes_stock {
            let levels: HashMap<Uuid, StockLevel> = t.products.values()
                .map(|p| (p.id, StockLevel { name: p.name.clone(), stock: p.stock.value() }))
                .collect();
            if let Some(shortfall) = t.orders[idx].find_shortfall(&levels)? {
                return Err(OrderError::InsufficientStock(shortfall).into());
            }
            // Every product was checked above under the same lock.
            let needed = t.orders[idx].required_stock()?;
            for (product_id, (_, qty)) in needed {
                let product = t.products.get_mut(&product_id).ok_or(StoreError::NotFound("Product"))?;
                let remaining = product.remove_inventory(qty).ok_or_else(|| StoreError::Corrupt(format!("stock for {product_id} changed under lock")))?;
                movements.push(StockMovement { product_id, quantity: qty, remaining: remaining.value() });
            }
        }

        let order = &mut t.orders[idx];
        order.apply(plan);
        Ok(StatusChange { order: order.clone(), from: plan.from, movements })
    }

    async fn dashboard(&self, query: &DashboardQuery) -> StoreResult<Dashboard> {
        let t = self.tables.lock().await;
        let products: Vec<Product> = t.products.values().cloned().collect();
        let customers = t.users.iter().filter(|(u, _)| u.role == Role::Customer).count() as u64;
        Ok(Dashboard::compute(&t.orders, &products, customers, query, Utc::now()))
    }
}
