//! End-to-end tests driving the router over the in-memory store.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use opensase_apparel::auth::{hash_password, TokenSigner};
use opensase_apparel::domain::aggregates::{NewProduct, NewUser, Product, Role};
use opensase_apparel::domain::value_objects::{Money, Quantity};
use opensase_apparel::events::EventPublisher;
use opensase_apparel::store::{MemoryStore, Store};
use opensase_apparel::{app, AppState};

struct Harness {
    app: Router,
    store: Arc<MemoryStore>,
    tokens: Arc<TokenSigner>,
    admin: String,
    customer: String,
}

impl Harness {
    async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let signer = TokenSigner::new(SecretString::from("test-secret-0123456789abcdef-0123".to_string()), chrono::Duration::days(7));
        let state = AppState::new(store.clone(), signer, EventPublisher::disabled());
        let tokens = state.tokens.clone();

        let admin = store.create_user(NewUser::new("admin@shop.test", "Admin", "x".into(), Role::Admin)).await.unwrap();
        let customer = store.create_user(NewUser::new("ana@shop.test", "Ana", "x".into(), Role::Customer)).await.unwrap();
        Self {
            app: app(state),
            admin: tokens.issue(admin.id).unwrap(),
            customer: tokens.issue(customer.id).unwrap(),
            tokens,
            store,
        }
    }

    async fn product(&self, name: &str, price: i64, stock: u32) -> Product {
        self.store
            .create_product(NewProduct {
                name: name.into(),
                description: String::new(),
                price: Money::new(Decimal::new(price, 0)),
                stock: Quantity::new(stock),
                category_id: None,
                images: vec![],
                colors: vec![],
                featured: false,
            })
            .await
            .unwrap()
    }

    async fn stock_of(&self, id: Uuid) -> u32 {
        self.store.get_product(id).await.unwrap().unwrap().stock.value()
    }

    async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        let req = match body {
            Some(b) => req.header(header::CONTENT_TYPE, "application/json").body(Body::from(b.to_string())).unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let response = self.app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    async fn place_order(&self, lines: Value) -> Value {
        let body = json!({
            "items": lines,
            "shippingName": "Ana Diaz",
            "shippingPhone": "+1 555 0100",
            "shippingAddress": "1 Market St",
        });
        let (status, body) = self.send(Method::POST, "/api/v1/orders", Some(self.customer.as_str()), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["order"].clone()
    }

    async fn set_status(&self, order_id: &str, status: &str) -> (StatusCode, Value) {
        let uri = format!("/api/v1/orders/{order_id}");
        self.send(Method::PUT, &uri, Some(self.admin.as_str()), Some(json!({ "status": status }))).await
    }
}

#[tokio::test]
async fn test_health() {
    let h = Harness::new().await;
    let (status, body) = h.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_delivery_decrements_stock_exactly_once() {
    let h = Harness::new().await;
    let p = h.product("Oxford Shirt", 40, 5).await;
    let order = h.place_order(json!([{ "productId": p.id, "quantity": 3, "price": "40.00" }])).await;
    let id = order["id"].as_str().unwrap();
    assert_eq!(h.stock_of(p.id).await, 5, "placing an order does not touch stock");

    let (status, body) = h.set_status(id, "DELIVERED").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["status"], "DELIVERED");
    assert_eq!(h.stock_of(p.id).await, 2);

    // Re-marking delivered is accepted and consumes nothing.
    let (status, _) = h.set_status(id, "DELIVERED").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.stock_of(p.id).await, 2);
}

#[tokio::test]
async fn test_intermediate_statuses_leave_stock_alone() {
    let h = Harness::new().await;
    let p = h.product("Chinos", 55, 4).await;
    let order = h.place_order(json!([{ "productId": p.id, "quantity": 1 }])).await;
    let id = order["id"].as_str().unwrap();

    for status in ["PROCESSING", "SHIPPED"] {
        assert_eq!(h.set_status(id, status).await.0, StatusCode::OK);
        assert_eq!(h.stock_of(p.id).await, 4);
    }
    assert_eq!(h.set_status(id, "delivered").await.0, StatusCode::OK);
    assert_eq!(h.stock_of(p.id).await, 3);
}

#[tokio::test]
async fn test_insufficient_stock_rejects_without_side_effects() {
    let h = Harness::new().await;
    let p = h.product("Wool Scarf", 20, 2).await;
    let order = h.place_order(json!([{ "productId": p.id, "quantity": 3 }])).await;
    let id = order["id"].as_str().unwrap();

    let (status, body) = h.set_status(id, "DELIVERED").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Insufficient stock for Wool Scarf");
    assert_eq!(body["details"]["productName"], "Wool Scarf");
    assert_eq!(body["details"]["available"], 2);
    assert_eq!(body["details"]["required"], 3);
    assert_eq!(body["details"]["shortfall"], 1);

    assert_eq!(h.stock_of(p.id).await, 2);
    let (_, body) = h.send(Method::GET, &format!("/api/v1/orders/{id}"), Some(h.customer.as_str()), None).await;
    assert_eq!(body["order"]["status"], "PENDING");
}

#[tokio::test]
async fn test_failing_line_rolls_back_every_decrement() {
    let h = Harness::new().await;
    let plenty = h.product("Socks", 5, 10).await;
    let scarce = h.product("Beanie", 15, 1).await;
    let order = h
        .place_order(json!([
            { "productId": plenty.id, "quantity": 4 },
            { "productId": scarce.id, "quantity": 2 },
        ]))
        .await;

    let (status, body) = h.set_status(order["id"].as_str().unwrap(), "DELIVERED").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["productId"], scarce.id.to_string());
    assert_eq!(h.stock_of(plenty.id).await, 10);
    assert_eq!(h.stock_of(scarce.id).await, 1);
}

#[tokio::test]
async fn test_order_total_uses_catalog_price() {
    let h = Harness::new().await;
    let p = h.product("Linen Blazer", 25, 9).await;
    let order = h.place_order(json!([{ "productId": p.id, "quantity": 2, "price": "1.00", "color": "sand" }])).await;
    assert_eq!(order["total"], "50.00");
    assert_eq!(order["status"], "PENDING");
    assert_eq!(order["items"][0]["unitPrice"], "25.00");
    assert_eq!(order["items"][0]["color"], "sand");
    assert_eq!(order["shippingName"], "Ana Diaz");
}

#[tokio::test]
async fn test_order_validation() {
    let h = Harness::new().await;
    let p = h.product("Parka", 120, 3).await;
    let body = json!({ "items": [], "shippingName": "A", "shippingPhone": "1", "shippingAddress": "x" });
    let (status, _) = h.send(Method::POST, "/api/v1/orders", Some(h.customer.as_str()), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let body = json!({ "items": [{ "productId": p.id, "quantity": 1 }], "shippingName": "  ", "shippingPhone": "1", "shippingAddress": "x" });
    let (status, _) = h.send(Method::POST, "/api/v1/orders", Some(h.customer.as_str()), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let body = json!({ "items": [{ "productId": Uuid::now_v7(), "quantity": 1 }], "shippingName": "A", "shippingPhone": "1", "shippingAddress": "x" });
    let (status, _) = h.send(Method::POST, "/api/v1/orders", Some(h.customer.as_str()), Some(body)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = h.send(Method::POST, "/api/v1/orders", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_oversized_line_quantity_is_rejected() {
    let h = Harness::new().await;
    let p = h.product("Cargo Pants", 2, 5).await;
    let body = json!({
        "items": [
            { "productId": p.id, "quantity": 3_000_000_000u32, "color": "red" },
            { "productId": p.id, "quantity": 3_000_000_000u32, "color": "blue" },
        ],
        "shippingName": "Ana Diaz", "shippingPhone": "1", "shippingAddress": "x",
    });
    let (status, body) = h.send(Method::POST, "/api/v1/orders", Some(h.customer.as_str()), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    let (_, mine) = h.send(Method::GET, "/api/v1/orders", Some(h.customer.as_str()), None).await;
    assert_eq!(mine["orders"].as_array().unwrap().len(), 0);

    // The largest allowed lines still sum safely and are refused at delivery.
    let order = h.place_order(json!([
        { "productId": p.id, "quantity": 999, "color": "red" },
        { "productId": p.id, "quantity": 999, "color": "blue" },
    ])).await;
    let (status, body) = h.set_status(order["id"].as_str().unwrap(), "DELIVERED").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["required"], 1998);
    assert_eq!(h.stock_of(p.id).await, 5);
}

#[tokio::test]
async fn test_status_update_access_and_transitions() {
    let h = Harness::new().await;
    let p = h.product("Cardigan", 60, 5).await;
    let order = h.place_order(json!([{ "productId": p.id, "quantity": 1 }])).await;
    let id = order["id"].as_str().unwrap();
    let uri = format!("/api/v1/orders/{id}");

    let (status, _) = h.send(Method::PUT, &uri, Some(h.customer.as_str()), Some(json!({ "status": "SHIPPED" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = h.send(Method::PUT, &uri, None, Some(json!({ "status": "SHIPPED" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = h.set_status(&Uuid::now_v7().to_string(), "SHIPPED").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = h.set_status(id, "LOST").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(h.set_status(id, "CANCELLED").await.0, StatusCode::OK);
    let (status, body) = h.set_status(id, "DELIVERED").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], json!({ "from": "CANCELLED", "to": "DELIVERED" }));
    assert_eq!(h.stock_of(p.id).await, 5);
}

#[tokio::test]
async fn test_role_is_read_from_store_on_each_request() {
    let h = Harness::new().await;
    let (status, _) = h.send(Method::GET, "/api/v1/admin/dashboard", Some(h.customer.as_str()), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let ghost = h.tokens.issue(Uuid::now_v7()).unwrap();
    let (status, _) = h.send(Method::GET, "/api/v1/auth/me", Some(ghost.as_str()), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = h.send(Method::GET, "/api/v1/auth/me", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_orders_are_private_to_their_owner() {
    let h = Harness::new().await;
    let p = h.product("Belt", 30, 5).await;
    let order = h.place_order(json!([{ "productId": p.id, "quantity": 1 }])).await;
    let uri = format!("/api/v1/orders/{}", order["id"].as_str().unwrap());

    let other = h.store.create_user(NewUser::new("ben@shop.test", "Ben", "x".into(), Role::Customer)).await.unwrap();
    let other = h.tokens.issue(other.id).unwrap();
    assert_eq!(h.send(Method::GET, &uri, Some(other.as_str()), None).await.0, StatusCode::NOT_FOUND);
    assert_eq!(h.send(Method::GET, &uri, Some(h.admin.as_str()), None).await.0, StatusCode::OK);

    let (_, mine) = h.send(Method::GET, "/api/v1/orders", Some(h.customer.as_str()), None).await;
    assert_eq!(mine["orders"].as_array().unwrap().len(), 1);
    let (_, theirs) = h.send(Method::GET, "/api/v1/orders", Some(other.as_str()), None).await;
    assert!(theirs["orders"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_register_login_and_me() {
    let h = Harness::new().await;
    let body = json!({ "email": "Cleo@Shop.test", "name": "Cleo", "password": "long-enough" });
    let (status, created) = h.send(Method::POST, "/api/v1/auth/register", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["user"]["email"], "cleo@shop.test");
    assert_eq!(created["user"]["role"], "CUSTOMER");
    assert!(created["user"].get("passwordHash").is_none());

    let (status, _) = h.send(Method::POST, "/api/v1/auth/register", None, Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let short = json!({ "email": "dee@shop.test", "name": "Dee", "password": "short" });
    assert_eq!(h.send(Method::POST, "/api/v1/auth/register", None, Some(short)).await.0, StatusCode::BAD_REQUEST);

    let login = json!({ "email": "cleo@shop.test", "password": "long-enough" });
    let (status, session) = h.send(Method::POST, "/api/v1/auth/login", None, Some(login)).await;
    assert_eq!(status, StatusCode::OK);
    let token = session["token"].as_str().unwrap();
    let (status, me) = h.send(Method::GET, "/api/v1/auth/me", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["name"], "Cleo");

    let wrong = json!({ "email": "cleo@shop.test", "password": "not-the-one" });
    let (status, wrong_body) = h.send(Method::POST, "/api/v1/auth/login", None, Some(wrong)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let unknown = json!({ "email": "nobody@shop.test", "password": "not-the-one" });
    let (status, unknown_body) = h.send(Method::POST, "/api/v1/auth/login", None, Some(unknown)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body["error"], unknown_body["error"]);
}

#[tokio::test]
async fn test_seeded_password_login() {
    let h = Harness::new().await;
    let hash = hash_password("admin-password").unwrap();
    h.store.create_user(NewUser::new("ops@shop.test", "Ops", hash, Role::Admin)).await.unwrap();
    let login = json!({ "email": "OPS@shop.test", "password": "admin-password" });
    let (status, body) = h.send(Method::POST, "/api/v1/auth/login", None, Some(login)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "ADMIN");
}

#[tokio::test]
async fn test_cart_stock_check_is_advisory() {
    let h = Harness::new().await;
    let p = h.product("Tee", 15, 3).await;
    let token = Some(h.customer.as_str());

    let (status, body) = h.send(Method::POST, "/api/v1/cart", token, Some(json!({ "productId": p.id, "quantity": 2, "color": "white" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["item"]["quantity"], 2);

    let (status, body) = h.send(Method::POST, "/api/v1/cart", token, Some(json!({ "productId": p.id, "quantity": 2, "color": "white" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["warning"], "Only 3 of Tee left in stock");
    assert_eq!(body["available"], 3);
    assert_eq!(body["requested"], 4);

    let (_, cart) = h.send(Method::GET, "/api/v1/cart", token, None).await;
    assert_eq!(cart["items"][0]["quantity"], 2);
    assert_eq!(cart["subtotal"], "30.00");

    let (status, body) = h.send(Method::POST, "/api/v1/cart/check", token, Some(json!({ "productId": p.id, "quantity": 1, "color": "white" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));
    let (_, body) = h.send(Method::POST, "/api/v1/cart/check", token, Some(json!({ "productId": p.id, "quantity": 1, "inCart": 3 }))).await;
    assert_eq!(body["available"], 3);

    let item_id = cart["items"][0]["id"].as_str().unwrap().to_string();
    let (status, body) = h.send(Method::PUT, &format!("/api/v1/cart/{item_id}"), token, Some(json!({ "quantity": 1 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["item"]["quantity"], 1);
    let (status, _) = h.send(Method::PUT, &format!("/api/v1/cart/{item_id}"), token, Some(json!({ "quantity": 0 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let sold_out = h.product("Cap", 10, 0).await;
    let (status, body) = h.send(Method::POST, "/api/v1/cart", token, Some(json!({ "productId": sold_out.id, "quantity": 1 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cap is out of stock");
    assert_eq!(body["details"]["available"], 0);

    let (status, _) = h.send(Method::DELETE, &format!("/api/v1/cart/{item_id}"), token, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, cart) = h.send(Method::GET, "/api/v1/cart", token, None).await;
    assert!(cart["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_placing_an_order_clears_the_cart() {
    let h = Harness::new().await;
    let p = h.product("Hoodie", 45, 8).await;
    let token = Some(h.customer.as_str());
    h.send(Method::POST, "/api/v1/cart", token, Some(json!({ "productId": p.id, "quantity": 1 }))).await;
    h.place_order(json!([{ "productId": p.id, "quantity": 1 }])).await;
    let (_, cart) = h.send(Method::GET, "/api/v1/cart", token, None).await;
    assert!(cart["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_wishlist_toggle() {
    let h = Harness::new().await;
    let p = h.product("Raincoat", 90, 2).await;
    let token = Some(h.customer.as_str());

    let (_, body) = h.send(Method::POST, "/api/v1/wishlist", token, Some(json!({ "productId": p.id }))).await;
    assert_eq!(body["wishlisted"], true);
    let (_, list) = h.send(Method::GET, "/api/v1/wishlist", token, None).await;
    assert_eq!(list[0]["name"], "Raincoat");
    let (_, body) = h.send(Method::POST, "/api/v1/wishlist", token, Some(json!({ "productId": p.id }))).await;
    assert_eq!(body["wishlisted"], false);

    let (status, _) = h.send(Method::DELETE, &format!("/api/v1/wishlist/{}", p.id), token, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = h.send(Method::POST, "/api/v1/wishlist", token, Some(json!({ "productId": Uuid::now_v7() }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_catalog_admin_and_reviews() {
    let h = Harness::new().await;
    let (status, category) = h
        .send(Method::POST, "/api/v1/categories", Some(h.admin.as_str()), Some(json!({ "name": "T-Shirts & Tops" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(category["slug"], "t-shirts-tops");
    let (status, _) = h.send(Method::POST, "/api/v1/categories", Some(h.admin.as_str()), Some(json!({ "name": "t-shirts tops" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let new_product = json!({ "name": "Polo", "price": "35.50", "stock": 4, "categoryId": category["id"], "colors": ["navy", " navy"] });
    let (status, _) = h.send(Method::POST, "/api/v1/products", Some(h.customer.as_str()), Some(new_product.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, product) = h.send(Method::POST, "/api/v1/products", Some(h.admin.as_str()), Some(new_product)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(product["price"], "35.50");
    assert_eq!(product["colors"], json!(["navy"]));
    let id = product["id"].as_str().unwrap().to_string();

    let (status, _) = h.send(Method::POST, "/api/v1/products", Some(h.admin.as_str()), Some(json!({ "name": "Bad", "price": "-1" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, updated) = h.send(Method::PUT, &format!("/api/v1/products/{id}"), Some(h.admin.as_str()), Some(json!({ "featured": true }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["featured"], true);
    let (_, page) = h.send(Method::GET, "/api/v1/products?featured=true&search=pol", None, None).await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["perPage"], 20);

    let reviews = format!("/api/v1/products/{id}/reviews");
    let (status, review) = h.send(Method::POST, &reviews, Some(h.customer.as_str()), Some(json!({ "rating": 5, "comment": "Fits well" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(review["authorName"], "Ana");
    let (status, _) = h.send(Method::POST, &reviews, Some(h.customer.as_str()), Some(json!({ "rating": 4 }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = h.send(Method::POST, &reviews, Some(h.admin.as_str()), Some(json!({ "rating": 6 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = h.send(Method::DELETE, &format!("/api/v1/products/{id}"), Some(h.admin.as_str()), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = h.send(Method::GET, &format!("/api/v1/products/{id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_dashboard_and_order_listing() {
    let h = Harness::new().await;
    let p = h.product("Jeans", 70, 6).await;
    let delivered = h.place_order(json!([{ "productId": p.id, "quantity": 2 }])).await;
    let cancelled = h.place_order(json!([{ "productId": p.id, "quantity": 1 }])).await;
    h.set_status(delivered["id"].as_str().unwrap(), "DELIVERED").await;
    h.set_status(cancelled["id"].as_str().unwrap(), "CANCELLED").await;

    let (status, dash) = h.send(Method::GET, "/api/v1/admin/dashboard?days=7&lowStock=4", Some(h.admin.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dash["revenue"], "140.00");
    assert_eq!(dash["orderCount"], 2);
    assert_eq!(dash["customerCount"], 1);
    assert_eq!(dash["ordersByStatus"]["DELIVERED"], 1);
    assert_eq!(dash["ordersByStatus"]["PENDING"], 0);
    assert_eq!(dash["topProducts"][0]["units"], 2);
    assert_eq!(dash["lowStock"][0]["stock"], 4);
    assert_eq!(dash["dailyRevenue"].as_array().unwrap().len(), 7);

    let (status, _) = h.send(Method::GET, "/api/v1/admin/dashboard?days=0", Some(h.admin.as_str()), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, page) = h.send(Method::GET, "/api/v1/admin/orders?status=CANCELLED", Some(h.admin.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["data"][0]["id"], cancelled["id"]);

    let (status, page) = h.send(Method::GET, "/api/v1/admin/orders?status=%20delivered", Some(h.admin.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["data"][0]["id"], delivered["id"]);

    let (status, _) = h.send(Method::GET, "/api/v1/admin/orders?status=lost", Some(h.admin.as_str()), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
