//! Typed HTTP client for the storefront API.

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::{ClientError, SessionSnapshot, StockChecker, StockVerdict};
use crate::domain::aggregates::{Order, ShippingDetails};
use crate::routes::{AuthResponse, OrderResponse, ToggleResponse};

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CheckBody {
    Warning { warning: String, available: u32 },
    Ok { ok: bool },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutLine {
    product_id: Uuid,
    quantity: u32,
    price: rust_decimal::Decimal,
    color: String,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<SecretString>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.into().trim_end_matches('/').to_string(), token: None }
    }

    pub fn with_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    pub fn is_signed_in(&self) -> bool {
        self.token.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{path}", self.base_url)
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder, ClientError> {
        let token = self.token.as_ref().ok_or(ClientError::NotSignedIn)?;
        Ok(req.bearer_auth(token.expose_secret()))
    }

    async fn parse_error(response: reqwest::Response) -> ClientError {
        let status = response.status().as_u16();
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => format!("HTTP {status}"),
        };
        ClientError::Api { status, message }
    }

    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        if response.status().is_success() {
            return Ok(response.json().await?);
        }
        Err(Self::parse_error(response).await)
    }

    /// Signs in and keeps the returned token for later calls.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let response = self.http.post(self.url("/auth/login")).json(&json!({ "email": email, "password": password })).send().await?;
        let auth: AuthResponse = Self::handle_response(response).await?;
        self.token = Some(SecretString::from(auth.token.clone()));
        Ok(auth)
    }

    pub async fn check_stock(&self, product_id: Uuid, color: &str, in_cart: u32, delta: u32) -> Result<StockVerdict, ClientError> {
        let body = json!({ "productId": product_id, "quantity": delta, "color": color, "inCart": in_cart });
        let response = self.authed(self.http.post(self.url("/cart/check")).json(&body))?.send().await?;
        match response.status() {
            StatusCode::OK => Ok(match response.json::<CheckBody>().await? {
                CheckBody::Warning { warning, available } => StockVerdict::Warning { message: warning, available },
                CheckBody::Ok { .. } => StockVerdict::Ok,
            }),
            StatusCode::BAD_REQUEST => {
                let body: ErrorBody = response.json().await?;
                Ok(StockVerdict::Rejected { message: body.error })
            }
            _ => Err(Self::parse_error(response).await),
        }
    }

    /// Mirrors a local wishlist toggle on the server.
    pub async fn toggle_wishlist(&self, product_id: Uuid) -> Result<bool, ClientError> {
        let req = self.http.post(self.url("/wishlist")).json(&json!({ "productId": product_id }));
        let response = self.authed(req)?.send().await?;
        let body: ToggleResponse = Self::handle_response(response).await?;
        Ok(body.wishlisted)
    }

    /// Submits the session cart as an order. The server prices it; the local
    /// prices travel along only for its logs.
    pub async fn place_order(&self, session: &SessionSnapshot, shipping: &ShippingDetails) -> Result<Order, ClientError> {
        let items: Vec<CheckoutLine> = session
            .cart
            .lines
            .iter()
            .map(|l| CheckoutLine { product_id: l.product_id, quantity: l.quantity, price: l.price.amount(), color: l.color.clone() })
            .collect();
        let body = json!({
            "items": items,
            "shippingName": shipping.name,
            "shippingPhone": shipping.phone,
            "shippingAddress": shipping.address,
        });
        let response = self.authed(self.http.post(self.url("/orders")).json(&body))?.send().await?;
        let created: OrderResponse = Self::handle_response(response).await?;
        Ok(created.order)
    }
}

#[async_trait]
impl StockChecker for ApiClient {
    async fn check(&self, product_id: Uuid, color: &str, in_cart: u32, delta: u32) -> Result<StockVerdict, ClientError> {
        self.check_stock(product_id, color, in_cart, delta).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_and_sign_in_state() {
        let client = ApiClient::new("http://localhost:8083/");
        assert_eq!(client.url("/cart/check"), "http://localhost:8083/api/v1/cart/check");
        assert!(!client.is_signed_in());
        assert!(matches!(client.authed(client.http.get(client.url("/cart"))), Err(ClientError::NotSignedIn)));
        assert!(client.with_token(SecretString::from("t".to_string())).is_signed_in());
    }

    #[test]
    fn test_check_body_shapes() {
        let ok: CheckBody = serde_json::from_str(r#"{"ok":true}"#).unwrap();
        assert!(matches!(ok, CheckBody::Ok { ok: true }));
        let warn: CheckBody = serde_json::from_str(r#"{"warning":"Only 2 left","available":2,"requested":3}"#).unwrap();
        assert!(matches!(warn, CheckBody::Warning { available: 2, .. }));
    }
}
