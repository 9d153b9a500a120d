//! Products, categories and reviews.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::{active_product, not_blank, ValidJson};
use crate::auth::{AdminUser, CurrentUser};
use crate::domain::aggregates::{Category, NewCategory, NewProduct, NewReview, Product, ProductPatch, Review};
use crate::domain::events::{DomainEvent, ProductEvent};
use crate::domain::value_objects::{Money, Quantity, Slug};
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::store::{Page, Paging, ProductQuery};

fn non_negative(value: &Decimal) -> std::result::Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("negative"));
    }
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub category: Option<Uuid>,
    pub featured: Option<bool>,
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

impl From<ListParams> for ProductQuery {
    fn from(p: ListParams) -> Self {
        Self {
            paging: Paging::new(p.page, p.per_page),
            category: p.category,
            featured: p.featured,
            search: p.search,
            min_price: p.min_price,
            max_price: p.max_price,
        }
    }
}

pub async fn list_products(State(s): State<AppState>, Query(p): Query<ListParams>) -> Result<Json<Page<Product>>> {
    Ok(Json(s.store.list_products(&p.into()).await?))
}

pub async fn get_product(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Product>> {
    Ok(Json(active_product(&s, id).await?))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 200), custom = "not_blank")]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub description: String,
    #[validate(custom = "non_negative")]
    pub price: Decimal,
    #[serde(default)]
    #[validate(range(max = 2147483647))]
    pub stock: u32,
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub featured: bool,
}

pub async fn create_product(
    State(s): State<AppState>,
    AdminUser(admin): AdminUser,
    ValidJson(r): ValidJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = s
        .store
        .create_product(NewProduct {
            name: r.name.trim().to_string(),
            description: r.description,
            price: Money::new(r.price),
            stock: Quantity::new(r.stock),
            category_id: r.category_id,
            images: r.images,
            colors: tidy(r.colors),
            featured: r.featured,
        })
        .await?;
    tracing::info!(product_id = %product.id, admin_id = %admin.id, stock = product.stock.value(), "Product created");
    s.events.publish(DomainEvent::Product(ProductEvent::Created { product_id: product.id })).await;
    Ok((StatusCode::CREATED, Json(product)))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 200), custom = "not_blank")]
    pub name: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(custom = "non_negative")]
    pub price: Option<Decimal>,
    #[validate(range(max = 2147483647))]
    pub stock: Option<u32>,
    pub category_id: Option<Uuid>,
    pub images: Option<Vec<String>>,
    pub colors: Option<Vec<String>>,
    pub featured: Option<bool>,
}

impl From<UpdateProductRequest> for ProductPatch {
    fn from(r: UpdateProductRequest) -> Self {
        Self {
            name: r.name.map(|n| n.trim().to_string()),
            description: r.description,
            price: r.price.map(Money::new),
            stock: r.stock.map(Quantity::new),
            category_id: r.category_id,
            images: r.images,
            colors: r.colors.map(tidy),
            featured: r.featured,
        }
    }
}

pub async fn update_product(
    State(s): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
    ValidJson(r): ValidJson<UpdateProductRequest>,
) -> Result<Json<Product>> {
    let product = s.store.update_product(id, r.into()).await?.ok_or(AppError::NotFound("Product"))?;
    Ok(Json(product))
}

/// Soft delete: the row stays so past orders keep their product reference.
pub async fn delete_product(State(s): State<AppState>, AdminUser(_): AdminUser, Path(id): Path<Uuid>) -> Result<StatusCode> {
    if !s.store.deactivate_product(id).await? {
        return Err(AppError::NotFound("Product"));
    }
    tracing::info!(product_id = %id, "Product deactivated");
    Ok(StatusCode::NO_CONTENT)
}

fn tidy(colors: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(colors.len());
    for c in colors.into_iter().map(|c| c.trim().to_string()).filter(|c| !c.is_empty()) {
        if !out.contains(&c) {
            out.push(c);
        }
    }
    out
}

pub async fn list_categories(State(s): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(s.store.list_categories().await?))
}

pub async fn get_category(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Category>> {
    s.store.get_category(id).await?.map(Json).ok_or(AppError::NotFound("Category"))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

pub async fn create_category(
    State(s): State<AppState>,
    AdminUser(_): AdminUser,
    ValidJson(r): ValidJson<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>)> {
    let slug = Slug::from_name(&r.name).map_err(|e| AppError::BadRequest(format!("Invalid category name: {e}")))?;
    let category = s
        .store
        .create_category(NewCategory { name: r.name.trim().to_string(), slug, description: r.description })
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn list_reviews(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Vec<Review>>> {
    let product = active_product(&s, id).await?;
    Ok(Json(s.store.list_reviews(product.id).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    #[validate(range(min = 1, max = 5))]
    pub rating: u8,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub comment: String,
}

pub async fn create_review(
    State(s): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    ValidJson(r): ValidJson<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Review>)> {
    let product = active_product(&s, id).await?;
    let review = s
        .store
        .create_review(NewReview { product_id: product.id, user_id: user.id, rating: r.rating, comment: r.comment.trim().to_string() })
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}
