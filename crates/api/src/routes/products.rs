//! Product route handlers.
//!
//! Reads go through the catalog cache; every successful mutation
//! invalidates the whole catalog namespace before responding, so the next
//! read observes the write.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use cedarmarket_core::ProductId;

use crate::cache::{CachedValue, key, ttl};
use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::product::ListProductsParams;
use crate::models::{NewProduct, Product, ProductPage, ProductPatch, ProductQuery, ProductStats};
use crate::routes::{CountResponse, MessageResponse};
use crate::state::AppState;

/// Create product payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub price: Decimal,
    pub description: String,
    pub image: String,
    pub stock: Option<i32>,
    pub category: String,
    pub brand: Option<String>,
}

impl CreateProductRequest {
    /// Validate required fields and numeric bounds.
    fn validate(&self) -> std::result::Result<(), String> {
        let required = [&self.name, &self.description, &self.image, &self.category];
        if required.iter().any(|field| field.trim().is_empty()) {
            return Err(
                "Name, price, description, image, and category are required".to_owned(),
            );
        }

        if self.price <= Decimal::ZERO {
            return Err("Price must be greater than 0".to_owned());
        }

        if self.stock.unwrap_or(0) < 0 {
            return Err("Stock cannot be negative".to_owned());
        }

        Ok(())
    }
}

/// Partial update payload.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub stock: Option<i32>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateProductRequest {
    /// Validate numeric bounds on whichever fields are present.
    fn validate(&self) -> std::result::Result<(), String> {
        if matches!(self.price, Some(price) if price <= Decimal::ZERO) {
            return Err("Price must be greater than 0".to_owned());
        }

        if matches!(self.stock, Some(stock) if stock < 0) {
            return Err("Stock cannot be negative".to_owned());
        }

        Ok(())
    }
}

impl From<UpdateProductRequest> for ProductPatch {
    fn from(body: UpdateProductRequest) -> Self {
        Self {
            name: body.name,
            price: body.price,
            description: body.description,
            image: body.image,
            stock: body.stock,
            category: body.category,
            brand: body.brand,
            is_active: body.is_active,
        }
    }
}

/// Filtered, paginated product listing (cached).
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListProductsParams>,
) -> Result<Json<ProductPage>> {
    let query = ProductQuery::from(params);
    let cache_key = key::products_list(&query);

    if let Some(CachedValue::Page(page)) = state.catalog_cache().get(&cache_key) {
        tracing::debug!(key = %cache_key, "product list served from cache");
        return Ok(Json(page));
    }

    let page = ProductRepository::new(state.pool()).list(&query).await?;
    state
        .catalog_cache()
        .set(cache_key, CachedValue::Page(page.clone()), ttl::LIST);

    Ok(Json(page))
}

/// Single product read (cached).
#[instrument(skip(state))]
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    let cache_key = key::product_detail(id);

    if let Some(CachedValue::Product(product)) = state.catalog_cache().get(&cache_key) {
        tracing::debug!(key = %cache_key, "product detail served from cache");
        return Ok(Json(*product));
    }

    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))?;

    state.catalog_cache().set(
        cache_key,
        CachedValue::Product(Box::new(product.clone())),
        ttl::DETAIL,
    );

    Ok(Json(product))
}

/// Create a product (admin).
#[instrument(skip(state, body))]
pub async fn create(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(body): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    body.validate().map_err(AppError::BadRequest)?;

    let product = ProductRepository::new(state.pool())
        .insert(NewProduct {
            name: body.name,
            price: body.price,
            description: body.description,
            image: body.image,
            stock: body.stock.unwrap_or(0),
            category: body.category,
            brand: body.brand.unwrap_or_default(),
        })
        .await?;

    let invalidated = state.catalog_cache().invalidate_catalog();
    tracing::debug!(invalidated, "catalog cache cleared after product create");

    Ok((StatusCode::CREATED, Json(product)))
}

/// Partially update a product (admin).
#[instrument(skip(state, body))]
pub async fn update(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<Json<Product>> {
    body.validate().map_err(AppError::BadRequest)?;

    let product = ProductRepository::new(state.pool())
        .update(id, body.into())
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))?;

    let invalidated = state.catalog_cache().invalidate_catalog();
    tracing::debug!(invalidated, "catalog cache cleared after product update");

    Ok(Json(product))
}

/// Soft-delete a product (admin).
#[instrument(skip(state))]
pub async fn soft_delete(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<MessageResponse>> {
    let deleted = ProductRepository::new(state.pool()).soft_delete(id).await?;
    if !deleted {
        return Err(AppError::NotFound("Product not found".to_owned()));
    }

    let invalidated = state.catalog_cache().invalidate_catalog();
    tracing::debug!(invalidated, "catalog cache cleared after product delete");

    Ok(Json(MessageResponse::new("Product deleted successfully")))
}

/// Permanently delete a product (admin).
#[instrument(skip(state))]
pub async fn hard_delete(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<MessageResponse>> {
    let deleted = ProductRepository::new(state.pool()).hard_delete(id).await?;
    if !deleted {
        return Err(AppError::NotFound("Product not found".to_owned()));
    }

    let invalidated = state.catalog_cache().invalidate_catalog();
    tracing::debug!(invalidated, "catalog cache cleared after product hard delete");

    Ok(Json(MessageResponse::new("Product permanently deleted")))
}

/// Distinct categories of active products (cached).
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    let cache_key = key::categories_list();

    if let Some(CachedValue::Categories(categories)) = state.catalog_cache().get(&cache_key) {
        return Ok(Json(categories));
    }

    let categories = ProductRepository::new(state.pool()).categories().await?;
    state.catalog_cache().set(
        cache_key,
        CachedValue::Categories(categories.clone()),
        ttl::CATEGORIES,
    );

    Ok(Json(categories))
}

/// Aggregate catalog statistics (admin, cached).
#[instrument(skip(state))]
pub async fn stats(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<ProductStats>> {
    let cache_key = key::product_stats();

    if let Some(CachedValue::Stats(stats)) = state.catalog_cache().get(&cache_key) {
        return Ok(Json(stats));
    }

    let stats = ProductRepository::new(state.pool()).stats().await?;
    state
        .catalog_cache()
        .set(cache_key, CachedValue::Stats(stats.clone()), ttl::STATS);

    Ok(Json(stats))
}

/// Total product count (admin).
#[instrument(skip(state))]
pub async fn count(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<CountResponse>> {
    let cache_key = key::products_count();

    if let Some(CachedValue::Count(count)) = state.catalog_cache().get(&cache_key) {
        return Ok(Json(CountResponse { count }));
    }

    let count = ProductRepository::new(state.pool()).count().await?;
    state
        .catalog_cache()
        .set(cache_key, CachedValue::Count(count), ttl::COUNT);

    Ok(Json(CountResponse { count }))
}

/// Cache counters (admin).
#[instrument(skip(state))]
pub async fn cache_stats(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Json<crate::cache::CacheStats> {
    Json(state.catalog_cache().stats())
}

/// Coarse catalog cache invalidation (admin).
#[instrument(skip(state))]
pub async fn cache_clear(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Json<MessageResponse> {
    let invalidated = state.catalog_cache().invalidate_catalog();
    tracing::info!(invalidated, "catalog cache cleared by admin");

    Json(MessageResponse::new("Product cache cleared successfully"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_create() -> CreateProductRequest {
        CreateProductRequest {
            name: "Cedar Soap".to_owned(),
            price: Decimal::new(450, 2),
            description: "Hand-made".to_owned(),
            image: "/uploads/soap.jpg".to_owned(),
            stock: Some(12),
            category: "soap".to_owned(),
            brand: None,
        }
    }

    #[test]
    fn test_create_validation_accepts_valid() {
        assert!(valid_create().validate().is_ok());
    }

    #[test]
    fn test_create_validation_requires_fields() {
        let mut body = valid_create();
        body.name = "  ".to_owned();
        assert!(body.validate().is_err());

        let mut body = valid_create();
        body.category = String::new();
        assert!(body.validate().is_err());
    }

    #[test]
    fn test_create_validation_rejects_non_positive_price() {
        let mut body = valid_create();
        body.price = Decimal::ZERO;
        assert_eq!(body.validate().unwrap_err(), "Price must be greater than 0");

        body.price = Decimal::new(-100, 2);
        assert!(body.validate().is_err());
    }

    #[test]
    fn test_create_validation_rejects_negative_stock() {
        let mut body = valid_create();
        body.stock = Some(-1);
        assert_eq!(body.validate().unwrap_err(), "Stock cannot be negative");
    }

    #[test]
    fn test_update_validation_only_checks_present_fields() {
        assert!(UpdateProductRequest::default().validate().is_ok());

        let body = UpdateProductRequest {
            price: Some(Decimal::ZERO),
            ..UpdateProductRequest::default()
        };
        assert!(body.validate().is_err());

        let body = UpdateProductRequest {
            stock: Some(-5),
            ..UpdateProductRequest::default()
        };
        assert!(body.validate().is_err());
    }
}
