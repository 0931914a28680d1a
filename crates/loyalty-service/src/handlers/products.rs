//! Product catalog handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use loyalty_core::{Product, ProductId};

use crate::auth::{AdminAuth, AuthUser};
use crate::error::ApiError;
use crate::state::AppState;

/// Product creation request.
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    /// Display name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Price in cents.
    pub price_cents: i64,
    /// Stock-keeping unit.
    pub sku: String,
    /// Initial stock quantity.
    pub stock_quantity: u32,
    /// Category name.
    #[serde(default)]
    pub category: String,
}

/// Product update request.
#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    /// Display name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Price in cents.
    pub price_cents: i64,
    /// Stock-keeping unit.
    pub sku: String,
    /// Category name.
    #[serde(default)]
    pub category: String,
}

/// Stock update request.
#[derive(Debug, Deserialize)]
pub struct SetStockRequest {
    /// New stock quantity. Availability follows the quantity.
    pub quantity: u32,
}

/// Stock query response.
#[derive(Debug, Serialize)]
pub struct StockResponse {
    /// The product id.
    pub product_id: String,
    /// Units currently in stock.
    pub stock_quantity: u32,
    /// Whether the product can be ordered.
    pub is_available: bool,
}

/// Product listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    /// Restrict to products in this category.
    pub category: Option<String>,
    /// Case-insensitive name/description search term.
    pub search: Option<String>,
}

/// Low-stock listing query parameters.
#[derive(Debug, Deserialize)]
pub struct LowStockQuery {
    /// Stock threshold; defaults to the configured value.
    pub threshold: Option<u32>,
}

/// List products, optionally filtered by category or search term.
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = match (query.category, query.search) {
        (Some(category), _) => state.products.list_by_category(&category)?,
        (None, Some(term)) => state.products.search(&term)?,
        (None, None) => state.products.list()?,
    };
    Ok(Json(products))
}

/// List products with stock at or below the threshold (admin).
pub async fn list_low_stock(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    Query(query): Query<LowStockQuery>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let threshold = query.threshold.unwrap_or(state.config.low_stock_threshold);
    Ok(Json(state.products.low_stock(threshold)?))
}

/// Get a product by id.
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Product>, ApiError> {
    let product = state
        .products
        .get(&product_id)?
        .ok_or_else(|| ApiError::NotFound(format!("product not found: {product_id}")))?;
    Ok(Json(product))
}

/// Get a product's stock level.
pub async fn get_stock(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(product_id): Path<ProductId>,
) -> Result<Json<StockResponse>, ApiError> {
    let product = state
        .products
        .get(&product_id)?
        .ok_or_else(|| ApiError::NotFound(format!("product not found: {product_id}")))?;

    Ok(Json(StockResponse {
        product_id: product_id.to_string(),
        stock_quantity: product.stock_quantity,
        is_available: product.is_available,
    }))
}

/// Add a product to the catalog (admin).
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Json(body): Json<CreateProductRequest>,
) -> Result<Json<Product>, ApiError> {
    let product = state.products.create(
        &body.name,
        &body.description,
        body.price_cents,
        &body.sku,
        body.stock_quantity,
        &body.category,
    )?;

    tracing::info!(product_id = %product.id, admin_id = %admin.admin_id, "Product created by admin");
    Ok(Json(product))
}

/// Update a product (admin). Stock stays as stored; use the stock endpoint
/// to change it.
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    Path(product_id): Path<ProductId>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<Json<Product>, ApiError> {
    let mut product = state
        .products
        .get(&product_id)?
        .ok_or_else(|| ApiError::NotFound(format!("product not found: {product_id}")))?;

    product.name = body.name;
    product.description = body.description;
    product.price_cents = body.price_cents;
    product.sku = body.sku;
    product.category = body.category;

    let updated = state
        .products
        .update(product)?
        .ok_or_else(|| ApiError::NotFound(format!("product not found: {product_id}")))?;
    Ok(Json(updated))
}

/// Delete a product (admin).
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Path(product_id): Path<ProductId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.products.delete(&product_id)? {
        return Err(ApiError::NotFound(format!("product not found: {product_id}")));
    }
    tracing::info!(product_id = %product_id, admin_id = %admin.admin_id, "Product deleted by admin");
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Set a product's stock level (admin).
pub async fn set_stock(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    Path(product_id): Path<ProductId>,
    Json(body): Json<SetStockRequest>,
) -> Result<Json<StockResponse>, ApiError> {
    if !state.products.set_stock(&product_id, body.quantity)? {
        return Err(ApiError::NotFound(format!("product not found: {product_id}")));
    }

    Ok(Json(StockResponse {
        product_id: product_id.to_string(),
        stock_quantity: body.quantity,
        is_available: body.quantity > 0,
    }))
}
