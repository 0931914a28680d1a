//! Order lifecycle handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use loyalty_core::{Order, OrderId, OrderStatus};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::services::{NewOrder, OrderLine};
use crate::state::AppState;

/// Checkout request. The ordering member comes from the bearer token.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    /// Requested lines.
    pub items: Vec<OrderLine>,
    /// Points to convert into a discount, if any.
    pub points_to_use: Option<i64>,
    /// Shipping address override; falls back to the member's default.
    pub shipping_address: Option<String>,
    /// Billing address override; falls back to the member's default.
    pub billing_address: Option<String>,
}

/// Quote request: price lines against live product prices without placing
/// anything.
#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    /// Lines to price.
    pub items: Vec<OrderLine>,
}

/// Quote response.
#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    /// Sum of live price × quantity over known products, in cents.
    pub total_cents: i64,
    /// Points the total would earn if ordered at this price.
    pub points_earned: i64,
}

/// Status update request.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    /// Target fulfillment status.
    pub status: OrderStatus,
}

/// Payment completion request.
#[derive(Debug, Deserialize)]
pub struct ProcessPaymentRequest {
    /// External payment transaction id.
    pub transaction_id: String,
}

/// Order listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    /// Restrict to orders in this fulfillment status.
    pub status: Option<OrderStatus>,
}

/// Place an order for the authenticated member.
///
/// All lines are validated before anything mutates; a declined order (a
/// product is unknown, unavailable, or short on stock) leaves no side
/// effect.
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<CreateOrderRequest>,
) -> Result<Json<Order>, ApiError> {
    let placed = state.orders.create_order(NewOrder {
        member_id: auth.member_id,
        items: body.items,
        points_to_use: body.points_to_use,
        shipping_address: body.shipping_address,
        billing_address: body.billing_address,
    })?;

    placed.map(Json).ok_or_else(|| {
        ApiError::Conflict("a requested product is unknown or short on stock".into())
    })
}

/// List orders, optionally filtered by status.
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let orders = match query.status {
        Some(status) => state.orders.list_by_status(status)?,
        None => state.orders.list()?,
    };
    Ok(Json(orders))
}

/// List the authenticated member's orders, newest first.
pub async fn list_my_orders(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(state.orders.list_by_member(&auth.member_id)?))
}

/// Get an order by id.
pub async fn get_order(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(order_id): Path<OrderId>,
) -> Result<Json<Order>, ApiError> {
    let order = state
        .orders
        .get(&order_id)?
        .ok_or_else(|| ApiError::NotFound(format!("order not found: {order_id}")))?;
    Ok(Json(order))
}

/// Price lines against live product prices. Unknown product ids are
/// skipped rather than rejected.
pub async fn quote_order(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Json(body): Json<QuoteRequest>,
) -> Result<Json<QuoteResponse>, ApiError> {
    let total_cents = state.orders.calculate_order_total(&body.items)?;
    Ok(Json(QuoteResponse {
        total_cents,
        points_earned: crate::services::OrderService::calculate_points_earned(total_cents),
    }))
}

/// Move an order to a new fulfillment status.
///
/// Fulfillment moves strictly forward; a transition into Delivered credits
/// the member's earned points exactly once. `Cancelled` is not a valid
/// target here; cancellation goes through its own endpoint.
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(order_id): Path<OrderId>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, ApiError> {
    if state.orders.get(&order_id)?.is_none() {
        return Err(ApiError::NotFound(format!("order not found: {order_id}")));
    }
    if !state.orders.update_status(&order_id, body.status)? {
        return Err(ApiError::Conflict(format!(
            "illegal status transition to {:?}",
            body.status
        )));
    }

    let order = state
        .orders
        .get(&order_id)?
        .ok_or_else(|| ApiError::NotFound(format!("order not found: {order_id}")))?;
    Ok(Json(order))
}

/// Record a completed payment against an order.
pub async fn process_payment(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(order_id): Path<OrderId>,
    Json(body): Json<ProcessPaymentRequest>,
) -> Result<Json<Order>, ApiError> {
    if body.transaction_id.trim().is_empty() {
        return Err(ApiError::BadRequest("transaction_id must not be blank".into()));
    }
    if !state.orders.process_payment(&order_id, body.transaction_id.trim())? {
        return Err(ApiError::NotFound(format!("order not found: {order_id}")));
    }

    let order = state
        .orders
        .get(&order_id)?
        .ok_or_else(|| ApiError::NotFound(format!("order not found: {order_id}")))?;
    Ok(Json(order))
}

/// Cancel an order, restoring stock and refunding any points used.
///
/// Delivered and already-cancelled orders are rejected.
pub async fn cancel_order(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(order_id): Path<OrderId>,
) -> Result<Json<Order>, ApiError> {
    if state.orders.get(&order_id)?.is_none() {
        return Err(ApiError::NotFound(format!("order not found: {order_id}")));
    }
    if !state.orders.cancel_order(&order_id)? {
        return Err(ApiError::Conflict(
            "delivered or cancelled orders cannot be cancelled".into(),
        ));
    }

    let order = state
        .orders
        .get(&order_id)?
        .ok_or_else(|| ApiError::NotFound(format!("order not found: {order_id}")))?;
    Ok(Json(order))
}
