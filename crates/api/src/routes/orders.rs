//! Order route handlers.
//!
//! Creating an order consumes the caller's cart: the order insert and the
//! cart delete commit together, so a subsequent cart read returns an empty
//! cart, never the pre-order one.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use cedarmarket_core::{OrderId, OrderStatus, PaymentMethod};

use crate::db::{CartRepository, OrderRepository};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::{Address, Order};
use crate::routes::{CountResponse, MessageResponse};
use crate::state::AppState;

/// Create-order payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub address: Address,
    pub payment_method: PaymentMethod,
}

/// Response wrapping a single order.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub order: Order,
}

/// Response wrapping an order list.
#[derive(Debug, Serialize)]
pub struct OrdersResponse {
    pub orders: Vec<Order>,
}

/// Response for order mutations: a human message plus the order.
#[derive(Debug, Serialize)]
pub struct OrderWithMessage {
    pub message: String,
    pub order: Order,
}

/// Status-transition payload.
#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

/// Place an order from the caller's current cart.
#[instrument(skip(state, body))]
pub async fn create(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderWithMessage>)> {
    let cart = CartRepository::new(state.pool())
        .get_by_user(auth.id)
        .await?
        .filter(|cart| !cart.is_empty())
        .ok_or_else(|| AppError::BadRequest("Cart is empty".to_owned()))?;

    let cart_id = cart.id;
    let order = Order::from_cart(Some(auth.id), cart, body.address, body.payment_method);

    OrderRepository::new(state.pool())
        .insert_consuming_cart(&order, cart_id)
        .await?;

    tracing::info!(order = %order.id, user = %auth.id, "order created, cart consumed");

    Ok((
        StatusCode::CREATED,
        Json(OrderWithMessage {
            message: "Order created successfully".to_owned(),
            order,
        }),
    ))
}

/// Every order, newest first (admin).
#[instrument(skip(state))]
pub async fn list_all(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<OrdersResponse>> {
    let orders = OrderRepository::new(state.pool()).list_all().await?;
    Ok(Json(OrdersResponse { orders }))
}

/// The caller's orders, newest first.
#[instrument(skip(state))]
pub async fn my_orders(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<OrdersResponse>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(auth.id)
        .await?;
    Ok(Json(OrdersResponse { orders }))
}

/// One order; accessible to its owner and to admins.
#[instrument(skip(state))]
pub async fn get_by_id(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderResponse>> {
    let order = OrderRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_owned()))?;

    let is_owner = order.user_id == Some(auth.id);
    if !auth.is_admin && !is_owner {
        return Err(AppError::Forbidden(
            "Not authorized to access this order".to_owned(),
        ));
    }

    Ok(Json(OrderResponse { order }))
}

/// Move an order to a new status (admin), settling payment where the
/// transition calls for it.
#[instrument(skip(state))]
pub async fn update_status(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(body): Json<UpdateOrderStatusRequest>,
) -> Result<Json<OrderWithMessage>> {
    let repo = OrderRepository::new(state.pool());

    let mut order = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_owned()))?;

    order.transition_to(body.status);
    repo.update_status(&order).await?;

    Ok(Json(OrderWithMessage {
        message: "Order updated successfully".to_owned(),
        order,
    }))
}

/// Delete an order (admin).
#[instrument(skip(state))]
pub async fn delete(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<MessageResponse>> {
    let deleted = OrderRepository::new(state.pool()).delete(id).await?;
    if !deleted {
        return Err(AppError::NotFound("Order not found".to_owned()));
    }

    Ok(Json(MessageResponse::new("Order deleted successfully")))
}

/// Total order count (admin).
#[instrument(skip(state))]
pub async fn count(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<CountResponse>> {
    let count = OrderRepository::new(state.pool()).count().await?;
    Ok(Json(CountResponse { count }))
}
