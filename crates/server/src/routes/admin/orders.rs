//! Console order operations: fulfillment, returns, refund reconciliation.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use clove_core::{OrderId, OrderStatus, RefundStatus};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::auth::RequireAdmin;
use crate::models::Order;
use crate::routes::orders::OrderResponse;
use crate::routes::require_write;
use crate::services::checkout::CheckoutService;
use crate::state::AppState;

/// Query string for the order list.
#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    /// Restrict to one fulfillment status.
    pub status: Option<OrderStatus>,
}

/// Request to mark an order shipped.
#[derive(Debug, Deserialize)]
pub struct ShipOrderRequest {
    pub tracking_id: String,
}

async fn load_order(state: &AppState, order_id: OrderId) -> Result<Order> {
    OrderRepository::new(state.pool())
        .get_by_id(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))
}

/// `GET /admin/orders` - every order, newest first, optionally filtered by
/// fulfillment status (`?status=processing`).
///
/// # Errors
///
/// Returns 500 on database failure.
pub async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<Vec<OrderResponse>>> {
    let orders = OrderRepository::new(state.pool())
        .list_all(query.status)
        .await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// `GET /admin/orders/{id}` - any order, regardless of owner.
///
/// # Errors
///
/// Returns 404 for an unknown order.
pub async fn get(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
) -> Result<Json<OrderResponse>> {
    let order = load_order(&state, order_id).await?;
    Ok(Json(order.into()))
}

/// `POST /admin/orders/{id}/ship` - mark a processing order shipped.
///
/// # Errors
///
/// Returns 409 unless the order is `processing`, 400 for a blank tracking
/// reference.
pub async fn ship(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
    Json(body): Json<ShipOrderRequest>,
) -> Result<Json<OrderResponse>> {
    require_write(&admin)?;

    let tracking_id = body.tracking_id.trim();
    if tracking_id.is_empty() {
        return Err(AppError::BadRequest("a tracking id is required".to_owned()));
    }

    let order = load_order(&state, order_id).await?;
    let checkout = CheckoutService::new(state.pool(), state.payments());
    let order = checkout.ship(order, tracking_id).await?;
    Ok(Json(order.into()))
}

/// `POST /admin/orders/{id}/deliver` - mark a shipped order delivered.
///
/// Settles the payment for cash-on-delivery orders.
///
/// # Errors
///
/// Returns 409 unless the order is `shipped`.
pub async fn deliver(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
) -> Result<Json<OrderResponse>> {
    require_write(&admin)?;

    let order = load_order(&state, order_id).await?;
    let checkout = CheckoutService::new(state.pool(), state.payments());
    let order = checkout.deliver(order).await?;
    Ok(Json(order.into()))
}

/// `POST /admin/orders/{id}/cancel` - cancel an order on the customer's
/// behalf.
///
/// # Errors
///
/// Returns 409 once the order has shipped.
pub async fn cancel(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
    Json(body): Json<crate::routes::orders::CancelOrderRequest>,
) -> Result<Json<OrderResponse>> {
    require_write(&admin)?;

    let reason = body.reason.trim();
    if reason.is_empty() {
        return Err(AppError::BadRequest(
            "a cancellation reason is required".to_owned(),
        ));
    }

    let order = load_order(&state, order_id).await?;
    let checkout = CheckoutService::new(state.pool(), state.payments());
    let order = checkout.cancel(order, reason).await?;
    Ok(Json(order.into()))
}

/// `POST /admin/orders/{id}/return/approve` - approve a requested return.
///
/// A settled payment moves the refund to `initiated`.
///
/// # Errors
///
/// Returns 409 unless a return is currently `requested`.
pub async fn approve_return(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
) -> Result<Json<OrderResponse>> {
    require_write(&admin)?;

    let order = load_order(&state, order_id).await?;
    let checkout = CheckoutService::new(state.pool(), state.payments());
    let order = checkout.approve_return(order).await?;
    Ok(Json(order.into()))
}

/// `POST /admin/orders/{id}/return/reject` - reject a requested return.
///
/// # Errors
///
/// Returns 409 unless a return is currently `requested`.
pub async fn reject_return(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
) -> Result<Json<OrderResponse>> {
    require_write(&admin)?;

    let order = load_order(&state, order_id).await?;
    let checkout = CheckoutService::new(state.pool(), state.payments());
    let order = checkout.reject_return(order).await?;
    Ok(Json(order.into()))
}

/// `POST /admin/orders/{id}/refund/complete` - record an initiated refund as
/// paid out.
///
/// # Errors
///
/// Returns 409 unless the refund is `initiated`.
pub async fn complete_refund(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
) -> Result<Json<OrderResponse>> {
    require_write(&admin)?;

    let order = load_order(&state, order_id).await?;
    let checkout = CheckoutService::new(state.pool(), state.payments());
    let order = checkout.set_refund(order, RefundStatus::Completed).await?;
    Ok(Json(order.into()))
}

/// `POST /admin/orders/{id}/refund/fail` - record an initiated refund as
/// failed.
///
/// # Errors
///
/// Returns 409 unless the refund is `initiated`.
pub async fn fail_refund(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
) -> Result<Json<OrderResponse>> {
    require_write(&admin)?;

    let order = load_order(&state, order_id).await?;
    let checkout = CheckoutService::new(state.pool(), state.payments());
    let order = checkout.set_refund(order, RefundStatus::Failed).await?;
    Ok(Json(order.into()))
}

/// `POST /admin/orders/{id}/refund/retry` - put a failed refund back into
/// `initiated` for another attempt.
///
/// # Errors
///
/// Returns 409 unless the refund is `failed`.
pub async fn retry_refund(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
) -> Result<Json<OrderResponse>> {
    require_write(&admin)?;

    let order = load_order(&state, order_id).await?;
    let checkout = CheckoutService::new(state.pool(), state.payments());
    let order = checkout.set_refund(order, RefundStatus::Initiated).await?;
    Ok(Json(order.into()))
}
