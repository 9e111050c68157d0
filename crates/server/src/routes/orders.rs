//! Customer order handlers: history, detail, payment re-verification,
//! cancellation, returns.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use clove_core::{
    CurrencyCode, OrderId, OrderStatus, PaymentMethod, PaymentStatus, ProductId, RefundStatus,
    ReturnStatus, UserId, VariantId,
};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::auth::RequireUser;
use crate::models::{Address, Order, OrderItem};
use crate::services::checkout::CheckoutService;
use crate::state::AppState;

/// An order, as returned by the API.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub user_id: UserId,
    pub transaction_id: Option<String>,
    pub payment_method: PaymentMethod,
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub coupon_code: Option<String>,
    pub discount_amount: Decimal,
    pub shipping_address: Address,
    pub billing_address: Option<Address>,
    pub payment_status: PaymentStatus,
    pub payment_failure_reason: Option<String>,
    pub order_status: OrderStatus,
    pub cancellation_reason: Option<String>,
    pub tracking_id: Option<String>,
    pub return_status: ReturnStatus,
    pub refund_status: RefundStatus,
    pub placed_at: DateTime<Utc>,
    pub payment_completed_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub items: Vec<OrderItemResponse>,
}

/// One order line, as returned by the API.
#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            product_id: item.product_id,
            variant_id: item.variant_id,
            product_name: item.product_name,
            unit_price: item.unit_price,
            quantity: item.quantity,
        }
    }
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            transaction_id: order.transaction_id,
            payment_method: order.payment_method,
            amount: order.amount,
            currency: order.currency,
            coupon_code: order.coupon_code,
            discount_amount: order.discount_amount,
            shipping_address: order.shipping_address,
            billing_address: order.billing_address,
            payment_status: order.payment_status,
            payment_failure_reason: order.payment_failure_reason,
            order_status: order.order_status,
            cancellation_reason: order.cancellation_reason,
            tracking_id: order.tracking_id,
            return_status: order.return_status,
            refund_status: order.refund_status,
            placed_at: order.placed_at,
            payment_completed_at: order.payment_completed_at,
            delivered_at: order.delivered_at,
            items: order.items.into_iter().map(Into::into).collect(),
        }
    }
}

/// Request to cancel an order.
#[derive(Debug, Deserialize)]
pub struct CancelOrderRequest {
    pub reason: String,
}

/// Load an order and check it belongs to the caller.
pub(crate) async fn load_owned_order(
    state: &AppState,
    order_id: OrderId,
    user_id: UserId,
) -> Result<Order> {
    let order = OrderRepository::new(state.pool())
        .get_by_id(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;

    if order.user_id != user_id {
        // Hide other users' orders entirely
        return Err(AppError::NotFound(format!("order {order_id}")));
    }
    Ok(order)
}

/// `GET /orders` - the caller's order history, newest first.
///
/// # Errors
///
/// Returns 500 on database failure.
pub async fn list(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderResponse>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// `GET /orders/{id}`.
///
/// # Errors
///
/// Returns 404 for an unknown order or one that belongs to someone else.
pub async fn get(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
) -> Result<Json<OrderResponse>> {
    let order = load_owned_order(&state, order_id, user.id).await?;
    Ok(Json(order.into()))
}

/// `POST /orders/{id}/pay/verify` - re-run gateway verification for a
/// pending or failed payment.
///
/// # Errors
///
/// Returns 400 for COD orders, 502 for gateway failures.
pub async fn verify_payment(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
) -> Result<Json<OrderResponse>> {
    let order = load_owned_order(&state, order_id, user.id).await?;
    let checkout = CheckoutService::new(state.pool(), state.payments());
    let order = checkout.verify_payment(order).await?;
    Ok(Json(order.into()))
}

/// `POST /orders/{id}/cancel` - cancel an order that has not shipped.
///
/// # Errors
///
/// Returns 409 once the order has shipped, been delivered, or is already
/// cancelled.
pub async fn cancel(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
    Json(body): Json<CancelOrderRequest>,
) -> Result<Json<OrderResponse>> {
    let reason = body.reason.trim();
    if reason.is_empty() {
        return Err(AppError::BadRequest(
            "a cancellation reason is required".to_owned(),
        ));
    }

    let order = load_owned_order(&state, order_id, user.id).await?;
    let checkout = CheckoutService::new(state.pool(), state.payments());
    let order = checkout.cancel(order, reason).await?;
    Ok(Json(order.into()))
}

/// `POST /orders/{id}/return` - request a return for a delivered order.
///
/// # Errors
///
/// Returns 409 if the order is not delivered or a return was already
/// requested.
pub async fn request_return(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
) -> Result<Json<OrderResponse>> {
    let order = load_owned_order(&state, order_id, user.id).await?;
    let checkout = CheckoutService::new(state.pool(), state.payments());
    let order = checkout.request_return(order).await?;
    Ok(Json(order.into()))
}
