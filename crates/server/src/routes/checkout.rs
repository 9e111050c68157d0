//! Checkout handler: turn the active cart into an order.

use axum::{Json, extract::State, http::StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;

use clove_core::{CurrencyCode, PaymentMethod};

use crate::error::Result;
use crate::middleware::auth::RequireUser;
use crate::models::Address;
use crate::routes::orders::OrderResponse;
use crate::services::checkout::{CheckoutService, PlaceOrder};
use crate::state::AppState;

/// Checkout request body.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub payment_method: PaymentMethod,
    /// Gateway reference; required for online payment methods.
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub currency: CurrencyCode,
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub discount_amount: Decimal,
    pub shipping_address: Address,
    pub billing_address: Option<Address>,
}

/// `POST /checkout` - place an order from the active cart.
///
/// The amount is computed server-side from the cart lines minus the
/// validated discount. For online payment methods the gateway verifies the
/// transaction before the payment is marked completed; a declined charge
/// leaves the order with `payment_status = failed` for retry via
/// `POST /orders/{id}/pay/verify`.
///
/// # Errors
///
/// Returns 400 for an empty cart or invalid input, 502 for gateway
/// failures.
pub async fn place_order(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Json(body): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<OrderResponse>)> {
    let checkout = CheckoutService::new(state.pool(), state.payments());
    let order = checkout
        .place_order(
            user.id,
            PlaceOrder {
                payment_method: body.payment_method,
                transaction_id: body.transaction_id,
                currency: body.currency,
                coupon_code: body.coupon_code,
                discount_amount: body.discount_amount,
                shipping_address: body.shipping_address,
                billing_address: body.billing_address,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(order.into())))
}
