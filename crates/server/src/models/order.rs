//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use clove_core::{
    CartId, CurrencyCode, OrderId, OrderItemId, OrderStatus, PaymentMethod, PaymentStatus,
    ProductId, RefundStatus, ReturnStatus, UserId, VariantId,
};

/// A shipping or billing address, stored as JSONB on the order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Address {
    pub full_name: String,
    pub address_line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub phone: String,
}

/// A placed order with its line items.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub cart_id: CartId,
    /// Gateway reference for online payments (e.g. a payment-intent id).
    pub transaction_id: Option<String>,
    pub payment_method: PaymentMethod,
    /// Total charged, after discount. Computed server-side at placement.
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

/// A line item snapshotted from the cart at placement time.
#[derive(Debug, Clone)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub variant_id: VariantId,
    /// Product name at the time of purchase.
    pub product_name: String,
    /// Unit price at the time of purchase.
    pub unit_price: Decimal,
    pub quantity: i32,
}

/// Input for creating an order row. Statuses start at their defaults
/// (`pending` / `processing` / `not_requested` / `not_initiated`).
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub cart_id: CartId,
    pub transaction_id: Option<String>,
    pub payment_method: PaymentMethod,
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub coupon_code: Option<String>,
    pub discount_amount: Decimal,
    pub shipping_address: Address,
    pub billing_address: Option<Address>,
    pub items: Vec<NewOrderItem>,
}

/// Input for one order line.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
}
