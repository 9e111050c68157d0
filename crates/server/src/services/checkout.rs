//! Checkout and order lifecycle.
//!
//! This service owns every status mutation on an order. Each move is checked
//! against the core `can_become` tables plus the cross-entity rules (returns
//! need a delivered order, refunds need a settled payment), so route handlers
//! cannot drive an order into a state its history does not support.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;

use clove_core::{
    CurrencyCode, OrderStatus, PaymentMethod, PaymentStatus, RefundStatus, ReturnStatus, UserId,
};

use crate::db::{CartRepository, OrderRepository, RepositoryError};
use crate::models::{Address, NewOrder, NewOrderItem, Order};
use crate::services::payments::{PaymentError, PaymentGateway, Verification};

/// Errors that can occur during checkout and order lifecycle operations.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The active cart has no lines.
    #[error("cart is empty")]
    EmptyCart,

    /// A cart line points at a product that is no longer listed.
    #[error("product is no longer available: {0}")]
    UnlistedProduct(String),

    /// Online payment methods need a gateway transaction reference.
    #[error("transaction_id is required for online payment")]
    MissingTransactionId,

    /// The payment method exists in the vocabulary but has no live gateway.
    #[error("payment method not enabled: {0}")]
    GatewayNotEnabled(PaymentMethod),

    /// The requested discount is out of bounds or has no coupon code.
    #[error("invalid discount: {0}")]
    InvalidDiscount(String),

    /// Amount arithmetic overflowed.
    #[error("order amount out of range")]
    AmountOverflow,

    /// The requested move is not a legal transition.
    #[error("illegal {what} transition: {from} -> {to}")]
    IllegalTransition {
        /// Which status field was asked to move.
        what: &'static str,
        /// Current state.
        from: String,
        /// Requested state.
        to: String,
    },

    /// Returns are only possible once the order is delivered.
    #[error("order is {order_status}; returns are only possible after delivery")]
    ReturnBeforeDelivery {
        /// Current fulfillment status.
        order_status: OrderStatus,
    },

    /// Cash-on-delivery orders have no gateway transaction to verify.
    #[error("cash-on-delivery orders have nothing to verify")]
    NothingToVerify,

    /// Gateway error.
    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// Repository/database error.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Input for placing an order from the active cart.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub payment_method: PaymentMethod,
    pub transaction_id: Option<String>,
    pub currency: CurrencyCode,
    pub coupon_code: Option<String>,
    pub discount_amount: Decimal,
    pub shipping_address: Address,
    pub billing_address: Option<Address>,
}

/// Checkout and order lifecycle service.
pub struct CheckoutService<'a, G> {
    orders: OrderRepository<'a>,
    carts: CartRepository<'a>,
    gateway: &'a G,
}

impl<'a, G: PaymentGateway> CheckoutService<'a, G> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, gateway: &'a G) -> Self {
        Self {
            orders: OrderRepository::new(pool),
            carts: CartRepository::new(pool),
            gateway,
        }
    }

    /// Place an order from the user's active cart.
    ///
    /// Snapshots the cart lines, computes the amount server-side, creates
    /// the order, retires the cart, and (for online methods) asks the
    /// gateway to verify the transaction. A declined verification leaves the
    /// order in place with `payment_status = failed` so it can be retried.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` for an empty cart, validation
    /// errors for bad input, and gateway/repository errors otherwise.
    pub async fn place_order(
        &self,
        user_id: UserId,
        input: PlaceOrder,
    ) -> Result<Order, CheckoutError> {
        match input.payment_method {
            // Razorpay is in the vocabulary for stored orders, but has no
            // live gateway yet
            PaymentMethod::Razorpay => {
                return Err(CheckoutError::GatewayNotEnabled(PaymentMethod::Razorpay));
            }
            method if method.is_online() && input.transaction_id.is_none() => {
                return Err(CheckoutError::MissingTransactionId);
            }
            _ => {}
        }

        let cart = self.carts.get_or_create_active(user_id).await?;
        if cart.items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        if let Some(line) = cart.items.iter().find(|line| !line.product_listed) {
            return Err(CheckoutError::UnlistedProduct(line.product_name.clone()));
        }

        let subtotal = cart.subtotal().ok_or(CheckoutError::AmountOverflow)?;
        let amount = amount_after_discount(subtotal, input.discount_amount, input.coupon_code.as_deref())?;

        let items = cart
            .items
            .iter()
            .map(|line| NewOrderItem {
                product_id: line.product_id,
                variant_id: line.variant_id,
                product_name: line.product_name.clone(),
                unit_price: line.unit_price,
                quantity: line.quantity,
            })
            .collect();

        let order = self
            .orders
            .create(NewOrder {
                user_id,
                cart_id: cart.id,
                transaction_id: input.transaction_id,
                payment_method: input.payment_method,
                amount,
                currency: input.currency,
                coupon_code: input.coupon_code,
                discount_amount: input.discount_amount,
                shipping_address: input.shipping_address,
                billing_address: input.billing_address,
                items,
            })
            .await?;

        tracing::info!(order_id = %order.id, amount = %order.amount, "order placed");

        if order.payment_method.is_online() {
            return self.verify_payment(order).await;
        }
        Ok(order)
    }

    /// Ask the gateway whether the order's transaction settled and record
    /// the outcome.
    ///
    /// An already-completed payment is a no-op success.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NothingToVerify` for COD orders,
    /// `CheckoutError::MissingTransactionId` if the order carries no
    /// reference, and gateway errors from the provider.
    pub async fn verify_payment(&self, order: Order) -> Result<Order, CheckoutError> {
        if !order.payment_method.is_online() {
            return Err(CheckoutError::NothingToVerify);
        }
        if order.payment_status == PaymentStatus::Completed {
            return Ok(order);
        }

        let transaction_id = order
            .transaction_id
            .as_deref()
            .ok_or(CheckoutError::MissingTransactionId)?;

        match self.gateway.verify(transaction_id).await? {
            Verification::Succeeded => {
                guard_transition(
                    "payment_status",
                    order.payment_status,
                    PaymentStatus::Completed,
                    order.payment_status.can_become(PaymentStatus::Completed),
                )?;
                self.orders
                    .set_payment_status(order.id, PaymentStatus::Completed, Some(Utc::now()), None)
                    .await?;
                tracing::info!(order_id = %order.id, "payment verified");
            }
            Verification::Failed { reason } => {
                // A repeat failure refreshes the recorded reason
                if order.payment_status != PaymentStatus::Failed {
                    guard_transition(
                        "payment_status",
                        order.payment_status,
                        PaymentStatus::Failed,
                        order.payment_status.can_become(PaymentStatus::Failed),
                    )?;
                }
                self.orders
                    .set_payment_status(order.id, PaymentStatus::Failed, None, Some(&reason))
                    .await?;
                tracing::warn!(order_id = %order.id, reason = %reason, "payment verification failed");
            }
        }

        self.reload(order).await
    }

    /// Cancel an order. Only possible before it ships; a settled payment
    /// moves the refund to `initiated`.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::IllegalTransition` if the order already
    /// shipped, was delivered, or is already cancelled.
    pub async fn cancel(&self, order: Order, reason: &str) -> Result<Order, CheckoutError> {
        guard_transition(
            "order_status",
            order.order_status,
            OrderStatus::Cancelled,
            order.order_status.can_become(OrderStatus::Cancelled),
        )?;

        self.orders.set_cancelled(order.id, reason).await?;

        if order.payment_status == PaymentStatus::Completed
            && order.refund_status.can_become(RefundStatus::Initiated)
        {
            self.orders
                .set_refund_status(order.id, RefundStatus::Initiated)
                .await?;
            tracing::info!(order_id = %order.id, "refund initiated for cancelled order");
        }

        self.reload(order).await
    }

    /// Mark an order shipped with its tracking reference.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::IllegalTransition` unless the order is
    /// `processing`.
    pub async fn ship(&self, order: Order, tracking_id: &str) -> Result<Order, CheckoutError> {
        guard_transition(
            "order_status",
            order.order_status,
            OrderStatus::Shipped,
            order.order_status.can_become(OrderStatus::Shipped),
        )?;

        self.orders.set_shipped(order.id, tracking_id).await?;
        self.reload(order).await
    }

    /// Mark an order delivered. A cash-on-delivery payment settles here.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::IllegalTransition` unless the order is
    /// `shipped`.
    pub async fn deliver(&self, order: Order) -> Result<Order, CheckoutError> {
        guard_transition(
            "order_status",
            order.order_status,
            OrderStatus::Delivered,
            order.order_status.can_become(OrderStatus::Delivered),
        )?;

        let now = Utc::now();
        self.orders.set_delivered(order.id, now).await?;

        if order.payment_method == PaymentMethod::Cod
            && order.payment_status.can_become(PaymentStatus::Completed)
        {
            self.orders
                .set_payment_status(order.id, PaymentStatus::Completed, Some(now), None)
                .await?;
        }

        self.reload(order).await
    }

    /// Request a return for a delivered order.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::ReturnBeforeDelivery` if the order has not
    /// been delivered, or `CheckoutError::IllegalTransition` if a return was
    /// already requested or resolved.
    pub async fn request_return(&self, order: Order) -> Result<Order, CheckoutError> {
        if order.order_status != OrderStatus::Delivered {
            return Err(CheckoutError::ReturnBeforeDelivery {
                order_status: order.order_status,
            });
        }
        guard_transition(
            "return_status",
            order.return_status,
            ReturnStatus::Requested,
            order.return_status.can_become(ReturnStatus::Requested),
        )?;

        self.orders
            .set_return_status(order.id, ReturnStatus::Requested)
            .await?;
        self.reload(order).await
    }

    /// Approve a requested return. A settled payment moves the refund to
    /// `initiated`.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::IllegalTransition` unless a return is
    /// currently `requested`.
    pub async fn approve_return(&self, order: Order) -> Result<Order, CheckoutError> {
        guard_transition(
            "return_status",
            order.return_status,
            ReturnStatus::Approved,
            order.return_status.can_become(ReturnStatus::Approved),
        )?;

        self.orders
            .set_return_status(order.id, ReturnStatus::Approved)
            .await?;

        if order.payment_status == PaymentStatus::Completed
            && order.refund_status.can_become(RefundStatus::Initiated)
        {
            self.orders
                .set_refund_status(order.id, RefundStatus::Initiated)
                .await?;
            tracing::info!(order_id = %order.id, "refund initiated for approved return");
        }

        self.reload(order).await
    }

    /// Reject a requested return.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::IllegalTransition` unless a return is
    /// currently `requested`.
    pub async fn reject_return(&self, order: Order) -> Result<Order, CheckoutError> {
        guard_transition(
            "return_status",
            order.return_status,
            ReturnStatus::Rejected,
            order.return_status.can_become(ReturnStatus::Rejected),
        )?;

        self.orders
            .set_return_status(order.id, ReturnStatus::Rejected)
            .await?;
        self.reload(order).await
    }

    /// Record the outcome of an initiated refund, or retry a failed one.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::IllegalTransition` if the move is not in the
    /// refund transition table.
    pub async fn set_refund(&self, order: Order, to: RefundStatus) -> Result<Order, CheckoutError> {
        guard_transition(
            "refund_status",
            order.refund_status,
            to,
            order.refund_status.can_become(to),
        )?;

        self.orders.set_refund_status(order.id, to).await?;
        self.reload(order).await
    }

    async fn reload(&self, order: Order) -> Result<Order, CheckoutError> {
        Ok(self
            .orders
            .get_by_id(order.id)
            .await?
            .ok_or(RepositoryError::NotFound)?)
    }
}

/// Build an [`CheckoutError::IllegalTransition`] unless `allowed`.
fn guard_transition<S: std::fmt::Display>(
    what: &'static str,
    from: S,
    to: S,
    allowed: bool,
) -> Result<(), CheckoutError> {
    if allowed {
        Ok(())
    } else {
        Err(CheckoutError::IllegalTransition {
            what,
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

/// Validate the discount and subtract it from the subtotal.
fn amount_after_discount(
    subtotal: Decimal,
    discount: Decimal,
    coupon_code: Option<&str>,
) -> Result<Decimal, CheckoutError> {
    if discount.is_sign_negative() {
        return Err(CheckoutError::InvalidDiscount(
            "discount cannot be negative".to_owned(),
        ));
    }
    if !discount.is_zero() && coupon_code.is_none() {
        return Err(CheckoutError::InvalidDiscount(
            "discount requires a coupon code".to_owned(),
        ));
    }
    if discount > subtotal {
        return Err(CheckoutError::InvalidDiscount(
            "discount exceeds order subtotal".to_owned(),
        ));
    }
    subtotal
        .checked_sub(discount)
        .ok_or(CheckoutError::AmountOverflow)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_amount_after_discount_plain() {
        let amount = amount_after_discount(dec("100.00"), Decimal::ZERO, None).unwrap();
        assert_eq!(amount, dec("100.00"));
    }

    #[test]
    fn test_amount_after_discount_with_coupon() {
        let amount = amount_after_discount(dec("100.00"), dec("15.00"), Some("SPICE15")).unwrap();
        assert_eq!(amount, dec("85.00"));
    }

    #[test]
    fn test_discount_requires_coupon_code() {
        assert!(matches!(
            amount_after_discount(dec("100.00"), dec("15.00"), None),
            Err(CheckoutError::InvalidDiscount(_))
        ));
    }

    #[test]
    fn test_discount_cannot_exceed_subtotal() {
        assert!(matches!(
            amount_after_discount(dec("10.00"), dec("15.00"), Some("SPICE15")),
            Err(CheckoutError::InvalidDiscount(_))
        ));
    }

    #[test]
    fn test_discount_cannot_be_negative() {
        assert!(matches!(
            amount_after_discount(dec("10.00"), dec("-1.00"), Some("SPICE15")),
            Err(CheckoutError::InvalidDiscount(_))
        ));
    }

    #[test]
    fn test_guard_transition_message_names_states() {
        let err = guard_transition(
            "order_status",
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
            OrderStatus::Delivered.can_become(OrderStatus::Cancelled),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "illegal order_status transition: delivered -> cancelled"
        );
    }
}
