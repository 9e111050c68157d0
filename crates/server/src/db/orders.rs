//! Order repository.
//!
//! Status columns are written only by the targeted update methods below; the
//! checkout service validates every transition against the core
//! `can_become` tables before calling them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

use clove_core::{
    CartId, CurrencyCode, OrderId, OrderItemId, OrderStatus, PaymentMethod, PaymentStatus,
    ProductId, RefundStatus, ReturnStatus, UserId, VariantId,
};

use super::{RepositoryError, parse_column};
use crate::models::{Address, NewOrder, Order, OrderItem};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    cart_id: i32,
    transaction_id: Option<String>,
    payment_method: String,
    amount: Decimal,
    currency: String,
    coupon_code: Option<String>,
    discount_amount: Decimal,
    shipping_address: Json<Address>,
    billing_address: Option<Json<Address>>,
    payment_status: String,
    payment_failure_reason: Option<String>,
    order_status: String,
    cancellation_reason: Option<String>,
    tracking_id: Option<String>,
    return_status: String,
    refund_status: String,
    placed_at: DateTime<Utc>,
    payment_completed_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    product_id: i32,
    variant_id: i32,
    product_name: String,
    unit_price: Decimal,
    quantity: i32,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
        Ok(Order {
            id: OrderId::new(self.id),
            user_id: UserId::new(self.user_id),
            cart_id: CartId::new(self.cart_id),
            transaction_id: self.transaction_id,
            payment_method: parse_column::<PaymentMethod>(&self.payment_method, "payment_method")?,
            amount: self.amount,
            currency: parse_column::<CurrencyCode>(&self.currency, "currency")?,
            coupon_code: self.coupon_code,
            discount_amount: self.discount_amount,
            shipping_address: self.shipping_address.0,
            billing_address: self.billing_address.map(|j| j.0),
            payment_status: parse_column::<PaymentStatus>(&self.payment_status, "payment_status")?,
            payment_failure_reason: self.payment_failure_reason,
            order_status: parse_column::<OrderStatus>(&self.order_status, "order_status")?,
            cancellation_reason: self.cancellation_reason,
            tracking_id: self.tracking_id,
            return_status: parse_column::<ReturnStatus>(&self.return_status, "return_status")?,
            refund_status: parse_column::<RefundStatus>(&self.refund_status, "refund_status")?,
            placed_at: self.placed_at,
            payment_completed_at: self.payment_completed_at,
            delivered_at: self.delivered_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
            items,
        })
    }
}

const SELECT: &str = "SELECT id, user_id, cart_id, transaction_id, payment_method, amount, \
                      currency, coupon_code, discount_amount, shipping_address, billing_address, \
                      payment_status, payment_failure_reason, order_status, cancellation_reason, \
                      tracking_id, return_status, refund_status, placed_at, payment_completed_at, \
                      delivered_at, created_at, updated_at FROM orders";

const SELECT_ITEMS: &str = "SELECT id, order_id, product_id, variant_id, product_name, \
                            unit_price, quantity FROM order_items";

/// Repository for orders and order items.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    fn items_from(rows: Vec<OrderItemRow>) -> Vec<OrderItem> {
        rows.into_iter()
            .map(|r| OrderItem {
                id: OrderItemId::new(r.id),
                product_id: ProductId::new(r.product_id),
                variant_id: VariantId::new(r.variant_id),
                product_name: r.product_name,
                unit_price: r.unit_price,
                quantity: r.quantity,
            })
            .collect()
    }

    /// Create an order from a cart snapshot and retire the cart, in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn create(&self, new_order: NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row: OrderRow = sqlx::query_as(
            "INSERT INTO orders (user_id, cart_id, transaction_id, payment_method, amount,
                                 currency, coupon_code, discount_amount, shipping_address,
                                 billing_address)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING id, user_id, cart_id, transaction_id, payment_method, amount, currency,
                       coupon_code, discount_amount, shipping_address, billing_address,
                       payment_status, payment_failure_reason, order_status, cancellation_reason,
                       tracking_id, return_status, refund_status, placed_at, payment_completed_at,
                       delivered_at, created_at, updated_at",
        )
        .bind(new_order.user_id.as_i32())
        .bind(new_order.cart_id.as_i32())
        .bind(new_order.transaction_id.as_deref())
        .bind(new_order.payment_method.to_string())
        .bind(new_order.amount)
        .bind(new_order.currency.code())
        .bind(new_order.coupon_code.as_deref())
        .bind(new_order.discount_amount)
        .bind(Json(&new_order.shipping_address))
        .bind(new_order.billing_address.as_ref().map(Json))
        .fetch_one(&mut *tx)
        .await?;

        let mut item_rows = Vec::with_capacity(new_order.items.len());
        for item in &new_order.items {
            let item_row: OrderItemRow = sqlx::query_as(
                "INSERT INTO order_items (order_id, product_id, variant_id, product_name,
                                          unit_price, quantity)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 RETURNING id, order_id, product_id, variant_id, product_name, unit_price,
                           quantity",
            )
            .bind(row.id)
            .bind(item.product_id.as_i32())
            .bind(item.variant_id.as_i32())
            .bind(&item.product_name)
            .bind(item.unit_price)
            .bind(item.quantity)
            .fetch_one(&mut *tx)
            .await?;
            item_rows.push(item_row);
        }

        // Retire the cart so the next add starts a fresh one
        sqlx::query("UPDATE carts SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
            .bind(new_order.cart_id.as_i32())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        row.into_order(Self::items_from(item_rows))
    }

    /// Get an order by ID, with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if a stored status does not parse.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!("{SELECT} WHERE id = $1"))
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;

        match row {
            Some(row) => {
                let items: Vec<OrderItemRow> =
                    sqlx::query_as(&format!("{SELECT_ITEMS} WHERE order_id = $1 ORDER BY id"))
                        .bind(row.id)
                        .fetch_all(self.pool)
                        .await?;
                Ok(Some(row.into_order(Self::items_from(items))?))
            }
            None => Ok(None),
        }
    }

    /// Orders for one user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if a stored status does not parse.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> =
            sqlx::query_as(&format!("{SELECT} WHERE user_id = $1 ORDER BY placed_at DESC"))
                .bind(user_id.as_i32())
                .fetch_all(self.pool)
                .await?;
        self.assemble(rows).await
    }

    /// All orders, newest first, optionally filtered by fulfillment status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if a stored status does not parse.
    pub async fn list_all(
        &self,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "{SELECT} WHERE ($1::TEXT IS NULL OR order_status = $1) ORDER BY placed_at DESC"
        ))
        .bind(status.map(|s| s.to_string()))
        .fetch_all(self.pool)
        .await?;
        self.assemble(rows).await
    }

    async fn assemble(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let item_rows: Vec<OrderItemRow> =
            sqlx::query_as(&format!("{SELECT_ITEMS} WHERE order_id = ANY($1) ORDER BY id"))
                .bind(&ids)
                .fetch_all(self.pool)
                .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let order_id = row.id;
            let items = item_rows
                .iter()
                .filter(|i| i.order_id == order_id)
                .map(|i| OrderItem {
                    id: OrderItemId::new(i.id),
                    product_id: ProductId::new(i.product_id),
                    variant_id: VariantId::new(i.variant_id),
                    product_name: i.product_name.clone(),
                    unit_price: i.unit_price,
                    quantity: i.quantity,
                })
                .collect();
            orders.push(row.into_order(items)?);
        }
        Ok(orders)
    }

    /// Record a payment settlement outcome.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the ID does not exist.
    pub async fn set_payment_status(
        &self,
        id: OrderId,
        status: PaymentStatus,
        completed_at: Option<DateTime<Utc>>,
        failure_reason: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE orders
             SET payment_status = $2,
                 payment_completed_at = COALESCE($3, payment_completed_at),
                 payment_failure_reason = $4,
                 updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id.as_i32())
        .bind(status.to_string())
        .bind(completed_at)
        .bind(failure_reason)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Move the order to `shipped` with its tracking reference.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the ID does not exist.
    pub async fn set_shipped(&self, id: OrderId, tracking_id: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE orders
             SET order_status = $2, tracking_id = $3, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id.as_i32())
        .bind(OrderStatus::Shipped.to_string())
        .bind(tracking_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Move the order to `delivered` and stamp the delivery time.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the ID does not exist.
    pub async fn set_delivered(
        &self,
        id: OrderId,
        delivered_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE orders
             SET order_status = $2, delivered_at = $3, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id.as_i32())
        .bind(OrderStatus::Delivered.to_string())
        .bind(delivered_at)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Move the order to `cancelled` with the caller's reason.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the ID does not exist.
    pub async fn set_cancelled(&self, id: OrderId, reason: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE orders
             SET order_status = $2, cancellation_reason = $3, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id.as_i32())
        .bind(OrderStatus::Cancelled.to_string())
        .bind(reason)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Record a return-request state change.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the ID does not exist.
    pub async fn set_return_status(
        &self,
        id: OrderId,
        status: ReturnStatus,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE orders SET return_status = $2, updated_at = NOW() WHERE id = $1")
                .bind(id.as_i32())
                .bind(status.to_string())
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Record a refund state change.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the ID does not exist.
    pub async fn set_refund_status(
        &self,
        id: OrderId,
        status: RefundStatus,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE orders SET refund_status = $2, updated_at = NOW() WHERE id = $1")
                .bind(id.as_i32())
                .bind(status.to_string())
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
