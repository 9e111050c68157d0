//! Cart repository.

use rust_decimal::Decimal;
use sqlx::PgPool;

use clove_core::{CartId, CartItemId, ProductId, UserId, VariantId};

use super::RepositoryError;
use crate::models::{Cart, CartLine};

#[derive(sqlx::FromRow)]
struct CartLineRow {
    id: i32,
    product_id: i32,
    product_name: String,
    variant_id: i32,
    variant_label: String,
    unit_price: Decimal,
    quantity: i32,
    product_listed: bool,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        Self {
            id: CartItemId::new(row.id),
            product_id: ProductId::new(row.product_id),
            product_name: row.product_name,
            variant_id: VariantId::new(row.variant_id),
            variant_label: row.variant_label,
            unit_price: row.unit_price,
            quantity: row.quantity,
            product_listed: row.product_listed,
        }
    }
}

/// Repository for carts and cart items.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the user's active cart, creating one if none exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_or_create_active(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let existing: Option<i32> =
            sqlx::query_scalar("SELECT id FROM carts WHERE user_id = $1 AND is_active")
                .bind(user_id.as_i32())
                .fetch_optional(self.pool)
                .await?;

        let cart_id = match existing {
            Some(id) => id,
            None => {
                sqlx::query_scalar("INSERT INTO carts (user_id) VALUES ($1) RETURNING id")
                    .bind(user_id.as_i32())
                    .fetch_one(self.pool)
                    .await?
            }
        };

        let items = self.lines(CartId::new(cart_id)).await?;
        Ok(Cart {
            id: CartId::new(cart_id),
            user_id,
            items,
        })
    }

    /// Line items for a cart, joined with product and variant detail.
    async fn lines(&self, cart_id: CartId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows: Vec<CartLineRow> = sqlx::query_as(
            "SELECT ci.id, ci.product_id, p.name AS product_name, ci.variant_id,
                    v.label AS variant_label, v.price AS unit_price, ci.quantity,
                    p.is_listed AS product_listed
             FROM cart_items ci
             JOIN products p ON p.id = ci.product_id
             JOIN product_variants v ON v.id = ci.variant_id
             WHERE ci.cart_id = $1
             ORDER BY ci.id",
        )
        .bind(cart_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(CartLine::from).collect())
    }

    /// Add a variant to the cart. An existing line for the same variant
    /// accumulates quantity instead of duplicating.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        variant_id: VariantId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO cart_items (cart_id, product_id, variant_id, quantity)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (cart_id, variant_id)
             DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity,
                           updated_at = NOW()",
        )
        .bind(cart_id.as_i32())
        .bind(product_id.as_i32())
        .bind(variant_id.as_i32())
        .bind(quantity)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Set a line's quantity. Zero deletes the line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line is not in this cart.
    pub async fn set_item_quantity(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        let result = if quantity == 0 {
            sqlx::query("DELETE FROM cart_items WHERE id = $1 AND cart_id = $2")
                .bind(item_id.as_i32())
                .bind(cart_id.as_i32())
                .execute(self.pool)
                .await?
        } else {
            sqlx::query(
                "UPDATE cart_items SET quantity = $3, updated_at = NOW()
                 WHERE id = $1 AND cart_id = $2",
            )
            .bind(item_id.as_i32())
            .bind(cart_id.as_i32())
            .bind(quantity)
            .execute(self.pool)
            .await?
        };

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Remove a line from the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line is not in this cart.
    pub async fn remove_item(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND cart_id = $2")
            .bind(item_id.as_i32())
            .bind(cart_id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Remove every line from the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, cart_id: CartId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id.as_i32())
            .execute(self.pool)
            .await?;
        Ok(())
    }
}
