//! Cart domain types.

use rust_decimal::Decimal;

use clove_core::{CartId, CartItemId, ProductId, UserId, VariantId};

/// The active cart for a user, with denormalized line detail.
#[derive(Debug, Clone)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub items: Vec<CartLine>,
}

impl Cart {
    /// Sum of line totals, before any discount.
    ///
    /// Returns `None` on overflow.
    #[must_use]
    pub fn subtotal(&self) -> Option<Decimal> {
        self.items.iter().try_fold(Decimal::ZERO, |acc, line| {
            let line_total = line.unit_price.checked_mul(Decimal::from(line.quantity))?;
            acc.checked_add(line_total)
        })
    }
}

/// One line of a cart, joined with its product and variant.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub variant_id: VariantId,
    pub variant_label: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    /// Whether the product is still listed; checkout refuses unlisted lines.
    pub product_listed: bool,
}
