//! Product domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use clove_core::{CategoryId, ProductId, VariantId};

/// A catalog product with its sellable variants.
#[derive(Debug, Clone)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub category_id: CategoryId,
    pub sub_category_id: Option<CategoryId>,
    /// Hosted image URLs, in display order.
    pub images: Vec<String>,
    pub is_listed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub variants: Vec<ProductVariant>,
}

/// A sellable unit of a product (e.g. "250g", "1kg"). Prices live here.
#[derive(Debug, Clone)]
pub struct ProductVariant {
    pub id: VariantId,
    pub product_id: ProductId,
    pub label: String,
    pub price: Decimal,
    /// Pre-discount price shown struck through, if any.
    pub original_price: Option<Decimal>,
    pub stock: i32,
}
