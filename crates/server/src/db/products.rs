//! Product repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use clove_core::{CategoryId, ProductId, VariantId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::{Product, ProductVariant};

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    description: String,
    category_id: i32,
    sub_category_id: Option<i32>,
    images: Vec<String>,
    is_listed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct VariantRow {
    id: i32,
    product_id: i32,
    label: String,
    price: Decimal,
    original_price: Option<Decimal>,
    stock: i32,
}

impl ProductRow {
    fn into_product(self, variants: Vec<ProductVariant>) -> Product {
        Product {
            id: ProductId::new(self.id),
            name: self.name,
            description: self.description,
            category_id: CategoryId::new(self.category_id),
            sub_category_id: self.sub_category_id.map(CategoryId::new),
            images: self.images,
            is_listed: self.is_listed,
            created_at: self.created_at,
            updated_at: self.updated_at,
            variants,
        }
    }
}

impl From<VariantRow> for ProductVariant {
    fn from(row: VariantRow) -> Self {
        Self {
            id: VariantId::new(row.id),
            product_id: ProductId::new(row.product_id),
            label: row.label,
            price: row.price,
            original_price: row.original_price,
            stock: row.stock,
        }
    }
}

const SELECT: &str = "SELECT id, name, description, category_id, sub_category_id, images, \
                      is_listed, created_at, updated_at FROM products";

const SELECT_VARIANTS: &str =
    "SELECT id, product_id, label, price, original_price, stock FROM product_variants";

/// A new variant to insert alongside a product.
#[derive(Debug, Clone)]
pub struct NewVariant {
    pub label: String,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub stock: i32,
}

/// Fields that can change on a product update. `None` leaves the column as is.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<CategoryId>,
    pub sub_category_id: Option<Option<CategoryId>>,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Attach variants to a batch of product rows.
    async fn assemble(&self, rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let variant_rows: Vec<VariantRow> =
            sqlx::query_as(&format!("{SELECT_VARIANTS} WHERE product_id = ANY($1) ORDER BY id"))
                .bind(&ids)
                .fetch_all(self.pool)
                .await?;

        let mut products: Vec<Product> =
            rows.into_iter().map(|r| r.into_product(Vec::new())).collect();
        for variant in variant_rows {
            let variant = ProductVariant::from(variant);
            if let Some(product) = products.iter_mut().find(|p| p.id == variant.product_id) {
                product.variants.push(variant);
            }
        }
        Ok(products)
    }

    /// All products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!("{SELECT} ORDER BY created_at DESC"))
            .fetch_all(self.pool)
            .await?;
        self.assemble(rows).await
    }

    /// Only listed products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_listed(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> =
            sqlx::query_as(&format!("{SELECT} WHERE is_listed ORDER BY created_at DESC"))
                .fetch_all(self.pool)
                .await?;
        self.assemble(rows).await
    }

    /// Listed products in a main category / sub category pair.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_category(
        &self,
        category_id: CategoryId,
        sub_category_id: CategoryId,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "{SELECT} WHERE is_listed AND category_id = $1 AND sub_category_id = $2
             ORDER BY created_at DESC"
        ))
        .bind(category_id.as_i32())
        .bind(sub_category_id.as_i32())
        .fetch_all(self.pool)
        .await?;
        self.assemble(rows).await
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!("{SELECT} WHERE id = $1"))
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(
                self.assemble(vec![row])
                    .await?
                    .pop()
                    .ok_or(RepositoryError::NotFound)?,
            )),
            None => Ok(None),
        }
    }

    /// Whether a product with this exact name exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn name_exists(
        &self,
        name: &str,
        exclude: Option<ProductId>,
    ) -> Result<bool, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE name = $1 AND ($2::INTEGER IS NULL OR id <> $2)",
        )
        .bind(name)
        .bind(exclude.map(|id| id.as_i32()))
        .fetch_one(self.pool)
        .await?;
        Ok(count > 0)
    }

    /// Create a product and its variants in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is already taken.
    pub async fn create(
        &self,
        name: &str,
        description: &str,
        category_id: CategoryId,
        sub_category_id: Option<CategoryId>,
        images: &[String],
        variants: &[NewVariant],
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row: ProductRow = sqlx::query_as(
            "INSERT INTO products (name, description, category_id, sub_category_id, images)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, name, description, category_id, sub_category_id, images,
                       is_listed, created_at, updated_at",
        )
        .bind(name)
        .bind(description)
        .bind(category_id.as_i32())
        .bind(sub_category_id.map(|id| id.as_i32()))
        .bind(images)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "product name already exists"))?;

        let mut inserted = Vec::with_capacity(variants.len());
        for variant in variants {
            let variant_row: VariantRow = sqlx::query_as(
                "INSERT INTO product_variants (product_id, label, price, original_price, stock)
                 VALUES ($1, $2, $3, $4, $5)
                 RETURNING id, product_id, label, price, original_price, stock",
            )
            .bind(row.id)
            .bind(&variant.label)
            .bind(variant.price)
            .bind(variant.original_price)
            .bind(variant.stock)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| conflict_on_unique(e, "duplicate variant label"))?;
            inserted.push(ProductVariant::from(variant_row));
        }

        tx.commit().await?;
        Ok(row.into_product(inserted))
    }

    /// Apply partial changes to a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the ID does not exist, or
    /// `RepositoryError::Conflict` if a rename collides.
    pub async fn update(
        &self,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<Product, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(
            "UPDATE products
             SET name = COALESCE($2, name),
                 description = COALESCE($3, description),
                 category_id = COALESCE($4, category_id),
                 sub_category_id = CASE WHEN $5 THEN $6 ELSE sub_category_id END,
                 updated_at = NOW()
             WHERE id = $1
             RETURNING id, name, description, category_id, sub_category_id, images,
                       is_listed, created_at, updated_at",
        )
        .bind(id.as_i32())
        .bind(changes.name.as_deref())
        .bind(changes.description.as_deref())
        .bind(changes.category_id.map(|id| id.as_i32()))
        .bind(changes.sub_category_id.is_some())
        .bind(
            changes
                .sub_category_id
                .flatten()
                .map(|id| id.as_i32()),
        )
        .fetch_optional(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "product name already exists"))?;

        match row {
            Some(row) => Ok(self
                .assemble(vec![row])
                .await?
                .pop()
                .ok_or(RepositoryError::NotFound)?),
            None => Err(RepositoryError::NotFound),
        }
    }

    /// Replace the full image list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the ID does not exist.
    pub async fn replace_images(
        &self,
        id: ProductId,
        images: &[String],
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE products SET images = $2, updated_at = NOW() WHERE id = $1")
                .bind(id.as_i32())
                .bind(images)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Set the listing flag. Setting it to its current value is a no-op
    /// success.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the ID does not exist.
    pub async fn set_listed(
        &self,
        id: ProductId,
        is_listed: bool,
    ) -> Result<Product, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(
            "UPDATE products
             SET is_listed = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING id, name, description, category_id, sub_category_id, images,
                       is_listed, created_at, updated_at",
        )
        .bind(id.as_i32())
        .bind(is_listed)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => Ok(self
                .assemble(vec![row])
                .await?
                .pop()
                .ok_or(RepositoryError::NotFound)?),
            None => Err(RepositoryError::NotFound),
        }
    }

    /// Delete a product and (via cascade) its variants.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the ID does not exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Get a single variant with its parent product's listing state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_variant(
        &self,
        variant_id: VariantId,
    ) -> Result<Option<(ProductVariant, bool)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct VariantWithListing {
            id: i32,
            product_id: i32,
            label: String,
            price: Decimal,
            original_price: Option<Decimal>,
            stock: i32,
            is_listed: bool,
        }

        let row: Option<VariantWithListing> = sqlx::query_as(
            "SELECT v.id, v.product_id, v.label, v.price, v.original_price, v.stock, p.is_listed
             FROM product_variants v
             JOIN products p ON p.id = v.product_id
             WHERE v.id = $1",
        )
        .bind(variant_id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| {
            (
                ProductVariant {
                    id: VariantId::new(r.id),
                    product_id: ProductId::new(r.product_id),
                    label: r.label,
                    price: r.price,
                    original_price: r.original_price,
                    stock: r.stock,
                },
                r.is_listed,
            )
        }))
    }
}
