//! Category repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use clove_core::CategoryId;

use super::{RepositoryError, conflict_on_unique};
use crate::models::Category;

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    name: String,
    description: String,
    parent_id: Option<i32>,
    is_listed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            name: row.name,
            description: row.description,
            parent_id: row.parent_id.map(CategoryId::new),
            is_listed: row.is_listed,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT: &str =
    "SELECT id, name, description, parent_id, is_listed, created_at, updated_at FROM categories";

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All categories, main categories first, then by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows: Vec<CategoryRow> =
            sqlx::query_as(&format!("{SELECT} ORDER BY parent_id NULLS FIRST, name"))
                .fetch_all(self.pool)
                .await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// Only listed categories, in the same order as [`Self::list_all`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_listed(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows: Vec<CategoryRow> = sqlx::query_as(&format!(
            "{SELECT} WHERE is_listed ORDER BY parent_id NULLS FIRST, name"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// Get a category by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row: Option<CategoryRow> = sqlx::query_as(&format!("{SELECT} WHERE id = $1"))
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(Category::from))
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is already taken.
    pub async fn create(
        &self,
        name: &str,
        description: &str,
        parent_id: Option<CategoryId>,
    ) -> Result<Category, RepositoryError> {
        let row: CategoryRow = sqlx::query_as(
            "INSERT INTO categories (name, description, parent_id)
             VALUES ($1, $2, $3)
             RETURNING id, name, description, parent_id, is_listed, created_at, updated_at",
        )
        .bind(name)
        .bind(description)
        .bind(parent_id.map(|id| id.as_i32()))
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "category name already exists"))?;

        Ok(row.into())
    }

    /// Update a category's name and description.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the ID does not exist, or
    /// `RepositoryError::Conflict` if the new name collides.
    pub async fn update(
        &self,
        id: CategoryId,
        name: &str,
        description: &str,
    ) -> Result<Category, RepositoryError> {
        let row: Option<CategoryRow> = sqlx::query_as(
            "UPDATE categories
             SET name = $2, description = $3, updated_at = NOW()
             WHERE id = $1
             RETURNING id, name, description, parent_id, is_listed, created_at, updated_at",
        )
        .bind(id.as_i32())
        .bind(name)
        .bind(description)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "category name already exists"))?;

        row.map(Category::from).ok_or(RepositoryError::NotFound)
    }

    /// Set the listing flag. Returns the updated category.
    ///
    /// Setting the flag to its current value is a no-op success.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the ID does not exist.
    pub async fn set_listed(
        &self,
        id: CategoryId,
        is_listed: bool,
    ) -> Result<Category, RepositoryError> {
        let row: Option<CategoryRow> = sqlx::query_as(
            "UPDATE categories
             SET is_listed = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING id, name, description, parent_id, is_listed, created_at, updated_at",
        )
        .bind(id.as_i32())
        .bind(is_listed)
        .fetch_optional(self.pool)
        .await?;

        row.map(Category::from).ok_or(RepositoryError::NotFound)
    }

    /// Delete a category (and, via cascade, its sub categories).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the ID does not exist.
    pub async fn delete(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
