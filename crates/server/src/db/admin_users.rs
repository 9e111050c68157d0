//! Admin-user repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use clove_core::{AdminRole, AdminUserId, Email};

use super::{RepositoryError, parse_column};
use crate::models::AdminUser;

#[derive(sqlx::FromRow)]
struct AdminUserRow {
    id: i32,
    email: String,
    name: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl AdminUserRow {
    fn into_admin(self) -> Result<AdminUser, RepositoryError> {
        Ok(AdminUser {
            id: AdminUserId::new(self.id),
            email: parse_column::<Email>(&self.email, "email")?,
            name: self.name,
            role: parse_column::<AdminRole>(&self.role, "role")?,
            created_at: self.created_at,
        })
    }
}

/// Repository for console operators.
pub struct AdminUserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AdminUserRepository<'a> {
    /// Create a new admin-user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an admin together with their password hash, for login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if a stored value does not parse.
    pub async fn get_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(AdminUser, String)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct AdminWithHash {
            #[sqlx(flatten)]
            admin: AdminUserRow,
            password_hash: String,
        }

        let row: Option<AdminWithHash> = sqlx::query_as(
            "SELECT id, email, name, role, created_at, password_hash
             FROM admin_users WHERE email = $1",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some((r.admin.into_admin()?, r.password_hash))),
            None => Ok(None),
        }
    }
}
