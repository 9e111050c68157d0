//! User repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use clove_core::{Email, Phone, UserId};

use super::{RepositoryError, conflict_on_unique, parse_column};
use crate::models::User;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    email: String,
    name: String,
    phone: String,
    is_blocked: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> Result<User, RepositoryError> {
        Ok(User {
            id: UserId::new(self.id),
            email: parse_column::<Email>(&self.email, "email")?,
            name: self.name,
            phone: parse_column::<Phone>(&self.phone, "phone")?,
            is_blocked: self.is_blocked,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT: &str =
    "SELECT id, email, name, phone, is_blocked, created_at, updated_at FROM users";

/// Repository for customer accounts.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if a stored value does not parse.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!("{SELECT} WHERE email = $1"))
            .bind(email.as_str())
            .fetch_optional(self.pool)
            .await?;
        row.map(UserRow::into_user).transpose()
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if a stored value does not parse.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!("{SELECT} WHERE id = $1"))
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;
        row.map(UserRow::into_user).transpose()
    }

    /// Get a user together with their password hash, for login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if a stored value does not parse.
    pub async fn get_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct UserWithHash {
            #[sqlx(flatten)]
            user: UserRow,
            password_hash: String,
        }

        let row: Option<UserWithHash> = sqlx::query_as(
            "SELECT id, email, name, phone, is_blocked, created_at, updated_at, password_hash
             FROM users WHERE email = $1",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some((r.user.into_user()?, r.password_hash))),
            None => Ok(None),
        }
    }

    /// Create a user. Registration verifies the email first, so this only
    /// runs after a successful OTP check.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already registered.
    pub async fn create(
        &self,
        email: &Email,
        name: &str,
        phone: &Phone,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let row: UserRow = sqlx::query_as(
            "INSERT INTO users (email, name, phone, password_hash)
             VALUES ($1, $2, $3, $4)
             RETURNING id, email, name, phone, is_blocked, created_at, updated_at",
        )
        .bind(email.as_str())
        .bind(name)
        .bind(phone.as_str())
        .bind(password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "email already registered"))?;

        row.into_user()
    }

    /// All customers, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if a stored value does not parse.
    pub async fn list_all(&self) -> Result<Vec<User>, RepositoryError> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!("{SELECT} ORDER BY created_at DESC"))
            .fetch_all(self.pool)
            .await?;
        rows.into_iter().map(UserRow::into_user).collect()
    }

    /// Set the blocked flag. Setting it to its current value is a no-op
    /// success.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the ID does not exist.
    pub async fn set_blocked(&self, id: UserId, is_blocked: bool) -> Result<User, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(
            "UPDATE users SET is_blocked = $2, updated_at = NOW() WHERE id = $1
             RETURNING id, email, name, phone, is_blocked, created_at, updated_at",
        )
        .bind(id.as_i32())
        .bind(is_blocked)
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.into_user()
    }
}
