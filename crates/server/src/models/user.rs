//! User and admin-user domain types.

use chrono::{DateTime, Utc};

use clove_core::{AdminRole, AdminUserId, Email, Phone, UserId};

/// A customer account.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub phone: Phone,
    /// Blocked users cannot log in.
    pub is_blocked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A console operator. Separate principal from customers.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub id: AdminUserId,
    pub email: Email,
    pub name: String,
    pub role: AdminRole,
    pub created_at: DateTime<Utc>,
}
