//! Session principal types.
//!
//! Stored in the tower-sessions cookie session after login. Customers and
//! admins are separate principals under separate keys, so an admin session
//! never satisfies a customer extractor or vice versa.

use serde::{Deserialize, Serialize};

use clove_core::{AdminRole, AdminUserId, UserId};

/// Session storage keys.
pub mod session_keys {
    /// Key for the logged-in customer.
    pub const CURRENT_USER: &str = "current_user";
    /// Key for the logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";
}

/// The logged-in customer, as stored in the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: String,
    pub name: String,
}

/// The logged-in admin, as stored in the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    pub id: AdminUserId,
    pub email: String,
    pub name: String,
    pub role: AdminRole,
}
