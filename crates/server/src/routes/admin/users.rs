//! Customer management for the console.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use clove_core::UserId;

use crate::db::UserRepository;
use crate::error::Result;
use crate::middleware::auth::RequireAdmin;
use crate::models::User;
use crate::routes::require_write;
use crate::state::AppState;

/// A customer, as shown in the console.
#[derive(Debug, Serialize)]
pub struct CustomerResponse {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub is_blocked: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for CustomerResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email.into_inner(),
            name: user.name,
            phone: user.phone.into_inner(),
            is_blocked: user.is_blocked,
            created_at: user.created_at,
        }
    }
}

/// `GET /admin/users` - every customer, newest first.
///
/// # Errors
///
/// Returns 500 on database failure.
pub async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<CustomerResponse>>> {
    let users = UserRepository::new(state.pool()).list_all().await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// `POST /admin/users/{id}/block` - prevent a customer from logging in.
///
/// Blocking an already-blocked customer is a no-op success.
///
/// # Errors
///
/// Returns 404 for an unknown ID.
pub async fn block(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<CustomerResponse>> {
    require_write(&admin)?;
    let user = UserRepository::new(state.pool()).set_blocked(id, true).await?;
    tracing::info!(user_id = %id, admin = %admin.email, "customer blocked");
    Ok(Json(user.into()))
}

/// `POST /admin/users/{id}/unblock` - restore a customer's access.
///
/// Unblocking a customer who is not blocked is a no-op success.
///
/// # Errors
///
/// Returns 404 for an unknown ID.
pub async fn unblock(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<CustomerResponse>> {
    require_write(&admin)?;
    let user = UserRepository::new(state.pool()).set_blocked(id, false).await?;
    tracing::info!(user_id = %id, admin = %admin.email, "customer unblocked");
    Ok(Json(user.into()))
}
