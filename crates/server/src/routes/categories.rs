//! Category management handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clove_core::CategoryId;

use crate::db::CategoryRepository;
use crate::error::{AppError, Result};
use crate::middleware::auth::RequireAdmin;
use crate::models::Category;
use crate::routes::require_write;
use crate::state::AppState;

/// A category, as returned by the API.
#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub parent_id: Option<CategoryId>,
    pub is_listed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            description: category.description,
            parent_id: category.parent_id,
            is_listed: category.is_listed,
            created_at: category.created_at,
            updated_at: category.updated_at,
        }
    }
}

/// Request to create a category.
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Present for a sub category, absent for a main category.
    pub parent_id: Option<CategoryId>,
}

/// Request to update a category.
#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// `GET /categories` - listed categories, for the store.
///
/// # Errors
///
/// Returns 500 on database failure.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<CategoryResponse>>> {
    let categories = CategoryRepository::new(state.pool()).list_listed().await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

/// `GET /categories/all` - every category, for the console.
///
/// # Errors
///
/// Returns 500 on database failure.
pub async fn list_all(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryResponse>>> {
    let categories = CategoryRepository::new(state.pool()).list_all().await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

/// `GET /categories/{id}`.
///
/// # Errors
///
/// Returns 404 for an unknown ID.
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<CategoryResponse>> {
    let category = CategoryRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {id}")))?;
    Ok(Json(category.into()))
}

/// `POST /categories` - create a category.
///
/// # Errors
///
/// Returns 409 for a duplicate name, 400 for an empty name or unknown
/// parent.
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(body): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>)> {
    require_write(&admin)?;

    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("category name is required".to_owned()));
    }

    let repo = CategoryRepository::new(state.pool());

    if let Some(parent_id) = body.parent_id {
        let parent = repo
            .get_by_id(parent_id)
            .await?
            .ok_or_else(|| AppError::BadRequest(format!("unknown parent category {parent_id}")))?;
        if parent.parent_id.is_some() {
            return Err(AppError::BadRequest(
                "categories can only nest one level deep".to_owned(),
            ));
        }
    }

    let category = repo.create(name, body.description.trim(), body.parent_id).await?;
    Ok((StatusCode::CREATED, Json(category.into())))
}

/// `PUT /categories/{id}` - rename / redescribe a category.
///
/// # Errors
///
/// Returns 404 for an unknown ID, 409 for a name collision.
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    Json(body): Json<UpdateCategoryRequest>,
) -> Result<Json<CategoryResponse>> {
    require_write(&admin)?;

    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("category name is required".to_owned()));
    }

    let category = CategoryRepository::new(state.pool())
        .update(id, name, body.description.trim())
        .await?;
    Ok(Json(category.into()))
}

/// `POST /categories/{id}/list` - make the category visible.
///
/// Already-listed categories are a no-op success.
///
/// # Errors
///
/// Returns 404 for an unknown ID.
pub async fn list_category(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<CategoryResponse>> {
    require_write(&admin)?;
    let category = CategoryRepository::new(state.pool()).set_listed(id, true).await?;
    Ok(Json(category.into()))
}

/// `POST /categories/{id}/unlist` - hide the category from the store.
///
/// Already-unlisted categories are a no-op success.
///
/// # Errors
///
/// Returns 404 for an unknown ID.
pub async fn unlist_category(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<CategoryResponse>> {
    require_write(&admin)?;
    let category = CategoryRepository::new(state.pool()).set_listed(id, false).await?;
    Ok(Json(category.into()))
}

/// `DELETE /categories/{id}` - irreversible delete.
///
/// # Errors
///
/// Returns 404 for an unknown ID.
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<StatusCode> {
    require_write(&admin)?;
    CategoryRepository::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
