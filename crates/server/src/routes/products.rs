//! Product management handlers.
//!
//! Product creation arrives as multipart form data: scalar fields plus any
//! number of `images` file parts. Files are pushed to the image host first;
//! only hosted URLs reach the database.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use clove_core::{CategoryId, ProductId, VariantId};

use crate::db::products::{NewVariant, ProductChanges};
use crate::db::{CategoryRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::middleware::auth::RequireAdmin;
use crate::models::{Product, ProductVariant};
use crate::routes::require_write;
use crate::state::AppState;

/// A product, as returned by the API.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub category_id: CategoryId,
    pub sub_category_id: Option<CategoryId>,
    pub images: Vec<String>,
    pub is_listed: bool,
    pub variants: Vec<VariantResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A product variant, as returned by the API.
#[derive(Debug, Serialize)]
pub struct VariantResponse {
    pub id: VariantId,
    pub label: String,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub stock: i32,
}

impl From<ProductVariant> for VariantResponse {
    fn from(variant: ProductVariant) -> Self {
        Self {
            id: variant.id,
            label: variant.label,
            price: variant.price,
            original_price: variant.original_price,
            stock: variant.stock,
        }
    }
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            category_id: product.category_id,
            sub_category_id: product.sub_category_id,
            images: product.images,
            is_listed: product.is_listed,
            variants: product.variants.into_iter().map(Into::into).collect(),
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

/// Variant payload inside the multipart `variants` field (a JSON array).
#[derive(Debug, Deserialize)]
struct VariantInput {
    label: String,
    price: Decimal,
    original_price: Option<Decimal>,
    #[serde(default)]
    stock: i32,
}

/// Request to update a product (JSON, partial).
#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<CategoryId>,
    pub sub_category_id: Option<CategoryId>,
}

/// `GET /products` - listed products, for the store.
///
/// # Errors
///
/// Returns 500 on database failure.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<ProductResponse>>> {
    let products = ProductRepository::new(state.pool()).list_listed().await?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}

/// `GET /products/all` - every product, for the console.
///
/// # Errors
///
/// Returns 500 on database failure.
pub async fn list_all(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductResponse>>> {
    let products = ProductRepository::new(state.pool()).list_all().await?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}

/// `GET /products/{id}`.
///
/// # Errors
///
/// Returns 404 for an unknown ID.
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductResponse>> {
    let product = ProductRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    Ok(Json(product.into()))
}

/// `GET /products/category/{main_id}/{sub_id}` - listed products in a
/// category pair.
///
/// # Errors
///
/// Returns 500 on database failure.
pub async fn list_by_category(
    State(state): State<AppState>,
    Path((main_id, sub_id)): Path<(CategoryId, CategoryId)>,
) -> Result<Json<Vec<ProductResponse>>> {
    let products = ProductRepository::new(state.pool())
        .list_by_category(main_id, sub_id)
        .await?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}

/// `POST /products` - create a product from multipart form data.
///
/// Expected parts: `name`, `description`, `category_id`, optional
/// `sub_category_id`, `variants` (JSON array), and one or more `images`
/// file parts.
///
/// # Errors
///
/// Returns 409 for a duplicate name, 400 for missing fields, 502 if the
/// image host rejects an upload.
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ProductResponse>)> {
    require_write(&admin)?;

    let form = ProductForm::read(multipart).await?;
    let name = form
        .name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("product name is required".to_owned()))?;
    let category_id = form
        .category_id
        .ok_or_else(|| AppError::BadRequest("category_id is required".to_owned()))?;
    if form.variants.is_empty() {
        return Err(AppError::BadRequest(
            "at least one variant is required".to_owned(),
        ));
    }

    let repo = ProductRepository::new(state.pool());
    if repo.name_exists(name, None).await? {
        return Err(AppError::Conflict("product name already exists".to_owned()));
    }
    if CategoryRepository::new(state.pool())
        .get_by_id(category_id)
        .await?
        .is_none()
    {
        return Err(AppError::BadRequest(format!(
            "unknown category {category_id}"
        )));
    }

    // Upload before insert so a rejected image never leaves a half-created
    // product behind
    let mut images = Vec::with_capacity(form.images.len());
    for (filename, bytes) in form.images {
        let uploaded = state.media().upload_image(bytes, &filename).await?;
        images.push(uploaded.secure_url);
    }

    let variants: Vec<NewVariant> = form
        .variants
        .into_iter()
        .map(|v| NewVariant {
            label: v.label,
            price: v.price,
            original_price: v.original_price,
            stock: v.stock,
        })
        .collect();

    let product = repo
        .create(
            name,
            form.description.as_deref().unwrap_or("").trim(),
            category_id,
            form.sub_category_id,
            &images,
            &variants,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(product.into())))
}

/// `PUT /products/{id}` - partial update.
///
/// # Errors
///
/// Returns 404 for an unknown ID, 409 for a name collision.
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>> {
    require_write(&admin)?;

    let repo = ProductRepository::new(state.pool());

    if let Some(name) = body.name.as_deref().map(str::trim) {
        if name.is_empty() {
            return Err(AppError::BadRequest("product name cannot be empty".to_owned()));
        }
        if repo.name_exists(name, Some(id)).await? {
            return Err(AppError::Conflict("product name already exists".to_owned()));
        }
    }

    let product = repo
        .update(
            id,
            &ProductChanges {
                name: body.name.map(|n| n.trim().to_owned()),
                description: body.description,
                category_id: body.category_id,
                sub_category_id: body.sub_category_id.map(Some),
            },
        )
        .await?;
    Ok(Json(product.into()))
}

/// `PATCH /products/{id}/images/{index}` - replace one image slot.
///
/// Takes a multipart body with a single `image` file part.
///
/// # Errors
///
/// Returns 404 for an unknown product, 400 for an out-of-range index or
/// missing file, 502 if the image host rejects the upload.
pub async fn update_image(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path((id, index)): Path<(ProductId, usize)>,
    mut multipart: Multipart,
) -> Result<Json<ProductResponse>> {
    require_write(&admin)?;

    let repo = ProductRepository::new(state.pool());
    let product = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    if index >= product.images.len() {
        return Err(AppError::BadRequest(format!(
            "image index {index} out of range (product has {})",
            product.images.len()
        )));
    }

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        if field.name() == Some("image") {
            let filename = field.file_name().unwrap_or("image").to_owned();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("failed to read upload: {e}")))?;
            upload = Some((filename, bytes.to_vec()));
        }
    }
    let (filename, bytes) =
        upload.ok_or_else(|| AppError::BadRequest("an 'image' file part is required".to_owned()))?;

    let uploaded = state.media().upload_image(bytes, &filename).await?;

    let mut images = product.images;
    if let Some(slot) = images.get_mut(index) {
        *slot = uploaded.secure_url;
    }
    repo.replace_images(id, &images).await?;

    let refreshed = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    Ok(Json(refreshed.into()))
}

/// `POST /products/{id}/list` - make the product visible.
///
/// Already-listed products are a no-op success.
///
/// # Errors
///
/// Returns 404 for an unknown ID.
pub async fn list_product(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductResponse>> {
    require_write(&admin)?;
    let product = ProductRepository::new(state.pool()).set_listed(id, true).await?;
    Ok(Json(product.into()))
}

/// `POST /products/{id}/unlist` - hide the product from the store.
///
/// Already-unlisted products are a no-op success.
///
/// # Errors
///
/// Returns 404 for an unknown ID.
pub async fn unlist_product(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductResponse>> {
    require_write(&admin)?;
    let product = ProductRepository::new(state.pool()).set_listed(id, false).await?;
    Ok(Json(product.into()))
}

/// `DELETE /products/{id}` - irreversible delete.
///
/// # Errors
///
/// Returns 404 for an unknown ID.
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    require_write(&admin)?;
    ProductRepository::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Accumulated multipart fields for product creation.
struct ProductForm {
    name: Option<String>,
    description: Option<String>,
    category_id: Option<CategoryId>,
    sub_category_id: Option<CategoryId>,
    variants: Vec<VariantInput>,
    images: Vec<(String, Vec<u8>)>,
}

impl ProductForm {
    async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = Self {
            name: None,
            description: None,
            category_id: None,
            sub_category_id: None,
            variants: Vec::new(),
            images: Vec::new(),
        };

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?
        {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            match name.as_str() {
                "images" => {
                    let filename = field.file_name().unwrap_or("image").to_owned();
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(format!("failed to read upload: {e}")))?;
                    form.images.push((filename, bytes.to_vec()));
                }
                "name" => form.name = Some(read_text(field).await?),
                "description" => form.description = Some(read_text(field).await?),
                "category_id" => {
                    form.category_id = Some(parse_id(&read_text(field).await?, "category_id")?);
                }
                "sub_category_id" => {
                    let text = read_text(field).await?;
                    if !text.trim().is_empty() {
                        form.sub_category_id = Some(parse_id(&text, "sub_category_id")?);
                    }
                }
                "variants" => {
                    let text = read_text(field).await?;
                    form.variants = serde_json::from_str(&text).map_err(|e| {
                        AppError::BadRequest(format!("invalid variants payload: {e}"))
                    })?;
                }
                _ => {}
            }
        }

        Ok(form)
    }
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart field: {e}")))
}

fn parse_id(text: &str, what: &str) -> Result<CategoryId> {
    text.trim()
        .parse::<i32>()
        .map(CategoryId::new)
        .map_err(|_| AppError::BadRequest(format!("invalid {what}: {text}")))
}
