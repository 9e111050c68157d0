//! Cart handlers. All routes require a logged-in customer.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use clove_core::{CartId, CartItemId, ProductId, VariantId};

use crate::db::{CartRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::middleware::auth::RequireUser;
use crate::models::{Cart, CartLine};
use crate::state::AppState;

/// Highest quantity a single line may hold.
const MAX_LINE_QUANTITY: i32 = 99;

/// The cart, as returned by the API.
#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub id: CartId,
    pub items: Vec<CartLineResponse>,
    pub subtotal: Decimal,
}

/// One cart line, as returned by the API.
#[derive(Debug, Serialize)]
pub struct CartLineResponse {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub variant_id: VariantId,
    pub variant_label: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}

impl TryFrom<Cart> for CartResponse {
    type Error = AppError;

    fn try_from(cart: Cart) -> Result<Self> {
        let subtotal = cart
            .subtotal()
            .ok_or_else(|| AppError::Internal("cart subtotal overflow".to_owned()))?;
        let items = cart
            .items
            .into_iter()
            .map(CartLineResponse::try_from)
            .collect::<Result<_>>()?;
        Ok(Self {
            id: cart.id,
            items,
            subtotal,
        })
    }
}

impl TryFrom<CartLine> for CartLineResponse {
    type Error = AppError;

    fn try_from(line: CartLine) -> Result<Self> {
        let line_total = line
            .unit_price
            .checked_mul(Decimal::from(line.quantity))
            .ok_or_else(|| AppError::Internal("cart line overflow".to_owned()))?;
        Ok(Self {
            id: line.id,
            product_id: line.product_id,
            product_name: line.product_name,
            variant_id: line.variant_id,
            variant_label: line.variant_label,
            unit_price: line.unit_price,
            quantity: line.quantity,
            line_total,
        })
    }
}

/// Request to add a variant to the cart.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub quantity: i32,
}

/// Request to change a line's quantity. Zero removes the line.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i32,
}

/// `GET /cart` - the active cart.
///
/// # Errors
///
/// Returns 500 on database failure.
pub async fn show(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
) -> Result<Json<CartResponse>> {
    let cart = CartRepository::new(state.pool())
        .get_or_create_active(user.id)
        .await?;
    Ok(Json(cart.try_into()?))
}

/// `POST /cart/items` - add a variant; an existing line accumulates.
///
/// # Errors
///
/// Returns 400 for a bad quantity, unknown variant, mismatched product, or
/// unlisted product.
pub async fn add_item(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Json(body): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<CartResponse>)> {
    if !(1..=MAX_LINE_QUANTITY).contains(&body.quantity) {
        return Err(AppError::BadRequest(format!(
            "quantity must be between 1 and {MAX_LINE_QUANTITY}"
        )));
    }

    let (variant, product_listed) = ProductRepository::new(state.pool())
        .get_variant(body.variant_id)
        .await?
        .ok_or_else(|| AppError::BadRequest(format!("unknown variant {}", body.variant_id)))?;

    if variant.product_id != body.product_id {
        return Err(AppError::BadRequest(
            "variant does not belong to this product".to_owned(),
        ));
    }
    if !product_listed {
        return Err(AppError::BadRequest(
            "product is not available for purchase".to_owned(),
        ));
    }

    let repo = CartRepository::new(state.pool());
    let cart = repo.get_or_create_active(user.id).await?;
    repo.add_item(cart.id, body.product_id, body.variant_id, body.quantity)
        .await?;

    let refreshed = repo.get_or_create_active(user.id).await?;
    Ok((StatusCode::CREATED, Json(refreshed.try_into()?)))
}

/// `PUT /cart/items/{id}` - set a line's quantity (zero removes it).
///
/// # Errors
///
/// Returns 404 if the line is not in the caller's cart, 400 for a bad
/// quantity.
pub async fn update_item(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(item_id): Path<CartItemId>,
    Json(body): Json<UpdateItemRequest>,
) -> Result<Json<CartResponse>> {
    if !(0..=MAX_LINE_QUANTITY).contains(&body.quantity) {
        return Err(AppError::BadRequest(format!(
            "quantity must be between 0 and {MAX_LINE_QUANTITY}"
        )));
    }

    let repo = CartRepository::new(state.pool());
    let cart = repo.get_or_create_active(user.id).await?;
    repo.set_item_quantity(cart.id, item_id, body.quantity).await?;

    let refreshed = repo.get_or_create_active(user.id).await?;
    Ok(Json(refreshed.try_into()?))
}

/// `DELETE /cart/items/{id}` - remove a line.
///
/// # Errors
///
/// Returns 404 if the line is not in the caller's cart.
pub async fn remove_item(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(item_id): Path<CartItemId>,
) -> Result<Json<CartResponse>> {
    let repo = CartRepository::new(state.pool());
    let cart = repo.get_or_create_active(user.id).await?;
    repo.remove_item(cart.id, item_id).await?;

    let refreshed = repo.get_or_create_active(user.id).await?;
    Ok(Json(refreshed.try_into()?))
}

/// `DELETE /cart` - empty the cart.
///
/// # Errors
///
/// Returns 500 on database failure.
pub async fn clear(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
) -> Result<Json<CartResponse>> {
    let repo = CartRepository::new(state.pool());
    let cart = repo.get_or_create_active(user.id).await?;
    repo.clear(cart.id).await?;

    let refreshed = repo.get_or_create_active(user.id).await?;
    Ok(Json(refreshed.try_into()?))
}
