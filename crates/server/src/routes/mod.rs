//! HTTP route handlers for the Clove REST API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (database)
//!
//! # Auth (strict rate limit)
//! POST /auth/register                   - Start OTP registration
//! POST /auth/register/verify            - Complete registration with the OTP
//! POST /auth/login                      - Customer login
//! POST /auth/admin/login                - Console operator login
//! POST /auth/logout                     - Drop the session
//! GET  /auth/me                         - Logged-in customer profile
//!
//! # Catalog
//! GET  /categories                      - Listed categories
//! GET  /categories/all                  - All categories (admin)
//! GET  /categories/{id}                 - Category detail
//! POST /categories                      - Create category (admin)
//! PUT  /categories/{id}                 - Update category (admin)
//! POST /categories/{id}/list            - List (idempotent, admin)
//! POST /categories/{id}/unlist          - Unlist (idempotent, admin)
//! DELETE /categories/{id}               - Delete (admin)
//!
//! GET  /products                        - Listed products
//! GET  /products/all                    - All products (admin)
//! GET  /products/{id}                   - Product detail
//! GET  /products/category/{main}/{sub}  - Products in a sub category
//! POST /products                        - Create product (admin, multipart)
//! PUT  /products/{id}                   - Update product (admin)
//! PATCH /products/{id}/images/{index}   - Replace one image (admin, multipart)
//! POST /products/{id}/list              - List (idempotent, admin)
//! POST /products/{id}/unlist            - Unlist (idempotent, admin)
//! DELETE /products/{id}                 - Delete (admin)
//!
//! # Cart & checkout
//! GET  /cart                            - Active cart with totals
//! POST /cart/items                      - Add/merge a line
//! PUT  /cart/items/{id}                 - Change quantity (0 removes)
//! DELETE /cart/items/{id}               - Remove a line
//! DELETE /cart                          - Empty the cart
//! POST /checkout                        - Place an order from the cart
//!
//! # Orders (customer)
//! GET  /orders                          - Order history
//! GET  /orders/{id}                     - Order detail (owner only)
//! POST /orders/{id}/pay/verify          - Re-run gateway verification
//! POST /orders/{id}/cancel              - Cancel before shipping
//! POST /orders/{id}/return              - Request a return after delivery
//!
//! # Console (admin)
//! GET  /admin/users                     - Customers
//! POST /admin/users/{id}/block          - Block (idempotent)
//! POST /admin/users/{id}/unblock        - Unblock (idempotent)
//! GET  /admin/orders                    - All orders (?status= filter)
//! GET  /admin/orders/{id}               - Any order
//! POST /admin/orders/{id}/ship          - processing -> shipped
//! POST /admin/orders/{id}/deliver       - shipped -> delivered
//! POST /admin/orders/{id}/cancel        - Cancel on the customer's behalf
//! POST /admin/orders/{id}/return/approve
//! POST /admin/orders/{id}/return/reject
//! POST /admin/orders/{id}/refund/complete
//! POST /admin/orders/{id}/refund/fail
//! POST /admin/orders/{id}/refund/retry
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod checkout;
pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{get, patch, post, put},
};

use crate::error::AppError;
use crate::middleware::rate_limit;
use crate::models::CurrentAdmin;
use crate::state::AppState;

/// Refuse read-only roles on mutating endpoints.
///
/// # Errors
///
/// Returns `AppError::Forbidden` for viewers.
pub fn require_write(admin: &CurrentAdmin) -> Result<(), AppError> {
    if admin.role.can_write() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "this role has read-only access".to_owned(),
        ))
    }
}

/// Create the auth routes router.
///
/// Carries the strict rate limiter: these are the endpoints brute force
/// goes after.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/register/verify", post(auth::verify_registration))
        .route("/login", post(auth::login))
        .route("/admin/login", post(auth::admin_login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .layer(rate_limit::auth_rate_limiter())
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::list).post(categories::create))
        .route("/all", get(categories::list_all))
        .route(
            "/{id}",
            get(categories::get)
                .put(categories::update)
                .delete(categories::delete),
        )
        .route("/{id}/list", post(categories::list_category))
        .route("/{id}/unlist", post(categories::unlist_category))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list).post(products::create))
        .route("/all", get(products::list_all))
        .route(
            "/{id}",
            get(products::get)
                .put(products::update)
                .delete(products::delete),
        )
        .route("/category/{main_id}/{sub_id}", get(products::list_by_category))
        .route("/{id}/images/{index}", patch(products::update_image))
        .route("/{id}/list", post(products::list_product))
        .route("/{id}/unlist", post(products::unlist_product))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add_item))
        .route(
            "/items/{id}",
            put(cart::update_item).delete(cart::remove_item),
        )
}

/// Create the customer order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list))
        .route("/{id}", get(orders::get))
        .route("/{id}/pay/verify", post(orders::verify_payment))
        .route("/{id}/cancel", post(orders::cancel))
        .route("/{id}/return", post(orders::request_return))
}

/// Create the console routes router, nested under `/admin`.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(admin::users::list))
        .route("/users/{id}/block", post(admin::users::block))
        .route("/users/{id}/unblock", post(admin::users::unblock))
        .route("/orders", get(admin::orders::list))
        .route("/orders/{id}", get(admin::orders::get))
        .route("/orders/{id}/ship", post(admin::orders::ship))
        .route("/orders/{id}/deliver", post(admin::orders::deliver))
        .route("/orders/{id}/cancel", post(admin::orders::cancel))
        .route(
            "/orders/{id}/return/approve",
            post(admin::orders::approve_return),
        )
        .route(
            "/orders/{id}/return/reject",
            post(admin::orders::reject_return),
        )
        .route(
            "/orders/{id}/refund/complete",
            post(admin::orders::complete_refund),
        )
        .route("/orders/{id}/refund/fail", post(admin::orders::fail_refund))
        .route("/orders/{id}/refund/retry", post(admin::orders::retry_refund))
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/categories", category_routes())
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .route("/checkout", post(checkout::place_order))
        .nest("/orders", order_routes())
        .nest("/admin", admin_routes())
        .layer(rate_limit::api_rate_limiter())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Route registration panics at router build time on malformed paths or
    // duplicate method/path pairs, so constructing the full tree is itself
    // the assertion.
    #[test]
    fn test_routes_build() {
        let _router: Router<AppState> = routes();
    }
}
