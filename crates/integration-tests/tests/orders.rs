//! Cart, checkout, and order lifecycle tests.
//!
//! These tests require:
//! - A running server (cargo run -p clove-server)
//! - A migrated, seeded database (clove migrate && clove seed)
//! - The test customer and admin accounts described in the crate docs

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use clove_integration_tests::{admin_client, base_url, client, user_client};

fn shipping_address() -> Value {
    json!({
        "full_name": "Integration Test",
        "address_line1": "1 Test Street",
        "city": "Testville",
        "postal_code": "00100",
        "country": "US",
        "phone": "+15550100200",
    })
}

/// Test helper: empty the customer's cart.
async fn clear_cart(http: &Client) {
    let resp = http
        .delete(format!("{}/cart", base_url()))
        .send()
        .await
        .expect("Failed to clear cart");
    assert_eq!(resp.status(), StatusCode::OK);
}

/// Test helper: find a seeded product with at least one variant.
async fn any_listed_product() -> Value {
    let resp = client()
        .get(format!("{}/products", base_url()))
        .send()
        .await
        .expect("Failed to list products");
    let products: Vec<Value> = resp.json().await.expect("Failed to parse products");

    products
        .into_iter()
        .find(|p| p["variants"].as_array().is_some_and(|v| !v.is_empty()))
        .expect("No seeded product with variants; run `clove seed`")
}

// ============================================================================
// Cart
// ============================================================================

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_cart_requires_session() {
    let resp = client()
        .get(format!("{}/cart", base_url()))
        .send()
        .await
        .expect("Failed to get cart");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running server, seed data, and test accounts"]
async fn test_cart_roundtrip() {
    let http = user_client().await;
    clear_cart(&http).await;

    let product = any_listed_product().await;
    let product_id = &product["id"];
    let variant = &product["variants"][0];

    // Add two of a variant
    let resp = http
        .post(format!("{}/cart/items", base_url()))
        .json(&json!({
            "product_id": product_id,
            "variant_id": variant["id"],
            "quantity": 2,
        }))
        .send()
        .await
        .expect("Failed to add cart item");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let cart: Value = resp.json().await.expect("Failed to parse cart");
    assert_eq!(cart["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(cart["items"][0]["quantity"], json!(2));

    // Adding the same variant again accumulates instead of duplicating
    let resp = http
        .post(format!("{}/cart/items", base_url()))
        .json(&json!({
            "product_id": product_id,
            "variant_id": variant["id"],
            "quantity": 1,
        }))
        .send()
        .await
        .expect("Failed to add cart item");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let cart: Value = resp.json().await.expect("Failed to parse cart");
    assert_eq!(cart["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(cart["items"][0]["quantity"], json!(3));

    // Setting the quantity to zero removes the line
    let item_id = cart["items"][0]["id"].as_i64().expect("cart item id");
    let resp = http
        .put(format!("{}/cart/items/{item_id}", base_url()))
        .json(&json!({ "quantity": 0 }))
        .send()
        .await
        .expect("Failed to update cart item");
    assert_eq!(resp.status(), StatusCode::OK);

    let cart: Value = resp.json().await.expect("Failed to parse cart");
    assert_eq!(cart["items"].as_array().map(Vec::len), Some(0));
}

// ============================================================================
// Checkout
// ============================================================================

#[tokio::test]
#[ignore = "Requires running server and test accounts"]
async fn test_checkout_empty_cart_rejected() {
    let http = user_client().await;
    clear_cart(&http).await;

    let resp = http
        .post(format!("{}/checkout", base_url()))
        .json(&json!({
            "payment_method": "cod",
            "shipping_address": shipping_address(),
        }))
        .send()
        .await
        .expect("Failed to post checkout");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running server and test accounts"]
async fn test_checkout_online_method_needs_transaction_id() {
    let http = user_client().await;

    let resp = http
        .post(format!("{}/checkout", base_url()))
        .json(&json!({
            "payment_method": "stripe",
            "shipping_address": shipping_address(),
        }))
        .send()
        .await
        .expect("Failed to post checkout");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running server, seed data, and test accounts"]
async fn test_cod_order_lifecycle() {
    let http = user_client().await;
    clear_cart(&http).await;

    let product = any_listed_product().await;
    let resp = http
        .post(format!("{}/cart/items", base_url()))
        .json(&json!({
            "product_id": product["id"],
            "variant_id": product["variants"][0]["id"],
            "quantity": 1,
        }))
        .send()
        .await
        .expect("Failed to add cart item");
    assert_eq!(resp.status(), StatusCode::CREATED);

    // Place a cash-on-delivery order
    let resp = http
        .post(format!("{}/checkout", base_url()))
        .json(&json!({
            "payment_method": "cod",
            "shipping_address": shipping_address(),
        }))
        .send()
        .await
        .expect("Failed to post checkout");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let order: Value = resp.json().await.expect("Failed to parse order");
    let order_id = order["id"].as_i64().expect("order id");
    assert_eq!(order["order_status"], json!("processing"));
    assert_eq!(order["payment_status"], json!("pending"));
    assert_eq!(order["return_status"], json!("not_requested"));
    assert_eq!(order["refund_status"], json!("not_initiated"));

    // The cart was retired at placement
    let resp = http
        .get(format!("{}/cart", base_url()))
        .send()
        .await
        .expect("Failed to get cart");
    let cart: Value = resp.json().await.expect("Failed to parse cart");
    assert_eq!(cart["items"].as_array().map(Vec::len), Some(0));

    // Admin walks the order through the fulfillment flow
    let admin = admin_client().await;

    let resp = admin
        .post(format!("{}/admin/orders/{order_id}/ship", base_url()))
        .json(&json!({ "tracking_id": "TRACK-1234" }))
        .send()
        .await
        .expect("Failed to ship order");
    assert_eq!(resp.status(), StatusCode::OK);
    let order: Value = resp.json().await.expect("Failed to parse order");
    assert_eq!(order["order_status"], json!("shipped"));

    // A shipped order can no longer be cancelled
    let resp = http
        .post(format!("{}/orders/{order_id}/cancel", base_url()))
        .json(&json!({ "reason": "changed my mind" }))
        .send()
        .await
        .expect("Failed to post cancellation");
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // Delivery settles the COD payment
    let resp = admin
        .post(format!("{}/admin/orders/{order_id}/deliver", base_url()))
        .send()
        .await
        .expect("Failed to deliver order");
    assert_eq!(resp.status(), StatusCode::OK);
    let order: Value = resp.json().await.expect("Failed to parse order");
    assert_eq!(order["order_status"], json!("delivered"));
    assert_eq!(order["payment_status"], json!("completed"));

    // Return flow: request (customer), approve (admin), refund initiates
    let resp = http
        .post(format!("{}/orders/{order_id}/return", base_url()))
        .send()
        .await
        .expect("Failed to request return");
    assert_eq!(resp.status(), StatusCode::OK);
    let order: Value = resp.json().await.expect("Failed to parse order");
    assert_eq!(order["return_status"], json!("requested"));

    let resp = admin
        .post(format!(
            "{}/admin/orders/{order_id}/return/approve",
            base_url()
        ))
        .send()
        .await
        .expect("Failed to approve return");
    assert_eq!(resp.status(), StatusCode::OK);
    let order: Value = resp.json().await.expect("Failed to parse order");
    assert_eq!(order["return_status"], json!("approved"));
    assert_eq!(order["refund_status"], json!("initiated"));

    let resp = admin
        .post(format!(
            "{}/admin/orders/{order_id}/refund/complete",
            base_url()
        ))
        .send()
        .await
        .expect("Failed to complete refund");
    assert_eq!(resp.status(), StatusCode::OK);
    let order: Value = resp.json().await.expect("Failed to parse order");
    assert_eq!(order["refund_status"], json!("completed"));
}

// ============================================================================
// Admin order surface
// ============================================================================

#[tokio::test]
#[ignore = "Requires running server and test admin"]
async fn test_admin_order_list_filters_by_status() {
    let http = admin_client().await;

    let resp = http
        .get(format!("{}/admin/orders?status=processing", base_url()))
        .send()
        .await
        .expect("Failed to list orders");
    assert_eq!(resp.status(), StatusCode::OK);

    let orders: Vec<Value> = resp.json().await.expect("Failed to parse orders");
    assert!(
        orders
            .iter()
            .all(|o| o["order_status"] == json!("processing"))
    );
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_admin_orders_require_admin_session() {
    let resp = client()
        .get(format!("{}/admin/orders", base_url()))
        .send()
        .await
        .expect("Failed to list orders");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
