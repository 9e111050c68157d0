//! Integration tests for Clove.
//!
//! The tests in `tests/` drive a running server over HTTP; they are all
//! `#[ignore]`d so `cargo test` stays hermetic.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database, migrate, and seed fixtures
//! docker compose up -d postgres
//! cargo run -p clove-cli -- migrate
//! cargo run -p clove-cli -- admin create -e admin@test.local -n "Test Admin" -p test-admin-pw
//!
//! # Start the server, then:
//! cargo test -p clove-integration-tests -- --ignored
//! ```
//!
//! # Environment
//!
//! - `CLOVE_BASE_URL` - server under test (default `http://localhost:4000`)
//! - `CLOVE_TEST_ADMIN_EMAIL` / `CLOVE_TEST_ADMIN_PASSWORD` - console
//!   operator credentials for admin-surface tests
//! - `CLOVE_TEST_USER_EMAIL` / `CLOVE_TEST_USER_PASSWORD` - an existing
//!   customer account for cart/checkout tests

use reqwest::Client;
use serde_json::json;

/// Base URL of the server under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("CLOVE_BASE_URL").unwrap_or_else(|_| "http://localhost:4000".to_string())
}

/// A fresh client with a cookie store, not logged in.
///
/// # Panics
///
/// Panics if the TLS backend cannot be initialized.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// A unique email address for registration tests.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", uuid::Uuid::new_v4())
}

/// A unique name for catalog fixtures.
#[must_use]
pub fn unique_name(prefix: &str) -> String {
    format!("{prefix} {}", uuid::Uuid::new_v4())
}

/// Log in as the configured test admin and return the session-carrying
/// client.
///
/// # Panics
///
/// Panics if the credentials are missing from the environment or rejected
/// by the server.
pub async fn admin_client() -> Client {
    let email = std::env::var("CLOVE_TEST_ADMIN_EMAIL").expect("CLOVE_TEST_ADMIN_EMAIL not set");
    let password =
        std::env::var("CLOVE_TEST_ADMIN_PASSWORD").expect("CLOVE_TEST_ADMIN_PASSWORD not set");

    let client = client();
    let resp = client
        .post(format!("{}/auth/admin/login", base_url()))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("admin login request failed");
    assert!(
        resp.status().is_success(),
        "admin login rejected: {}",
        resp.status()
    );
    client
}

/// Log in as the configured test customer and return the session-carrying
/// client.
///
/// # Panics
///
/// Panics if the credentials are missing from the environment or rejected
/// by the server.
pub async fn user_client() -> Client {
    let email = std::env::var("CLOVE_TEST_USER_EMAIL").expect("CLOVE_TEST_USER_EMAIL not set");
    let password =
        std::env::var("CLOVE_TEST_USER_PASSWORD").expect("CLOVE_TEST_USER_PASSWORD not set");

    let client = client();
    let resp = client
        .post(format!("{}/auth/login", base_url()))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("customer login request failed");
    assert!(
        resp.status().is_success(),
        "customer login rejected: {}",
        resp.status()
    );
    client
}
