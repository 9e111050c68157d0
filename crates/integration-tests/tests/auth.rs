//! Authentication flow tests: OTP registration, login, sessions.
//!
//! These tests require:
//! - A running server (cargo run -p clove-server)
//! - A migrated database with the test accounts described in the crate docs
//!
//! The OTP itself is delivered over SMTP and never echoed by the API, so the
//! happy-path verification is covered by asserting the failure modes around
//! it (wrong code, expired/absent pending entry) plus the login flow for an
//! already-verified account.

use reqwest::StatusCode;
use serde_json::json;

use clove_integration_tests::{admin_client, base_url, client, unique_email, user_client};

fn register_body(email: &str) -> serde_json::Value {
    json!({
        "email": email,
        "name": "Integration Test",
        "phone": "+15550100200",
        "password": "correct horse battery",
    })
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_register_new_email_accepted() {
    let email = unique_email("register");
    let resp = client()
        .post(format!("{}/auth/register", base_url()))
        .json(&register_body(&email))
        .send()
        .await
        .expect("Failed to post registration");

    assert_eq!(resp.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
#[ignore = "Requires running server and test accounts"]
async fn test_register_existing_email_rejected() {
    let email = std::env::var("CLOVE_TEST_USER_EMAIL").expect("CLOVE_TEST_USER_EMAIL not set");
    let resp = client()
        .post(format!("{}/auth/register", base_url()))
        .json(&register_body(&email))
        .send()
        .await
        .expect("Failed to post registration");

    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_register_invalid_email_rejected() {
    let resp = client()
        .post(format!("{}/auth/register", base_url()))
        .json(&register_body("not-an-email"))
        .send()
        .await
        .expect("Failed to post registration");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_verify_wrong_code_rejected() {
    let email = unique_email("verify");
    let http = client();

    let resp = http
        .post(format!("{}/auth/register", base_url()))
        .json(&register_body(&email))
        .send()
        .await
        .expect("Failed to post registration");
    assert_eq!(resp.status(), StatusCode::ACCEPTED);

    // The real code went out by mail; any six digits we pick here are wrong
    // with overwhelming probability
    let resp = http
        .post(format!("{}/auth/register/verify", base_url()))
        .json(&json!({ "email": email, "otp": "000000" }))
        .send()
        .await
        .expect("Failed to post verification");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_verify_without_pending_registration_rejected() {
    let resp = client()
        .post(format!("{}/auth/register/verify", base_url()))
        .json(&json!({ "email": unique_email("absent"), "otp": "123456" }))
        .send()
        .await
        .expect("Failed to post verification");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Login & sessions
// ============================================================================

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_login_bad_credentials_rejected() {
    let resp = client()
        .post(format!("{}/auth/login", base_url()))
        .json(&json!({ "email": unique_email("nobody"), "password": "wrong" }))
        .send()
        .await
        .expect("Failed to post login");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_me_requires_session() {
    let resp = client()
        .get(format!("{}/auth/me", base_url()))
        .send()
        .await
        .expect("Failed to get profile");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running server and test accounts"]
async fn test_login_me_logout_roundtrip() {
    let http = user_client().await;

    let resp = http
        .get(format!("{}/auth/me", base_url()))
        .send()
        .await
        .expect("Failed to get profile");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: serde_json::Value = resp.json().await.expect("Failed to parse profile");
    assert_eq!(
        body["email"].as_str(),
        std::env::var("CLOVE_TEST_USER_EMAIL").ok().as_deref()
    );

    let resp = http
        .post(format!("{}/auth/logout", base_url()))
        .send()
        .await
        .expect("Failed to post logout");
    assert_eq!(resp.status(), StatusCode::OK);

    // Session is gone
    let resp = http
        .get(format!("{}/auth/me", base_url()))
        .send()
        .await
        .expect("Failed to get profile");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running server and test accounts"]
async fn test_admin_session_does_not_satisfy_customer_auth() {
    let http = admin_client().await;

    // An admin session must not look like a customer session
    let resp = http
        .get(format!("{}/auth/me", base_url()))
        .send()
        .await
        .expect("Failed to get profile");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
