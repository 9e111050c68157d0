//! Health endpoint tests.
//!
//! These tests require a running server (cargo run -p clove-server).

use reqwest::StatusCode;

use clove_integration_tests::{base_url, client};

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_health_liveness() {
    let resp = client()
        .get(format!("{}/health", base_url()))
        .send()
        .await
        .expect("Failed to reach /health");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.expect("Failed to read body"), "ok");
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_health_readiness() {
    let resp = client()
        .get(format!("{}/health/ready", base_url()))
        .send()
        .await
        .expect("Failed to reach /health/ready");

    assert_eq!(resp.status(), StatusCode::OK);
}
