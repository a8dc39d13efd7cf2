//! API integration tests against a running server
//!
//! Expects a migrated database seeded with staff 1 and reader 1 at library 1,
//! and the server's JWT secret in `JWT_SECRET`.

use chrono::{Duration, Utc};
use circulation_server::models::StaffClaims;
use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Helper to mint a desk token signed with the server's secret
fn get_auth_token() -> String {
    let secret = std::env::var("JWT_SECRET")
        .unwrap_or_else(|_| "change-this-secret-in-production".to_string());
    let now = Utc::now();
    StaffClaims {
        sub: "integration".to_string(),
        staff_id: 1,
        library_id: 1,
        circulation: true,
        exp: (now + Duration::hours(1)).timestamp(),
        iat: now.timestamp(),
    }
    .create_token(&secret)
    .expect("Failed to sign token")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_readiness_reaches_database() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_rejects_missing_token() {
    let client = Client::new();

    let response = client
        .get(format!("{}/stats/loans", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_reader_eligibility() {
    let client = Client::new();
    let token = get_auth_token();

    let response = client
        .get(format!("{}/readers/1/eligibility", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["eligible"].is_boolean());
    assert!(body["reasons"].is_array());
}

#[tokio::test]
#[ignore]
async fn test_lend_and_return_copy() {
    let client = Client::new();
    let token = get_auth_token();
    let copy_id = std::env::var("TEST_COPY_ID")
        .ok()
        .and_then(|v| v.parse::<i32>().ok())
        .unwrap_or(1);

    let response = client
        .post(format!("{}/loans", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "reader_id": 1,
            "copy_id": copy_id
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["loan"]["status"], "open");

    // Same copy cannot be lent twice
    let response = client
        .post(format!("{}/loans", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "reader_id": 1,
            "copy_id": copy_id
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 409);

    // Cleanup: check the copy back in
    let response = client
        .post(format!("{}/copies/{}/return", BASE_URL, copy_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["loan"]["status"], "returned");
}

#[tokio::test]
#[ignore]
async fn test_loan_stats() {
    let client = Client::new();
    let token = get_auth_token();

    let response = client
        .get(format!("{}/stats/loans", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["open"].is_number());
    assert!(body["overdue"].is_number());
}
