//! Router tests over an in-memory store

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use circulation_server::{
    api,
    circulation::{CirculationEngine, SystemClock},
    config::AppConfig,
    models::{Copy, CopyStatus, Reader, Staff, StaffClaims},
    repository::memory::{MemoryAuditLog, MemoryStore},
    services::Services,
    AppState,
};

struct TestApp {
    router: Router,
    secret: String,
}

async fn test_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    store
        .insert_staff(Staff {
            id: 1,
            library_id: 1,
            active: true,
            display_name: None,
        })
        .await;
    store
        .insert_reader(Reader {
            id: 1,
            active: true,
            blocked_until: None,
            library_id: 1,
            display_name: Some("Lin".to_string()),
            email: None,
        })
        .await;
    store
        .insert_reader(Reader {
            id: 2,
            active: false,
            blocked_until: Some(Utc::now() + Duration::days(30)),
            library_id: 1,
            display_name: None,
            email: None,
        })
        .await;
    for id in 1..=2 {
        store
            .insert_copy(Copy {
                id,
                library_id: 1,
                status: CopyStatus::Available,
                barcode: Some(format!("BC-{}", id)),
                title: Some("Dune".to_string()),
            })
            .await;
    }

    let config = AppConfig::default();
    let engine = CirculationEngine::new(
        store,
        Arc::new(MemoryAuditLog::new()),
        Arc::new(SystemClock),
        config.circulation.clone(),
    );
    let services = Services::new(engine, config.email.clone());
    let secret = config.auth.jwt_secret.clone();

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };
    TestApp {
        router: api::create_router(state),
        secret,
    }
}

impl TestApp {
    fn token(&self, circulation: bool) -> String {
        let now = Utc::now();
        StaffClaims {
            sub: "desk-1".to_string(),
            staff_id: 1,
            library_id: 1,
            circulation,
            exp: (now + Duration::hours(1)).timestamp(),
            iat: now.timestamp(),
        }
        .create_token(&self.secret)
        .unwrap()
    }

    async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}

#[tokio::test]
async fn health_and_readiness() {
    let app = test_app().await;
    let (status, body) = app.call(Method::GET, "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = app.call(Method::GET, "/api/v1/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn loan_requires_token_and_rights() {
    let app = test_app().await;
    let request = json!({ "reader_id": 1, "copy_id": 1 });

    let (status, _) = app
        .call(Method::POST, "/api/v1/loans", None, Some(request.clone()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = app.token(false);
    let (status, body) = app
        .call(Method::POST, "/api/v1/loans", Some(&token), Some(request))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "NotAuthorized");
}

#[tokio::test]
async fn lend_renew_and_return() {
    let app = test_app().await;
    let token = app.token(true);

    let (status, body) = app
        .call(
            Method::POST,
            "/api/v1/loans",
            Some(&token),
            Some(json!({ "reader_id": 1, "copy_id": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["loan"]["status"], "open");
    assert_eq!(body["audit"]["status"], "recorded");
    let loan_id = body["loan"]["id"].as_i64().unwrap();

    let (status, body) = app
        .call(Method::GET, &format!("/api/v1/loans/{}", loan_id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["copy_title"], "Dune");
    assert_eq!(body["is_overdue"], false);

    let (status, body) = app
        .call(Method::POST, "/api/v1/copies/1/renew", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["loan"]["renewal_count"], 1);

    let (status, body) = app
        .call(Method::POST, &format!("/api/v1/loans/{}/return", loan_id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["was_overdue"], false);
    assert_eq!(body["loan"]["status"], "returned");

    let (status, body) = app
        .call(Method::POST, &format!("/api/v1/loans/{}/return", loan_id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "LoanNotOpen");
}

#[tokio::test]
async fn ineligible_reader_gets_every_reason() {
    let app = test_app().await;
    let token = app.token(true);

    let (status, body) = app
        .call(Method::GET, "/api/v1/readers/2/eligibility", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["eligible"], false);
    assert_eq!(body["reasons"], json!(["reader_inactive", "reader_blocked"]));

    let (status, body) = app
        .call(
            Method::POST,
            "/api/v1/loans",
            Some(&token),
            Some(json!({ "reader_id": 2, "copy_id": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["reasons"], json!(["reader_inactive", "reader_blocked"]));
}

#[tokio::test]
async fn invalid_and_unknown_ids() {
    let app = test_app().await;
    let token = app.token(true);

    let (status, body) = app
        .call(
            Method::POST,
            "/api/v1/loans",
            Some(&token),
            Some(json!({ "reader_id": 0, "copy_id": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");

    let (status, body) = app
        .call(Method::GET, "/api/v1/readers/42/loans", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NoSuchUser");

    let (status, _) = app
        .call(Method::GET, "/api/v1/loans/42/notification", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stats_count_open_loans() {
    let app = test_app().await;
    let token = app.token(true);
    app.call(
        Method::POST,
        "/api/v1/loans",
        Some(&token),
        Some(json!({ "reader_id": 1, "copy_id": 2 })),
    )
    .await;

    let (status, body) = app
        .call(Method::GET, "/api/v1/stats/loans", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "open": 1, "overdue": 0 }));
}
