//! End-to-end router tests over an in-memory database.
//!
//! Each test builds the full middleware stack with `build_router` and
//! drives it through `tower::ServiceExt::oneshot`, so identity
//! resolution, validation, quota checks and ownership scoping are all
//! exercised exactly as a live request would hit them.

use std::str::FromStr;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tower::util::ServiceExt;

use trackd_server::core::build_router;
use trackd_server::{Config, ServerState};

const USER_A: &str = "user-a";
const USER_B: &str = "user-b";

fn stub_config() -> Config {
    Config {
        work_dir: "/tmp/trackd-test".into(),
        http_port: 0,
        database_path: None,
        environment: "development".into(),
        tier_source_url: None,
        tier_source_key: None,
        tier_source_table: "tiers".into(),
        stripe_secret_key: None,
        stripe_webhook_secret: None,
        stripe_api_base: "https://api.stripe.com".into(),
        checkout_success_url: "http://localhost:5173/billing/success".into(),
        checkout_cancel_url: "http://localhost:5173/billing".into(),
        anthropic_api_key: None,
        anthropic_model: "claude-3-5-haiku-latest".into(),
        anthropic_api_base: "https://api.anthropic.com".into(),
    }
}

/// One connection so every statement sees the same in-memory database.
async fn test_state_with(config: Config) -> ServerState {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .pragma("foreign_keys", "ON");
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    ServerState::with_pool(config, pool)
}

async fn test_state() -> ServerState {
    test_state_with(stub_config()).await
}

fn request(method: &str, uri: &str, user_id: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(id) = user_id {
        builder = builder
            .header("x-user-id", id)
            .header("x-user-email", format!("{id}@example.com"));
    }
    match body {
        Some(payload) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn read_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_api_requires_identity() {
    let app = build_router(test_state().await);

    let res = app
        .oneshot(request("GET", "/api/jobs", None, None))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = read_json(res).await;
    assert_eq!(body["code"], "E3001");
}

#[tokio::test]
async fn test_health_is_public() {
    let app = build_router(test_state().await);

    let res = app
        .clone()
        .oneshot(request("GET", "/health", None, None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());

    let res = app
        .oneshot(request("GET", "/health/detailed", None, None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    assert_eq!(body["checks"]["database"]["status"], "ok");
    assert_eq!(body["checks"]["billing"]["status"], "stubbed");
}

#[tokio::test]
async fn test_job_round_trip_maintains_customer_stats() {
    let app = build_router(test_state().await);

    // 1. Create a customer
    let res = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/customers",
            Some(USER_A),
            Some(json!({"name": "Mrs Hughes"})),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let customer = read_json(res).await;
    let customer_id = customer["id"].as_i64().unwrap();

    // 2. Log a linked job
    let res = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/jobs",
            Some(USER_A),
            Some(json!({
                "customerId": customer_id,
                "customerName": "Mrs Hughes",
                "jobType": "Boiler swap",
                "revenue": 600.0,
                "hours": 8.0,
                "status": "completed",
                "date": "2025-06-10"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let job = read_json(res).await;
    let job_id = job["id"].as_i64().unwrap();
    // hourlyRate is always derived server-side
    assert_eq!(job["hourlyRate"].as_f64(), Some(75.0));

    // 3. Customer aggregates were recomputed within the same request
    let res = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/customers/{customer_id}"),
            Some(USER_A),
            None,
        ))
        .await
        .unwrap();
    let customer = read_json(res).await;
    assert_eq!(customer["totalJobs"].as_i64(), Some(1));
    assert_eq!(customer["totalRevenue"].as_f64(), Some(600.0));
    assert_eq!(customer["averageJobValue"].as_f64(), Some(600.0));
    assert_eq!(customer["lastJobDate"], "2025-06-10");

    // 4. Filtered list finds it
    let res = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/jobs?customerId={customer_id}&status=completed"),
            Some(USER_A),
            None,
        ))
        .await
        .unwrap();
    let jobs = read_json(res).await;
    assert_eq!(jobs.as_array().map(Vec::len), Some(1));

    // 5. Deleting the job rolls the aggregates back
    let res = app
        .clone()
        .oneshot(request(
            "DELETE",
            &format!("/api/jobs/{job_id}"),
            Some(USER_A),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(read_json(res).await, Value::Bool(true));

    let res = app
        .oneshot(request(
            "GET",
            &format!("/api/customers/{customer_id}"),
            Some(USER_A),
            None,
        ))
        .await
        .unwrap();
    let customer = read_json(res).await;
    assert_eq!(customer["totalJobs"].as_i64(), Some(0));
    assert_eq!(customer["totalRevenue"].as_f64(), Some(0.0));
}

#[tokio::test]
async fn test_dashboard_reflects_logged_jobs() {
    let app = build_router(test_state().await);

    for (revenue, hours, status) in [(400.0, 4.0, "completed"), (200.0, 4.0, "quoted")] {
        let res = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/jobs",
                Some(USER_A),
                Some(json!({
                    "customerName": "Walk-in",
                    "jobType": "Tap fix",
                    "revenue": revenue,
                    "hours": hours,
                    "status": status,
                    "date": "2025-06-10"
                })),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    let res = app
        .oneshot(request("GET", "/api/analytics/dashboard", Some(USER_A), None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let metrics = read_json(res).await;
    assert_eq!(metrics["totalRevenue"].as_f64(), Some(600.0));
    assert_eq!(metrics["totalHours"].as_f64(), Some(8.0));
    assert_eq!(metrics["averageHourlyRate"].as_f64(), Some(75.0));
    assert_eq!(metrics["totalJobs"].as_i64(), Some(2));
    assert_eq!(metrics["completedJobs"].as_i64(), Some(1));
}

#[tokio::test]
async fn test_tier_catalog_serves_fallback_without_remote_source() {
    let app = build_router(test_state().await);

    let res = app
        .clone()
        .oneshot(request("GET", "/api/config/tiers", Some(USER_A), None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    let names: Vec<&str> = body["tiers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["trial", "basic", "pro"]);

    let res = app
        .clone()
        .oneshot(request("GET", "/api/config/tiers/pro", Some(USER_A), None))
        .await
        .unwrap();
    let body = read_json(res).await;
    assert!(body["tier"]["maxJobsPerMonth"].is_null());

    let res = app
        .oneshot(request("GET", "/api/config/tiers/platinum", Some(USER_A), None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_check_limit_is_caller_scoped() {
    let app = build_router(test_state().await);

    let res = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/config/check-limit",
            Some(USER_A),
            Some(json!({"userId": USER_B, "tierName": "trial", "limitType": "jobs"})),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app
        .oneshot(request(
            "POST",
            "/api/config/check-limit",
            Some(USER_A),
            Some(json!({"userId": USER_A, "tierName": "trial", "limitType": "jobs"})),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let check = read_json(res).await;
    assert_eq!(check["allowed"], Value::Bool(true));
    assert_eq!(check["limit"].as_i64(), Some(25));
    assert_eq!(check["current"].as_i64(), Some(0));
}

#[tokio::test]
async fn test_webhook_rejects_unsigned_payloads() {
    let mut config = stub_config();
    config.stripe_secret_key = Some("sk_test_123".into());
    config.stripe_webhook_secret = Some("whsec_test".into());
    let app = build_router(test_state_with(config).await);

    // No Stripe-Signature header at all
    let res = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/stripe/webhook",
            None,
            Some(json!({"type": "customer.subscription.updated"})),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Garbage signature
    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/stripe/webhook")
                .header("stripe-signature", "t=1,v1=deadbeef")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"type":"customer.subscription.updated"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stubbed_billing_accepts_webhooks_and_skips_checkout() {
    let app = build_router(test_state().await);

    // Unsigned webhook is acknowledged in stub mode
    let res = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/stripe/webhook",
            None,
            Some(json!({"type": "invoice.payment_succeeded"})),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Checkout degrades to a message instead of a hosted URL
    let res = app
        .oneshot(request(
            "POST",
            "/api/stripe/create-checkout-session",
            Some(USER_A),
            Some(json!({"tier": "basic", "billingCycle": "monthly"})),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let outcome = read_json(res).await;
    assert_eq!(outcome["updated"], Value::Bool(false));
    assert_eq!(outcome["message"], "Billing is not configured");
    assert!(outcome.get("url").is_none());
}

#[tokio::test]
async fn test_validation_failures_report_every_field() {
    let app = build_router(test_state().await);

    let res = app
        .oneshot(request(
            "POST",
            "/api/jobs",
            Some(USER_A),
            Some(json!({
                "customerName": "",
                "jobType": "Tap fix",
                "revenue": -1.0,
                "hours": 1.0,
                "date": "15/01/2025"
            })),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = read_json(res).await;
    assert_eq!(body["code"], "E0002");
    let details = body["details"].as_array().unwrap();
    assert_eq!(details.len(), 3);
    let fields: Vec<&str> = details
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"customerName"));
    assert!(fields.contains(&"revenue"));
    assert!(fields.contains(&"date"));
}

#[tokio::test]
async fn test_foreign_ids_read_as_missing() {
    let app = build_router(test_state().await);

    let res = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/jobs",
            Some(USER_A),
            Some(json!({
                "customerName": "Mr Shah",
                "jobType": "Rewire",
                "revenue": 1500.0,
                "hours": 20.0,
                "date": "2025-05-02"
            })),
        ))
        .await
        .unwrap();
    let job = read_json(res).await;
    let job_id = job["id"].as_i64().unwrap();

    // Another user sees 404, never the row
    let res = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/jobs/{job_id}"),
            Some(USER_B),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_json(res).await["code"], "E0003");

    let res = app
        .oneshot(request(
            "PUT",
            &format!("/api/jobs/{job_id}"),
            Some(USER_B),
            Some(json!({"revenue": 1.0})),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_insight_view_clears_notification_badge() {
    let app = build_router(test_state().await);

    let res = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/insights",
            Some(USER_A),
            Some(json!({
                "category": "pricing",
                "title": "Rates below market",
                "body": "Your average rate trails similar local businesses by 12%."
            })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let insight = read_json(res).await;
    let insight_id = insight["id"].as_i64().unwrap();

    let res = app
        .clone()
        .oneshot(request("GET", "/api/insights/unviewed-count", Some(USER_A), None))
        .await
        .unwrap();
    assert_eq!(read_json(res).await["count"].as_i64(), Some(1));

    let res = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/insights/{insight_id}/view"),
            Some(USER_A),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(read_json(res).await["viewed"], Value::Bool(true));

    let res = app
        .oneshot(request("GET", "/api/insights/unviewed-count", Some(USER_A), None))
        .await
        .unwrap();
    assert_eq!(read_json(res).await["count"].as_i64(), Some(0));
}
