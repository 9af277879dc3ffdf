//! Integration tests for the API server.

use std::sync::OnceLock;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use delivery::{ChannelConfig, SimulatedChannel};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::mpsc;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

/// Builds an app over fresh stores with an instant always-succeeding
/// channel and a live receipt worker.
fn setup() -> axum::Router {
    setup_with_config(ChannelConfig::instant())
}

fn setup_with_config(config: ChannelConfig) -> axum::Router {
    let (tx, rx) = mpsc::channel(64);
    let channel = SimulatedChannel::new(tx, config);
    let (state, worker) = api::create_default_state(channel, rx);
    tokio::spawn(worker.run());
    api::create_app(state, get_metrics_handle())
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn create_customer(app: &axum::Router, name: &str, email: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/customers",
            serde_json::json!({ "name": name, "email": email }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["id"].as_str().unwrap().to_string()
}

async fn record_transaction(app: &axum::Router, customer_id: &str, amount_cents: i64) {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/transactions",
            serde_json::json!({ "customer_id": customer_id, "amount_cents": amount_cents }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

/// Polls the stats endpoint until no deliveries are pending.
async fn settled_stats(app: &axum::Router, segment_id: &str) -> serde_json::Value {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let response = app
            .clone()
            .oneshot(get_request(&format!("/segments/{segment_id}/stats")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let stats = body_json(response).await;
        if stats["total"].as_u64() > Some(0) && stats["pending"] == 0 {
            return stats;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "deliveries did not settle in time"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();

    let response = app.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();

    let response = app.oneshot(get_request("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_and_get_customer() {
    let app = setup();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/customers",
            serde_json::json!({
                "name": "Ada",
                "email": "ada@example.com",
                "phone": "5551234567"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let created = body_json(response).await;
    assert_eq!(created["name"], "Ada");
    assert_eq!(created["total_spend_cents"], 0);
    assert_eq!(created["visit_count"], 0);
    assert!(created["last_active"].is_null());
    let id = created["id"].as_str().unwrap();

    let response = app
        .oneshot(get_request(&format!("/customers/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let fetched = body_json(response).await;
    assert_eq!(fetched["email"], "ada@example.com");
    assert_eq!(fetched["phone"], "5551234567");
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let app = setup();
    create_customer(&app, "Ada", "ada@example.com").await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/customers",
            serde_json::json!({ "name": "Imposter", "email": "ada@example.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let json = body_json(response).await;
    assert!(
        json["error"]
            .as_str()
            .unwrap()
            .contains("already exists")
    );
}

#[tokio::test]
async fn test_bulk_customers_isolate_failures() {
    let app = setup();

    let response = app
        .oneshot(json_request(
            "POST",
            "/customers/bulk",
            serde_json::json!([
                { "name": "Ada", "email": "ada@example.com" },
                { "name": "Dupe", "email": "ada@example.com" },
                { "name": "Bea", "email": "bea@example.com" }
            ]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["summary"]["total"], 3);
    assert_eq!(json["summary"]["created"], 2);
    assert_eq!(json["summary"]["failed"], 1);
    assert_eq!(json["errors"][0]["index"], 1);
}

#[tokio::test]
async fn test_get_nonexistent_customer() {
    let app = setup();
    let fake_id = uuid::Uuid::new_v4();

    let response = app
        .oneshot(get_request(&format!("/customers/{fake_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_id_format() {
    let app = setup();

    let response = app
        .oneshot(get_request("/customers/not-a-uuid"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_transactions_refresh_activity_profile() {
    let app = setup();
    let id = create_customer(&app, "Ada", "ada@example.com").await;

    record_transaction(&app, &id, 1000).await;
    record_transaction(&app, &id, 2500).await;

    let response = app
        .clone()
        .oneshot(get_request(&format!("/customers/{id}")))
        .await
        .unwrap();
    let customer = body_json(response).await;
    assert_eq!(customer["total_spend_cents"], 3500);
    assert_eq!(customer["visit_count"], 2);
    assert!(customer["last_active"].is_string());

    let response = app
        .oneshot(get_request(&format!("/customers/{id}/transactions")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let history = body_json(response).await;
    assert_eq!(history.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_negative_transaction_rejected() {
    let app = setup();
    let id = create_customer(&app, "Ada", "ada@example.com").await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/transactions",
            serde_json::json!({ "customer_id": id, "amount_cents": -500 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_transaction_for_unknown_customer() {
    let app = setup();

    let response = app
        .oneshot(json_request(
            "POST",
            "/transactions",
            serde_json::json!({
                "customer_id": uuid::Uuid::new_v4().to_string(),
                "amount_cents": 500
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_segment_requires_rules() {
    let app = setup();

    let response = app
        .oneshot(json_request(
            "POST",
            "/segments",
            serde_json::json!({ "name": "everyone", "rules": [] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_preview_does_not_dispatch() {
    let app = setup();

    let id = create_customer(&app, "Ada", "ada@example.com").await;
    record_transaction(&app, &id, 25000).await;
    create_customer(&app, "Bob", "bob@example.com").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/segments/preview",
            serde_json::json!({
                "rules": [
                    { "field": "totalSpend", "operator": "greater_than", "value": 100.0 }
                ]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let preview = body_json(response).await;
    assert_eq!(preview["matched"], 1);
    assert_eq!(preview["total_customers"], 2);
    assert_eq!(preview["match_rate_percent"], 50.0);

    // No segments were created as a side effect.
    let response = app.oneshot(get_request("/segments")).await.unwrap();
    let segments = body_json(response).await;
    assert_eq!(segments.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_segment_creation_dispatches_and_settles() {
    let app = setup();

    for (name, email, cents) in [
        ("Ada", "ada@example.com", 25000),
        ("Bea", "bea@example.com", 15000),
        ("Bob", "bob@example.com", 2000),
    ] {
        let id = create_customer(&app, name, email).await;
        record_transaction(&app, &id, cents).await;
    }

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/segments",
            serde_json::json!({
                "name": "big spenders",
                "description": "spent over $100",
                "rules": [
                    { "field": "totalSpend", "operator": "greater_than", "value": 100.0 }
                ]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let created = body_json(response).await;
    assert_eq!(created["segment"]["audience_size"], 2);
    assert_eq!(created["segment"]["status"], "active");
    assert_eq!(created["dispatch"]["dispatched"], 2);
    let segment_id = created["segment"]["id"].as_str().unwrap().to_string();

    let stats = settled_stats(&app, &segment_id).await;
    assert_eq!(stats["total"], 2);
    assert_eq!(stats["sent"], 2);
    assert_eq!(stats["failed"], 0);
    assert_eq!(stats["success_rate_percent"], 100.0);

    let response = app
        .oneshot(get_request(&format!("/segments/{segment_id}/deliveries")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let deliveries = body_json(response).await;
    let deliveries = deliveries.as_array().unwrap();
    assert_eq!(deliveries.len(), 2);
    assert!(deliveries.iter().all(|d| d["status"] == "SENT"));
    assert!(
        deliveries
            .iter()
            .any(|d| d["message"] == "Hi Ada, here's 10% off on your next order!")
    );
}

#[tokio::test]
async fn test_failing_channel_marks_deliveries_failed() {
    let config = ChannelConfig {
        success_rate: 0.0,
        ..ChannelConfig::instant()
    };
    let app = setup_with_config(config);

    let id = create_customer(&app, "Ada", "ada@example.com").await;
    record_transaction(&app, &id, 25000).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/segments",
            serde_json::json!({
                "name": "big spenders",
                "rules": [
                    { "field": "totalSpend", "operator": "greater_than", "value": 100.0 }
                ]
            }),
        ))
        .await
        .unwrap();
    let created = body_json(response).await;
    let segment_id = created["segment"]["id"].as_str().unwrap().to_string();

    let stats = settled_stats(&app, &segment_id).await;
    assert_eq!(stats["failed"], 1);
    assert_eq!(stats["success_rate_percent"], 0.0);

    let response = app
        .oneshot(get_request(&format!("/segments/{segment_id}/deliveries")))
        .await
        .unwrap();
    let deliveries = body_json(response).await;
    assert_eq!(deliveries[0]["failure_reason"], "network timeout");
}

#[tokio::test]
async fn test_receipt_callback_overwrites_outcome() {
    let app = setup();

    let id = create_customer(&app, "Ada", "ada@example.com").await;
    record_transaction(&app, &id, 25000).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/segments",
            serde_json::json!({
                "name": "big spenders",
                "rules": [
                    { "field": "totalSpend", "operator": "greater_than", "value": 100.0 }
                ]
            }),
        ))
        .await
        .unwrap();
    let created = body_json(response).await;
    let segment_id = created["segment"]["id"].as_str().unwrap().to_string();

    // Wait for the channel's own receipt to land first.
    settled_stats(&app, &segment_id).await;

    let response = app
        .clone()
        .oneshot(get_request(&format!("/segments/{segment_id}/deliveries")))
        .await
        .unwrap();
    let deliveries = body_json(response).await;
    let delivery_id = deliveries[0]["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/receipts",
            serde_json::json!({
                "delivery_id": delivery_id,
                "status": "FAILED",
                "failure_reason": "bounced"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(get_request(&format!("/segments/{segment_id}/deliveries")))
        .await
        .unwrap();
    let deliveries = body_json(response).await;
    assert_eq!(deliveries[0]["status"], "FAILED");
    assert_eq!(deliveries[0]["failure_reason"], "bounced");
}

#[tokio::test]
async fn test_receipt_callback_for_unknown_delivery() {
    let app = setup();

    let response = app
        .oneshot(json_request(
            "POST",
            "/receipts",
            serde_json::json!({
                "delivery_id": uuid::Uuid::new_v4().to_string(),
                "status": "SENT"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_segment_rules() {
    let app = setup();

    let id = create_customer(&app, "Ada", "ada@example.com").await;
    record_transaction(&app, &id, 25000).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/segments",
            serde_json::json!({
                "name": "big spenders",
                "rules": [
                    { "field": "totalSpend", "operator": "greater_than", "value": 100.0 }
                ]
            }),
        ))
        .await
        .unwrap();
    let created = body_json(response).await;
    let segment_id = created["segment"]["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/segments/{segment_id}"),
            serde_json::json!({
                "name": "loyal visitors",
                "status": "paused",
                "rules": [
                    { "field": "visitCount", "operator": "greater_equal", "value": 5.0 }
                ]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let updated = body_json(response).await;
    assert_eq!(updated["name"], "loyal visitors");
    assert_eq!(updated["status"], "paused");
    assert_eq!(updated["rules"][0]["field"], "visitCount");

    // Patching to an empty rule list is rejected.
    let response = app
        .oneshot(json_request(
            "PUT",
            &format!("/segments/{segment_id}"),
            serde_json::json!({ "rules": [] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_segment_cascades_deliveries() {
    let app = setup();

    let id = create_customer(&app, "Ada", "ada@example.com").await;
    record_transaction(&app, &id, 25000).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/segments",
            serde_json::json!({
                "name": "big spenders",
                "rules": [
                    { "field": "totalSpend", "operator": "greater_than", "value": 100.0 }
                ]
            }),
        ))
        .await
        .unwrap();
    let created = body_json(response).await;
    let segment_id = created["segment"]["id"].as_str().unwrap().to_string();
    settled_stats(&app, &segment_id).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/segments/{segment_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(get_request(&format!("/segments/{segment_id}/deliveries")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(get_request(&format!("/segments/{segment_id}/stats")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
