//! Integration tests for the API server.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use dag::DagProcessor;
use metrics_exporter_prometheus::PrometheusHandle;
use runtime::WorkflowRegistry;
use saga::{InMemoryInventoryStore, InMemoryNotifier, InMemoryPaymentGateway, OrderSaga};
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

fn setup() -> Router {
    let state = api::create_default_state();
    api::create_app(state, get_metrics_handle())
}

/// App wired with a payment gateway slow enough that signals can land
/// while the payment phase is still in flight.
fn setup_with_slow_payment() -> (Router, InMemoryPaymentGateway) {
    let payment = InMemoryPaymentGateway::new();
    payment.set_charge_delay(Duration::from_millis(400));

    let state = Arc::new(api::AppState {
        saga: Arc::new(OrderSaga::new(
            payment.clone(),
            InMemoryInventoryStore::new(),
            InMemoryNotifier::new(),
        )),
        orders: RwLock::new(HashMap::new()),
        registry: WorkflowRegistry::new(),
        processor: DagProcessor::new(nodes::default_registry()),
    });

    (api::create_app(state, get_metrics_handle()), payment)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn start_order_body() -> serde_json::Value {
    serde_json::json!({
        "items": [
            {"product_id": "SKU-001", "quantity": 2},
            {"product_id": "SKU-002", "quantity": 1}
        ],
        "total_cents": 3500
    })
}

/// Polls an order's status endpoint until it reports `expected`.
async fn wait_for_status(app: &Router, order_id: &str, expected: &str) -> bool {
    let deadline = std::time::Instant::now() + Duration::from_secs(2);
    while std::time::Instant::now() < deadline {
        let (status, body) = send(app, get(&format!("/orders/{order_id}/status"))).await;
        assert_eq!(status, StatusCode::OK);
        if body["status"] == expected {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();
    let (status, json) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_start_order_returns_accepted() {
    let app = setup();
    let (status, json) = send(&app, post_json("/orders", start_order_body())).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(json["order_id"].as_str().is_some());
    assert!(json["workflow_id"].as_str().is_some());
}

#[tokio::test]
async fn test_order_runs_to_completion() {
    let app = setup();
    let (_, started) = send(&app, post_json("/orders", start_order_body())).await;
    let order_id = started["order_id"].as_str().unwrap().to_string();

    assert!(wait_for_status(&app, &order_id, "COMPLETED").await);

    let (status, progress) = send(&app, get(&format!("/orders/{order_id}/progress"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(progress["payment"], 100);
    assert_eq!(progress["inventory"], 100);
    assert_eq!(progress["overall"], 100);
}

#[tokio::test]
async fn test_cancel_signal_while_payment_in_flight() {
    let (app, _) = setup_with_slow_payment();
    let (_, started) = send(&app, post_json("/orders", start_order_body())).await;
    let order_id = started["order_id"].as_str().unwrap().to_string();

    tokio::time::sleep(Duration::from_millis(20)).await;
    let (status, cancelled) = send(&app, post_json(&format!("/orders/{order_id}/cancel"), serde_json::json!({}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["accepted"], true);
    assert_eq!(cancelled["status"], "CANCELLED");

    assert!(wait_for_status(&app, &order_id, "CANCELLED").await);
}

#[tokio::test]
async fn test_add_item_signal_is_visible_in_next_query() {
    let (app, _) = setup_with_slow_payment();
    let (_, started) = send(&app, post_json("/orders", start_order_body())).await;
    let order_id = started["order_id"].as_str().unwrap().to_string();

    let (status, signalled) = send(
        &app,
        post_json(
            &format!("/orders/{order_id}/items"),
            serde_json::json!({"product_id": "SKU-003", "quantity": 4}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(signalled["accepted"], true);
    assert_eq!(signalled["item_count"], 3);

    let (_, snapshot) = send(&app, get(&format!("/orders/{order_id}/status"))).await;
    assert_eq!(snapshot["items"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_unknown_order_is_not_found() {
    let app = setup();
    let missing = uuid::Uuid::new_v4();
    let (status, _) = send(&app, get(&format!("/orders/{missing}/status"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_order_id_is_bad_request() {
    let app = setup();
    let (status, _) = send(&app, get("/orders/not-a-uuid/status")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_zero_quantity_is_rejected() {
    let app = setup();
    let (status, json) = send(
        &app,
        post_json(
            "/orders",
            serde_json::json!({
                "items": [{"product_id": "SKU-001", "quantity": 0}],
                "total_cents": 1000
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("SKU-001"));
}

#[tokio::test]
async fn test_schema_without_starting_nodes_is_bad_request() {
    let app = setup();
    let (status, json) = send(
        &app,
        post_json(
            "/workflows/run",
            serde_json::json!({
                "workflowId": "wf-cycle",
                "name": "cyclic",
                "nodes": [
                    {"id": "a", "type": "webhook", "data": {"url": "http://example.com"}},
                    {"id": "b", "type": "webhook", "data": {"url": "http://example.com"}}
                ],
                "edges": [
                    {"from": "a", "to": "b"},
                    {"from": "b", "to": "a"}
                ],
                "execution": {"mode": "sequential", "retryPolicy": {"maxAttempts": 1, "initialIntervalMs": 1}}
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("no starting nodes"));
}

#[tokio::test]
async fn test_unsupported_node_type_is_bad_request() {
    let app = setup();
    let (status, json) = send(
        &app,
        post_json(
            "/workflows/run",
            serde_json::json!({
                "workflowId": "wf-unknown",
                "name": "unknown type",
                "nodes": [{"id": "a", "type": "teleport", "data": {}}],
                "edges": [],
                "execution": {"mode": "sequential", "retryPolicy": {"maxAttempts": 1, "initialIntervalMs": 1}}
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("teleport"));
}

#[tokio::test]
async fn test_list_workflows_filters_by_attribute() {
    let app = setup();
    send(&app, post_json("/orders", start_order_body())).await;

    let (status, all) = send(&app, get("/workflows")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 1);

    let (_, filtered) = send(
        &app,
        get("/workflows?attribute_key=CustomKeywordField&attribute_value=order_processing"),
    )
    .await;
    assert_eq!(filtered.as_array().unwrap().len(), 1);
    assert_eq!(filtered[0]["kind"], "order");

    let (_, empty) = send(
        &app,
        get("/workflows?attribute_key=CustomKeywordField&attribute_value=other"),
    )
    .await;
    assert!(empty.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_metrics_endpoint_renders() {
    let app = setup();
    let response = app
        .clone()
        .oneshot(get("/metrics"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
