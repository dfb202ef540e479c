//! Integration tests for the API server.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::Actor;
use domain::{Product, seed_products};
use entity_store::{EntityId, EntityStore, InMemoryEntityStore};
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceExt;

use std::sync::OnceLock;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            let handle = builder
                .install_recorder()
                .expect("failed to install Prometheus recorder");
            api::routes::metrics::describe();
            handle
        })
        .clone()
}

/// Router over a store seeded with the fixture product (id 1).
async fn setup_with_store() -> (axum::Router, InMemoryEntityStore<Product>) {
    let store: InMemoryEntityStore<Product> = InMemoryEntityStore::new();
    store
        .add(
            Product::new("TestSku-1", "Product A", "A description", 49.99),
            &Actor::new("fixture"),
        )
        .await
        .unwrap();

    let state = api::create_default_state(store.clone(), Actor::new("sanjyot"));
    let app = api::create_app(Arc::clone(&state), get_metrics_handle());
    (app, store)
}

async fn setup() -> axum::Router {
    setup_with_store().await.0
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = setup().await;

    let response = app.oneshot(empty_request("GET", "/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["unhandled_requests"], serde_json::json!([]));
}

#[tokio::test]
async fn test_get_product() {
    let app = setup().await;

    let response = app
        .oneshot(empty_request("GET", "/api/v1/products/1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["id"], 1);
    assert_eq!(json["sku"], "TestSku-1");
    assert_eq!(json["price"], 49.99);
    assert_eq!(json["created_by"], "fixture");
}

#[tokio::test]
async fn test_get_missing_product_is_empty_ok() {
    let app = setup().await;

    let response = app
        .oneshot(empty_request("GET", "/api/v1/products/999"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn test_get_with_malformed_id() {
    let app = setup().await;

    let response = app
        .oneshot(empty_request("GET", "/api/v1/products/abc"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("abc"));
}

#[tokio::test]
async fn test_create_product() {
    let (app, store) = setup_with_store().await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/products",
            serde_json::json!({
                "sku": "NEW-1",
                "name": "Gadget",
                "description": "Shiny",
                "price": 10.5
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["id"], 2);
    assert_eq!(json["sku"], "NEW-1");
    assert_eq!(json["created_by"], "sanjyot");
    assert!(json["created_date"].as_str().is_some());

    let stored = store.get_by_id(EntityId::new(2)).await.unwrap().unwrap();
    assert_eq!(stored.name, "Gadget");
}

#[tokio::test]
async fn test_create_uses_actor_header() {
    let app = setup().await;

    let mut request = json_request(
        "POST",
        "/api/v1/products",
        serde_json::json!({ "sku": "NEW-2", "name": "Gizmo", "price": 1.0 }),
    );
    request
        .headers_mut()
        .insert("x-actor", "alice".parse().unwrap());

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["created_by"], "alice");
    assert_eq!(json["description"], "");
}

#[tokio::test]
async fn test_create_invalid_product_lists_fields() {
    let (app, store) = setup_with_store().await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/products",
            serde_json::json!({ "sku": "", "name": "", "description": "d", "price": 1.0 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["errors"]["sku"][0], "Sku is required");
    assert_eq!(json["errors"]["name"][0], "Name is required");
    assert_eq!(json["errors"].as_object().unwrap().len(), 2);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_create_missing_sku_is_a_validation_error() {
    let (app, store) = setup_with_store().await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/products",
            serde_json::json!({ "name": "N", "price": 1.0 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["errors"]["sku"][0], "Sku is required");
    assert_eq!(json["errors"].as_object().unwrap().len(), 1);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_create_null_and_blank_fields_are_validation_errors() {
    let app = setup().await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/products",
            serde_json::json!({ "sku": null, "name": "   ", "price": 1.0 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["errors"]["sku"][0], "Sku is required");
    assert_eq!(json["errors"]["name"][0], "Name is required");
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = setup().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/products",
            serde_json::json!({ "sku": "S", "name": "N", "price": "cheap" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("price"));

    let response = app
        .oneshot(json_request(
            "PUT",
            "/api/v1/products",
            serde_json::json!({ "name": "X", "price": 1.0 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_product() {
    let (app, store) = setup_with_store().await;

    let response = app
        .oneshot(json_request(
            "PUT",
            "/api/v1/products",
            serde_json::json!({ "id": 1, "name": "X", "description": "d", "price": 157.2 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let updated = store.get_by_id(EntityId::new(1)).await.unwrap().unwrap();
    assert_eq!(updated.name, "X");
    assert_eq!(updated.price, 157.2);
    assert_eq!(updated.sku, "TestSku-1");
    assert_eq!(updated.audit.last_modified_by.as_deref(), Some("sanjyot"));
}

#[tokio::test]
async fn test_update_missing_product() {
    let app = setup().await;

    let response = app
        .oneshot(json_request(
            "PUT",
            "/api/v1/products",
            serde_json::json!({ "id": 999, "name": "X", "description": "d", "price": 1.0 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Entity \"Product\" (999) was not found.");
}

#[tokio::test]
async fn test_delete_product_twice() {
    let (app, store) = setup_with_store().await;

    let first = app
        .clone()
        .oneshot(empty_request("DELETE", "/api/v1/products/1"))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::NO_CONTENT);
    assert_eq!(store.len().await, 0);

    let second = app
        .oneshot(empty_request("DELETE", "/api/v1/products/1"))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_seeded_product_is_served() {
    let store: InMemoryEntityStore<Product> = InMemoryEntityStore::new();
    seed_products(&store, &Actor::system()).await.unwrap();
    let state = api::create_default_state(store, Actor::system());
    let app = api::create_app(state, get_metrics_handle());

    let response = app
        .oneshot(empty_request("GET", "/api/v1/products/1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["sku"], "SonKun");
    assert_eq!(json["price"], 149.99);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup().await;

    // Drive one request through the pipeline so a counter exists.
    let _ = app
        .clone()
        .oneshot(empty_request("GET", "/api/v1/products/1"))
        .await
        .unwrap();

    let response = app.oneshot(empty_request("GET", "/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(body.contains("pipeline_requests_total"));
    assert!(body.contains("# HELP pipeline_requests_total"));
}
