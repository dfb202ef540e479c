//! HTTP API server with observability for the product catalog service.
//!
//! Provides REST endpoints for product management over the request
//! pipeline, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use common::Actor;
use domain::{Product, ProductService};
use entity_store::EntityStore;
use metrics_exporter_prometheus::PrometheusHandle;
use pipeline::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::products::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/api/v1/products",
            axum::routing::post(routes::products::create).put(routes::products::update),
        )
        .route(
            "/api/v1/products/{id}",
            get(routes::products::get).delete(routes::products::delete),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over `store`, acting as `default_actor`
/// when a request names no actor.
pub fn create_default_state<S>(store: S, default_actor: Actor) -> Arc<AppState>
where
    S: EntityStore<Product> + Clone + 'static,
{
    Arc::new(AppState {
        products: ProductService::with_actor(store, default_actor.clone()),
        default_actor,
        shutdown: CancellationToken::new(),
    })
}
