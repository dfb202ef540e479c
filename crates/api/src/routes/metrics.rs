//! Prometheus metrics endpoint.

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use metrics::Unit;
use metrics_exporter_prometheus::PrometheusHandle;

/// Registers help text for the metrics this service records.
///
/// Call once after the recorder is installed.
pub fn describe() {
    metrics::describe_counter!(
        "pipeline_requests_total",
        "Dispatched requests by request name and terminal state"
    );
    metrics::describe_histogram!(
        "pipeline_request_duration_seconds",
        Unit::Seconds,
        "Time from dispatch to settlement"
    );
    metrics::describe_counter!(
        "entity_store_mutations_total",
        "Rows inserted, updated or deleted by entity kind"
    );
    metrics::describe_counter!("api_errors_total", "Error responses by HTTP status");
}

/// GET /metrics: current values in Prometheus text format.
pub async fn get(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    let body = handle.render();
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}
