//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use domain::{AddProduct, DeleteProduct, GetProduct, UpdateProduct};
use pipeline::{Mediator, Request};
use serde::Serialize;

use super::products::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Product requests without a registered pipeline.
    pub unhandled_requests: Vec<&'static str>,
}

fn missing<R: Request>(mediator: &Mediator, out: &mut Vec<&'static str>) {
    if !mediator.handles::<R>() {
        out.push(R::NAME);
    }
}

/// GET /health: ok once every product request can be dispatched.
pub async fn check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let mediator = state.products.mediator();
    let mut unhandled_requests = Vec::new();
    missing::<GetProduct>(mediator, &mut unhandled_requests);
    missing::<AddProduct>(mediator, &mut unhandled_requests);
    missing::<UpdateProduct>(mediator, &mut unhandled_requests);
    missing::<DeleteProduct>(mediator, &mut unhandled_requests);

    if unhandled_requests.is_empty() {
        (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                unhandled_requests,
            }),
        )
    } else {
        tracing::warn!(?unhandled_requests, "product requests without a handler");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "degraded",
                unhandled_requests,
            }),
        )
    }
}
