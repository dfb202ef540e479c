//! Product CRUD endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use common::{Actor, EntityId};
use domain::{AddProduct, Product, ProductService, UpdateProduct};
use pipeline::{CancellationToken, RequestContext};

use crate::error::ApiError;

/// Header naming the user a request acts as.
pub const ACTOR_HEADER: &str = "x-actor";

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub products: ProductService,
    pub default_actor: Actor,
    /// Cancelled on shutdown; every request context holds a child of it.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Builds the per-request context, preferring the `x-actor` header.
    fn context(&self, headers: &HeaderMap) -> RequestContext {
        let actor = headers
            .get(ACTOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(Actor::new)
            .unwrap_or_else(|| self.default_actor.clone());
        RequestContext::new(actor).with_cancellation(self.shutdown.child_token())
    }
}

fn parse_id(raw: &str) -> Result<EntityId, ApiError> {
    raw.parse::<i64>()
        .map(EntityId::new)
        .map_err(|e| ApiError::BadRequest(format!("Invalid product id '{raw}': {e}")))
}

// -- Handlers --

/// GET /api/v1/products/{id}: the product, or an empty body when absent.
#[tracing::instrument(skip(state, headers))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    let ctx = state.context(&headers);

    match state.products.get(id, &ctx).await? {
        Some(product) => Ok(Json(product).into_response()),
        None => Ok(StatusCode::OK.into_response()),
    }
}

/// POST /api/v1/products: add a product.
#[tracing::instrument(skip(state, headers, payload))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<AddProduct>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let Json(req) = payload?;
    let ctx = state.context(&headers);
    let product = state.products.add(req, &ctx).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /api/v1/products: replace the mutable fields of a product.
#[tracing::instrument(skip(state, headers, payload))]
pub async fn update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<UpdateProduct>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(req) = payload?;
    let ctx = state.context(&headers);
    state.products.update(req, &ctx).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/products/{id}: remove a product.
#[tracing::instrument(skip(state, headers))]
pub async fn delete(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    let ctx = state.context(&headers);
    state.products.delete(id, &ctx).await?;
    Ok(StatusCode::NO_CONTENT)
}
