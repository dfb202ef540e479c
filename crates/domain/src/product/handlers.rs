//! Product request handlers.
//!
//! Each handler owns the decision of when to read, create, mutate or delete;
//! identity assignment and audit stamping stay with the entity store.

use async_trait::async_trait;
use entity_store::{EntityStore, StoreError};
use pipeline::{PipelineError, RequestContext, RequestHandler, Result};

use super::{AddProduct, DeleteProduct, GetProduct, Product, UpdateProduct};
use crate::projector::{ProductProjector, Projector};

/// Lifts a store failure into the pipeline taxonomy.
///
/// A row that vanished between load and write is still a not-found.
fn store_failure(error: StoreError) -> PipelineError {
    match error {
        StoreError::NotFound { kind, id } => PipelineError::not_found(kind, id),
        other => PipelineError::internal(other),
    }
}

/// Handles [`GetProduct`].
#[derive(Debug, Clone)]
pub struct GetProductHandler<S> {
    store: S,
}

impl<S> GetProductHandler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S> RequestHandler<GetProduct> for GetProductHandler<S>
where
    S: EntityStore<Product>,
{
    async fn handle(&self, request: GetProduct, ctx: &RequestContext) -> Result<Option<Product>> {
        ctx.cancellable(self.store.get_by_id(request.id))
            .await?
            .map_err(store_failure)
    }
}

/// Handles [`AddProduct`].
#[derive(Debug, Clone)]
pub struct AddProductHandler<S, P = ProductProjector> {
    store: S,
    projector: P,
}

impl<S> AddProductHandler<S> {
    pub fn new(store: S) -> Self {
        Self::with_projector(store, ProductProjector)
    }
}

impl<S, P> AddProductHandler<S, P> {
    pub fn with_projector(store: S, projector: P) -> Self {
        Self { store, projector }
    }
}

#[async_trait]
impl<S, P> RequestHandler<AddProduct> for AddProductHandler<S, P>
where
    S: EntityStore<Product>,
    P: Projector<AddProduct, Product>,
{
    async fn handle(&self, request: AddProduct, ctx: &RequestContext) -> Result<Product> {
        let product = self
            .projector
            .project(&request)
            .map_err(PipelineError::internal)?;

        let stored = ctx
            .cancellable(self.store.add(product, ctx.actor()))
            .await?
            .map_err(store_failure)?;

        tracing::info!(
            id = ?stored.id,
            sku = %stored.sku,
            actor = %ctx.actor(),
            "Product is successfully created"
        );
        Ok(stored)
    }
}

/// Handles [`UpdateProduct`].
#[derive(Debug, Clone)]
pub struct UpdateProductHandler<S, P = ProductProjector> {
    store: S,
    projector: P,
}

impl<S> UpdateProductHandler<S> {
    pub fn new(store: S) -> Self {
        Self::with_projector(store, ProductProjector)
    }
}

impl<S, P> UpdateProductHandler<S, P> {
    pub fn with_projector(store: S, projector: P) -> Self {
        Self { store, projector }
    }
}

#[async_trait]
impl<S, P> RequestHandler<UpdateProduct> for UpdateProductHandler<S, P>
where
    S: EntityStore<Product>,
    P: Projector<UpdateProduct, Product>,
{
    async fn handle(&self, request: UpdateProduct, ctx: &RequestContext) -> Result<()> {
        let mut product = ctx
            .cancellable(self.store.get_by_id(request.id))
            .await?
            .map_err(store_failure)?
            .ok_or_else(|| PipelineError::not_found(Product::KIND, request.id))?;

        self.projector
            .project_onto(&request, &mut product)
            .map_err(PipelineError::internal)?;

        ctx.cancellable(self.store.update(product, ctx.actor()))
            .await?
            .map_err(store_failure)?;

        tracing::info!(
            id = %request.id,
            actor = %ctx.actor(),
            "Product is successfully updated"
        );
        Ok(())
    }
}

/// Handles [`DeleteProduct`].
#[derive(Debug, Clone)]
pub struct DeleteProductHandler<S> {
    store: S,
}

impl<S> DeleteProductHandler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S> RequestHandler<DeleteProduct> for DeleteProductHandler<S>
where
    S: EntityStore<Product>,
{
    async fn handle(&self, request: DeleteProduct, ctx: &RequestContext) -> Result<()> {
        let product = ctx
            .cancellable(self.store.get_by_id(request.id))
            .await?
            .map_err(store_failure)?
            .ok_or_else(|| PipelineError::not_found(Product::KIND, request.id))?;

        ctx.cancellable(self.store.delete(&product))
            .await?
            .map_err(store_failure)?;

        tracing::info!(
            id = %request.id,
            actor = %ctx.actor(),
            "Product is successfully deleted"
        );
        Ok(())
    }
}
