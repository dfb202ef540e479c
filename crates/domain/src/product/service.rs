//! Product service providing a simplified API for product operations.

use entity_store::{Actor, EntityId, EntityStore};
use pipeline::{Mediator, MediatorBuilder, RequestContext, Result};

use super::{
    AddProduct, AddProductHandler, DeleteProduct, DeleteProductHandler, GetProduct,
    GetProductHandler, Product, UpdateProduct, UpdateProductHandler,
};

/// Registers the four product handlers, each behind the standard behaviors.
pub fn register_product_handlers<S>(builder: MediatorBuilder, store: S) -> MediatorBuilder
where
    S: EntityStore<Product> + Clone + 'static,
{
    builder
        .register::<GetProduct>(GetProductHandler::new(store.clone()))
        .register::<AddProduct>(AddProductHandler::new(store.clone()))
        .register::<UpdateProduct>(UpdateProductHandler::new(store.clone()))
        .register::<DeleteProduct>(DeleteProductHandler::new(store))
}

/// Service for managing products.
///
/// Wraps a mediator registered with the product handlers and offers one
/// typed method per request. Every call takes the [`RequestContext`] that
/// names the acting user and carries the cancellation signal.
#[derive(Clone)]
pub struct ProductService {
    mediator: Mediator,
}

impl ProductService {
    /// Creates a service over `store`, acting as the system actor by default.
    pub fn new<S>(store: S) -> Self
    where
        S: EntityStore<Product> + Clone + 'static,
    {
        Self::with_actor(store, Actor::system())
    }

    /// Creates a service whose default context acts as `default_actor`.
    pub fn with_actor<S>(store: S, default_actor: Actor) -> Self
    where
        S: EntityStore<Product> + Clone + 'static,
    {
        let builder = Mediator::builder().default_actor(default_actor);
        Self {
            mediator: register_product_handlers(builder, store).build(),
        }
    }

    /// Returns the underlying mediator.
    pub fn mediator(&self) -> &Mediator {
        &self.mediator
    }

    /// Creates a fresh context acting as the default actor.
    pub fn context(&self) -> RequestContext {
        RequestContext::new(self.mediator.default_actor().clone())
    }

    /// Gets a product by id, or None if it does not exist.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn get(&self, id: EntityId, ctx: &RequestContext) -> Result<Option<Product>> {
        self.mediator.send_with(GetProduct::new(id), ctx).await
    }

    /// Adds a product and returns it with its assigned id and created stamp.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn add(&self, request: AddProduct, ctx: &RequestContext) -> Result<Product> {
        self.mediator.send_with(request, ctx).await
    }

    /// Replaces the mutable fields of an existing product.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn update(&self, request: UpdateProduct, ctx: &RequestContext) -> Result<()> {
        self.mediator.send_with(request, ctx).await
    }

    /// Deletes a product.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn delete(&self, id: EntityId, ctx: &RequestContext) -> Result<()> {
        self.mediator.send_with(DeleteProduct::new(id), ctx).await
    }
}
