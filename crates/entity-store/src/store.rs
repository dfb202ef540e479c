use async_trait::async_trait;

use crate::{Actor, Entity, EntityId, EntityQuery, Filter, Result};

/// Core trait for entity repositories.
///
/// A store owns identity assignment and audit stamping for the entities it
/// persists. Reads return owned snapshots; mutating a returned entity has no
/// effect until it is passed back to [`update`](EntityStore::update).
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait EntityStore<T: Entity>: Send + Sync {
    /// Looks up an entity by identity.
    ///
    /// Returns None if no entity has this identity.
    async fn get_by_id(&self, id: EntityId) -> Result<Option<T>>;

    /// Returns the first entity, in identity order, matching the filter.
    async fn get_first_matching(&self, filter: Filter<T::Field>) -> Result<Option<T>>;

    /// Returns every entity in identity order.
    async fn get_all(&self) -> Result<Vec<T>>;

    /// Returns the entities matching a query.
    ///
    /// A query that matches nothing yields an empty vector.
    async fn get_matching(&self, query: EntityQuery<T::Field>) -> Result<Vec<T>>;

    /// Persists a new entity.
    ///
    /// Any identity or audit values on the input are ignored; the returned
    /// entity carries the assigned identity and the created stamp.
    async fn add(&self, entity: T, actor: &Actor) -> Result<T>;

    /// Persists several new entities, stamped with one timestamp.
    async fn add_many(&self, entities: Vec<T>, actor: &Actor) -> Result<Vec<T>>;

    /// Replaces the stored image of an existing entity.
    ///
    /// The caller supplies the complete entity. The store applies the
    /// modified stamp and keeps the stored created stamp.
    async fn update(&self, entity: T, actor: &Actor) -> Result<()>;

    /// Removes an entity.
    async fn delete(&self, entity: &T) -> Result<()>;

    /// Removes every entity matching the filter, returning how many were
    /// removed.
    ///
    /// Matches are read first and removed afterwards, so entities inserted
    /// concurrently may survive.
    async fn delete_matching(&self, filter: Filter<T::Field>) -> Result<u64>;
}

/// Extension trait providing convenience methods for entity stores.
#[async_trait]
pub trait EntityStoreExt<T: Entity>: EntityStore<T> {
    /// Checks if an entity with this identity exists.
    async fn exists(&self, id: EntityId) -> Result<bool> {
        Ok(self.get_by_id(id).await?.is_some())
    }

    /// Checks if the store holds no entities.
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.get_first_matching(Filter::All).await?.is_none())
    }

    /// Returns the entities matching a filter in identity order.
    async fn find(&self, filter: Filter<T::Field>) -> Result<Vec<T>> {
        self.get_matching(EntityQuery::matching(filter)).await
    }

    /// Counts the entities matching a filter.
    async fn count_matching(&self, filter: Filter<T::Field>) -> Result<usize> {
        Ok(self.find(filter).await?.len())
    }
}

// Blanket implementation for all EntityStore implementations
impl<T: Entity, S: EntityStore<T> + ?Sized> EntityStoreExt<T> for S {}

/// Returns the identity of an entity that is about to be updated or deleted.
pub(crate) fn require_id<T: Entity>(entity: &T) -> Result<EntityId> {
    entity
        .id()
        .ok_or(crate::StoreError::MissingIdentity { kind: T::kind() })
}

/// Records a completed mutation in the store metrics.
pub(crate) fn record_mutation<T: Entity>(mutation: crate::Mutation, count: u64) {
    metrics::counter!(
        "entity_store_mutations_total",
        "entity" => T::kind(),
        "mutation" => mutation.as_str()
    )
    .increment(count);
    tracing::debug!(entity = T::kind(), %mutation, count, "entity store mutation applied");
}
