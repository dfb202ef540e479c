use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{
    Actor, Clock, Entity, EntityId, EntityQuery, Filter, Mutation, Result, StoreError,
    SystemClock,
    audit::stamp,
    store::{EntityStore, record_mutation, require_id},
};

struct Table<T> {
    rows: HashMap<EntityId, T>,
    next_id: i64,
}

impl<T: Entity> Table<T> {
    fn insert(&mut self, mut entity: T, actor: &Actor, now: DateTime<Utc>) -> T {
        self.next_id += 1;
        let id = EntityId::new(self.next_id);
        entity.set_id(id);
        stamp(&mut entity, Mutation::Insert, actor, now);
        self.rows.insert(id, entity.clone());
        entity
    }

    fn sorted(&self) -> Vec<T> {
        let mut rows: Vec<T> = self.rows.values().cloned().collect();
        rows.sort_by_key(|e| e.id());
        rows
    }
}

/// In-memory entity store implementation.
///
/// Identities are assigned from a per-store sequence starting at 1 and are
/// never reused. Used by the tests and by the server when no database is
/// configured.
pub struct InMemoryEntityStore<T> {
    table: Arc<RwLock<Table<T>>>,
    clock: Arc<dyn Clock>,
}

impl<T> Clone for InMemoryEntityStore<T> {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<T: Entity> Default for InMemoryEntityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> InMemoryEntityStore<T> {
    /// Creates a new empty store stamping with the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates a new empty store stamping with the given clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            table: Arc::new(RwLock::new(Table {
                rows: HashMap::new(),
                next_id: 0,
            })),
            clock,
        }
    }

    /// Returns the number of stored entities.
    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    /// Removes all entities. The identity sequence keeps counting.
    pub async fn clear(&self) {
        self.table.write().await.rows.clear();
    }
}

#[async_trait]
impl<T: Entity> EntityStore<T> for InMemoryEntityStore<T> {
    async fn get_by_id(&self, id: EntityId) -> Result<Option<T>> {
        let table = self.table.read().await;
        Ok(table.rows.get(&id).cloned())
    }

    async fn get_first_matching(&self, filter: Filter<T::Field>) -> Result<Option<T>> {
        let table = self.table.read().await;
        let first = table
            .rows
            .values()
            .filter(|e| filter.matches(*e))
            .min_by_key(|e| e.id())
            .cloned();
        Ok(first)
    }

    async fn get_all(&self) -> Result<Vec<T>> {
        let table = self.table.read().await;
        Ok(table.sorted())
    }

    async fn get_matching(&self, query: EntityQuery<T::Field>) -> Result<Vec<T>> {
        let table = self.table.read().await;
        let mut entities: Vec<T> = table
            .rows
            .values()
            .filter(|e| query.filter.matches(*e))
            .cloned()
            .collect();
        entities.sort_by(|a, b| query.compare_entities(a, b));

        let offset = query.offset.unwrap_or(0);
        let entities = entities
            .into_iter()
            .skip(offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .collect();

        Ok(entities)
    }

    async fn add(&self, entity: T, actor: &Actor) -> Result<T> {
        let now = self.clock.now();
        let stored = self.table.write().await.insert(entity, actor, now);
        record_mutation::<T>(Mutation::Insert, 1);
        Ok(stored)
    }

    async fn add_many(&self, entities: Vec<T>, actor: &Actor) -> Result<Vec<T>> {
        let now = self.clock.now();
        let mut table = self.table.write().await;
        let stored: Vec<T> = entities
            .into_iter()
            .map(|entity| table.insert(entity, actor, now))
            .collect();
        record_mutation::<T>(Mutation::Insert, stored.len() as u64);
        Ok(stored)
    }

    async fn update(&self, mut entity: T, actor: &Actor) -> Result<()> {
        let id = require_id(&entity)?;
        let now = self.clock.now();

        let mut table = self.table.write().await;
        let stored = table.rows.get_mut(&id).ok_or(StoreError::NotFound {
            kind: T::kind(),
            id,
        })?;

        // Created stamp is owned by the store, whatever the caller sent.
        let persisted = stored.audit().clone();
        let audit = entity.audit_mut();
        audit.created_date = persisted.created_date;
        audit.created_by = persisted.created_by;
        stamp(&mut entity, Mutation::Update, actor, now);

        *stored = entity;
        record_mutation::<T>(Mutation::Update, 1);
        Ok(())
    }

    async fn delete(&self, entity: &T) -> Result<()> {
        let id = require_id(entity)?;
        let mut table = self.table.write().await;
        table.rows.remove(&id).ok_or(StoreError::NotFound {
            kind: T::kind(),
            id,
        })?;
        record_mutation::<T>(Mutation::Delete, 1);
        Ok(())
    }

    async fn delete_matching(&self, filter: Filter<T::Field>) -> Result<u64> {
        let ids: Vec<EntityId> = {
            let table = self.table.read().await;
            table
                .rows
                .values()
                .filter(|e| filter.matches(*e))
                .filter_map(|e| e.id())
                .collect()
        };
        if ids.is_empty() {
            return Ok(0);
        }

        let mut table = self.table.write().await;
        let removed = ids
            .iter()
            .filter(|id| table.rows.remove(*id).is_some())
            .count() as u64;
        record_mutation::<T>(Mutation::Delete, removed);
        Ok(removed)
    }
}
