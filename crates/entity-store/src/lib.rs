pub mod audit;
pub mod entity;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use audit::{AuditInfo, Auditable, Clock, FixedClock, Mutation, SystemClock};
pub use common::{Actor, EntityId};
pub use entity::{Entity, FieldValue};
pub use error::{Result, StoreError};
pub use memory::InMemoryEntityStore;
pub use postgres::{PgEntity, PostgresEntityStore};
pub use query::{CompareOp, Direction, EntityQuery, Filter, OrderBy};
pub use store::{EntityStore, EntityStoreExt};
