use thiserror::Error;

use crate::EntityId;

/// Errors that can occur when interacting with an entity store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No stored entity has the given identity.
    #[error("{kind} with id {id} not found")]
    NotFound { kind: &'static str, id: EntityId },

    /// A mutation that needs a stored identity was given an entity without one.
    #[error("{kind} has no identity; it must be added before it can be updated or deleted")]
    MissingIdentity { kind: &'static str },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for entity store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
