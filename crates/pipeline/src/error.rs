//! Pipeline error types.

use thiserror::Error;
use uuid::Uuid;

use crate::validation::ValidationFailures;

/// The closed set of failures a dispatch can surface.
///
/// `NotFound` and `Validation` are raised deliberately on the normal control
/// path and carry their payload to the caller untouched. `Internal` never
/// leaves the pipeline: the unhandled-exception behavior reduces it to
/// `Unhandled`.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The entity a request refers to does not exist.
    #[error("Entity \"{entity_kind}\" ({key}) was not found.")]
    NotFound {
        entity_kind: &'static str,
        key: String,
    },

    /// The request failed one or more validation rules.
    #[error("One or more validation failures have occurred: {0}")]
    Validation(ValidationFailures),

    /// An unexpected failure, reduced to the request name and a correlation id.
    #[error("An unknown error occurred for \"{request}\" ({correlation_id})")]
    Unhandled {
        request: &'static str,
        correlation_id: Uuid,
    },

    /// The request was cancelled before it completed.
    #[error("Request was cancelled")]
    Cancelled,

    /// A failure not modelled by the taxonomy, e.g. a store error.
    #[error("Internal error: {0}")]
    Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl PipelineError {
    /// Creates a not-found error for the given entity kind and key.
    pub fn not_found(entity_kind: &'static str, key: impl std::fmt::Display) -> Self {
        PipelineError::NotFound {
            entity_kind,
            key: key.to_string(),
        }
    }

    /// Wraps an arbitrary failure for the unhandled-exception behavior to reduce.
    pub fn internal(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        PipelineError::Internal(error.into())
    }

    /// Returns true for the taxonomy members that reach callers unchanged.
    pub fn is_expected(&self) -> bool {
        !matches!(self, PipelineError::Internal(_))
    }
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
