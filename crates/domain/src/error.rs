//! Domain error types.

use thiserror::Error;

/// Errors raised while projecting a request onto an entity image.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// A source value has no valid representation on the destination.
    #[error("Cannot project {field} onto {target}: {reason}")]
    InvalidValue {
        target: &'static str,
        field: &'static str,
        reason: String,
    },
}
