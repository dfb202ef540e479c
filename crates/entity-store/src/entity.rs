//! The entity abstraction stores operate on.

use std::cmp::Ordering;
use std::fmt::Debug;

use chrono::{DateTime, Utc};

use crate::{Auditable, EntityId};

/// A typed value read from one field of an entity.
///
/// Filters compare entity fields against these values; the PostgreSQL store
/// binds them as query parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    /// Compares two values, returning None when the types are incompatible.
    ///
    /// Integers and floats compare numerically with each other.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Int(a), FieldValue::Int(b)) => Some(a.cmp(b)),
            (FieldValue::Float(a), FieldValue::Float(b)) => a.partial_cmp(b),
            (FieldValue::Int(a), FieldValue::Float(b)) => (*a as f64).partial_cmp(b),
            (FieldValue::Float(a), FieldValue::Int(b)) => a.partial_cmp(&(*b as f64)),
            (FieldValue::Text(a), FieldValue::Text(b)) => Some(a.cmp(b)),
            (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Returns the text content if this is a `Text` value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<EntityId> for FieldValue {
    fn from(v: EntityId) -> Self {
        FieldValue::Int(v.as_i64())
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(v: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(v)
    }
}

/// An audited record with an integer identity, persisted by an
/// [`EntityStore`](crate::EntityStore).
///
/// Identity and audit fields belong to the store: implementations expose
/// them but never assign them from request data.
pub trait Entity: Auditable + Clone + Send + Sync + 'static {
    /// Field descriptors usable in filters and orderings.
    type Field: Copy + Eq + Debug + Send + Sync + 'static;

    /// Human-readable entity kind, e.g. `"Product"`.
    fn kind() -> &'static str;

    /// The store-assigned identity, or None before the entity is added.
    fn id(&self) -> Option<EntityId>;

    fn set_id(&mut self, id: EntityId);

    /// Reads one field as a comparable value.
    fn field(&self, field: Self::Field) -> FieldValue;
}
