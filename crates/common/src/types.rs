use serde::{Deserialize, Serialize};

/// Store-assigned integer identity of an entity.
///
/// Wraps an `i64` so entity identities cannot be mixed up with prices,
/// counts or other integers flowing through the same code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(i64);

impl EntityId {
    /// Creates an entity ID from a raw integer.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the underlying integer.
    pub const fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<EntityId> for i64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// The user or service on whose behalf a mutation is performed.
///
/// Recorded in the `created_by` / `last_modified_by` audit fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Actor(String);

impl Actor {
    /// Name used when no actor is configured.
    pub const SYSTEM: &'static str = "system";

    /// Creates an actor from a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The fallback actor for single-tenant deployments.
    pub fn system() -> Self {
        Self(Self::SYSTEM.to_string())
    }

    /// Returns the actor name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Actor {
    fn default() -> Self {
        Self::system()
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Actor {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Actor {
    fn from(name: String) -> Self {
        Self(name)
    }
}
