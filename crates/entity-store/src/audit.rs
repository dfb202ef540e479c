//! Audit metadata and the stamping policy applied by every store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Actor;

/// The kind of change a store call performs.
///
/// Stores pass this explicitly to [`stamp`] at the call site rather than
/// inferring it from tracked entity state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutation {
    Insert,
    Update,
    Delete,
}

impl Mutation {
    /// Label used for metrics and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mutation::Insert => "insert",
            Mutation::Update => "update",
            Mutation::Delete => "delete",
        }
    }
}

impl std::fmt::Display for Mutation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// System-assigned creation and modification stamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditInfo {
    pub created_date: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
    pub last_modified_date: Option<DateTime<Utc>>,
    pub last_modified_by: Option<String>,
}

impl AuditInfo {
    /// Returns true once the entity has been stamped as created.
    pub fn is_created(&self) -> bool {
        self.created_date.is_some()
    }

    /// Returns true once the entity has been stamped as modified.
    pub fn is_modified(&self) -> bool {
        self.last_modified_date.is_some()
    }
}

/// Capability of entities that carry [`AuditInfo`].
pub trait Auditable {
    fn audit(&self) -> &AuditInfo;
    fn audit_mut(&mut self) -> &mut AuditInfo;
}

/// Applies the audit policy for `mutation` to `entity`.
///
/// - `Insert` sets the created pair and clears the modified pair.
/// - `Update` sets the modified pair and leaves the created pair alone;
///   stores restore the persisted created pair themselves.
/// - `Delete` stamps nothing.
pub fn stamp<T: Auditable>(entity: &mut T, mutation: Mutation, actor: &Actor, at: DateTime<Utc>) {
    let audit = entity.audit_mut();
    match mutation {
        Mutation::Insert => {
            audit.created_date = Some(at);
            audit.created_by = Some(actor.as_str().to_string());
            audit.last_modified_date = None;
            audit.last_modified_by = None;
        }
        Mutation::Update => {
            audit.last_modified_date = Some(at);
            audit.last_modified_by = Some(actor.as_str().to_string());
        }
        Mutation::Delete => {}
    }
}

/// Source of audit timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Stamped {
        audit: AuditInfo,
    }

    impl Auditable for Stamped {
        fn audit(&self) -> &AuditInfo {
            &self.audit
        }

        fn audit_mut(&mut self) -> &mut AuditInfo {
            &mut self.audit
        }
    }

    #[test]
    fn insert_sets_created_and_clears_modified() {
        let mut entity = Stamped::default();
        entity.audit.last_modified_by = Some("intruder".to_string());
        let at = Utc::now();

        stamp(&mut entity, Mutation::Insert, &Actor::new("alice"), at);

        assert_eq!(entity.audit.created_date, Some(at));
        assert_eq!(entity.audit.created_by.as_deref(), Some("alice"));
        assert!(!entity.audit.is_modified());
        assert!(entity.audit.last_modified_by.is_none());
    }

    #[test]
    fn update_sets_modified_only() {
        let mut entity = Stamped::default();
        let created = Utc::now();
        stamp(&mut entity, Mutation::Insert, &Actor::new("alice"), created);

        let modified = created + chrono::Duration::seconds(5);
        stamp(&mut entity, Mutation::Update, &Actor::new("bob"), modified);

        assert_eq!(entity.audit.created_date, Some(created));
        assert_eq!(entity.audit.created_by.as_deref(), Some("alice"));
        assert_eq!(entity.audit.last_modified_date, Some(modified));
        assert_eq!(entity.audit.last_modified_by.as_deref(), Some("bob"));
    }

    #[test]
    fn delete_stamps_nothing() {
        let mut entity = Stamped::default();
        stamp(&mut entity, Mutation::Delete, &Actor::system(), Utc::now());
        assert_eq!(entity.audit, AuditInfo::default());
    }
}
