//! Entity identity: kinds, cache keys and the `Entity` trait.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kinds of entities held in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Accounts,
    Relationships,
    Groups,
    GroupRelationships,
}

impl EntityKind {
    /// Stable name of the kind, as used in logs and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Accounts => "accounts",
            EntityKind::Relationships => "relationships",
            EntityKind::Groups => "groups",
            EntityKind::GroupRelationships => "group_relationships",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `(kind, id)` pair identifying a cached entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey {
    pub kind: EntityKind,
    pub id: String,
}

impl CacheKey {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    /// Key for an entity type, using its declared kind.
    pub fn of<E: Entity>(id: impl Into<String>) -> Self {
        Self::new(E::KIND, id)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

/// A validated domain record identified by kind and id.
pub trait Entity: Send + Sync + 'static {
    /// The kind under which this entity is cached.
    const KIND: EntityKind;

    /// The entity's server-assigned identifier.
    fn id(&self) -> &str;

    /// The cache key this entity lives under.
    fn cache_key(&self) -> CacheKey {
        CacheKey::new(Self::KIND, self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_display() {
        let key = CacheKey::new(EntityKind::Accounts, "42");
        assert_eq!(key.to_string(), "accounts#42");
    }

    #[test]
    fn test_cache_keys_differ_by_kind() {
        let account = CacheKey::new(EntityKind::Accounts, "1");
        let group = CacheKey::new(EntityKind::Groups, "1");
        assert_ne!(account, group);
    }
}
