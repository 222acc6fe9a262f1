//! Relationship between the viewer and another account.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::{Entity, EntityKind};
use crate::schema::{
    Schema, ValidationError, entry_for, first_of_list, from_json, require_id, require_match,
};

/// Viewer-specific state about an account, keyed by that account's id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    #[serde(default)]
    pub following: bool,
    #[serde(default)]
    pub followed_by: bool,
    #[serde(default)]
    pub blocking: bool,
    #[serde(default)]
    pub blocked_by: bool,
    #[serde(default)]
    pub muting: bool,
    #[serde(default)]
    pub muting_notifications: bool,
    #[serde(default)]
    pub requested: bool,
    #[serde(default)]
    pub domain_blocking: bool,
    #[serde(default)]
    pub endorsed: bool,
    #[serde(default)]
    pub notifying: bool,
    #[serde(default)]
    pub note: String,
}

impl Entity for Relationship {
    const KIND: EntityKind = EntityKind::Relationships;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Schema for Relationship {
    /// Accepts the list returned by `/api/v1/accounts/relationships` or a bare object.
    fn parse(value: &Value) -> Result<Self, ValidationError> {
        let relationship: Relationship = from_json(Self::KIND, first_of_list(Self::KIND, value)?)?;
        require_id(Self::KIND, &relationship.id)?;
        Ok(relationship)
    }

    /// Picks the entry for `id` when the server answers with several.
    fn parse_for(value: &Value, id: &str) -> Result<Self, ValidationError> {
        let relationship = Self::parse(entry_for(Self::KIND, value, id)?)?;
        require_match(Self::KIND, id, &relationship.id)?;
        Ok(relationship)
    }
}
