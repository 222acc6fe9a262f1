use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::{Entity, EntityKind};
use crate::schema::{
    Schema, ValidationError, entry_for, first_of_list, from_json, require_id, require_match,
};

/// The viewer's role inside a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupRole {
    Owner,
    Admin,
    User,
}

/// The viewer's membership state in a group, keyed by the group id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRelationship {
    pub id: String,
    #[serde(default)]
    pub member: bool,
    #[serde(default)]
    pub requested: bool,
    #[serde(default)]
    pub role: Option<GroupRole>,
    #[serde(default)]
    pub blocked_by: bool,
    #[serde(default)]
    pub muting: bool,
    #[serde(default)]
    pub notifying: Option<bool>,
}

impl GroupRelationship {
    /// Owners and admins may edit the group.
    pub fn can_manage(&self) -> bool {
        self.member && matches!(self.role, Some(GroupRole::Owner | GroupRole::Admin))
    }
}

impl Entity for GroupRelationship {
    const KIND: EntityKind = EntityKind::GroupRelationships;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Schema for GroupRelationship {
    fn parse(value: &Value) -> Result<Self, ValidationError> {
        let relationship: GroupRelationship =
            from_json(Self::KIND, first_of_list(Self::KIND, value)?)?;
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
