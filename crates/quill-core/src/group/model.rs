use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::{Entity, EntityKind};
use crate::schema::{Schema, ValidationError, from_json, require_id};

/// Who can see a group's posts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupVisibility {
    #[default]
    Everyone,
    MembersOnly,
}

/// A group as returned by `/api/v1/groups/:id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub header: String,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub membership_required: bool,
    #[serde(default)]
    pub members_count: u64,
    #[serde(default)]
    pub group_visibility: GroupVisibility,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Entity for Group {
    const KIND: EntityKind = EntityKind::Groups;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Schema for Group {
    fn parse(value: &Value) -> Result<Self, ValidationError> {
        let group: Group = from_json(Self::KIND, value)?;
        require_id(Self::KIND, &group.id)?;
        Ok(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_group() {
        let group = Group::parse(&json!({
            "id": "7",
            "display_name": "Rustaceans",
            "members_count": 12,
            "group_visibility": "members_only"
        }))
        .unwrap();
        assert_eq!(group.members_count, 12);
        assert_eq!(group.group_visibility, GroupVisibility::MembersOnly);
        assert!(!group.locked);
    }

    #[test]
    fn test_parse_rejects_unknown_visibility() {
        let result = Group::parse(&json!({
            "id": "7",
            "display_name": "Rustaceans",
            "group_visibility": "secret"
        }));
        assert!(result.is_err());
    }
}
