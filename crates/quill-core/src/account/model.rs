//! Account domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::{Entity, EntityKind};
use crate::schema::{Schema, ValidationError, from_json, require_id};

/// A local or remote account as returned by `/api/v1/accounts/:id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub acct: String,
    pub username: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub header: String,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub bot: bool,
    /// Pleroma-style admin flag; absent on vanilla Mastodon.
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub followers_count: u64,
    #[serde(default)]
    pub following_count: u64,
    #[serde(default)]
    pub statuses_count: u64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Account {
    /// The name to show in the UI, falling back to the username.
    pub fn display_name_or_username(&self) -> &str {
        if self.display_name.trim().is_empty() {
            &self.username
        } else {
            &self.display_name
        }
    }

    /// Whether the account lives on another instance.
    pub fn is_remote(&self) -> bool {
        self.acct.contains('@')
    }
}

impl Entity for Account {
    const KIND: EntityKind = EntityKind::Accounts;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Schema for Account {
    fn parse(value: &Value) -> Result<Self, ValidationError> {
        let account: Account = from_json(Self::KIND, value)?;
        require_id(Self::KIND, &account.id)?;
        if account.username.trim().is_empty() {
            return Err(ValidationError::new(Self::KIND, "username must not be empty"));
        }
        Ok(account)
    }
}
