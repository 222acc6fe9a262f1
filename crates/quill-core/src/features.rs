//! Feature flags describing what the connected backend supports.
//!
//! Flags are read-only inputs owned by the embedding application; the
//! data layer only consults them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Features {
    /// Profiles of accounts that block the viewer stay visible.
    pub blockers_visible: bool,
    /// The backend exposes the groups API.
    pub groups: bool,
    /// The backend federates with other instances.
    pub federating: bool,
    /// The backend reports viewer relationships.
    pub relationships: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            blockers_visible: false,
            groups: false,
            federating: true,
            relationships: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_deserialization_keeps_defaults() {
        let features: Features = serde_json::from_str(r#"{ "groups": true }"#).unwrap();
        assert!(features.groups);
        assert!(features.federating);
        assert!(!features.blockers_visible);
    }
}
