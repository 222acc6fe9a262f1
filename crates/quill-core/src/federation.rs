//! Federation restrictions placed on a remote instance.
//!
//! Derives the list of restrictions to display from the raw MRF flags a
//! backend reports for a host.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw federation flags for a remote host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FederationFlags {
    pub accept: bool,
    pub reject: bool,
    pub reject_deletes: bool,
    pub report_removal: bool,
    pub avatar_removal: bool,
    pub banner_removal: bool,
    pub federated_timeline_removal: bool,
    pub followers_only: bool,
    pub media_nsfw: bool,
    pub media_removal: bool,
}

/// A remote instance and the flags applied to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteInstance {
    pub host: String,
    #[serde(default)]
    pub federation: FederationFlags,
}

/// A single restriction, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Restriction {
    FollowersOnly,
    FederatedTimelineRemoval,
    FullMediaRemoval,
    PartialMediaRemoval,
    MediaNsfw,
}

impl fmt::Display for Restriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Restriction::FollowersOnly => "Hidden except to followers",
            Restriction::FederatedTimelineRemoval => "Fediverse timeline removal",
            Restriction::FullMediaRemoval => "Full media removal",
            Restriction::PartialMediaRemoval => "Partial media removal",
            Restriction::MediaNsfw => "Attachments marked NSFW",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "restrictions", rename_all = "snake_case")]
pub enum FederationSummary {
    /// All activities from the host are blocked.
    Rejected,
    NoRestrictions,
    Restricted(Vec<Restriction>),
}

impl FederationFlags {
    /// True when any flag other than the informational ones is set.
    ///
    /// `accept`, `reject_deletes` and `report_removal` do not count.
    pub fn has_restrictions(&self) -> bool {
        self.reject
            || self.avatar_removal
            || self.banner_removal
            || self.federated_timeline_removal
            || self.followers_only
            || self.media_nsfw
            || self.media_removal
    }

    pub fn restrictions(&self) -> Vec<Restriction> {
        let mut items = Vec::new();

        let full_media_removal = self.media_removal && self.avatar_removal && self.banner_removal;
        let partial_media_removal = self.media_removal || self.avatar_removal || self.banner_removal;

        if self.followers_only {
            items.push(Restriction::FollowersOnly);
        } else if self.federated_timeline_removal {
            items.push(Restriction::FederatedTimelineRemoval);
        }

        if full_media_removal {
            items.push(Restriction::FullMediaRemoval);
        } else if partial_media_removal {
            items.push(Restriction::PartialMediaRemoval);
        }

        if !full_media_removal && self.media_nsfw {
            items.push(Restriction::MediaNsfw);
        }

        items
    }

    pub fn summary(&self) -> FederationSummary {
        if self.reject {
            FederationSummary::Rejected
        } else if self.has_restrictions() {
            FederationSummary::Restricted(self.restrictions())
        } else {
            FederationSummary::NoRestrictions
        }
    }
}

impl RemoteInstance {
    pub fn summary(&self) -> FederationSummary {
        self.federation.summary()
    }
}

/// Whether moderation details for remote hosts may be shown to the viewer.
pub fn moderation_disclosed(disclosed: bool, is_admin: bool) -> bool {
    disclosed || is_admin
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reject_wins() {
        let flags = FederationFlags {
            reject: true,
            media_removal: true,
            ..Default::default()
        };
        assert_eq!(flags.summary(), FederationSummary::Rejected);
    }

    #[test]
    fn test_informational_flags_are_not_restrictions() {
        let flags = FederationFlags {
            accept: true,
            reject_deletes: true,
            report_removal: true,
            ..Default::default()
        };
        assert_eq!(flags.summary(), FederationSummary::NoRestrictions);
    }

    #[test]
    fn test_followers_only_shadows_timeline_removal() {
        let flags = FederationFlags {
            followers_only: true,
            federated_timeline_removal: true,
            ..Default::default()
        };
        assert_eq!(flags.restrictions(), vec![Restriction::FollowersOnly]);
    }

    #[test]
    fn test_full_media_removal_hides_nsfw() {
        let flags = FederationFlags {
            media_removal: true,
            avatar_removal: true,
            banner_removal: true,
            media_nsfw: true,
            ..Default::default()
        };
        assert_eq!(flags.restrictions(), vec![Restriction::FullMediaRemoval]);
    }

    #[test]
    fn test_partial_media_removal_with_nsfw() {
        let flags = FederationFlags {
            federated_timeline_removal: true,
            avatar_removal: true,
            media_nsfw: true,
            ..Default::default()
        };
        assert_eq!(
            flags.summary(),
            FederationSummary::Restricted(vec![
                Restriction::FederatedTimelineRemoval,
                Restriction::PartialMediaRemoval,
                Restriction::MediaNsfw,
            ])
        );
    }

    #[test]
    fn test_remote_instance_deserializes_without_flags() {
        let instance: RemoteInstance =
            serde_json::from_str(r#"{ "host": "example.social" }"#).unwrap();
        assert_eq!(instance.summary(), FederationSummary::NoRestrictions);
    }

    #[test]
    fn test_moderation_disclosed() {
        assert!(moderation_disclosed(true, false));
        assert!(moderation_disclosed(false, true));
        assert!(!moderation_disclosed(false, false));
    }

    #[test]
    fn test_restriction_labels() {
        let labels: Vec<String> = FederationFlags {
            followers_only: true,
            avatar_removal: true,
            media_nsfw: true,
            ..Default::default()
        }
        .restrictions()
        .iter()
        .map(ToString::to_string)
        .collect();

        assert_eq!(
            labels,
            ["Hidden except to followers", "Partial media removal", "Attachments marked NSFW"]
        );
    }
}
