//! Group hooks: group lookup with membership, and membership mutations.

use quill_core::api::paths;
use quill_core::group::{Group, GroupRelationship};
use quill_core::{CacheKey, QuillError, Result};
use serde_json::Value;
use std::sync::Arc;

use crate::hooks::{EntityActions, EntityQuery, Endpoints, UseEntity};
use crate::scope::Scope;
use crate::session::Session;
use crate::store::EntityStore;

/// Read-only merge of a group and the viewer's membership in it.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupView {
    pub group: Arc<Group>,
    pub relationship: Option<Arc<GroupRelationship>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupState {
    pub group: Option<GroupView>,
    pub is_loading: bool,
    pub error: Option<QuillError>,
}

pub struct UseGroup {
    group: UseEntity<Group>,
    relationship: UseEntity<GroupRelationship>,
}

/// Looks up a group together with the viewer's membership.
///
/// Idle unless the instance supports groups.
pub fn use_group(session: &Session, group_id: Option<&str>, scope: &Scope) -> UseGroup {
    let id = group_id.unwrap_or_default();
    let enabled = group_id.is_some() && session.features().groups;

    UseGroup {
        group: session.use_entity(
            EntityQuery::new(CacheKey::of::<Group>(id), paths::group(id)).enabled(enabled),
            scope,
        ),
        relationship: session.use_entity(
            EntityQuery::new(
                CacheKey::of::<GroupRelationship>(id),
                paths::group_relationships(id),
            )
            .enabled(enabled),
            scope,
        ),
    }
}

impl UseGroup {
    pub fn snapshot(&self) -> GroupState {
        let group = self.group.snapshot();
        let relationship = self.relationship.snapshot();

        GroupState {
            is_loading: group.is_loading || relationship.is_loading,
            error: group.error.or(relationship.error),
            group: group.entity.map(|group| GroupView {
                group,
                relationship: relationship.entity,
            }),
        }
    }

    pub async fn settled(&mut self) -> GroupState {
        self.group.settled().await;
        self.relationship.settled().await;
        self.snapshot()
    }

    pub async fn changed(&mut self) -> Option<GroupState> {
        tokio::select! {
            state = self.group.changed() => { state?; }
            state = self.relationship.changed() => { state?; }
        }
        Some(self.snapshot())
    }
}

/// Join or leave a group.
///
/// The returned membership is cached under the group's id; `invalidate`
/// drops the cached group so its member count is refetched.
pub struct GroupMembership {
    actions: EntityActions<GroupRelationship>,
    group_key: CacheKey,
    store: EntityStore,
}

impl GroupMembership {
    pub async fn mutate(&self, body: Option<Value>) -> Result<Arc<GroupRelationship>> {
        self.actions.create_entity(body).await
    }

    pub fn is_loading(&self) -> bool {
        self.actions.is_loading()
    }

    pub fn error(&self) -> Option<QuillError> {
        self.actions.error()
    }

    pub fn invalidate(&self) {
        self.store.invalidate(&self.group_key);
    }
}

fn membership(session: &Session, group: &Group, path: String) -> GroupMembership {
    GroupMembership {
        actions: session.entity_actions(
            CacheKey::of::<GroupRelationship>(&group.id),
            Endpoints::post(path),
        ),
        group_key: CacheKey::of::<Group>(&group.id),
        store: session.store().clone(),
    }
}

pub fn use_join_group(session: &Session, group: &Group) -> GroupMembership {
    membership(session, group, paths::join_group(&group.id))
}

pub fn use_leave_group(session: &Session, group: &Group) -> GroupMembership {
    membership(session, group, paths::leave_group(&group.id))
}

/// Edits a group's details in place.
pub fn use_update_group(session: &Session, group_id: &str) -> EntityActions<Group> {
    session.entity_actions(CacheKey::of::<Group>(group_id), Endpoints::patch(paths::group(group_id)))
}

pub fn use_delete_group(session: &Session, group_id: &str) -> EntityActions<Group> {
    session.entity_actions(CacheKey::of::<Group>(group_id), Endpoints::delete(paths::group(group_id)))
}
