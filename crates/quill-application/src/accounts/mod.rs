//! Account hooks.
//!
//! Composes an account with the viewer's relationship to it. Both halves
//! are cached independently; the merged [`AccountView`] is built per read
//! and never written back to the store.

use quill_core::account::{Account, Relationship};
use quill_core::api::paths;
use quill_core::{CacheKey, QuillError};
use std::sync::Arc;

use crate::hooks::{EntityQuery, UseEntity};
use crate::scope::Scope;
use crate::session::Session;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UseAccountOpts {
    pub with_relationship: bool,
}

/// Read-only merge of an account and the viewer's relationship to it.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountView {
    pub account: Arc<Account>,
    pub relationship: Option<Arc<Relationship>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccountState {
    pub account: Option<AccountView>,
    /// True until every required piece has resolved.
    pub is_loading: bool,
    pub is_relationship_loading: bool,
    /// The account blocks the viewer and the backend hides blockers.
    pub is_unavailable: bool,
    pub error: Option<QuillError>,
}

pub struct UseAccount {
    account: UseEntity<Account>,
    relationship: UseEntity<Relationship>,
    with_relationship: bool,
    me: Option<String>,
    blockers_visible: bool,
}

/// Looks up an account, optionally with the viewer's relationship.
///
/// A `None` id disables both requests.
pub fn use_account(
    session: &Session,
    account_id: Option<&str>,
    opts: UseAccountOpts,
    scope: &Scope,
) -> UseAccount {
    let id = account_id.unwrap_or_default();
    let with_relationship =
        account_id.is_some() && opts.with_relationship && session.features().relationships;

    let account = session.use_entity::<Account>(
        EntityQuery::new(CacheKey::of::<Account>(id), paths::account(id)).enabled(account_id.is_some()),
        scope,
    );
    let relationship = session.use_entity::<Relationship>(
        EntityQuery::new(
            CacheKey::of::<Relationship>(id),
            paths::account_relationships(id),
        )
        .enabled(with_relationship),
        scope,
    );

    UseAccount {
        account,
        relationship,
        with_relationship,
        me: session.me(),
        blockers_visible: session.features().blockers_visible,
    }
}

impl UseAccount {
    pub fn snapshot(&self) -> AccountState {
        let account = self.account.snapshot();
        let relationship = self.relationship.snapshot();

        let is_blocked = relationship
            .entity
            .as_ref()
            .is_some_and(|r| r.blocked_by);
        let is_me = match (&self.me, &account.entity) {
            (Some(me), Some(account)) => *me == account.id,
            _ => false,
        };

        AccountState {
            is_loading: account.is_loading || (self.with_relationship && relationship.is_loading),
            is_relationship_loading: relationship.is_loading,
            is_unavailable: !is_me && is_blocked && !self.blockers_visible,
            error: account.error.or(relationship.error),
            account: account.entity.map(|account| AccountView {
                account,
                relationship: relationship.entity,
            }),
        }
    }

    /// Waits until both requests settle.
    pub async fn settled(&mut self) -> AccountState {
        self.account.settled().await;
        self.relationship.settled().await;
        self.snapshot()
    }

    /// Waits for the next change to either half.
    ///
    /// Returns `None` once the scope is cancelled or when both halves are
    /// disabled.
    pub async fn changed(&mut self) -> Option<AccountState> {
        if !self.with_relationship {
            self.account.changed().await?;
            return Some(self.snapshot());
        }
        tokio::select! {
            state = self.account.changed() => { state?; }
            state = self.relationship.changed() => { state?; }
        }
        Some(self.snapshot())
    }

    /// Refetches both halves.
    pub fn refetch(&mut self) {
        self.account.refetch();
        self.relationship.refetch();
    }
}
