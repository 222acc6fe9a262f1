//! Session lifecycle.
//!
//! A [`Session`] owns the process-wide store for one signed-in viewer. It
//! is created at application start and its store is cleared whenever the
//! viewer changes, so no entity fetched for one account leaks into
//! another.

use quill_core::{ApiClient, CacheKey, Features, Schema};
use std::sync::{Arc, PoisonError, RwLock};

use crate::hooks::{EntityActions, EntityFetcher, EntityQuery, Endpoints, UseEntity};
use crate::scope::Scope;
use crate::store::{EntityStore, StoreConfig};

/// Inputs for a new session.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub store: StoreConfig,
    pub features: Features,
    /// Id of the signed-in account, if any.
    pub me: Option<String>,
}

pub struct Session {
    client: Arc<dyn ApiClient>,
    fetcher: EntityFetcher,
    features: Features,
    me: RwLock<Option<String>>,
}

impl Session {
    pub fn new(client: Arc<dyn ApiClient>, config: SessionConfig) -> Self {
        let store = EntityStore::new(config.store);
        Self {
            fetcher: EntityFetcher::new(client.clone(), store),
            client,
            features: config.features,
            me: RwLock::new(config.me),
        }
    }

    pub fn store(&self) -> &EntityStore {
        self.fetcher.store()
    }

    pub fn fetcher(&self) -> &EntityFetcher {
        &self.fetcher
    }

    pub fn client(&self) -> &Arc<dyn ApiClient> {
        &self.client
    }

    pub fn features(&self) -> &Features {
        &self.features
    }

    /// Id of the signed-in account.
    pub fn me(&self) -> Option<String> {
        self.me
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Switches the viewer and drops everything cached for the previous one.
    ///
    /// Requests still in flight for the previous viewer are detached: new
    /// loads start their own, and the old results never reach the store.
    pub fn switch_account(&self, me: Option<String>) {
        tracing::info!(me = ?me, "switching session account");
        *self.me.write().unwrap_or_else(PoisonError::into_inner) = me;
        self.store().clear();
        self.fetcher.reset();
    }

    pub fn logout(&self) {
        self.switch_account(None);
    }

    pub fn use_entity<E: Schema>(&self, query: EntityQuery, scope: &Scope) -> UseEntity<E> {
        self.fetcher.use_entity(query, scope)
    }

    pub fn entity_actions<E: Schema>(&self, key: CacheKey, endpoints: Endpoints) -> EntityActions<E> {
        EntityActions::new(key, endpoints, self.client.clone(), self.store().clone())
    }
}
