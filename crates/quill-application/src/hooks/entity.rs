//! Fetch-or-read access to a single entity.
//!
//! [`EntityFetcher`] owns the in-flight request table: at most one request
//! per cache key is outstanding, and every caller asking for that key
//! attaches to the same shared task. The task is spawned, so its store
//! write lands even if every caller has gone away, unless the store was
//! cleared in the meantime.

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use quill_core::{ApiClient, CacheKey, QuillError, Result, Schema};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

use crate::scope::Scope;
use crate::store::{AnyEntity, ConditionalWrite, EntityStore, EntitySubscription};

type SharedFetch = Shared<BoxFuture<'static, Result<AnyEntity>>>;

/// Describes one cacheable resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityQuery {
    pub key: CacheKey,
    /// Path passed to the API client's `get`.
    pub path: String,
    /// Disabled queries never touch the network or the store.
    pub enabled: bool,
}

impl EntityQuery {
    pub fn new(key: CacheKey, path: impl Into<String>) -> Self {
        Self {
            key,
            path: path.into(),
            enabled: true,
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Progress of the request behind a hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    /// Disabled; nothing was requested.
    Idle,
    Loading,
    Ready,
    Failed(QuillError),
}

/// What a consumer sees of an entity at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityState<E> {
    pub entity: Option<Arc<E>>,
    pub is_loading: bool,
    pub error: Option<QuillError>,
}

impl<E> EntityState<E> {
    pub fn idle() -> Self {
        Self {
            entity: None,
            is_loading: false,
            error: None,
        }
    }

    fn cancelled() -> Self {
        Self {
            entity: None,
            is_loading: false,
            error: Some(QuillError::Cancelled),
        }
    }
}

struct InFlight {
    ticket: u64,
    future: SharedFetch,
}

type InFlightTable = Arc<Mutex<HashMap<CacheKey, InFlight>>>;

/// Removes a request's own entry from the table when its task ends,
/// including by panic.
struct InFlightGuard {
    in_flight: InFlightTable,
    key: CacheKey,
    ticket: u64,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if in_flight.get(&self.key).is_some_and(|pending| pending.ticket == self.ticket) {
            in_flight.remove(&self.key);
        }
    }
}

/// Store position a fetch started from.
#[derive(Debug, Clone, Copy)]
struct FetchOrigin {
    epoch: u64,
    revision: u64,
}

/// Issues de-duplicated, validated fetches into an [`EntityStore`].
#[derive(Clone)]
pub struct EntityFetcher {
    client: Arc<dyn ApiClient>,
    store: EntityStore,
    in_flight: InFlightTable,
    tickets: Arc<AtomicU64>,
}

impl EntityFetcher {
    pub fn new(client: Arc<dyn ApiClient>, store: EntityStore) -> Self {
        Self {
            client,
            store,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            tickets: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn client(&self) -> &Arc<dyn ApiClient> {
        &self.client
    }

    /// Number of requests currently outstanding.
    pub fn in_flight(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Forgets every outstanding request so later loads start fresh ones.
    ///
    /// The forgotten requests still finish, but their writes are refused
    /// once the store has been cleared.
    pub fn reset(&self) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !in_flight.is_empty() {
            tracing::debug!(requests = in_flight.len(), "detaching in-flight requests");
        }
        in_flight.clear();
    }

    /// Returns the cached entity, fetching it first if absent or stale.
    ///
    /// # Errors
    ///
    /// Returns an error if the query is disabled, the transport fails or the
    /// payload does not validate. The store is untouched in every error case.
    pub async fn load<E: Schema>(&self, query: &EntityQuery) -> Result<Arc<E>> {
        if !query.enabled {
            return Err(QuillError::internal(format!("query for {} is disabled", query.key)));
        }
        if self.store.is_fresh(&query.key) {
            if let Some(entity) = self.store.get::<E>(&query.key) {
                tracing::debug!(key = %query.key, "cache hit");
                return Ok(entity);
            }
        }
        self.fetch::<E>(query).await
    }

    /// Fetches the entity even if a fresh copy is cached.
    ///
    /// Still joins a request already in flight for the key.
    pub async fn fetch<E: Schema>(&self, query: &EntityQuery) -> Result<Arc<E>> {
        let value = self.dispatch::<E>(query).await?;
        value.downcast::<E>().map_err(|_| {
            QuillError::internal(format!("{} is cached under a different type", query.key))
        })
    }

    /// Returns the shared request for the key, starting one if needed.
    fn dispatch<E: Schema>(&self, query: &EntityQuery) -> SharedFetch {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(pending) = in_flight.get(&query.key) {
            tracing::debug!(key = %query.key, "joining in-flight request");
            return pending.future.clone();
        }

        let ticket = self.tickets.fetch_add(1, Ordering::Relaxed);
        let origin = FetchOrigin {
            epoch: self.store.epoch(),
            revision: self.store.revision(&query.key),
        };
        tracing::debug!(key = %query.key, path = %query.path, "cache miss, requesting");

        let guard = InFlightGuard {
            in_flight: self.in_flight.clone(),
            key: query.key.clone(),
            ticket,
        };
        let task = tokio::spawn(run_fetch::<E>(
            self.client.clone(),
            self.store.clone(),
            guard,
            query.path.clone(),
            origin,
        ));
        let future = async move {
            task.await
                .unwrap_or_else(|e| Err(QuillError::internal(format!("fetch task failed: {e}"))))
        }
        .boxed()
        .shared();

        in_flight.insert(
            query.key.clone(),
            InFlight {
                ticket,
                future: future.clone(),
            },
        );
        future
    }

    /// Starts a reactive hook for the query.
    ///
    /// Disabled queries yield an idle hook without side effects. Fresh cache
    /// entries are served without a request.
    pub fn use_entity<E: Schema>(&self, query: EntityQuery, scope: &Scope) -> UseEntity<E> {
        if !query.enabled {
            let (_, status) = watch::channel(FetchStatus::Idle);
            return UseEntity {
                fetcher: self.clone(),
                query,
                scope: scope.clone(),
                status,
                subscription: None,
                _marker: PhantomData,
            };
        }

        let subscription = self.store.subscribe(&query.key);
        let cached = self.store.is_fresh(&query.key) && self.store.get::<E>(&query.key).is_some();
        let status = if cached {
            tracing::debug!(key = %query.key, "cache hit");
            let (_, status) = watch::channel(FetchStatus::Ready);
            status
        } else {
            self.watch_request::<E>(&query, scope)
        };

        UseEntity {
            fetcher: self.clone(),
            query,
            scope: scope.clone(),
            status,
            subscription: Some(subscription),
            _marker: PhantomData,
        }
    }

    /// Tracks the shared request on behalf of one consumer.
    ///
    /// The watcher gives up when the scope is cancelled; the request itself
    /// keeps running.
    fn watch_request<E: Schema>(
        &self,
        query: &EntityQuery,
        scope: &Scope,
    ) -> watch::Receiver<FetchStatus> {
        let (tx, rx) = watch::channel(FetchStatus::Loading);
        let request = self.dispatch::<E>(query);
        let token = scope.token().clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    tx.send_replace(FetchStatus::Failed(QuillError::Cancelled));
                }
                outcome = request => {
                    tx.send_replace(match outcome {
                        Ok(_) => FetchStatus::Ready,
                        Err(err) => FetchStatus::Failed(err),
                    });
                }
            }
        });
        rx
    }
}

async fn run_fetch<E: Schema>(
    client: Arc<dyn ApiClient>,
    store: EntityStore,
    guard: InFlightGuard,
    path: String,
    origin: FetchOrigin,
) -> Result<AnyEntity> {
    let key = &guard.key;

    match client.get(&path).await {
        Ok(payload) => match E::parse_for(&payload, &key.id) {
            Ok(entity) => {
                let entity: AnyEntity = Arc::new(entity);
                write_fetched(&store, key, entity, origin)
            }
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "discarding invalid payload");
                Err(QuillError::from(err))
            }
        },
        Err(err) => {
            tracing::debug!(key = %key, error = %err, "request failed");
            Err(err.into_not_found(key.kind, &key.id))
        }
    }
}

/// Writes a fetch result unless the store was cleared since it started.
///
/// With the stale-fetch guard on, a key written since the fetch started
/// keeps its newer value and that value is returned instead.
fn write_fetched(
    store: &EntityStore,
    key: &CacheKey,
    entity: AnyEntity,
    origin: FetchOrigin,
) -> Result<AnyEntity> {
    let revision = store.config().guard_stale_fetches.then_some(origin.revision);
    match store.put_any_if(key, entity.clone(), origin.epoch, revision) {
        ConditionalWrite::Written => Ok(entity),
        ConditionalWrite::KeyChanged => {
            tracing::debug!(key = %key, "key changed during fetch, keeping newer entry");
            Ok(store.get_any(key).unwrap_or(entity))
        }
        ConditionalWrite::StoreCleared => {
            tracing::debug!(key = %key, "store cleared during fetch, dropping result");
            Err(QuillError::Cancelled)
        }
    }
}

/// A consumer's live view of one entity.
pub struct UseEntity<E> {
    fetcher: EntityFetcher,
    query: EntityQuery,
    scope: Scope,
    status: watch::Receiver<FetchStatus>,
    subscription: Option<EntitySubscription>,
    _marker: PhantomData<fn() -> E>,
}

impl<E: Schema> UseEntity<E> {
    pub fn query(&self) -> &EntityQuery {
        &self.query
    }

    pub fn status(&self) -> FetchStatus {
        self.status.borrow().clone()
    }

    /// Current state, read synchronously from the store.
    pub fn snapshot(&self) -> EntityState<E> {
        if self.scope.is_cancelled() {
            return EntityState::cancelled();
        }
        if !self.query.enabled {
            return EntityState::idle();
        }
        let status = self.status.borrow().clone();
        EntityState {
            entity: self.fetcher.store().get::<E>(&self.query.key),
            is_loading: status == FetchStatus::Loading,
            error: match status {
                FetchStatus::Failed(err) => Some(err),
                _ => None,
            },
        }
    }

    /// Waits until the request behind this hook settles.
    ///
    /// Store writes made up to this point count as observed by `changed`.
    pub async fn settled(&mut self) -> EntityState<E> {
        loop {
            if *self.status.borrow_and_update() != FetchStatus::Loading {
                break;
            }
            tokio::select! {
                _ = self.scope.cancelled() => break,
                changed = self.status.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        if let Some(subscription) = self.subscription.as_mut() {
            subscription.mark_seen();
        }
        self.snapshot()
    }

    /// Waits for the next store write or status change for this key.
    ///
    /// Returns `None` for disabled hooks and once the scope is cancelled.
    pub async fn changed(&mut self) -> Option<EntityState<E>> {
        if self.scope.is_cancelled() {
            return None;
        }
        let subscription = self.subscription.as_mut()?;
        tokio::select! {
            _ = self.scope.cancelled() => return None,
            revision = subscription.changed() => { revision?; }
            status = self.status.changed() => {
                if status.is_err() {
                    // Settled status; only store writes remain.
                    let subscription = self.subscription.as_mut()?;
                    tokio::select! {
                        _ = self.scope.cancelled() => return None,
                        revision = subscription.changed() => { revision?; }
                    }
                }
            }
        }
        Some(self.snapshot())
    }

    /// Requests the entity again even if the cached copy is fresh.
    pub fn refetch(&mut self) {
        if !self.query.enabled || self.scope.is_cancelled() {
            return;
        }
        self.status = self.fetcher.watch_request::<E>(&self.query, &self.scope);
    }
}
