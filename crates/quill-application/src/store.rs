//! Process-wide entity store.
//!
//! A normalized cache keyed by `(kind, id)`. Reads are synchronous against
//! the in-memory snapshot; every write or invalidation bumps the key's
//! revision and wakes its subscribers. The store knows nothing about the
//! network.

use quill_core::{CacheKey, Entity};
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// A type-erased cached entity.
pub(crate) type AnyEntity = Arc<dyn Any + Send + Sync>;

/// Store tuning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreConfig {
    /// Entries older than this are refetched on the next read.
    /// `None` keeps entries fresh until invalidated.
    pub stale_after: Option<Duration>,
    /// Drop fetch results for keys written after the fetch started.
    pub guard_stale_fetches: bool,
}

struct Slot {
    value: AnyEntity,
    fetched_at: Instant,
}

/// Result of a conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConditionalWrite {
    Written,
    /// The key was written or invalidated after the expected revision.
    KeyChanged,
    /// The store was cleared since the writer's epoch.
    StoreCleared,
}

#[derive(Default)]
struct StoreState {
    entries: HashMap<CacheKey, Slot>,
    /// Kept across invalidation so revisions never go backwards for a
    /// subscribed key. `clear` drops the revisions nobody watches, so the
    /// map is bounded by the keys used since the last clear.
    revisions: HashMap<CacheKey, u64>,
    watchers: HashMap<CacheKey, watch::Sender<u64>>,
    /// Bumped by every `clear`.
    epoch: u64,
}

impl StoreState {
    fn bump(&mut self, key: &CacheKey) -> u64 {
        let revision = self.revisions.entry(key.clone()).or_insert(0);
        *revision += 1;
        let revision = *revision;
        if let Some(tx) = self.watchers.get(key) {
            tx.send_replace(revision);
        }
        revision
    }
}

/// In-memory cache of validated entities.
///
/// Cloning is cheap; clones share the same underlying state.
#[derive(Clone)]
pub struct EntityStore {
    state: Arc<RwLock<StoreState>>,
    config: StoreConfig,
}

impl EntityStore {
    /// Creates a new empty store.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            state: Arc::new(RwLock::new(StoreState::default())),
            config,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Gets a cached entity.
    ///
    /// Returns `None` if the key is absent or holds a different type.
    pub fn get<E: Entity>(&self, key: &CacheKey) -> Option<Arc<E>> {
        self.get_any(key).and_then(|value| value.downcast::<E>().ok())
    }

    pub(crate) fn get_any(&self, key: &CacheKey) -> Option<AnyEntity> {
        self.read().entries.get(key).map(|slot| slot.value.clone())
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.read().entries.contains_key(key)
    }

    /// Whether the key holds an entry younger than `stale_after`.
    pub fn is_fresh(&self, key: &CacheKey) -> bool {
        let state = self.read();
        match (state.entries.get(key), self.config.stale_after) {
            (Some(_), None) => true,
            (Some(slot), Some(ttl)) => slot.fetched_at.elapsed() < ttl,
            (None, _) => false,
        }
    }

    /// Number of writes and invalidations seen for the key.
    pub fn revision(&self, key: &CacheKey) -> u64 {
        self.read().revisions.get(key).copied().unwrap_or(0)
    }

    /// Number of times the store has been cleared.
    pub fn epoch(&self) -> u64 {
        self.read().epoch
    }

    /// Writes an entity and notifies subscribers of its key.
    pub fn put<E: Entity>(&self, key: &CacheKey, entity: E) -> Arc<E> {
        let entity = Arc::new(entity);
        self.put_any(key, entity.clone());
        entity
    }

    pub(crate) fn put_any(&self, key: &CacheKey, value: AnyEntity) -> u64 {
        let mut state = self.write();
        state.entries.insert(
            key.clone(),
            Slot {
                value,
                fetched_at: Instant::now(),
            },
        );
        state.bump(key)
    }

    /// Writes only if the store was not cleared since `epoch` and, when
    /// `revision` is given, nothing touched the key since it was read.
    ///
    /// Leaves the entry alone otherwise.
    pub(crate) fn put_any_if(
        &self,
        key: &CacheKey,
        value: AnyEntity,
        epoch: u64,
        revision: Option<u64>,
    ) -> ConditionalWrite {
        let mut state = self.write();
        if state.epoch != epoch {
            return ConditionalWrite::StoreCleared;
        }
        let current = state.revisions.get(key).copied().unwrap_or(0);
        if revision.is_some_and(|expected| expected != current) {
            return ConditionalWrite::KeyChanged;
        }
        state.entries.insert(
            key.clone(),
            Slot {
                value,
                fetched_at: Instant::now(),
            },
        );
        state.bump(key);
        ConditionalWrite::Written
    }

    /// Removes an entry and notifies subscribers of its key.
    ///
    /// Returns whether an entry was present.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        let mut state = self.write();
        let removed = state.entries.remove(key).is_some();
        state.bump(key);
        tracing::debug!(key = %key, removed, "invalidated cache entry");
        removed
    }

    /// Drops every entry, e.g. on logout or account switch.
    ///
    /// Starts a new epoch: conditional writes begun before the clear are
    /// refused.
    pub fn clear(&self) {
        let mut state = self.write();
        let entries = state.entries.len();
        state.entries.clear();
        state.epoch += 1;
        state.watchers.retain(|_, tx| tx.receiver_count() > 0);

        let watched: HashSet<CacheKey> = state.watchers.keys().cloned().collect();
        state.revisions.retain(|key, _| watched.contains(key));
        for key in &watched {
            state.bump(key);
        }
        tracing::info!(entries, epoch = state.epoch, "cleared entity store");
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribes to writes and invalidations of a single key.
    pub fn subscribe(&self, key: &CacheKey) -> EntitySubscription {
        let mut state = self.write();
        state.watchers.retain(|_, tx| tx.receiver_count() > 0);
        let current = state.revisions.get(key).copied().unwrap_or(0);
        let rx = match state.watchers.get(key) {
            Some(tx) => tx.subscribe(),
            None => {
                let (tx, rx) = watch::channel(current);
                state.watchers.insert(key.clone(), tx);
                rx
            }
        };
        EntitySubscription {
            key: key.clone(),
            rx,
        }
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

/// Change notifications for one cache key.
pub struct EntitySubscription {
    key: CacheKey,
    rx: watch::Receiver<u64>,
}

impl EntitySubscription {
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Waits for the next write or invalidation of the key.
    ///
    /// Returns the new revision, or `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<u64> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }

    /// Treats every change so far as observed.
    pub fn mark_seen(&mut self) {
        self.rx.borrow_and_update();
    }
}
