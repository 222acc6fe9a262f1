//! Write-through mutations for a single cache key.

use quill_core::{ApiClient, CacheKey, Method, QuillError, Result, Schema};
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::store::{AnyEntity, ConditionalWrite, EntityStore};

/// Endpoints backing each mutation. Unset endpoints reject the call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Endpoints {
    pub post: Option<String>,
    pub patch: Option<String>,
    pub delete: Option<String>,
}

impl Endpoints {
    pub fn post(path: impl Into<String>) -> Self {
        Self {
            post: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self {
            patch: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            delete: Some(path.into()),
            ..Default::default()
        }
    }
}

/// Counts a mutation as in flight until dropped.
struct PendingGuard(Arc<AtomicUsize>);

impl PendingGuard {
    fn new(pending: &Arc<AtomicUsize>) -> Self {
        pending.fetch_add(1, Ordering::SeqCst);
        Self(pending.clone())
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Create/update/delete operations that write through to the store.
///
/// Writes are last-writer-wins: a successful response replaces whatever
/// is cached under the key when it arrives. Responses that arrive after the
/// store was cleared are dropped and reported as cancelled.
pub struct EntityActions<E> {
    key: CacheKey,
    endpoints: Endpoints,
    client: Arc<dyn ApiClient>,
    store: EntityStore,
    pending: Arc<AtomicUsize>,
    last_error: Arc<Mutex<Option<QuillError>>>,
    _marker: PhantomData<fn() -> E>,
}

impl<E> Clone for EntityActions<E> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            endpoints: self.endpoints.clone(),
            client: self.client.clone(),
            store: self.store.clone(),
            pending: self.pending.clone(),
            last_error: self.last_error.clone(),
            _marker: PhantomData,
        }
    }
}

impl<E: Schema> EntityActions<E> {
    pub fn new(key: CacheKey, endpoints: Endpoints, client: Arc<dyn ApiClient>, store: EntityStore) -> Self {
        Self {
            key,
            endpoints,
            client,
            store,
            pending: Arc::new(AtomicUsize::new(0)),
            last_error: Arc::new(Mutex::new(None)),
            _marker: PhantomData,
        }
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// True while any mutation issued through this handle is in flight.
    pub fn is_loading(&self) -> bool {
        self.pending.load(Ordering::SeqCst) > 0
    }

    /// The failure of the most recent mutation, if it failed.
    pub fn error(&self) -> Option<QuillError> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// POSTs `body` and caches the validated response.
    pub async fn create_entity(&self, body: Option<Value>) -> Result<Arc<E>> {
        let path = self.endpoint(Method::Post, self.endpoints.post.as_deref())?;
        self.run(Method::Post, path, body)
            .await?
            .ok_or_else(|| QuillError::internal("create returned no entity"))
    }

    /// PATCHes `body` and caches the validated response.
    pub async fn update_entity(&self, body: Option<Value>) -> Result<Arc<E>> {
        let path = self.endpoint(Method::Patch, self.endpoints.patch.as_deref())?;
        self.run(Method::Patch, path, body)
            .await?
            .ok_or_else(|| QuillError::internal("update returned no entity"))
    }

    /// DELETEs the entity and drops it from the store.
    pub async fn delete_entity(&self) -> Result<()> {
        let path = self.endpoint(Method::Delete, self.endpoints.delete.as_deref())?;
        self.run(Method::Delete, path, None).await.map(|_| ())
    }

    fn endpoint(&self, method: Method, path: Option<&str>) -> Result<String> {
        match path {
            Some(path) => Ok(path.to_string()),
            None => {
                let err = QuillError::missing_endpoint(method.as_str());
                self.record(Some(err.clone()));
                Err(err)
            }
        }
    }

    fn record(&self, error: Option<QuillError>) {
        *self
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = error;
    }

    /// Runs one mutation in its own task so the store write survives the
    /// caller being dropped.
    async fn run(&self, method: Method, path: String, body: Option<Value>) -> Result<Option<Arc<E>>> {
        let _pending = PendingGuard::new(&self.pending);
        self.record(None);

        let epoch = self.store.epoch();
        let task = tokio::spawn(execute::<E>(
            self.client.clone(),
            self.store.clone(),
            self.key.clone(),
            epoch,
            method,
            path,
            body,
        ));
        let outcome = task
            .await
            .unwrap_or_else(|e| Err(QuillError::internal(format!("mutation task failed: {e}"))));
        if let Err(err) = &outcome {
            self.record(Some(err.clone()));
        }
        outcome
    }
}

/// Sends the request and applies its result to the store.
///
/// Deletes yield `None`; creates and updates yield the cached entity.
async fn execute<E: Schema>(
    client: Arc<dyn ApiClient>,
    store: EntityStore,
    key: CacheKey,
    epoch: u64,
    method: Method,
    path: String,
    body: Option<Value>,
) -> Result<Option<Arc<E>>> {
    tracing::debug!(key = %key, %method, path = %path, "mutating entity");
    let payload = client
        .request(method, &path, body)
        .await
        .map_err(|e| e.into_not_found(key.kind, &key.id))?;

    if method == Method::Delete {
        if store.epoch() == epoch {
            store.invalidate(&key);
        }
        return Ok(None);
    }

    match E::parse_for(&payload, &key.id) {
        Ok(entity) => {
            let entity = Arc::new(entity);
            let value: AnyEntity = entity.clone();
            match store.put_any_if(&key, value, epoch, None) {
                ConditionalWrite::StoreCleared => {
                    tracing::debug!(key = %key, "store cleared during mutation, dropping result");
                    Err(QuillError::Cancelled)
                }
                _ => Ok(Some(entity)),
            }
        }
        Err(err) => {
            tracing::warn!(key = %key, error = %err, "discarding invalid mutation response");
            Err(QuillError::from(err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedApi;
    use quill_core::group::{Group, GroupRelationship};
    use quill_core::EntityKind;
    use serde_json::json;

    fn group_key() -> CacheKey {
        CacheKey::new(EntityKind::Groups, "7")
    }

    #[tokio::test]
    async fn test_create_writes_to_store() {
        let api = ScriptedApi::new();
        api.respond(
            Method::Post,
            "/api/v1/groups/7/join",
            Ok(json!({ "id": "7", "member": true, "role": "user" })),
        );
        let store = EntityStore::default();
        let key = CacheKey::new(EntityKind::GroupRelationships, "7");
        let actions = EntityActions::<GroupRelationship>::new(
            key.clone(),
            Endpoints::post("/api/v1/groups/7/join"),
            api.clone(),
            store.clone(),
        );

        let relationship = actions.create_entity(None).await.unwrap();

        assert!(relationship.member);
        assert!(store.get::<GroupRelationship>(&key).unwrap().member);
        assert!(!actions.is_loading());
        assert!(actions.error().is_none());
    }

    #[tokio::test]
    async fn test_is_loading_while_in_flight() {
        let api = ScriptedApi::new();
        let gate = api.respond_gated(
            Method::Patch,
            "/api/v1/groups/7",
            Ok(json!({ "id": "7", "display_name": "Renamed" })),
        );
        let actions = EntityActions::<Group>::new(
            group_key(),
            Endpoints::patch("/api/v1/groups/7"),
            api.clone(),
            EntityStore::default(),
        );

        let observer = actions.clone();
        let check = async move {
            tokio::task::yield_now().await;
            let loading = observer.is_loading();
            gate.notify_one();
            loading
        };
        let (result, was_loading) =
            tokio::join!(actions.update_entity(Some(json!({ "display_name": "Renamed" }))), check);

        assert!(was_loading);
        assert_eq!(result.unwrap().display_name, "Renamed");
        assert!(!actions.is_loading());
    }

    #[tokio::test]
    async fn test_invalid_response_keeps_store() {
        let api = ScriptedApi::new();
        api.respond(Method::Patch, "/api/v1/groups/7", Ok(json!({ "id": "" })));
        let store = EntityStore::default();
        store.put(
            &group_key(),
            Group {
                id: "7".into(),
                display_name: "Original".into(),
                ..Default::default()
            },
        );
        let actions = EntityActions::<Group>::new(
            group_key(),
            Endpoints::patch("/api/v1/groups/7"),
            api.clone(),
            store.clone(),
        );

        let err = actions.update_entity(None).await.unwrap_err();

        assert!(err.is_validation());
        assert_eq!(actions.error(), Some(err));
        assert_eq!(store.get::<Group>(&group_key()).unwrap().display_name, "Original");
    }

    #[tokio::test]
    async fn test_delete_removes_entry() {
        let api = ScriptedApi::new();
        api.respond(Method::Delete, "/api/v1/groups/7", Ok(json!({})));
        let store = EntityStore::default();
        store.put(
            &group_key(),
            Group {
                id: "7".into(),
                display_name: "Doomed".into(),
                ..Default::default()
            },
        );
        let actions = EntityActions::<Group>::new(
            group_key(),
            Endpoints::delete("/api/v1/groups/7"),
            api.clone(),
            store.clone(),
        );

        actions.delete_entity().await.unwrap();

        assert!(!store.contains(&group_key()));
    }

    #[tokio::test]
    async fn test_missing_endpoint_issues_no_request() {
        let api = ScriptedApi::new();
        let actions = EntityActions::<Group>::new(
            group_key(),
            Endpoints::post("/api/v1/groups"),
            api.clone(),
            EntityStore::default(),
        );

        let err = actions.delete_entity().await.unwrap_err();

        assert_eq!(err, QuillError::missing_endpoint("DELETE"));
        assert_eq!(api.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_response_for_other_id_is_rejected() {
        let api = ScriptedApi::new();
        api.respond(
            Method::Patch,
            "/api/v1/groups/7",
            Ok(json!({ "id": "8", "display_name": "Someone else" })),
        );
        let store = EntityStore::default();
        let actions = EntityActions::<Group>::new(
            group_key(),
            Endpoints::patch("/api/v1/groups/7"),
            api.clone(),
            store.clone(),
        );

        let err = actions.update_entity(None).await.unwrap_err();

        assert!(err.is_validation());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_response_after_clear_is_dropped() {
        let api = ScriptedApi::new();
        let gate = api.respond_gated(
            Method::Post,
            "/api/v1/groups/7/join",
            Ok(json!({ "id": "7", "member": true, "role": "user" })),
        );
        let store = EntityStore::default();
        let actions = EntityActions::<GroupRelationship>::new(
            CacheKey::new(EntityKind::GroupRelationships, "7"),
            Endpoints::post("/api/v1/groups/7/join"),
            api.clone(),
            store.clone(),
        );

        let clearing = store.clone();
        let logout = async move {
            tokio::task::yield_now().await;
            clearing.clear();
            gate.notify_one();
        };
        let (result, _) = tokio::join!(actions.create_entity(None), logout);

        assert_eq!(result.unwrap_err(), QuillError::Cancelled);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_transport_error_is_surfaced() {
        let api = ScriptedApi::new();
        api.respond(
            Method::Post,
            "/api/v1/groups/7/join",
            Err(QuillError::transport(Some(422), "already a member")),
        );
        let actions = EntityActions::<GroupRelationship>::new(
            CacheKey::new(EntityKind::GroupRelationships, "7"),
            Endpoints::post("/api/v1/groups/7/join"),
            api.clone(),
            EntityStore::default(),
        );

        let err = actions.create_entity(None).await.unwrap_err();

        assert_eq!(err.status(), Some(422));
        assert!(actions.error().unwrap().is_transport());
    }
}
