// ABOUTME: TypedStore, the in-memory map of one record kind mirrored to a persistence backend.
// ABOUTME: Restores from the backend once at init and rewrites the full snapshot after every mutation.

use std::collections::BTreeMap;
use std::sync::Arc;

use relaystore_core::{
    Reason, Record, STORE_STORAGE_VERSION, StoreRecord, format_message_context, merge,
    storage_key, to_patch,
};
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::backend::PersistenceBackend;
use crate::error::StoreError;

/// What `init` did with the persisted snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// Nothing was persisted under this store's key.
    ColdStart,
    /// A snapshot was found and reconciled into the map.
    Restored { loaded: usize, skipped: usize },
    /// Restoring failed; the store kept whatever it already held.
    Failed(String),
    /// `init` had already run on this store.
    AlreadyInitialized,
}

struct StoreState<R: StoreRecord> {
    map: BTreeMap<R::Key, R>,
    /// Values read from the backend and not yet reconciled into `map`.
    cached: Vec<Value>,
    initialized: bool,
}

/// The single source of truth for one record kind's live state.
///
/// Map mutation and the following persist run under one write lock, so
/// mutations never interleave and the backend always receives a snapshot of
/// the map as it was right after that mutation.
pub struct TypedStore<R: StoreRecord> {
    backend: Arc<dyn PersistenceBackend>,
    context: String,
    version: String,
    storage_key: String,
    state: RwLock<StoreState<R>>,
}

impl<R: StoreRecord> TypedStore<R> {
    /// Create a store for `context` at the current storage version.
    pub fn new(backend: Arc<dyn PersistenceBackend>, prefix: &str, context: &str) -> Self {
        Self::with_version(backend, prefix, STORE_STORAGE_VERSION, context)
    }

    pub fn with_version(
        backend: Arc<dyn PersistenceBackend>,
        prefix: &str,
        version: &str,
        context: &str,
    ) -> Self {
        Self {
            backend,
            context: context.to_string(),
            version: version.to_string(),
            storage_key: storage_key(prefix, version, context),
            state: RwLock::new(StoreState {
                map: BTreeMap::new(),
                cached: Vec::new(),
                initialized: false,
            }),
        }
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Restore persisted state. Must complete before any other call; later
    /// calls are no-ops. Never fails: restore errors are logged and reported
    /// through the outcome, leaving the store empty.
    pub async fn init(&self) -> RestoreOutcome {
        let mut state = self.state.write().await;
        if state.initialized {
            tracing::warn!(context = %self.context, "init called more than once, ignoring");
            return RestoreOutcome::AlreadyInitialized;
        }
        tracing::trace!(context = %self.context, "initialized");
        self.initialize(&mut state).await
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.map.is_empty()
    }

    pub async fn keys(&self) -> Vec<R::Key> {
        self.state.read().await.map.keys().cloned().collect()
    }

    pub async fn values(&self) -> Vec<R> {
        self.state.read().await.map.values().cloned().collect()
    }

    /// Insert `value` under `key`, or merge it into the existing value if the
    /// key is already present so fields it leaves unset are not dropped.
    pub async fn set(&self, key: R::Key, value: R) -> Result<(), StoreError> {
        self.ensure_key_matches(&key, &value)?;

        let mut state = self.state.write().await;
        if state.map.contains_key(&key) {
            let patch = to_patch(&value)?;
            return self.update_locked(&mut state, &key, &patch).await;
        }

        tracing::debug!(context = %self.context, "setting value");
        tracing::trace!(method = "set", key = %key, value = ?value);
        state.map.insert(key, value);
        self.persist(&state.map).await
    }

    /// Return a copy of the value stored under `key`.
    pub async fn get(&self, key: &R::Key) -> Result<R, StoreError> {
        tracing::debug!(context = %self.context, "getting value");
        tracing::trace!(method = "get", key = %key);
        let state = self.state.read().await;
        self.get_data(&state.map, key).cloned()
    }

    /// Shallow-merge the fields of `patch` (a JSON object) into the value
    /// stored under `key` and persist the result.
    pub async fn update(&self, key: &R::Key, patch: Value) -> Result<(), StoreError> {
        let Value::Object(patch) = patch else {
            return Err(StoreError::InvalidPatch {
                context: format_message_context(&self.context),
            });
        };
        let mut state = self.state.write().await;
        self.update_locked(&mut state, key, &patch).await
    }

    /// Remove `key`. Absent keys are ignored and cause no persist.
    pub async fn delete(&self, key: &R::Key, reason: &Reason) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if !state.map.contains_key(key) {
            return Ok(());
        }
        tracing::debug!(context = %self.context, "deleting value");
        tracing::trace!(method = "delete", key = %key, reason = %reason);
        state.map.remove(key);
        self.persist(&state.map).await
    }

    // ---------- Private ----------

    async fn update_locked(
        &self,
        state: &mut StoreState<R>,
        key: &R::Key,
        patch: &Map<String, Value>,
    ) -> Result<(), StoreError> {
        tracing::debug!(context = %self.context, "updating value");
        tracing::trace!(method = "update", key = %key, update = ?patch);
        let merged: R = merge(self.get_data(&state.map, key)?, patch)?;
        self.ensure_key_matches(key, &merged)?;
        state.map.insert(key.clone(), merged);
        self.persist(&state.map).await
    }

    fn get_data<'a>(
        &self,
        map: &'a BTreeMap<R::Key, R>,
        key: &R::Key,
    ) -> Result<&'a R, StoreError> {
        map.get(key).ok_or_else(|| {
            let err = StoreError::NotFound {
                context: format_message_context(&self.context),
                key: key.to_string(),
            };
            tracing::error!("{}", err);
            err
        })
    }

    fn ensure_key_matches(&self, key: &R::Key, value: &R) -> Result<(), StoreError> {
        let actual = value.key();
        if &actual == key {
            return Ok(());
        }
        Err(StoreError::KeyMismatch {
            context: format_message_context(&self.context),
            key: key.to_string(),
            actual: actual.to_string(),
        })
    }

    async fn persist(&self, map: &BTreeMap<R::Key, R>) -> Result<(), StoreError> {
        let values = map
            .values()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        self.backend.set_item(&self.storage_key, &values).await?;
        Ok(())
    }

    async fn initialize(&self, state: &mut StoreState<R>) -> RestoreOutcome {
        let restored = self.restore(state).await;
        let (loaded, skipped) = self.reset(state);
        self.on_init(state);

        match restored {
            Ok(None) => RestoreOutcome::ColdStart,
            Ok(Some(_)) => RestoreOutcome::Restored { loaded, skipped },
            Err(e) => {
                tracing::debug!(
                    "failed to restore value for {}",
                    format_message_context(&self.context)
                );
                tracing::error!(context = %self.context, error = %e, "restore failed");
                RestoreOutcome::Failed(e.to_string())
            }
        }
    }

    /// Stage the persisted snapshot into `cached`. Returns the number of
    /// staged values, or None on cold start.
    async fn restore(&self, state: &mut StoreState<R>) -> Result<Option<usize>, StoreError> {
        let persisted = self.backend.get_item(&self.storage_key).await?;
        let Some(persisted) = persisted.filter(|values| !values.is_empty()) else {
            return Ok(None);
        };

        if !state.map.is_empty() {
            let err = StoreError::RestoreConflict {
                context: format_message_context(&self.context),
            };
            tracing::error!("{}", err);
            return Err(err);
        }

        let staged = persisted.len();
        state.cached = persisted;
        tracing::debug!(
            "successfully restored value for {}",
            format_message_context(&self.context)
        );
        tracing::trace!(method = "restore", staged);
        Ok(Some(staged))
    }

    /// Reconcile staged values into the map. Each value is decoded against
    /// this store's own record shape; values that do not fit it are skipped.
    /// `cached` is always left empty.
    fn reset(&self, state: &mut StoreState<R>) -> (usize, usize) {
        let cached = std::mem::take(&mut state.cached);
        let mut loaded = 0;
        let mut skipped = 0;

        for value in cached {
            if let Some(record) = R::from_value(&value) {
                state.map.insert(record.key(), record);
                loaded += 1;
                continue;
            }
            match Record::from_value(value) {
                Some(other) => tracing::trace!(
                    "skipping {} record {} in {} store",
                    other.kind(),
                    other.natural_key(),
                    R::KIND
                ),
                None => tracing::trace!("skipping unrecognized record in {} store", R::KIND),
            }
            skipped += 1;
        }

        if loaded > 0 || skipped > 0 {
            tracing::info!(
                "reconciled {} {} records ({} skipped)",
                loaded,
                R::KIND,
                skipped
            );
        }
        (loaded, skipped)
    }

    fn on_init(&self, state: &mut StoreState<R>) {
        state.cached.clear();
        state.initialized = true;
    }
}
