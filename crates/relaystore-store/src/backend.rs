// ABOUTME: The persistence backend contract consumed by typed stores, plus an in-memory backend.
// ABOUTME: A backend maps an opaque storage key to the last fully written sequence of records.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::BackendError;

/// Durable key/value slot storage for record snapshots.
///
/// `set_item` must overwrite the whole sequence at `key` atomically: a reader
/// never observes a partially written sequence.
#[async_trait]
pub trait PersistenceBackend: Send + Sync {
    /// Return the last successfully written sequence for `key`, or None if
    /// nothing was ever written there.
    async fn get_item(&self, key: &str) -> Result<Option<Vec<Value>>, BackendError>;

    /// Replace the full sequence stored at `key`.
    async fn set_item(&self, key: &str, values: &[Value]) -> Result<(), BackendError>;
}

#[derive(Debug, Default)]
struct MemoryInner {
    items: HashMap<String, Vec<Value>>,
    writes: HashMap<String, usize>,
    fail_reads: bool,
    fail_writes: bool,
}

/// Process-local backend. Clones share the same slots, which lets several
/// store instances observe each other's snapshots the way they would through
/// a real backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful writes issued against `key`.
    pub async fn write_count(&self, key: &str) -> usize {
        self.inner.lock().await.writes.get(key).copied().unwrap_or(0)
    }

    /// Make every subsequent read fail until reset.
    pub async fn fail_reads(&self, fail: bool) {
        self.inner.lock().await.fail_reads = fail;
    }

    /// Make every subsequent write fail until reset.
    pub async fn fail_writes(&self, fail: bool) {
        self.inner.lock().await.fail_writes = fail;
    }
}

#[async_trait]
impl PersistenceBackend for MemoryBackend {
    async fn get_item(&self, key: &str) -> Result<Option<Vec<Value>>, BackendError> {
        let inner = self.inner.lock().await;
        if inner.fail_reads {
            return Err(BackendError::ReadFailed {
                key: key.to_string(),
                reason: "reads disabled".to_string(),
            });
        }
        Ok(inner.items.get(key).cloned())
    }

    async fn set_item(&self, key: &str, values: &[Value]) -> Result<(), BackendError> {
        let mut inner = self.inner.lock().await;
        if inner.fail_writes {
            return Err(BackendError::WriteFailed {
                key: key.to_string(),
                reason: "writes disabled".to_string(),
            });
        }
        inner.items.insert(key.to_string(), values.to_vec());
        *inner.writes.entry(key.to_string()).or_insert(0) += 1;
        Ok(())
    }
}
