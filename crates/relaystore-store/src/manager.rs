// ABOUTME: Owns the proposal, session and pairing stores of one client over a shared backend.
// ABOUTME: Opens the configured backend and initializes every store once at startup.

use std::sync::Arc;

use relaystore_core::{Pairing, Proposal, RecordKind, Session};

use crate::backend::{MemoryBackend, PersistenceBackend};
use crate::config::{BackendKind, RelayStoreConfig};
use crate::error::BackendError;
use crate::file::FileBackend;
use crate::store::{RestoreOutcome, TypedStore};

/// Restore outcome of each store after `init_all`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitReport {
    pub proposals: RestoreOutcome,
    pub sessions: RestoreOutcome,
    pub pairings: RestoreOutcome,
}

/// The three per-domain stores a client keeps, one per record kind.
pub struct StoreManager {
    pub proposals: TypedStore<Proposal>,
    pub sessions: TypedStore<Session>,
    pub pairings: TypedStore<Pairing>,
}

impl StoreManager {
    /// Create stores for every record kind over `backend`. Each store's
    /// context is its record kind name.
    pub fn new(backend: Arc<dyn PersistenceBackend>, prefix: &str) -> Self {
        Self {
            proposals: TypedStore::new(
                Arc::clone(&backend),
                prefix,
                RecordKind::Proposal.as_str(),
            ),
            sessions: TypedStore::new(Arc::clone(&backend), prefix, RecordKind::Session.as_str()),
            pairings: TypedStore::new(backend, prefix, RecordKind::Pairing.as_str()),
        }
    }

    /// Open the backend named by `config` and create the stores over it.
    pub fn from_config(config: &RelayStoreConfig) -> Result<Self, BackendError> {
        let backend: Arc<dyn PersistenceBackend> = match config.backend {
            BackendKind::File => Arc::new(FileBackend::open(&config.home)?),
            BackendKind::Memory => Arc::new(MemoryBackend::new()),
        };
        Ok(Self::new(backend, &config.storage_prefix))
    }

    /// Initialize every store. Restore failures are reported, never raised.
    pub async fn init_all(&self) -> InitReport {
        let report = InitReport {
            proposals: self.proposals.init().await,
            sessions: self.sessions.init().await,
            pairings: self.pairings.init().await,
        };
        tracing::info!(
            "stores initialized: {} proposals, {} sessions, {} pairings",
            self.proposals.len().await,
            self.sessions.len().await,
            self.pairings.len().await
        );
        report
    }
}
