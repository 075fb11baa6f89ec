// ABOUTME: Persistence layer for relaystore, mirroring in-memory record stores to a backend.
// ABOUTME: Provides the backend contract, memory and file backends, typed stores, and the store manager.

pub mod backend;
pub mod config;
pub mod error;
pub mod file;
pub mod manager;
pub mod store;

pub use backend::{MemoryBackend, PersistenceBackend};
pub use config::{BackendKind, ConfigError, RelayStoreConfig};
pub use error::{BackendError, StoreError};
pub use file::FileBackend;
pub use manager::{InitReport, StoreManager};
pub use store::{RestoreOutcome, TypedStore};
