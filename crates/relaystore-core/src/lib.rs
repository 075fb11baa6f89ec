// ABOUTME: Core library for relaystore, containing the record model shared by every store.
// ABOUTME: Defines proposals, pairings and sessions, their classifier, merge rules and storage keys.

pub mod classify;
pub mod key;
pub mod merge;
pub mod record;

pub use classify::{classify, matches_shape};
pub use key::{
    DEFAULT_STORAGE_PREFIX, STORAGE_KEY_SEPARATOR, STORE_STORAGE_VERSION, format_message_context,
    format_storage_key_name, storage_key,
};
pub use merge::{merge, to_patch};
pub use record::{
    Metadata, Pairing, Participant, Proposal, Reason, Record, RecordKey, RecordKind, Relay,
    Session, StoreRecord,
};
