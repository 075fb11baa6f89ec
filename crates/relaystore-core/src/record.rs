// ABOUTME: Domain records held by the client stores: connection proposals, pairings and sessions.
// ABOUTME: Each record exposes its natural identifier and keeps unknown payload fields verbatim.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::classify::{classify, matches_shape};

/// Descriptive metadata a peer application advertises about itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub icons: Vec<String>,
}

/// One side of a connection, identified by its public key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub public_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

/// Relay protocol options negotiated for a topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relay {
    pub protocol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// A pending connection proposal, keyed by its numeric request id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: u64,
    pub proposer: Participant,
    pub relay: Relay,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A pairing between two peers, keyed by its topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pairing {
    pub topic: String,
    pub expiry: u64,
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relay: Option<Relay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_metadata: Option<Metadata>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An established session, keyed by its topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub topic: String,
    pub expiry: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acknowledged: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer: Option<Participant>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Session {
    /// Create a session with only its required fields set.
    pub fn new(topic: impl Into<String>, expiry: u64) -> Self {
        Self {
            topic: topic.into(),
            expiry,
            acknowledged: None,
            controller: None,
            peer: None,
            extra: Map::new(),
        }
    }
}

impl Pairing {
    /// Create an inactive pairing with only its required fields set.
    pub fn new(topic: impl Into<String>, expiry: u64) -> Self {
        Self {
            topic: topic.into(),
            expiry,
            active: false,
            relay: None,
            peer_metadata: None,
            extra: Map::new(),
        }
    }
}

impl Proposal {
    pub fn new(id: u64, proposer: Participant, relay: Relay) -> Self {
        Self {
            id,
            proposer,
            relay,
            expiry: None,
            extra: Map::new(),
        }
    }
}

/// The closed set of record shapes a persisted snapshot may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Proposal,
    Pairing,
    Session,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Proposal => "proposal",
            RecordKind::Pairing => "pairing",
            RecordKind::Session => "session",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The natural identifier of any record, independent of its kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKey {
    Id(u64),
    Topic(String),
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Id(id) => write!(f, "{}", id),
            RecordKey::Topic(topic) => f.write_str(topic),
        }
    }
}

/// A decoded record of any kind. Persisted snapshots carry no variant tag, so
/// values are classified by shape before they become a `Record`.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Proposal(Proposal),
    Pairing(Pairing),
    Session(Session),
}

impl Record {
    /// Classify a persisted value and decode it as the matching kind.
    /// Returns None when no shape matches or the matching shape fails to decode.
    pub fn from_value(value: Value) -> Option<Self> {
        let kind = classify(&value)?;
        let decoded = match kind {
            RecordKind::Proposal => serde_json::from_value(value).map(Record::Proposal),
            RecordKind::Pairing => serde_json::from_value(value).map(Record::Pairing),
            RecordKind::Session => serde_json::from_value(value).map(Record::Session),
        };
        match decoded {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::trace!("value shaped like a {} failed to decode: {}", kind, e);
                None
            }
        }
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Proposal(_) => RecordKind::Proposal,
            Record::Pairing(_) => RecordKind::Pairing,
            Record::Session(_) => RecordKind::Session,
        }
    }

    /// The identifier this record is indexed under: `id` for proposals,
    /// `topic` for pairings and sessions.
    pub fn natural_key(&self) -> RecordKey {
        match self {
            Record::Proposal(p) => RecordKey::Id(p.id),
            Record::Pairing(p) => RecordKey::Topic(p.topic.clone()),
            Record::Session(s) => RecordKey::Topic(s.topic.clone()),
        }
    }
}

/// A reason attached to a deletion, kept for diagnostics only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reason {
    pub code: i64,
    pub message: String,
}

impl Reason {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

/// A record kind that can live in a typed store.
///
/// All keys within one store share `Key`, which is always derived from the
/// record's natural identifier field.
pub trait StoreRecord:
    Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    type Key: Ord + Clone + fmt::Debug + fmt::Display + Send + Sync + 'static;

    const KIND: RecordKind;

    fn key(&self) -> Self::Key;

    /// Decode a persisted value as this kind if it has this kind's required
    /// fields. Other kinds' shapes are not consulted, so payload fields that
    /// happen to look like another kind never hide a valid record.
    fn from_value(value: &Value) -> Option<Self> {
        if !matches_shape(Self::KIND, value) {
            return None;
        }
        match Self::deserialize(value) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::trace!("value shaped like a {} failed to decode: {}", Self::KIND, e);
                None
            }
        }
    }
}

impl StoreRecord for Proposal {
    type Key = u64;
    const KIND: RecordKind = RecordKind::Proposal;

    fn key(&self) -> u64 {
        self.id
    }
}

impl StoreRecord for Pairing {
    type Key = String;
    const KIND: RecordKind = RecordKind::Pairing;

    fn key(&self) -> String {
        self.topic.clone()
    }
}

impl StoreRecord for Session {
    type Key = String;
    const KIND: RecordKind = RecordKind::Session;

    fn key(&self) -> String {
        self.topic.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn minimal_session_serializes_to_required_fields_only() {
        let session = Session::new("t1", 100);
        let value = serde_json::to_value(&session).expect("serialize");
        assert_eq!(value, json!({"topic": "t1", "expiry": 100}));
    }

    #[test]
    fn unknown_fields_survive_in_extra() {
        let value = json!({
            "topic": "t1",
            "expiry": 100,
            "namespaces": {"eip155": {"accounts": ["eip155:1:0xabc"]}},
            "self": {"publicKey": "aa"}
        });

        let session: Session = serde_json::from_value(value.clone()).expect("deserialize");
        assert_eq!(session.extra.len(), 2);
        assert!(session.extra.contains_key("namespaces"));

        let back = serde_json::to_value(&session).expect("serialize");
        assert_eq!(back, value);
    }

    #[test]
    fn camel_case_fields_on_the_wire() {
        let mut pairing = Pairing::new("p1", 50);
        pairing.peer_metadata = Some(Metadata {
            name: "Dapp".to_string(),
            description: String::new(),
            url: None,
            icons: Vec::new(),
        });

        let value = serde_json::to_value(&pairing).expect("serialize");
        assert_eq!(value["peerMetadata"]["name"], json!("Dapp"));
        assert_eq!(value["active"], json!(false));
    }

    #[test]
    fn natural_key_follows_kind() {
        let proposal = Record::Proposal(Proposal::new(
            7,
            Participant {
                public_key: "pk".to_string(),
                metadata: None,
            },
            Relay {
                protocol: "irn".to_string(),
                data: None,
            },
        ));
        let session = Record::Session(Session::new("abc", 1));

        assert_eq!(proposal.natural_key(), RecordKey::Id(7));
        assert_eq!(proposal.kind(), RecordKind::Proposal);
        assert_eq!(session.natural_key(), RecordKey::Topic("abc".to_string()));
        assert_eq!(session.natural_key().to_string(), "abc");
    }

    #[test]
    fn session_decodes_despite_payload_fields_of_other_kinds() {
        let value = json!({
            "topic": "t1",
            "expiry": 100,
            "active": true,
            "id": 9,
            "proposer": {"publicKey": "pk"},
            "relay": {"protocol": "irn"}
        });

        let session = Session::from_value(&value).expect("session shape");
        assert_eq!(session.key(), "t1");
        assert_eq!(session.extra["active"], json!(true));
        assert_eq!(session.extra["id"], json!(9));
        assert_eq!(serde_json::to_value(&session).unwrap(), value);
    }

    #[test]
    fn from_value_requires_own_shape() {
        let session = json!({"topic": "t", "expiry": 1});
        assert!(Pairing::from_value(&session).is_none());
        assert!(Proposal::from_value(&session).is_none());
        assert_eq!(Session::from_value(&session).map(|s| s.key()), Some("t".to_string()));
    }

    #[test]
    fn from_value_drops_shape_match_with_bad_field_types() {
        // Shaped like a proposal, but the proposer lacks its public key.
        let value = json!({"id": 1, "proposer": {}, "relay": {"protocol": "irn"}});
        assert!(Record::from_value(value).is_none());
    }
}
