// ABOUTME: Shape-based classification of persisted records that carry no variant tag.
// ABOUTME: Ordered required-field predicates decide whether a value is a proposal, pairing or session.

use serde_json::{Map, Value};

use crate::record::RecordKind;

type ShapePredicate = fn(&Map<String, Value>) -> bool;

/// Evaluated in order, first match wins. Pairing must precede Session
/// because a pairing's required fields are a superset of a session's.
const SHAPES: [(RecordKind, ShapePredicate); 3] = [
    (RecordKind::Proposal, is_proposal_shape),
    (RecordKind::Pairing, is_pairing_shape),
    (RecordKind::Session, is_session_shape),
];

/// Determine which record kind a persisted value is, if any.
pub fn classify(value: &Value) -> Option<RecordKind> {
    let fields = value.as_object()?;
    SHAPES
        .iter()
        .find(|(_, matches)| matches(fields))
        .map(|(kind, _)| *kind)
}

/// Whether `value` has the required fields of `kind`, regardless of any other
/// kind it might also satisfy.
pub fn matches_shape(kind: RecordKind, value: &Value) -> bool {
    let Some(fields) = value.as_object() else {
        return false;
    };
    SHAPES
        .iter()
        .any(|(shape, matches)| *shape == kind && matches(fields))
}

fn is_proposal_shape(fields: &Map<String, Value>) -> bool {
    fields.get("id").is_some_and(Value::is_u64)
        && fields.get("proposer").is_some_and(Value::is_object)
        && fields.get("relay").is_some_and(Value::is_object)
}

fn is_pairing_shape(fields: &Map<String, Value>) -> bool {
    is_session_shape(fields) && fields.get("active").is_some_and(Value::is_boolean)
}

fn is_session_shape(fields: &Map<String, Value>) -> bool {
    fields.get("topic").is_some_and(Value::is_string)
        && fields.get("expiry").is_some_and(Value::is_u64)
}
