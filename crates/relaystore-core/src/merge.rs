// ABOUTME: Shallow field merge used by store updates.
// ABOUTME: Fields present in the patch replace the current record's fields; everything else is kept.

use serde::Serialize;
use serde::de::{DeserializeOwned, Error as _};
use serde_json::{Map, Value};

/// Convert a value into the object of fields it serializes to.
pub fn to_patch<T: Serialize>(value: &T) -> Result<Map<String, Value>, serde_json::Error> {
    match serde_json::to_value(value)? {
        Value::Object(fields) => Ok(fields),
        other => Err(serde_json::Error::custom(format!(
            "expected an object, got {}",
            other
        ))),
    }
}

/// Shallow-merge `patch` over `current` and decode the result.
///
/// Only top-level fields are replaced; nested objects in the patch are not
/// merged into the current nested objects.
pub fn merge<T>(current: &T, patch: &Map<String, Value>) -> Result<T, serde_json::Error>
where
    T: Serialize + DeserializeOwned,
{
    let mut fields = to_patch(current)?;
    for (name, value) in patch {
        fields.insert(name.clone(), value.clone());
    }
    serde_json::from_value(Value::Object(fields))
}
