//! Response envelopes
//!
//! The backend wraps most payloads in a named field (`{ "users": [...] }`,
//! `{ "profile": {...} }`) but not consistently. These helpers accept the
//! wrapped and the bare form.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::ApiError;

/// Extract a list stored under `key`, or the body itself if it is an array.
/// A missing or `null` list reads as empty.
pub fn list_from<T: DeserializeOwned>(body: Value, key: &str) -> Result<Vec<T>, ApiError> {
    let list = match body {
        Value::Array(_) => body,
        Value::Object(mut map) => map.remove(key).unwrap_or(Value::Null),
        _ => Value::Null,
    };
    match list {
        Value::Null => Ok(Vec::new()),
        other => Ok(serde_json::from_value(other)?),
    }
}

/// Extract an item stored under `key`, or the body itself if there is no
/// such field.
pub fn item_from<T: DeserializeOwned>(body: Value, key: &str) -> Result<T, ApiError> {
    let item = match body {
        Value::Object(mut map) if map.get(key).is_some_and(Value::is_object) => {
            map.remove(key).unwrap_or(Value::Null)
        }
        other => other,
    };
    Ok(serde_json::from_value(item)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_from_envelope_and_bare() {
        let wrapped: Vec<u32> = list_from(json!({ "success": true, "items": [1, 2] }), "items").unwrap();
        let bare: Vec<u32> = list_from(json!([3]), "items").unwrap();

        assert_eq!(wrapped, vec![1, 2]);
        assert_eq!(bare, vec![3]);
    }

    #[test]
    fn test_list_from_missing_is_empty() {
        let missing: Vec<u32> = list_from(json!({ "success": true }), "items").unwrap();
        let null: Vec<u32> = list_from(Value::Null, "items").unwrap();

        assert!(missing.is_empty());
        assert!(null.is_empty());
    }

    #[test]
    fn test_list_from_wrong_type_is_decode_error() {
        let err = list_from::<u32>(json!({ "items": "nope" }), "items").unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn test_item_from() {
        let wrapped: Value = item_from(json!({ "profile": { "bio": "x" } }), "profile").unwrap();
        let bare: Value = item_from(json!({ "bio": "y" }), "profile").unwrap();

        assert_eq!(wrapped, json!({ "bio": "x" }));
        assert_eq!(bare, json!({ "bio": "y" }));
    }
}
