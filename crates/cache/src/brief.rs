//! Brief canonicalization and content hashing
//!
//! A brief is the structured description of a render request (composition
//! parameters, copy, asset references). Two briefs with the same content must
//! hash identically regardless of how their fields were ordered by the
//! producer, so hashing goes through an explicit canonical JSON encoding:
//! object keys sorted lexicographically at every depth, compact separators.
//! Relying on the serializer's map ordering would make the hash depend on
//! insertion order for order-preserving serializers.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Deterministic digest of a brief's canonicalized content (SHA-256 as
/// lowercase hex)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BriefHash(String);

impl BriefHash {
    /// Compute the hash of a brief's content
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] when the brief cannot be encoded as
    /// JSON (non-string map keys, serializer failures).
    pub fn from_content<T: Serialize>(content: &T) -> Result<Self> {
        let value = serde_json::to_value(content)
            .map_err(|e| Error::serialization(format!("Failed to encode brief: {e}")))?;
        let digest = Sha256::digest(canonical_json(&value).as_bytes());
        Ok(Self(hex::encode(digest)))
    }

    /// Create from hex string (validation)
    ///
    /// # Errors
    ///
    /// Returns an error if the hex string is invalid or wrong length
    pub fn from_hex(hex: impl Into<String>) -> Result<Self> {
        let s = hex.into();
        if s.len() != 64 {
            return Err(Error::configuration(format!(
                "BriefHash must be 64 hex characters, got {}",
                s.len()
            )));
        }
        if !s.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()) {
            return Err(Error::configuration(
                "BriefHash must contain only lowercase hex digits",
            ));
        }
        Ok(Self(s))
    }

    /// Get the hex representation
    #[must_use]
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BriefHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hash a brief's content
///
/// Convenience wrapper around [`BriefHash::from_content`].
///
/// # Errors
///
/// Returns [`Error::Serialization`] when the brief cannot be encoded as JSON.
pub fn hash_brief<T: Serialize>(brief: &T) -> Result<BriefHash> {
    BriefHash::from_content(brief)
}

/// Encode a JSON value canonically: object keys sorted at every depth,
/// compact separators, standard JSON escapes.
#[must_use]
pub fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_unstable();
            let fields: Vec<String> = keys
                .into_iter()
                .map(|k| {
                    format!(
                        "{}:{}",
                        Value::String(k.clone()),
                        canonical_json(&map[k])
                    )
                })
                .collect();
            format!("{{{}}}", fields.join(","))
        }
        Value::Array(items) => {
            let elements: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", elements.join(","))
        }
        // Null, booleans, numbers and strings already render compactly (and
        // escaped) through serde_json's Display.
        scalar => scalar.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_json_sorts_object_keys() {
        let value = json!({"zeta": 1, "alpha": 2, "mid": 3});
        assert_eq!(
            canonical_json(&value),
            r#"{"alpha":2,"mid":3,"zeta":1}"#
        );
    }

    #[test]
    fn canonical_json_sorts_nested_objects() {
        let value = json!({"outer": {"b": [{"y": 1, "x": 2}], "a": null}});
        assert_eq!(
            canonical_json(&value),
            r#"{"outer":{"a":null,"b":[{"x":2,"y":1}]}}"#
        );
    }

    #[test]
    fn canonical_json_preserves_array_order() {
        let value = json!(["b", "a", 3, true]);
        assert_eq!(canonical_json(&value), r#"["b","a",3,true]"#);
    }

    #[test]
    fn canonical_json_escapes_strings() {
        let value = json!({"text": "line\nbreak \"quoted\""});
        assert_eq!(
            canonical_json(&value),
            r#"{"text":"line\nbreak \"quoted\""}"#
        );
    }

    #[test]
    fn hash_is_64_lowercase_hex_chars() {
        let hash = hash_brief(&json!({"id": "campaign-1"})).unwrap();
        assert_eq!(hash.as_hex().len(), 64);
        assert!(hash
            .as_hex()
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn hash_ignores_key_insertion_order() {
        let a: Value = serde_json::from_str(r#"{"title": "Summer Sale", "id": "campaign-1"}"#)
            .unwrap();
        let b: Value = serde_json::from_str(r#"{"id": "campaign-1", "title": "Summer Sale"}"#)
            .unwrap();
        assert_eq!(hash_brief(&a).unwrap(), hash_brief(&b).unwrap());
    }

    #[test]
    fn hash_changes_when_text_changes() {
        let base = json!({"sections": [{"type": "headline", "text": "Amazing Summer Deals"}]});
        let changed = json!({"sections": [{"type": "headline", "text": "Amazing Winter Deals"}]});
        assert_ne!(hash_brief(&base).unwrap(), hash_brief(&changed).unwrap());
    }

    #[test]
    fn hash_changes_when_field_added() {
        let base = json!({"id": "campaign-1"});
        let extended = json!({"id": "campaign-1", "locale": "de-DE"});
        assert_ne!(hash_brief(&base).unwrap(), hash_brief(&extended).unwrap());
    }

    #[test]
    fn hash_distinguishes_array_order() {
        let a = json!({"assets": ["intro.mp4", "outro.mp4"]});
        let b = json!({"assets": ["outro.mp4", "intro.mp4"]});
        assert_ne!(hash_brief(&a).unwrap(), hash_brief(&b).unwrap());
    }

    #[test]
    fn structs_and_equivalent_json_hash_identically() {
        #[derive(Serialize)]
        struct Brief {
            id: String,
            title: String,
        }

        let brief = Brief {
            id: "campaign-1".into(),
            title: "Summer Sale".into(),
        };
        let value = json!({"id": "campaign-1", "title": "Summer Sale"});
        assert_eq!(hash_brief(&brief).unwrap(), hash_brief(&value).unwrap());
    }

    #[test]
    fn non_string_map_keys_fail_with_serialization_error() {
        use std::collections::BTreeMap;

        let mut map: BTreeMap<Vec<u8>, String> = BTreeMap::new();
        map.insert(vec![1, 2], "value".into());

        assert!(matches!(
            hash_brief(&map),
            Err(Error::Serialization { .. })
        ));
    }

    #[test]
    fn brief_hash_hex_validation() {
        // Valid
        assert!(BriefHash::from_hex(
            "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef"
        )
        .is_ok());

        // Too short
        assert!(BriefHash::from_hex("abc").is_err());

        // Uppercase rejected
        assert!(BriefHash::from_hex(
            "0123456789ABCDEF0123456789abcdef0123456789abcdef0123456789abcdef"
        )
        .is_err());

        // Invalid characters
        assert!(BriefHash::from_hex(
            "xyz3456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef"
        )
        .is_err());
    }
}
