//! Canonical JSON encoding.
//!
//! Object keys are emitted in lexicographic order at every nesting level and
//! no insignificant whitespace is written, so two structurally equal values
//! always produce identical bytes regardless of field insertion order. The
//! same encoding is used for object hashing and for every outbound wire
//! message.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{TypeError, TypeResult};

/// Encode `value` canonically into bytes.
pub fn to_canonical_vec<T: Serialize + ?Sized>(value: &T) -> TypeResult<Vec<u8>> {
    to_canonical_string(value).map(String::into_bytes)
}

/// Encode `value` canonically into a string.
pub fn to_canonical_string<T: Serialize + ?Sized>(value: &T) -> TypeResult<String> {
    let value = serde_json::to_value(value).map_err(|e| TypeError::Encoding(e.to_string()))?;
    serde_json::to_string(&sort_keys(value)).map_err(|e| TypeError::Encoding(e.to_string()))
}

// Rebuilds every map in key order; holds even if `preserve_order` is enabled
// on serde_json somewhere in the dependency graph.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::new();
            for (key, inner) in entries {
                sorted.insert(key, sort_keys(inner));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_are_sorted() {
        let value = json!({"type": "hello", "agent": "x"});
        assert_eq!(
            to_canonical_string(&value).unwrap(),
            r#"{"agent":"x","type":"hello"}"#
        );
    }

    #[test]
    fn nested_keys_are_sorted() {
        let value = json!({"z": {"b": 1, "a": [{"d": 1, "c": 2}]}, "a": null});
        assert_eq!(
            to_canonical_string(&value).unwrap(),
            r#"{"a":null,"z":{"a":[{"c":2,"d":1}],"b":1}}"#
        );
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let a: Value = serde_json::from_str(r#"{"name":"n","deps":[]}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"deps":[],"name":"n"}"#).unwrap();
        assert_eq!(to_canonical_vec(&a).unwrap(), to_canonical_vec(&b).unwrap());
    }

    #[test]
    fn array_order_is_preserved() {
        let value = json!(["b", "a"]);
        assert_eq!(to_canonical_string(&value).unwrap(), r#"["b","a"]"#);
    }

    #[test]
    fn strings_with_newlines_are_escaped() {
        let value = json!({"text": "a\nb"});
        let encoded = to_canonical_string(&value).unwrap();
        assert!(!encoded.contains('\n'));
    }
}
