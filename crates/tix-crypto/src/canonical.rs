use serde::Serialize;
use serde_json::Value;

use crate::hasher::HasherError;

/// Encode a JSON value canonically: object keys in byte-wise ascending
/// order at every nesting level, no insignificant whitespace.
///
/// Independent of how `serde_json::Map` orders its keys, so the output is
/// stable even if the `preserve_order` feature is enabled elsewhere in the
/// dependency graph.
pub fn canonical_json(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    write_value(value, &mut out);
    out
}

/// Serialize any value to canonical JSON bytes.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, HasherError> {
    let value =
        serde_json::to_value(value).map_err(|e| HasherError::Serialization(e.to_string()))?;
    Ok(canonical_json(&value))
}

fn write_value(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push(b'{');
            for (i, (key, val)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_scalar(&Value::String(key.clone()), out);
                out.push(b':');
                write_value(val, out);
            }
            out.push(b'}');
        }
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_value(item, out);
            }
            out.push(b']');
        }
        scalar => write_scalar(scalar, out),
    }
}

fn write_scalar(value: &Value, out: &mut Vec<u8>) {
    // Scalars (strings, numbers, bools, null) have a single compact encoding.
    out.extend_from_slice(value.to_string().as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn keys_are_sorted_at_every_level() {
        let value = json!({"b": 1, "a": {"z": true, "m": null}, "c": [{"y": 1, "x": 2}]});
        let encoded = String::from_utf8(canonical_json(&value)).unwrap();
        assert_eq!(
            encoded,
            r#"{"a":{"m":null,"z":true},"b":1,"c":[{"x":2,"y":1}]}"#
        );
    }

    #[test]
    fn array_order_is_preserved() {
        let encoded = canonical_json(&json!([3, 1, 2]));
        assert_eq!(encoded, b"[3,1,2]");
    }

    #[test]
    fn strings_are_escaped() {
        let encoded = String::from_utf8(canonical_json(&json!({"k": "a\"b"}))).unwrap();
        assert_eq!(encoded, r#"{"k":"a\"b"}"#);
    }

    proptest! {
        #[test]
        fn insertion_order_does_not_change_encoding(
            entries in proptest::collection::btree_map("[a-z]{1,8}", any::<i64>(), 0..12)
        ) {
            let mut forward = serde_json::Map::new();
            for (k, v) in entries.iter() {
                forward.insert(k.clone(), Value::from(*v));
            }
            let mut reverse = serde_json::Map::new();
            for (k, v) in entries.iter().rev() {
                reverse.insert(k.clone(), Value::from(*v));
            }
            prop_assert_eq!(
                canonical_json(&Value::Object(forward)),
                canonical_json(&Value::Object(reverse))
            );
        }
    }
}
