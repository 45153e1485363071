use serde_json::Value;
use thiserror::Error;

/// Errors from canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalError {
    #[error("input is not canonically serializable: {0}")]
    Unserializable(String),
}

impl From<serde_json::Error> for CanonicalError {
    fn from(e: serde_json::Error) -> Self {
        CanonicalError::Unserializable(e.to_string())
    }
}

/// Serialize a structured value to canonical bytes.
///
/// Canonical form: lexicographically sorted keys at every nesting level,
/// minimal separators, UTF-8. This is the single encoding used for all
/// digest preimages in the pipeline.
pub fn canonicalize(value: &Value) -> Result<Vec<u8>, CanonicalError> {
    let mut out = Vec::with_capacity(128);
    write_canonical(value, &mut out)?;
    Ok(out)
}

fn write_canonical(value: &Value, out: &mut Vec<u8>) -> Result<(), CanonicalError> {
    match value {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Bool(true) => out.extend_from_slice(b"true"),
        Value::Bool(false) => out.extend_from_slice(b"false"),
        // serde_json's scalar rendering is already deterministic.
        Value::Number(n) => out.extend_from_slice(n.to_string().as_bytes()),
        Value::String(_) => out.extend_from_slice(&serde_json::to_vec(value)?),
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_canonical(item, out)?;
            }
            out.push(b']');
        }
        Value::Object(map) => {
            // Key order in the input map must not leak into the bytes.
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_unstable();
            out.push(b'{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                out.extend_from_slice(&serde_json::to_vec(&Value::String(key.clone()))?);
                out.push(b':');
                write_canonical(&map[key], out)?;
            }
            out.push(b'}');
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_are_sorted_at_every_level() {
        let a = json!({"b": {"z": 1, "a": 2}, "a": [3, {"y": 0, "x": 1}]});
        let bytes = canonicalize(&a).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"a":[3,{"x":1,"y":0}],"b":{"a":2,"z":1}}"#
        );
    }

    #[test]
    fn semantically_equal_structures_serialize_identically() {
        let a = json!({"x": 1, "y": "two"});
        let b: Value = serde_json::from_str(r#"{"y": "two", "x": 1}"#).unwrap();
        assert_eq!(canonicalize(&a).unwrap(), canonicalize(&b).unwrap());
    }

    #[test]
    fn no_incidental_whitespace() {
        let bytes = canonicalize(&json!({"k": [1, 2, 3]})).unwrap();
        assert!(!bytes.contains(&b' '));
    }

    #[test]
    fn strings_are_escaped() {
        let bytes = canonicalize(&json!({"k": "a\"b"})).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), r#"{"k":"a\"b"}"#);
    }
}
