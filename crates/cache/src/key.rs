//! Canonical cache key derivation.
//!
//! The key is the calculation type joined with a SHA-256 hex digest of a
//! canonical JSON encoding of the input. Object keys are written in
//! sorted order at every nesting level, so two payloads with the same
//! key-value pairs in different insertion order always hash the same.

use serde_json::Value;
use sha2::{Digest, Sha256};

use zins_core::calc::CalcInput;

/// Canonical key for a calculation input: `"{type}:{sha256-hex}"`.
pub fn cache_key(input: &CalcInput) -> String {
    // Serializing a plain data enum cannot fail.
    let value = serde_json::to_value(input).unwrap_or(Value::Null);
    let digest = Sha256::digest(canonical_json(&value).as_bytes());
    format!("{}:{digest:x}", input.calc_type())
}

/// Encode a JSON value deterministically: object keys sorted, no
/// insignificant whitespace.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                // Object keys are plain strings; escaping via Value keeps
                // the encoding identical to serde_json's.
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(&map[*key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        // Scalars already have a single JSON rendering.
        other => out.push_str(&other.to_string()),
    }
}
