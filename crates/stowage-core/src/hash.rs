//! Compiler input fingerprinting
//!
//! A fingerprint is a 128-bit MurmurHash3 (x86 variant, seed 0) over the
//! canonical form of a compiler input document: object keys sorted
//! recursively, serialized as JSON with two-space indentation. It is used
//! only for change detection, never as a security primitive.

use std::io::Cursor;

use serde_json::{Map, Value};

use crate::types::Fingerprint;

/// Compute the fingerprint of a compiler input document
pub fn fingerprint(compiler_input: &Value) -> Fingerprint {
    let canonical = canonical_string(compiler_input);
    Fingerprint::new(murmur128_hex(canonical.as_bytes()))
}

/// Render a JSON value with recursively sorted keys and fixed indentation
pub fn canonical_string(value: &Value) -> String {
    let canonical = canonicalize(value);
    // Serializing a `Value` cannot fail: all keys are strings
    serde_json::to_string_pretty(&canonical).unwrap_or_default()
}

/// Rebuild `value` with every object's keys inserted in sorted order, so the
/// result does not depend on whether `serde_json` preserves insertion order.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::with_capacity(map.len());
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// MurmurHash3 x86_128 rendered as the four 32-bit state words in order,
/// each big-endian.
fn murmur128_hex(bytes: &[u8]) -> String {
    // Reading from an in-memory cursor cannot fail
    let hash = murmur3::murmur3_x86_128(&mut Cursor::new(bytes), 0).unwrap_or_default();
    let words = [
        hash as u32,
        (hash >> 32) as u32,
        (hash >> 64) as u32,
        (hash >> 96) as u32,
    ];
    let mut out = [0u8; 16];
    for (chunk, word) in out.chunks_exact_mut(4).zip(words) {
        chunk.copy_from_slice(&word.to_be_bytes());
    }
    hex::encode(out)
}
