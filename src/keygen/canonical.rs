//! Canonicalizer
//!
//! Reduces an argument [`Value`] into a type-tagged, order-preserving tree
//! that always encodes to the same bytes.

use serde::Serialize;

use crate::keygen::Value;

/// Token standing in for an absent value.
///
/// A caller-supplied string `"__nil__"` reduces to the same scalar, so
/// `None` and `Some("__nil__")` share a key. This is a known limitation.
pub const NIL_TOKEN: &str = "__nil__";

// == Canonical Value ==
/// Reduced form of an argument, the basis of key generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CanonicalValue {
    Scalar(String),
    Sequence(Vec<CanonicalValue>),
}

impl CanonicalValue {
    /// Deterministic byte encoding of the tree.
    pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

// == Reduce ==
/// Reduces a value into its canonical form. Never fails.
///
/// Mappings become a sequence of `[key, value]` pairs sorted by key, so
/// `HashMap` iteration order never leaks into the key.
pub fn reduce(value: &Value) -> CanonicalValue {
    match value {
        Value::Nil => CanonicalValue::Scalar(NIL_TOKEN.to_string()),
        Value::Str(s) => CanonicalValue::Scalar(s.clone()),
        Value::Int(i) => CanonicalValue::Scalar(i.to_string()),
        Value::UInt(u) => CanonicalValue::Scalar(u.to_string()),
        // Display is locale independent and the shortest round-trippable form
        Value::Float(f) => CanonicalValue::Scalar(f.to_string()),
        Value::Bool(b) => CanonicalValue::Scalar(b.to_string()),
        Value::Time(secs) => CanonicalValue::Scalar(secs.to_string()),
        Value::Seq(items) | Value::Record(items) => {
            CanonicalValue::Sequence(items.iter().map(reduce).collect())
        }
        Value::Map(entries) => reduce_map(entries),
        Value::Opaque(text) => CanonicalValue::Scalar(text.clone()),
    }
}

fn reduce_map(entries: &[(Value, Value)]) -> CanonicalValue {
    let mut pairs: Vec<(Vec<u8>, CanonicalValue)> = entries
        .iter()
        .map(|(k, v)| {
            let pair = CanonicalValue::Sequence(vec![reduce(k), reduce(v)]);
            (sort_bytes(&pair), pair)
        })
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    CanonicalValue::Sequence(pairs.into_iter().map(|(_, pair)| pair).collect())
}

// Encoded pair; the key comes first, so this orders by key and then by value
// for duplicate keys. Encoding a tree of strings does not fail.
fn sort_bytes(pair: &CanonicalValue) -> Vec<u8> {
    pair.encode().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keygen::ToValue;
    use std::collections::HashMap;

    fn scalar(s: &str) -> CanonicalValue {
        CanonicalValue::Scalar(s.to_string())
    }

    #[test]
    fn test_scalars() {
        assert_eq!(reduce(&Value::Nil), scalar(NIL_TOKEN));
        assert_eq!(reduce(&Value::Str("abc".into())), scalar("abc"));
        assert_eq!(reduce(&Value::Int(-7)), scalar("-7"));
        assert_eq!(reduce(&Value::Float(1.5)), scalar("1.5"));
        assert_eq!(reduce(&Value::Bool(false)), scalar("false"));
        assert_eq!(reduce(&Value::Time(1_700_000_000)), scalar("1700000000"));
    }

    #[test]
    fn test_nil_token_collides_with_literal() {
        assert_eq!(reduce(&Value::Nil), reduce(&"__nil__".to_value()));
    }

    #[test]
    fn test_sequence_preserves_order() {
        let forward = reduce(&vec![1i32, 2].to_value());
        let backward = reduce(&vec![2i32, 1].to_value());
        assert_ne!(forward, backward);
        assert_eq!(
            forward,
            CanonicalValue::Sequence(vec![scalar("1"), scalar("2")])
        );
    }

    #[test]
    fn test_map_is_order_independent() {
        let a = Value::Map(vec![
            (Value::Str("x".into()), Value::Int(1)),
            (Value::Str("y".into()), Value::Int(2)),
        ]);
        let b = Value::Map(vec![
            (Value::Str("y".into()), Value::Int(2)),
            (Value::Str("x".into()), Value::Int(1)),
        ]);
        assert_eq!(reduce(&a), reduce(&b));
    }

    #[test]
    fn test_map_keys_are_significant() {
        let a = Value::Map(vec![
            (Value::Str("x".into()), Value::Int(1)),
            (Value::Str("y".into()), Value::Int(2)),
        ]);
        let swapped = Value::Map(vec![
            (Value::Str("x".into()), Value::Int(2)),
            (Value::Str("y".into()), Value::Int(1)),
        ]);
        assert_ne!(reduce(&a), reduce(&swapped));
    }

    #[test]
    fn test_hash_map_reduces_stably() {
        let mut map = HashMap::new();
        for i in 0..32i32 {
            map.insert(format!("k{}", i), i);
        }
        let mut entries: Vec<(String, i32)> = map.clone().into_iter().collect();
        entries.reverse();
        let copy: HashMap<String, i32> = entries.into_iter().collect();
        assert_eq!(reduce(&map.to_value()), reduce(&copy.to_value()));
    }

    #[test]
    fn test_nested_record() {
        let value = Value::Record(vec![
            Value::Str("name".into()),
            Value::Seq(vec![Value::Nil, Value::Bool(true)]),
        ]);
        assert_eq!(
            reduce(&value),
            CanonicalValue::Sequence(vec![
                scalar("name"),
                CanonicalValue::Sequence(vec![scalar(NIL_TOKEN), scalar("true")]),
            ])
        );
    }

    #[test]
    fn test_encoding_is_byte_stable() {
        let value = vec![Some(1i32), None].to_value();
        let first = reduce(&value).encode().unwrap();
        let second = reduce(&value).encode().unwrap();
        assert_eq!(first, second);
    }
}
