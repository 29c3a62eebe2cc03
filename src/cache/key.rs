//! Cache Key Scheme
//!
//! Deterministic, reversible mapping between (entity type, id) pairs and the
//! keys used in the KV backend. Separator characters inside type names are
//! escaped so that a prefix scan for one type can never match another type's
//! keys.

use std::fmt;

use crate::store::EntityId;

// == Constants ==
/// Separator between the escaped type name and the id.
const SEPARATOR: char = ':';

/// Escape character for separators and itself inside type names.
const ESCAPE: char = '\\';

// == Cache Key ==
/// A key derived from (entity type, id), reversible for eviction bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    // == Encode ==
    /// Builds the key for an entity: `escape(type) + ":" + id`.
    pub fn encode(entity_type: &str, id: &EntityId) -> Self {
        let mut key = escape_type(entity_type);
        key.push(SEPARATOR);
        key.push_str(&id.to_string());
        CacheKey(key)
    }

    // == Decode ==
    /// Reconstructs (entity type, id) from a key.
    ///
    /// Returns `None` for keys this scheme did not produce (no unescaped
    /// separator, or a dangling escape). Ids that render as canonical
    /// integers decode as `EntityId::Int`.
    pub fn decode(key: &str) -> Option<(String, EntityId)> {
        let mut entity_type = String::new();
        let mut chars = key.char_indices();

        while let Some((pos, ch)) = chars.next() {
            match ch {
                c if c == ESCAPE => match chars.next() {
                    Some((_, escaped)) => entity_type.push(escaped),
                    None => return None,
                },
                c if c == SEPARATOR => {
                    let id = &key[pos + SEPARATOR.len_utf8()..];
                    return Some((entity_type, parse_id(id)));
                }
                c => entity_type.push(c),
            }
        }

        None
    }

    // == Prefix ==
    /// The scan prefix covering every key of one entity type.
    pub fn prefix_for(entity_type: &str) -> String {
        let mut prefix = escape_type(entity_type);
        prefix.push(SEPARATOR);
        prefix
    }

    /// The key as a string slice for the KV transport.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// == Helpers ==
/// Escapes separator and escape characters in a type name.
fn escape_type(entity_type: &str) -> String {
    let mut escaped = String::with_capacity(entity_type.len());
    for ch in entity_type.chars() {
        if ch == SEPARATOR || ch == ESCAPE {
            escaped.push(ESCAPE);
        }
        escaped.push(ch);
    }
    escaped
}

/// Ids that render as canonical integers are integers; everything else stays
/// a string.
fn parse_id(id: &str) -> EntityId {
    match id.parse::<i64>() {
        Ok(n) if n.to_string() == id => EntityId::Int(n),
        _ => EntityId::Str(id.to_string()),
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_plain_type() {
        let key = CacheKey::encode("Point", &EntityId::Int(68));
        assert_eq!(key.as_str(), "Point:68");
    }

    #[test]
    fn test_encode_escapes_separator() {
        let key = CacheKey::encode("App:Point", &EntityId::Int(1));
        assert_eq!(key.as_str(), "App\\:Point:1");
    }

    #[test]
    fn test_encode_escapes_backslash() {
        let key = CacheKey::encode("App\\Point", &EntityId::Int(1));
        assert_eq!(key.as_str(), "App\\\\Point:1");
    }

    #[test]
    fn test_decode_round_trip() {
        for (entity_type, id) in [
            ("Point", EntityId::Int(68)),
            ("App\\Models\\Point", EntityId::Int(1)),
            ("A:B:C", EntityId::Str("x:y".to_string())),
            ("Student", EntityId::Str("uuid-123".to_string())),
        ] {
            let key = CacheKey::encode(entity_type, &id);
            let (decoded_type, decoded_id) = CacheKey::decode(key.as_str()).unwrap();
            assert_eq!(decoded_type, entity_type);
            assert_eq!(decoded_id, id);
        }
    }

    #[test]
    fn test_decode_rejects_malformed_keys() {
        // No unescaped separator at all
        assert_eq!(CacheKey::decode("noseparator"), None);
        // Dangling escape at the end
        assert_eq!(CacheKey::decode("Type\\"), None);
    }

    #[test]
    fn test_decode_normalizes_canonical_integer_ids() {
        let (_, id) = CacheKey::decode("Point:68").unwrap();
        assert_eq!(id, EntityId::Int(68));

        // Non-canonical renderings stay strings
        let (_, id) = CacheKey::decode("Point:007").unwrap();
        assert_eq!(id, EntityId::Str("007".to_string()));
    }

    #[test]
    fn test_prefix_isolation() {
        // A type whose name starts with another type plus separator-like
        // characters must not fall under the shorter type's prefix.
        let prefix = CacheKey::prefix_for("Point");
        let other = CacheKey::encode("Point:Extra", &EntityId::Int(1));
        assert!(!other.as_str().starts_with(&prefix));

        let own = CacheKey::encode("Point", &EntityId::Int(1));
        assert!(own.as_str().starts_with(&prefix));
    }

    #[test]
    fn test_distinct_pairs_distinct_keys() {
        let a = CacheKey::encode("A", &EntityId::Str("b:1".to_string()));
        let b = CacheKey::encode("A:b", &EntityId::Int(1));
        assert_ne!(a, b);
    }
}
