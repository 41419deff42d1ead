//! Memoizing key/value stores with serializable snapshots.
//!
//! Every derived artifact in the engine (resolved elements, dependency
//! descriptions, selector-match results) is memoized in a [`Cache`]
//! keyed by a canonical rendering of its inputs. Caches can be wiped,
//! snapshotted to plain string-keyed maps, and reloaded additively, so a
//! host can persist them between runs. Disabling a cache swaps in a
//! no-op store with the identical interface.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A deterministic cache key.
///
/// Built from a canonical JSON rendering of the keyed inputs: object
/// keys are sorted recursively and absent values serialize as explicit
/// `null`s, so structurally identical inputs always produce the same
/// key, and `None` can never collide with the string `"null"` (strings
/// keep their quotes).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derives a key from any serializable value.
    pub fn of<T: Serialize>(value: &T) -> Self {
        let rendered = serde_json::to_value(value)
            .map_or_else(|_| "null".to_string(), |v| canonical_json(&v));
        Self(rendered)
    }

    /// The canonical string form of this key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Renders a JSON value with recursively sorted object keys.
fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let entries: BTreeMap<&String, &Value> = map.iter().collect();
            let mut out = String::from("{");
            for (i, (key, val)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                out.push_str(&canonical_json(val));
            }
            out.push('}');
            out
        }
        Value::Array(items) => {
            let mut out = String::from("[");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&canonical_json(item));
            }
            out.push(']');
            out
        }
        other => other.to_string(),
    }
}

/// A serialized cache: plain string keys to values.
pub type CacheSnapshot<V> = BTreeMap<String, V>;

/// A memoizing key/value store.
///
/// Interior mutability behind a mutex keeps concurrent same-key access
/// safe; contention is not a concern since the engine is effectively
/// single-threaded.
#[derive(Debug)]
pub struct Cache<V> {
    enabled: bool,
    entries: Mutex<HashMap<String, V>>,
}

impl<V: Clone> Cache<V> {
    /// Creates a cache. When `enabled` is false every write is a no-op
    /// and every read misses, which disables memoization without
    /// changing any caller's behavior.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, V>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a value is memoized under this key.
    #[must_use]
    pub fn has(&self, key: &CacheKey) -> bool {
        self.enabled && self.lock().contains_key(key.as_str())
    }

    /// Fetches the memoized value for a key.
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        if !self.enabled {
            return None;
        }
        self.lock().get(key.as_str()).cloned()
    }

    /// Memoizes a value under a key.
    pub fn set(&self, key: &CacheKey, value: V) {
        if self.enabled {
            self.lock().insert(key.as_str().to_string(), value);
        }
    }

    /// Wipes every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of memoized entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl<V: Clone + Serialize + DeserializeOwned> Cache<V> {
    /// Snapshots the cache as a plain key → value map.
    #[must_use]
    pub fn snapshot(&self) -> CacheSnapshot<V> {
        self.lock()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Loads entries from a snapshot. Additive: existing entries are
    /// kept, colliding keys are overwritten.
    pub fn load_snapshot(&self, snapshot: CacheSnapshot<V>) {
        if !self.enabled {
            return;
        }
        self.lock().extend(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Described {
        name: String,
        hits: u32,
    }

    // -- CacheKey --

    #[test]
    fn key_is_stable_across_field_order() {
        let a = serde_json::json!({ "b": 1, "a": "x" });
        let b = serde_json::json!({ "a": "x", "b": 1 });
        assert_eq!(CacheKey::of(&a), CacheKey::of(&b));
    }

    #[test]
    fn key_distinguishes_none_from_literal_string() {
        let absent: (Option<&str>, &str) = (None, "kind");
        let literal = (Some("null"), "kind");
        assert_ne!(CacheKey::of(&absent), CacheKey::of(&literal));
    }

    #[test]
    fn key_of_tuple_is_deterministic() {
        let key1 = CacheKey::of(&("a/b.js", Some("c"), 3));
        let key2 = CacheKey::of(&("a/b.js", Some("c"), 3));
        assert_eq!(key1, key2);
    }

    // -- Cache --

    #[test]
    fn get_returns_what_was_set() {
        let cache = Cache::new(true);
        let key = CacheKey::of(&"k");
        cache.set(
            &key,
            Described {
                name: "n".into(),
                hits: 1,
            },
        );
        assert!(cache.has(&key));
        assert_eq!(
            cache.get(&key),
            Some(Described {
                name: "n".into(),
                hits: 1
            })
        );
    }

    #[test]
    fn disabled_cache_never_stores() {
        let cache = Cache::new(false);
        let key = CacheKey::of(&"k");
        cache.set(&key, 42u32);
        assert!(!cache.has(&key));
        assert_eq!(cache.get(&key), None);
    }

    #[test]
    fn clear_wipes_entries() {
        let cache = Cache::new(true);
        let key = CacheKey::of(&"k");
        cache.set(&key, 1u32);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn snapshot_round_trips() {
        let cache = Cache::new(true);
        let key = CacheKey::of(&("src/a.js",));
        cache.set(&key, 7u32);

        let restored = Cache::new(true);
        restored.load_snapshot(cache.snapshot());
        assert_eq!(restored.get(&key), Some(7));
    }

    #[test]
    fn load_snapshot_is_additive() {
        let cache = Cache::new(true);
        let kept = CacheKey::of(&"kept");
        cache.set(&kept, 1u32);

        let mut incoming = CacheSnapshot::new();
        incoming.insert(CacheKey::of(&"new").as_str().to_string(), 2u32);
        cache.load_snapshot(incoming);

        assert_eq!(cache.get(&kept), Some(1));
        assert_eq!(cache.get(&CacheKey::of(&"new")), Some(2));
        assert_eq!(cache.len(), 2);
    }
}
