//! Key-value persistence seam
//!
//! The core only ever reads and writes integers by key; the storage format
//! belongs to whoever implements [`KeyValueStore`].

use std::collections::HashMap;

/// Integer key-value storage
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<i64>;
    fn set(&mut self, key: &str, value: i64);

    fn get_or(&self, key: &str, default: i64) -> i64 {
        self.get(key).unwrap_or(default)
    }
}

/// In-memory store, used headless and in tests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    values: HashMap<String, i64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<i64> {
        self.values.get(key).copied()
    }

    fn set(&mut self, key: &str, value: i64) {
        self.values.insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("a"), None);
        assert_eq!(store.get_or("a", 5), 5);
        store.set("a", 3);
        store.set("a", 4);
        assert_eq!(store.get("a"), Some(4));
        assert_eq!(store.len(), 1);
    }
}
