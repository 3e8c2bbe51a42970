use super::{KeyValue, StoreError};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory twin of the disk store. Backs tests and keeps the app usable
/// when no data directory can be opened.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValue for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let map = self.inner.read().unwrap();
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut map = self.inner.write().unwrap();
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut map = self.inner.write().unwrap();
        map.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_get_set_remove() {
        let store = MemoryStore::new();

        assert!(store.get("key1").unwrap().is_none());

        store.set("key1", "value").unwrap();
        assert_eq!(store.get("key1").unwrap().as_deref(), Some("value"));

        store.remove("key1").unwrap();
        assert!(store.get("key1").unwrap().is_none());
    }
}
