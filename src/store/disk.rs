use super::{KeyValue, StoreError};
use anyhow::Result;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tracing::debug;

/// Durable store backed by a fjall keyspace with a single partition.
pub struct DiskStore {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)?;

        let keyspace = Config::new(path).open()?;
        let partition = keyspace.open_partition("state", PartitionCreateOptions::default())?;
        Ok(Self {
            keyspace,
            partition,
        })
    }

    /// Flushes buffered writes to disk.
    pub fn persist(&self) -> Result<(), StoreError> {
        self.keyspace.persist(PersistMode::SyncAll)?;
        Ok(())
    }
}

impl KeyValue for DiskStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.partition.get(key)? {
            Some(slice) => {
                debug!("Store HIT for key: {key}");
                Ok(Some(String::from_utf8_lossy(&slice).into_owned()))
            }
            None => {
                debug!("Store MISS for key: {key}");
                Ok(None)
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.partition.insert(key, value)?;
        debug!("Store SET for key: {key}");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.partition.remove(key)?;
        debug!("Store REMOVE for key: {key}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_disk_store_get_set_remove() {
        let dir = tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();

        assert!(store.get("key1").unwrap().is_none());

        store.set("key1", r#"{"a":1}"#).unwrap();
        assert_eq!(store.get("key1").unwrap().as_deref(), Some(r#"{"a":1}"#));

        store.remove("key1").unwrap();
        assert!(store.get("key1").unwrap().is_none());
    }

    #[test]
    fn test_disk_store_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = DiskStore::open(dir.path()).unwrap();
            store.set("league", r#""Standard""#).unwrap();
            store.persist().unwrap();
        }

        let store = DiskStore::open(dir.path()).unwrap();
        assert_eq!(store.get("league").unwrap().as_deref(), Some(r#""Standard""#));
    }

    #[test]
    fn test_disk_store_overwrites_value() {
        let dir = tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();

        store.set("k", "1").unwrap();
        store.set("k", "2").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("2"));
    }
}
