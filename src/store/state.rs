//! Typed persistent state slots.
//!
//! A [`StateSlot`] binds one key of the store to an in-memory value for the
//! lifetime of a command: deserialized once on load, written through on
//! every update. Reads that fail fall back to a default; writes that fail
//! keep the in-memory value and report the divergence to the caller.

use super::{KeyValue, StoreError};
use crate::core::currency::{DEFAULT_DECIMALS, precise_round};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Numeric fields normalized on every write of an array-shaped document.
const ROUNDED_FIELDS: [&str; 4] = ["buyPrice", "sellPrice", "buyQuantity", "sellQuantity"];

pub struct StateSlot<T> {
    store: Arc<dyn KeyValue>,
    key: &'static str,
    value: T,
}

impl<T> StateSlot<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Binds `key` to a typed slot. Absent or corrupt stored text yields
    /// `default`; read failures are logged and never propagated.
    pub fn load(store: Arc<dyn KeyValue>, key: &'static str, default: T) -> Self {
        let value = match store.get(key) {
            Ok(Some(text)) => match serde_json::from_str(&text) {
                Ok(value) => value,
                Err(e) => {
                    warn!(key, error = %e, "Stored value is corrupt, using default");
                    default
                }
            },
            Ok(None) => default,
            Err(e) => {
                warn!(key, error = %e, "Failed to read stored value, using default");
                default
            }
        };
        Self { store, key, value }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Transforms the current value and persists the result.
    ///
    /// Only the functional form exists: an update is always expressed over
    /// the previous value, never as a captured snapshot, so interleaved
    /// writers on one key cannot silently lose each other's changes.
    ///
    /// If the resolved value serializes to an array of objects, the known
    /// numeric fields of each element are rounded before the write and the
    /// in-memory value is rehydrated from the normalized document, keeping
    /// memory and store byte-equal on success. A failed write keeps the new
    /// in-memory value (no rollback) and returns the error; the caller
    /// decides whether to surface it.
    pub fn update(&mut self, f: impl FnOnce(T) -> T) -> Result<(), StoreError> {
        let next = f(self.value.clone());

        let mut doc = match serde_json::to_value(&next) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(key = self.key, error = %e, "Failed to encode value, keeping in-memory state");
                self.value = next;
                return Err(StoreError::Encode {
                    key: self.key.to_string(),
                    source: e,
                });
            }
        };
        normalize_numeric_fields(&mut doc);

        self.value = match serde_json::from_value(doc.clone()) {
            Ok(value) => value,
            Err(e) => {
                debug!(key = self.key, error = %e, "Normalized document does not rehydrate");
                next
            }
        };

        if let Err(e) = self.store.set(self.key, &doc.to_string()) {
            warn!(key = self.key, error = %e, "Failed to persist value, keeping in-memory state");
            return Err(e);
        }
        debug!(key = self.key, "Persisted state");
        Ok(())
    }
}

/// Rounds the well-known numeric fields of an array-of-objects document.
/// Other shapes and fields pass through untouched.
fn normalize_numeric_fields(doc: &mut Value) {
    let Value::Array(items) = doc else { return };
    for item in items {
        let Value::Object(fields) = item else { continue };
        for name in ROUNDED_FIELDS {
            if let Some(field) = fields.get_mut(name) {
                if let Some(number) = field.as_f64() {
                    if let Some(rounded) =
                        serde_json::Number::from_f64(precise_round(number, DEFAULT_DECIMALS))
                    {
                        *field = Value::Number(rounded);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    struct FailingStore;

    impl KeyValue for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Engine("quota exceeded".to_string()))
        }

        fn remove(&self, _key: &str) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[test]
    fn test_load_returns_default_when_absent() {
        let store: Arc<dyn KeyValue> = Arc::new(MemoryStore::new());
        let slot = StateSlot::load(Arc::clone(&store), "missing", vec![1, 2, 3]);
        assert_eq!(slot.get(), &vec![1, 2, 3]);
    }

    #[test]
    fn test_load_returns_default_on_corrupt_text() {
        let store: Arc<dyn KeyValue> = Arc::new(MemoryStore::new());
        store.set("bad", "{not json").unwrap();
        let slot = StateSlot::load(Arc::clone(&store), "bad", 42u32);
        assert_eq!(*slot.get(), 42);
    }

    #[test]
    fn test_update_round_trips_through_store() {
        let store: Arc<dyn KeyValue> = Arc::new(MemoryStore::new());

        let mut slot = StateSlot::load(Arc::clone(&store), "leagues", Vec::<String>::new());
        slot.update(|mut leagues| {
            leagues.push("Standard".to_string());
            leagues
        })
        .unwrap();

        let reloaded = StateSlot::load(Arc::clone(&store), "leagues", Vec::<String>::new());
        assert_eq!(reloaded.get(), &vec!["Standard".to_string()]);
    }

    #[test]
    fn test_sequential_functional_updates_compose() {
        let store: Arc<dyn KeyValue> = Arc::new(MemoryStore::new());
        let mut slot = StateSlot::load(Arc::clone(&store), "counter", 0i64);

        slot.update(|n| n + 1).unwrap();
        slot.update(|n| n + 1).unwrap();
        slot.update(|n| n * 10).unwrap();

        assert_eq!(*slot.get(), 20);
        let reloaded = StateSlot::load(store, "counter", 0i64);
        assert_eq!(*reloaded.get(), 20);
    }

    #[test]
    fn test_update_normalizes_known_numeric_fields() {
        let store: Arc<dyn KeyValue> = Arc::new(MemoryStore::new());
        let mut slot = StateSlot::load(Arc::clone(&store), "rows", Vec::<Value>::new());

        slot.update(|_| vec![json!({"buyPrice": 1.23456789, "other": "x"})])
            .unwrap();

        // In-memory value carries the normalized number
        assert_eq!(slot.get()[0]["buyPrice"], json!(1.234568));
        assert_eq!(slot.get()[0]["other"], json!("x"));

        // And so does the persisted document
        let reloaded = StateSlot::load(Arc::clone(&store), "rows", Vec::<Value>::new());
        assert_eq!(reloaded.get()[0]["buyPrice"], json!(1.234568));
        assert_eq!(reloaded.get()[0]["other"], json!("x"));
    }

    #[test]
    fn test_normalization_skips_non_array_documents() {
        let store: Arc<dyn KeyValue> = Arc::new(MemoryStore::new());
        let mut slot = StateSlot::load(
            Arc::clone(&store),
            "scalar",
            json!({"buyPrice": 1.23456789}),
        );

        slot.update(|v| v).unwrap();

        // Top-level objects are not sequences; nothing is rounded
        assert_eq!(slot.get()["buyPrice"], json!(1.23456789));
    }

    #[test]
    fn test_failed_write_keeps_memory_and_reports() {
        let store: Arc<dyn KeyValue> = Arc::new(FailingStore);
        let mut slot = StateSlot::load(Arc::clone(&store), "counter", 0i64);

        let result = slot.update(|n| n + 5);
        assert!(matches!(result, Err(StoreError::Engine(_))));
        assert_eq!(*slot.get(), 5);
    }
}
