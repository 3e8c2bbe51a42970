//! Durable key-value state for the application.
//!
//! Everything the app remembers between runs lives under a small fixed set
//! of string keys, each holding one JSON document. The [`KeyValue`] trait is
//! the synchronous text contract over the backend; [`state::StateSlot`]
//! layers typed access, default fallback and write normalization on top.

pub mod disk;
pub mod memory;
pub mod state;

use thiserror::Error;

pub use disk::DiskStore;
pub use memory::MemoryStore;
pub use state::StateSlot;

/// Keys of every persisted document. The shape of the value under each key
/// is owned by the consuming feature, not by this layer.
pub mod keys {
    pub const EXCHANGE_RATE: &str = "exchangeRate";
    pub const TRANSACTIONS: &str = "transactions";
    pub const TRANSACTION_GROUPS: &str = "transactionGroups";
    pub const COMPLETED_TRANSACTIONS: &str = "completedTransactions";
    pub const SELECTED_LEAGUE: &str = "selectedLeague";
    pub const RATE_CACHE: &str = "rateCache";
    pub const FEATURE_TOGGLES: &str = "featureToggles";
    pub const UI_PREFERENCES: &str = "uiPreferences";

    /// Every key, in export order.
    pub const ALL: [&str; 8] = [
        EXCHANGE_RATE,
        TRANSACTIONS,
        TRANSACTION_GROUPS,
        COMPLETED_TRANSACTIONS,
        SELECTED_LEAGUE,
        RATE_CACHE,
        FEATURE_TOGGLES,
        UI_PREFERENCES,
    ];
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage engine rejected the operation (I/O, capacity).
    #[error("storage engine: {0}")]
    Engine(String),
    #[error("failed to encode value for key '{key}': {source}")]
    Encode {
        key: String,
        source: serde_json::Error,
    },
}

impl From<fjall::Error> for StoreError {
    fn from(error: fjall::Error) -> Self {
        StoreError::Engine(error.to_string())
    }
}

/// Synchronous string key-value contract over the durable store.
pub trait KeyValue: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}
