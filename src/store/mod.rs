//! Persistent Store
//!
//! Best-effort JSON document storage under fixed keys. Reads that fail or return
//! garbage are treated as "no prior data", and failed writes are logged and dropped,
//! so callers never have to handle a storage error.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    io,
    sync::Arc,
};

use mockall::automock;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::{debug, error, warn};

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Storage key holding the cart line items.
pub const CART_STORAGE_KEY: &str = "hvac_cart";

/// Storage key holding the list of placed orders.
pub const ORDERS_STORAGE_KEY: &str = "orders";

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing medium failed.
    #[error("storage I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The write would exceed the backend's byte quota.
    #[error("storage quota exceeded writing {key}: {required} bytes required, {quota} allowed")]
    QuotaExceeded {
        /// Key being written
        key: String,
        /// Bytes the store would hold after the write
        required: usize,
        /// Configured quota in bytes
        quota: usize,
    },

    /// The key cannot be used by this backend.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// The backend cannot currently be accessed.
    #[error("storage is unavailable")]
    Unavailable,
}

/// Raw string key-value storage, the equivalent of a browser's local storage.
#[automock]
pub trait Storage: Send + Sync {
    /// Read the document stored under `key`, if any.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Overwrite the document stored under `key`.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// JSON document store over a shared [`Storage`] backend.
#[derive(Clone)]
pub struct PersistentStore {
    storage: Arc<dyn Storage>,
}

impl PersistentStore {
    /// Create a store over the given backend.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Load and deserialize the document stored under `key`.
    ///
    /// Returns `None` when the key is unset, the backend fails, or the payload does
    /// not parse as `T`.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let payload = match self.storage.get_item(key) {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                debug!(key, "no persisted document");

                return None;
            }
            Err(error) => {
                warn!(key, %error, "failed to read persisted document");

                return None;
            }
        };

        match serde_json::from_str(&payload) {
            Ok(value) => Some(value),
            Err(error) => {
                warn!(key, %error, "discarding malformed persisted document");

                None
            }
        }
    }

    /// Serialize `value` and overwrite the document stored under `key`.
    ///
    /// Returns whether the document was written.
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(error) => {
                error!(key, %error, "failed to serialize document");

                return false;
            }
        };

        match self.storage.set_item(key, &payload) {
            Ok(()) => {
                debug!(key, bytes = payload.len(), "persisted document");

                true
            }
            Err(error) => {
                error!(key, %error, "failed to persist document");

                false
            }
        }
    }
}

impl Debug for PersistentStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PersistentStore").finish_non_exhaustive()
    }
}
