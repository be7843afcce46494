//! In-memory storage backend

use std::sync::Mutex;

use rustc_hash::FxHashMap;

use super::{Storage, StorageError};

/// Process-local storage, optionally limited to a byte quota.
///
/// The quota counts key and value bytes of every stored document, the same way
/// browser local storage accounts for its limit.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    documents: Mutex<FxHashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    /// Create an unbounded in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an in-memory store that rejects writes beyond `quota` bytes.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            documents: Mutex::default(),
            quota: Some(quota),
        }
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let documents = self
            .documents
            .lock()
            .map_err(|_poisoned| StorageError::Unavailable)?;

        Ok(documents.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut documents = self
            .documents
            .lock()
            .map_err(|_poisoned| StorageError::Unavailable)?;

        if let Some(quota) = self.quota {
            let others: usize = documents
                .iter()
                .filter(|(existing, _)| existing.as_str() != key)
                .map(|(existing, document)| existing.len() + document.len())
                .sum();

            let required = others + key.len() + value.len();

            if required > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    required,
                    quota,
                });
            }
        }

        documents.insert(key.to_string(), value.to_string());

        Ok(())
    }
}
