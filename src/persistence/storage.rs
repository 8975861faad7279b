//! Key-value storage backends
//!
//! The browser backend lives in `platform::web`; this module holds the trait
//! and an in-memory store for native runs and tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage is unavailable")]
    Unavailable,
    #[error("reading `{key}` failed: {reason}")]
    ReadFailed { key: String, reason: String },
    #[error("writing `{key}` failed: {reason}")]
    WriteFailed { key: String, reason: String },
}

/// A durable string slot per key (LocalStorage semantics)
pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory storage
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RefCell<HashMap<String, String>>,
    /// Reject writes, like a browser over quota
    full: Cell<bool>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent writes fail (removals still succeed)
    pub fn set_full(&self, full: bool) {
        self.full.set(full);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.items.borrow().contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.full.get() {
            return Err(StorageError::WriteFailed {
                key: key.to_string(),
                reason: "quota exceeded".to_string(),
            });
        }
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("k").unwrap(), None);

        storage.set("k", "v").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));

        storage.remove("k").unwrap();
        assert!(storage.is_empty());
        // Removing twice is fine
        storage.remove("k").unwrap();
    }

    #[test]
    fn test_full_storage_rejects_writes() {
        let storage = MemoryStorage::new();
        storage.set("k", "old").unwrap();
        storage.set_full(true);

        let err = storage.set("k", "new").unwrap_err();
        assert!(matches!(err, StorageError::WriteFailed { .. }));
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("old"));
    }
}
