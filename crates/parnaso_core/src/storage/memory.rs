//! Volatile key-value store.
//!
//! # Invariants
//! - Contents live only as long as the value; nothing touches disk.
//! - Mutations notify subscribers exactly like `FileStore`.

use super::{ChangeFeed, KeyValueStore, StorageChange, StorageError, StorageResult};
use std::collections::BTreeMap;
use std::sync::mpsc::Receiver;
use std::sync::Mutex;

/// Volatile key-value store for tests and demo sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
    feed: ChangeFeed,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.entries
            .lock()
            .map_err(|_| StorageError::Poisoned)?
            .insert(key.to_string(), value.to_string());
        self.feed.notify(StorageChange {
            key: key.to_string(),
            new_value: Some(value.to_string()),
        });
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.entries
            .lock()
            .map_err(|_| StorageError::Poisoned)?
            .remove(key);
        self.feed.notify(StorageChange {
            key: key.to_string(),
            new_value: None,
        });
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.keys().cloned().collect())
    }

    fn subscribe(&self) -> Receiver<StorageChange> {
        self.feed.subscribe()
    }
}
