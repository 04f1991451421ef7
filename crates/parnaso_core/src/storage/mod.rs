//! Flat key-value storage used by the local fallback backend.
//!
//! # Responsibility
//! - Define the `KeyValueStore` contract (string keys to string values).
//! - Broadcast every mutation to subscribers, so other views can reload.
//! - Host the local `WritingStore` and the backup export/import format.
//!
//! # Invariants
//! - Values are opaque strings; callers own their JSON encoding.
//! - Every successful `set_item`/`remove_item` emits one `StorageChange`.

pub mod backup;
mod feed;
mod file;
pub mod keys;
pub mod local_store;
mod memory;

pub use feed::{ChangeFeed, StorageChange};
pub use file::FileStore;
pub use memory::MemoryStore;

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::mpsc::Receiver;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    /// Backing file exists but is not a JSON object of strings.
    Corrupt(String),
    /// A writer panicked while holding the store lock.
    Poisoned,
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "storage io error: {err}"),
            Self::Corrupt(message) => write!(f, "storage file is corrupt: {message}"),
            Self::Poisoned => write!(f, "storage lock poisoned"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Corrupt(_) | Self::Poisoned => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// String key-value store with change notifications.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;
    fn remove_item(&self, key: &str) -> StorageResult<()>;
    /// All keys in ascending order.
    fn keys(&self) -> StorageResult<Vec<String>>;
    /// Receives one `StorageChange` per later mutation.
    fn subscribe(&self) -> Receiver<StorageChange>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        (**self).remove_item(key)
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        (**self).keys()
    }

    fn subscribe(&self) -> Receiver<StorageChange> {
        (**self).subscribe()
    }
}
