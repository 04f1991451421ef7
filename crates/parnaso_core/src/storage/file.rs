//! JSON-file key-value store.
//!
//! # Invariants
//! - The file always holds one JSON object mapping keys to strings.
//! - Writes go to a sibling temp file first and are renamed into place.

use super::{ChangeFeed, KeyValueStore, StorageChange, StorageError, StorageResult};
use log::{error, info};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::sync::Mutex;

/// Key-value store persisted to a single JSON file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
    feed: ChangeFeed,
}

impl FileStore {
    /// Opens the store at `path`, starting empty when the file is missing.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str::<BTreeMap<String, String>>(&text)
                .map_err(|err| StorageError::Corrupt(format!("{}: {err}", path.display())))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        info!(
            "event=kv_open module=storage status=ok keys={} path={}",
            entries.len(),
            path.display()
        );

        Ok(Self {
            path,
            entries: Mutex::new(entries),
            feed: ChangeFeed::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn mutate(
        &self,
        apply: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> StorageResult<()> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        let mut next = entries.clone();
        apply(&mut next);
        if let Err(err) = persist(&self.path, &next) {
            error!(
                "event=kv_write module=storage status=error path={} error={}",
                self.path.display(),
                err
            );
            return Err(err);
        }
        *entries = next;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.mutate(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })?;
        self.feed.notify(StorageChange {
            key: key.to_string(),
            new_value: Some(value.to_string()),
        });
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.mutate(|entries| {
            entries.remove(key);
        })?;
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

fn persist(path: &Path, entries: &BTreeMap<String, String>) -> StorageResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let text = serde_json::to_string_pretty(entries)
        .map_err(|err| StorageError::Corrupt(err.to_string()))?;
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, text)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
