//! Manual backup format for the local backend.
//!
//! A backup is one flat JSON object mapping `parnaso_*` keys to their
//! stored string values, e.g.
//! `{"parnaso_u1_sessions": "[...]", "parnaso_u1_settings": "{...}"}`.
//! Importing it into another data directory reproduces those keys.
//!
//! # Invariants
//! - Only writing data travels. The signed-in account and the database
//!   location are neither exported nor imported, so a backup can never
//!   sign anyone in or redirect the relational backend.

use crate::storage::keys::{is_app_key, CURRENT_USER_KEY, DATABASE_PATH_KEY};
use crate::storage::{KeyValueStore, StorageError};
use log::{info, warn};
use serde_json::Value;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum BackupError {
    /// Input is not valid JSON.
    Parse(serde_json::Error),
    /// Input is JSON but not an object.
    NotAnObject,
    /// No `parnaso_*` entry could be imported.
    NothingImported,
    Storage(StorageError),
}

impl Display for BackupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "backup is not valid JSON: {err}"),
            Self::NotAnObject => write!(f, "backup must be a JSON object"),
            Self::NothingImported => write!(f, "backup contains no parnaso_* entries"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BackupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::NotAnObject | Self::NothingImported => None,
        }
    }
}

impl From<StorageError> for BackupError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// Outcome of an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    /// Foreign keys, session and configuration keys, and null values that
    /// were left alone.
    pub skipped: usize,
}

/// Whether `key` is application data that belongs in a backup.
fn is_backup_key(key: &str) -> bool {
    is_app_key(key) && key != CURRENT_USER_KEY && key != DATABASE_PATH_KEY
}

/// Serializes every application data key into the backup format.
pub fn export_backup_json<S: KeyValueStore + ?Sized>(store: &S) -> Result<String, BackupError> {
    let mut data = BTreeMap::new();
    for key in store.keys()? {
        if !is_backup_key(&key) {
            continue;
        }
        if let Some(value) = store.get_item(&key)? {
            data.insert(key, value);
        }
    }

    info!(
        "event=backup_export module=storage status=ok keys={}",
        data.len()
    );
    serde_json::to_string_pretty(&data).map_err(BackupError::Parse)
}

/// Writes every `parnaso_*` data entry of `json` into `store`.
///
/// String values are stored verbatim; other non-null JSON values are stored
/// as their JSON text. Existing keys are overwritten.
pub fn import_backup_json<S: KeyValueStore + ?Sized>(
    store: &S,
    json: &str,
) -> Result<ImportReport, BackupError> {
    let parsed: Value = serde_json::from_str(json).map_err(BackupError::Parse)?;
    let Value::Object(entries) = parsed else {
        return Err(BackupError::NotAnObject);
    };

    let mut report = ImportReport {
        imported: 0,
        skipped: 0,
    };
    for (key, value) in entries {
        let text = match value {
            _ if !is_backup_key(&key) => None,
            Value::Null => None,
            Value::String(text) => Some(text),
            other => Some(other.to_string()),
        };
        match text {
            Some(text) => {
                store.set_item(&key, &text)?;
                report.imported += 1;
            }
            None => report.skipped += 1,
        }
    }

    if report.imported == 0 {
        warn!(
            "event=backup_import module=storage status=error skipped={}",
            report.skipped
        );
        return Err(BackupError::NothingImported);
    }
    info!(
        "event=backup_import module=storage status=ok imported={} skipped={}",
        report.imported, report.skipped
    );
    Ok(report)
}
