//! Relational backend configuration.
//!
//! # Responsibility
//! - Resolve where the relational database lives: the
//!   `PARNASO_DATABASE_PATH` environment variable wins, then the value
//!   persisted in the key-value store under `parnaso_database_path`.
//! - Persist or clear the stored value.
//!
//! # Invariants
//! - Blank values count as unset.
//! - Without a resolved path the application runs on the local backend.

use crate::storage::keys::DATABASE_PATH_KEY;
use crate::storage::{KeyValueStore, StorageResult};
use log::info;
use std::path::{Path, PathBuf};

pub const DATABASE_PATH_ENV: &str = "PARNASO_DATABASE_PATH";

/// Where the active backend configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Environment,
    Stored,
    Unset,
}

impl ConfigSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Environment => "environment",
            Self::Stored => "stored",
            Self::Unset => "unset",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    database_path: Option<PathBuf>,
    source: ConfigSource,
}

impl BackendConfig {
    /// Resolves configuration from the process environment and `store`.
    pub fn resolve<S: KeyValueStore + ?Sized>(store: &S) -> StorageResult<Self> {
        Self::resolve_with_env(store, std::env::var(DATABASE_PATH_ENV).ok())
    }

    /// Same as `resolve`, with the environment value supplied by the caller.
    pub fn resolve_with_env<S: KeyValueStore + ?Sized>(
        store: &S,
        env_value: Option<String>,
    ) -> StorageResult<Self> {
        if let Some(path) = non_blank(env_value) {
            return Ok(Self {
                database_path: Some(PathBuf::from(path)),
                source: ConfigSource::Environment,
            });
        }
        if let Some(path) = non_blank(store.get_item(DATABASE_PATH_KEY)?) {
            return Ok(Self {
                database_path: Some(PathBuf::from(path)),
                source: ConfigSource::Stored,
            });
        }
        Ok(Self {
            database_path: None,
            source: ConfigSource::Unset,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.database_path.is_some()
    }

    pub fn database_path(&self) -> Option<&Path> {
        self.database_path.as_deref()
    }

    pub fn source(&self) -> ConfigSource {
        self.source
    }
}

/// Stores a database path for later runs. Blank input is ignored.
pub fn update_backend_config<S: KeyValueStore + ?Sized>(
    store: &S,
    database_path: &str,
) -> StorageResult<bool> {
    let trimmed = database_path.trim();
    if trimmed.is_empty() {
        return Ok(false);
    }
    store.set_item(DATABASE_PATH_KEY, trimmed)?;
    info!("event=config_update module=config status=ok key={DATABASE_PATH_KEY}");
    Ok(true)
}

/// Forgets the stored database path.
pub fn clear_backend_config<S: KeyValueStore + ?Sized>(store: &S) -> StorageResult<()> {
    store.remove_item(DATABASE_PATH_KEY)?;
    info!("event=config_clear module=config status=ok key={DATABASE_PATH_KEY}");
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{clear_backend_config, update_backend_config, BackendConfig, ConfigSource};
    use crate::storage::MemoryStore;
    use std::path::Path;

    #[test]
    fn environment_wins_over_stored_value() {
        let store = MemoryStore::new();
        update_backend_config(&store, " /data/stored.db ").unwrap();

        let config =
            BackendConfig::resolve_with_env(&store, Some("/data/env.db".to_string())).unwrap();
        assert_eq!(config.source(), ConfigSource::Environment);
        assert_eq!(config.database_path(), Some(Path::new("/data/env.db")));

        let config = BackendConfig::resolve_with_env(&store, Some("  ".to_string())).unwrap();
        assert_eq!(config.source(), ConfigSource::Stored);
        assert_eq!(config.database_path(), Some(Path::new("/data/stored.db")));
    }

    #[test]
    fn blank_update_is_ignored_and_clear_unsets() {
        let store = MemoryStore::new();
        assert!(!update_backend_config(&store, "   ").unwrap());
        assert!(!BackendConfig::resolve_with_env(&store, None)
            .unwrap()
            .is_configured());

        update_backend_config(&store, "/data/p.db").unwrap();
        clear_backend_config(&store).unwrap();
        let config = BackendConfig::resolve_with_env(&store, None).unwrap();
        assert_eq!(config.source(), ConfigSource::Unset);
    }
}
