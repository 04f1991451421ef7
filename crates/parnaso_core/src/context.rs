//! Per-data-directory application context.
//!
//! # Responsibility
//! - Open the key-value store (`storage.json`) of one data directory.
//! - Resolve backend configuration and open the relational database when
//!   configured.
//! - Hand out services bound to the selected backend.
//!
//! # Invariants
//! - Relative database paths are resolved against the data directory.
//! - Account features (auth, admin) require the relational backend.
//! - Without it, writing use-cases run on the local store as the guest.

use crate::config::BackendConfig;
use crate::db::{open_db, DbError};
use crate::repo::profile_repo::SqliteProfileRepository;
use crate::repo::writing_repo::SqliteWritingStore;
use crate::repo::{RepoError, WritingStore};
use crate::service::admin_service::AdminService;
use crate::service::auth_service::{AuthError, AuthService};
use crate::service::writing_service::WritingService;
use crate::service::UserSession;
use crate::storage::local_store::LocalWritingStore;
use crate::storage::{FileStore, StorageError};
use log::info;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const STORAGE_FILE_NAME: &str = "storage.json";

#[derive(Debug)]
pub enum ContextError {
    Storage(StorageError),
    Db(DbError),
    Repo(RepoError),
    Auth(AuthError),
    /// Operation needs the relational backend.
    NotConfigured,
    /// Operation needs a signed-in account.
    NotSignedIn,
}

impl Display for ContextError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Auth(err) => write!(f, "{err}"),
            Self::NotConfigured => write!(f, "database is not configured"),
            Self::NotSignedIn => write!(f, "not signed in"),
        }
    }
}

impl Error for ContextError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Auth(err) => Some(err),
            Self::NotConfigured | Self::NotSignedIn => None,
        }
    }
}

impl From<StorageError> for ContextError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<DbError> for ContextError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for ContextError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<AuthError> for ContextError {
    fn from(value: AuthError) -> Self {
        Self::Auth(value)
    }
}

pub struct AppContext {
    data_dir: PathBuf,
    kv: FileStore,
    config: BackendConfig,
    connection: Option<Connection>,
}

impl AppContext {
    /// Opens `data_dir` using the process environment for configuration.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self, ContextError> {
        let data_dir = data_dir.into();
        let kv = FileStore::open(data_dir.join(STORAGE_FILE_NAME))?;
        let config = BackendConfig::resolve(&kv)?;
        Self::with_config(data_dir, kv, config)
    }

    /// Opens `data_dir` with an explicit configuration.
    pub fn with_config(
        data_dir: PathBuf,
        kv: FileStore,
        config: BackendConfig,
    ) -> Result<Self, ContextError> {
        let connection = match config.database_path() {
            Some(path) => Some(open_db(resolve_against(&data_dir, path))?),
            None => None,
        };
        info!(
            "event=context_open module=context status=ok backend={} config_source={}",
            if connection.is_some() { "relational" } else { "local" },
            config.source().as_str()
        );
        Ok(Self {
            data_dir,
            kv,
            config,
            connection,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn kv(&self) -> &FileStore {
        &self.kv
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub fn is_relational(&self) -> bool {
        self.connection.is_some()
    }

    /// Store for the active backend.
    pub fn writing_store(&self) -> Result<Box<dyn WritingStore + '_>, ContextError> {
        match &self.connection {
            Some(conn) => Ok(Box::new(SqliteWritingStore::try_new(conn)?)),
            None => Ok(Box::new(LocalWritingStore::new(&self.kv))),
        }
    }

    pub fn writing_service(
        &self,
    ) -> Result<WritingService<Box<dyn WritingStore + '_>>, ContextError> {
        Ok(WritingService::new(self.writing_store()?))
    }

    pub fn auth_service(&self) -> Result<AuthService<SqliteProfileRepository<'_>>, ContextError> {
        let conn = self.require_connection()?;
        Ok(AuthService::new(SqliteProfileRepository::try_new(conn)?))
    }

    pub fn admin_service(
        &self,
    ) -> Result<AdminService<SqliteProfileRepository<'_>, SqliteWritingStore<'_>>, ContextError>
    {
        let conn = self.require_connection()?;
        Ok(AdminService::new(
            SqliteProfileRepository::try_new(conn)?,
            SqliteWritingStore::try_new(conn)?,
        ))
    }

    /// Account the current data directory acts as.
    ///
    /// The guest on the local backend; the remembered sign-in otherwise.
    pub fn current_session(&self) -> Result<UserSession, ContextError> {
        if !self.is_relational() {
            return Ok(UserSession::guest());
        }
        self.auth_service()?
            .current_session(&self.kv)?
            .ok_or(ContextError::NotSignedIn)
    }

    fn require_connection(&self) -> Result<&Connection, ContextError> {
        self.connection.as_ref().ok_or(ContextError::NotConfigured)
    }
}

fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
