//! Repository layer: data access contracts and relational implementations.
//!
//! # Responsibility
//! - Define the `WritingStore` seam shared by the relational and local
//!   backends.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths validate records before touching storage.
//! - Saves are upserts keyed by `(owner, id)`; the last write wins.
//! - Read paths reject malformed persisted rows instead of masking them.

pub mod profile_repo;
pub mod writing_repo;

use crate::db::DbError;
use crate::model::project::Project;
use crate::model::session::WritingSession;
use crate::model::settings::UserSettings;
use crate::model::user::UserId;
use crate::model::ValidationError;
use crate::storage::StorageError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence error shared by every repository.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    Storage(StorageError),
    /// Target record does not exist. Carries a `kind:id` description.
    NotFound(String),
    /// A unique value is already taken. Carries a `kind:value` description.
    Conflict(String),
    InvalidData(String),
    /// Connection schema is older than this binary expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::NotFound(what) => write!(f, "not found: {what}"),
            Self::Conflict(what) => write!(f, "already exists: {what}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::NotFound(_)
            | Self::Conflict(_)
            | Self::InvalidData(_)
            | Self::UninitializedConnection { .. } => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<StorageError> for RepoError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// Per-user persistence of sessions, projects and goal settings.
///
/// Both backends implement this trait so services stay storage-agnostic.
pub trait WritingStore {
    /// Sessions newest first.
    fn list_sessions(&self, user_id: &UserId) -> RepoResult<Vec<WritingSession>>;
    /// Inserts or replaces one session by id.
    fn save_session(&self, user_id: &UserId, session: &WritingSession) -> RepoResult<()>;
    /// Removes one session; `NotFound` when absent.
    fn delete_session(&self, user_id: &UserId, session_id: &str) -> RepoResult<()>;
    /// Projects in creation order.
    fn list_projects(&self, user_id: &UserId) -> RepoResult<Vec<Project>>;
    /// Inserts or replaces one project by id.
    fn save_project(&self, user_id: &UserId, project: &Project) -> RepoResult<()>;
    /// Stored settings, or `UserSettings::initial()` when none exist.
    fn get_settings(&self, user_id: &UserId) -> RepoResult<UserSettings>;
    fn save_settings(&self, user_id: &UserId, settings: &UserSettings) -> RepoResult<()>;
    /// Resets to empty sessions, empty projects and initial settings.
    fn clear_user_data(&self, user_id: &UserId) -> RepoResult<()>;
    /// Drops every record owned by `user_id`.
    fn delete_user_data(&self, user_id: &UserId) -> RepoResult<()>;
}

impl<T: WritingStore + ?Sized> WritingStore for &T {
    fn list_sessions(&self, user_id: &UserId) -> RepoResult<Vec<WritingSession>> {
        (**self).list_sessions(user_id)
    }

    fn save_session(&self, user_id: &UserId, session: &WritingSession) -> RepoResult<()> {
        (**self).save_session(user_id, session)
    }

    fn delete_session(&self, user_id: &UserId, session_id: &str) -> RepoResult<()> {
        (**self).delete_session(user_id, session_id)
    }

    fn list_projects(&self, user_id: &UserId) -> RepoResult<Vec<Project>> {
        (**self).list_projects(user_id)
    }

    fn save_project(&self, user_id: &UserId, project: &Project) -> RepoResult<()> {
        (**self).save_project(user_id, project)
    }

    fn get_settings(&self, user_id: &UserId) -> RepoResult<UserSettings> {
        (**self).get_settings(user_id)
    }

    fn save_settings(&self, user_id: &UserId, settings: &UserSettings) -> RepoResult<()> {
        (**self).save_settings(user_id, settings)
    }

    fn clear_user_data(&self, user_id: &UserId) -> RepoResult<()> {
        (**self).clear_user_data(user_id)
    }

    fn delete_user_data(&self, user_id: &UserId) -> RepoResult<()> {
        (**self).delete_user_data(user_id)
    }
}

impl<T: WritingStore + ?Sized> WritingStore for Box<T> {
    fn list_sessions(&self, user_id: &UserId) -> RepoResult<Vec<WritingSession>> {
        (**self).list_sessions(user_id)
    }

    fn save_session(&self, user_id: &UserId, session: &WritingSession) -> RepoResult<()> {
        (**self).save_session(user_id, session)
    }

    fn delete_session(&self, user_id: &UserId, session_id: &str) -> RepoResult<()> {
        (**self).delete_session(user_id, session_id)
    }

    fn list_projects(&self, user_id: &UserId) -> RepoResult<Vec<Project>> {
        (**self).list_projects(user_id)
    }

    fn save_project(&self, user_id: &UserId, project: &Project) -> RepoResult<()> {
        (**self).save_project(user_id, project)
    }

    fn get_settings(&self, user_id: &UserId) -> RepoResult<UserSettings> {
        (**self).get_settings(user_id)
    }

    fn save_settings(&self, user_id: &UserId, settings: &UserSettings) -> RepoResult<()> {
        (**self).save_settings(user_id, settings)
    }

    fn clear_user_data(&self, user_id: &UserId) -> RepoResult<()> {
        (**self).clear_user_data(user_id)
    }

    fn delete_user_data(&self, user_id: &UserId) -> RepoResult<()> {
        (**self).delete_user_data(user_id)
    }
}
