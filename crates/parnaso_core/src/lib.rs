//! Core domain logic for Parnaso, a writing-habit tracker.
//!
//! # Responsibility
//! - Own every data rule; the CLI is a thin surface over this crate.
//! - Expose one service API over two interchangeable storage backends.

pub mod config;
pub mod context;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod storage;

pub use config::{clear_backend_config, update_backend_config, BackendConfig, ConfigSource};
pub use context::{AppContext, ContextError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::project::{Project, ProjectId, ProjectStatus};
pub use model::session::{SessionDetails, SessionId, WritingSession};
pub use model::settings::UserSettings;
pub use model::user::{User, UserId, UserRole};
pub use model::ValidationError;
pub use repo::profile_repo::{ProfileRepository, SqliteProfileRepository};
pub use repo::writing_repo::SqliteWritingStore;
pub use repo::{RepoError, RepoResult, WritingStore};
pub use service::admin_service::{AdminError, AdminService, UserData};
pub use service::auth_service::{logout, AuthError, AuthService};
pub use service::progress::{ProgressSummary, ProjectProgress};
pub use service::stats::GlobalStats;
pub use service::writing_service::{WritingService, WritingServiceError};
pub use service::UserSession;
pub use storage::backup::{export_backup_json, import_backup_json, BackupError, ImportReport};
pub use storage::local_store::LocalWritingStore;
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageChange, StorageError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
