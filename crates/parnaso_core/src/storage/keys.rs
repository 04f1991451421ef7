//! Key naming for the local backend.
//!
//! # Invariants
//! - Every application key starts with `parnaso_`.
//! - Per-user data lives at `parnaso_<userId>_sessions|projects|settings`.

use crate::model::user::UserId;

pub const KEY_PREFIX: &str = "parnaso_";
/// Signed-in account id for the current data directory.
pub const CURRENT_USER_KEY: &str = "parnaso_current_user";
/// Relational backend location persisted by `config::update_backend_config`.
pub const DATABASE_PATH_KEY: &str = "parnaso_database_path";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub sessions: String,
    pub projects: String,
    pub settings: String,
}

impl StorageKeys {
    pub fn for_user(user_id: &UserId) -> Self {
        Self {
            sessions: format!("{KEY_PREFIX}{user_id}_sessions"),
            projects: format!("{KEY_PREFIX}{user_id}_projects"),
            settings: format!("{KEY_PREFIX}{user_id}_settings"),
        }
    }

    pub fn all(&self) -> [&str; 3] {
        [
            self.sessions.as_str(),
            self.projects.as_str(),
            self.settings.as_str(),
        ]
    }
}

/// Whether `key` belongs to this application.
pub fn is_app_key(key: &str) -> bool {
    key.starts_with(KEY_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::{is_app_key, StorageKeys};
    use crate::model::user::UserId;

    #[test]
    fn keys_embed_user_id() {
        let keys = StorageKeys::for_user(&UserId::new("u1"));
        assert_eq!(keys.sessions, "parnaso_u1_sessions");
        assert_eq!(keys.projects, "parnaso_u1_projects");
        assert_eq!(keys.settings, "parnaso_u1_settings");
        assert!(keys.all().iter().all(|key| is_app_key(key)));
        assert!(!is_app_key("theme"));
    }
}
