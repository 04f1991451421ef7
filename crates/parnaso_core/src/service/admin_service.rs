//! Moderation and platform overview.
//!
//! # Responsibility
//! - List and search accounts, approve/block and delete writers.
//! - Inspect one writer's data and aggregate platform totals.
//!
//! # Invariants
//! - Every call requires an admin `UserSession`.
//! - Admin accounts cannot be blocked or deleted through this service.

use crate::model::project::Project;
use crate::model::session::WritingSession;
use crate::model::settings::UserSettings;
use crate::model::user::{User, UserId, UserRole};
use crate::repo::profile_repo::ProfileRepository;
use crate::repo::{RepoError, WritingStore};
use crate::service::stats::{aggregate_sessions, GlobalStats};
use crate::service::UserSession;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum AdminError {
    /// Acting account is not an admin.
    Forbidden,
    /// Target is an admin account.
    ProtectedAccount(UserId),
    UserNotFound(UserId),
    Repo(RepoError),
}

impl Display for AdminError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forbidden => write!(f, "administrator role required"),
            Self::ProtectedAccount(id) => write!(f, "admin account cannot be moderated: {id}"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AdminError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for AdminError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Everything stored for one writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserData {
    pub user: User,
    pub sessions: Vec<WritingSession>,
    pub projects: Vec<Project>,
    pub settings: UserSettings,
}

pub struct AdminService<P: ProfileRepository, W: WritingStore> {
    profiles: P,
    store: W,
}

impl<P: ProfileRepository, W: WritingStore> AdminService<P, W> {
    pub fn new(profiles: P, store: W) -> Self {
        Self { profiles, store }
    }

    /// Accounts whose name or e-mail contains `search` (case-insensitive).
    pub fn list_users(&self, actor: &UserSession, search: &str) -> Result<Vec<User>, AdminError> {
        require_admin(actor)?;
        Ok(self
            .profiles
            .list_profiles()?
            .into_iter()
            .filter(|user| user.matches_search(search))
            .collect())
    }

    /// Flips the blocked flag of a non-admin account and returns it.
    pub fn toggle_block(&self, actor: &UserSession, target: &UserId) -> Result<User, AdminError> {
        require_admin(actor)?;
        let mut user = self.moderatable_user(target)?;
        user.is_blocked = !user.is_blocked;
        self.profiles.set_blocked(&user.id, user.is_blocked)?;
        info!(
            "event=admin_toggle_block module=admin status=ok actor_id={} user_id={} blocked={}",
            actor.user_id(),
            user.id,
            user.is_blocked
        );
        Ok(user)
    }

    /// Removes a non-admin account together with all of its data.
    pub fn delete_user(&self, actor: &UserSession, target: &UserId) -> Result<(), AdminError> {
        require_admin(actor)?;
        let user = self.moderatable_user(target)?;
        self.store.delete_user_data(&user.id)?;
        self.profiles.delete_profile(&user.id)?;
        info!(
            "event=admin_delete_user module=admin status=ok actor_id={} user_id={}",
            actor.user_id(),
            user.id
        );
        Ok(())
    }

    /// Grants the admin role.
    pub fn promote(&self, actor: &UserSession, target: &UserId) -> Result<User, AdminError> {
        require_admin(actor)?;
        let mut user = self.existing_user(target)?;
        self.profiles.set_role(&user.id, UserRole::Admin)?;
        if user.is_blocked {
            self.profiles.set_blocked(&user.id, false)?;
            user.is_blocked = false;
        }
        user.role = UserRole::Admin;
        info!(
            "event=admin_promote module=admin status=ok actor_id={} user_id={}",
            actor.user_id(),
            user.id
        );
        Ok(user)
    }

    pub fn inspect_user(&self, actor: &UserSession, target: &UserId) -> Result<UserData, AdminError> {
        require_admin(actor)?;
        let user = self.existing_user(target)?;
        Ok(UserData {
            sessions: self.store.list_sessions(&user.id)?,
            projects: self.store.list_projects(&user.id)?,
            settings: self.store.get_settings(&user.id)?,
            user,
        })
    }

    /// Platform totals over every registered account.
    pub fn global_stats(&self, actor: &UserSession) -> Result<GlobalStats, AdminError> {
        require_admin(actor)?;
        let users = self.profiles.list_profiles()?;
        let mut stats = aggregate_sessions(&self.store, users.iter().map(|user| &user.id));
        stats.pending_users = pending_count(&users);
        Ok(stats)
    }

    fn existing_user(&self, target: &UserId) -> Result<User, AdminError> {
        self.profiles
            .get_profile(target)?
            .ok_or_else(|| AdminError::UserNotFound(target.clone()))
    }

    fn moderatable_user(&self, target: &UserId) -> Result<User, AdminError> {
        let user = self.existing_user(target)?;
        if user.is_admin() {
            return Err(AdminError::ProtectedAccount(user.id));
        }
        Ok(user)
    }
}

/// Blocked non-admin accounts awaiting approval.
pub fn pending_count(users: &[User]) -> usize {
    users
        .iter()
        .filter(|user| user.is_blocked && !user.is_admin())
        .count()
}

fn require_admin(actor: &UserSession) -> Result<(), AdminError> {
    if actor.is_admin() {
        Ok(())
    } else {
        warn!(
            "event=admin_access module=admin status=rejected actor_id={}",
            actor.user_id()
        );
        Err(AdminError::Forbidden)
    }
}
