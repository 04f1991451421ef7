//! Writer-facing use-cases: sessions, projects, goals and the dashboard.
//!
//! # Invariants
//! - Every call is scoped to the `UserSession` it receives.
//! - A session may only reference a project owned by the same writer.
//! - Storage-agnostic: works over any `WritingStore`.

use crate::model::project::Project;
use crate::model::session::WritingSession;
use crate::model::settings::UserSettings;
use crate::repo::{RepoError, RepoResult, WritingStore};
use crate::service::progress::{summarize, ProgressSummary};
use crate::service::UserSession;
use chrono::NaiveDate;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum WritingServiceError {
    /// Session references a project the writer does not own.
    UnknownProject(String),
    Repo(RepoError),
}

impl Display for WritingServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownProject(id) => write!(f, "unknown project: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for WritingServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::UnknownProject(_) => None,
        }
    }
}

impl From<RepoError> for WritingServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub struct WritingService<W: WritingStore> {
    store: W,
}

impl<W: WritingStore> WritingService<W> {
    pub fn new(store: W) -> Self {
        Self { store }
    }

    /// Sessions newest first.
    pub fn sessions(&self, session: &UserSession) -> RepoResult<Vec<WritingSession>> {
        self.store.list_sessions(session.user_id())
    }

    /// Saves a logged session and returns the fresh list.
    pub fn log_session(
        &self,
        session: &UserSession,
        record: &WritingSession,
    ) -> Result<Vec<WritingSession>, WritingServiceError> {
        if let Some(project_id) = record.project_id.as_deref() {
            let owned = self
                .store
                .list_projects(session.user_id())?
                .iter()
                .any(|project| project.id == project_id);
            if !owned {
                return Err(WritingServiceError::UnknownProject(project_id.to_string()));
            }
        }

        self.store.save_session(session.user_id(), record)?;
        info!(
            "event=session_log module=service status=ok user_id={} session_id={} words={}",
            session.user_id(),
            record.id,
            record.word_count
        );
        Ok(self.store.list_sessions(session.user_id())?)
    }

    pub fn delete_session(&self, session: &UserSession, session_id: &str) -> RepoResult<()> {
        self.store.delete_session(session.user_id(), session_id)
    }

    pub fn projects(&self, session: &UserSession) -> RepoResult<Vec<Project>> {
        self.store.list_projects(session.user_id())
    }

    /// Creates or replaces a project and returns the fresh list.
    pub fn save_project(
        &self,
        session: &UserSession,
        project: &Project,
    ) -> RepoResult<Vec<Project>> {
        self.store.save_project(session.user_id(), project)?;
        self.store.list_projects(session.user_id())
    }

    pub fn settings(&self, session: &UserSession) -> RepoResult<UserSettings> {
        self.store.get_settings(session.user_id())
    }

    pub fn update_settings(
        &self,
        session: &UserSession,
        settings: &UserSettings,
    ) -> RepoResult<UserSettings> {
        self.store.save_settings(session.user_id(), settings)?;
        Ok(*settings)
    }

    /// Wipes sessions and projects and restores initial goals.
    pub fn reset(&self, session: &UserSession) -> RepoResult<()> {
        self.store.clear_user_data(session.user_id())?;
        info!(
            "event=user_reset module=service status=ok user_id={}",
            session.user_id()
        );
        Ok(())
    }

    /// Computes dashboard numbers as of `today`.
    pub fn progress(&self, session: &UserSession, today: NaiveDate) -> RepoResult<ProgressSummary> {
        let sessions = self.store.list_sessions(session.user_id())?;
        let projects = self.store.list_projects(session.user_id())?;
        let settings = self.store.get_settings(session.user_id())?;
        Ok(summarize(&sessions, &projects, &settings, today))
    }
}
