//! Relational `WritingStore` over the `writing_sessions`, `projects` and
//! `user_settings` tables.
//!
//! # Responsibility
//! - Map application records one-to-one onto table rows.
//! - Split a session into typed columns (`id`, `project_id`, `date`,
//!   `word_count`) plus the `data` JSON column holding `SessionDetails`.
//!
//! # Invariants
//! - Every query is scoped by `user_id`.
//! - Session listing is deterministic: `date DESC, created_at DESC, rowid DESC`.
//! - Bulk resets run in one immediate transaction.

use crate::db::migrations::{latest_version, schema_version};
use crate::model::project::{Project, ProjectStatus};
use crate::model::session::{SessionDetails, WritingSession};
use crate::model::settings::UserSettings;
use crate::model::user::UserId;
use crate::repo::{RepoError, RepoResult, WritingStore};
use chrono::NaiveDate;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

const DATE_FORMAT: &str = "%Y-%m-%d";

const SESSION_SELECT_SQL: &str = "SELECT
    id,
    project_id,
    date,
    word_count,
    data
FROM writing_sessions";

const PROJECT_SELECT_SQL: &str = "SELECT
    id,
    name,
    description,
    target_word_count,
    color,
    status,
    created_at
FROM projects";

/// SQLite-backed writing store.
pub struct SqliteWritingStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteWritingStore<'conn> {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl WritingStore for SqliteWritingStore<'_> {
    fn list_sessions(&self, user_id: &UserId) -> RepoResult<Vec<WritingSession>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SESSION_SELECT_SQL}
             WHERE user_id = ?1
             ORDER BY date DESC, created_at DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query([user_id.as_str()])?;
        let mut sessions = Vec::new();
        while let Some(row) = rows.next()? {
            sessions.push(parse_session_row(row)?);
        }
        Ok(sessions)
    }

    fn save_session(&self, user_id: &UserId, session: &WritingSession) -> RepoResult<()> {
        session.validate()?;
        let data = serde_json::to_string(&session.details).map_err(|err| {
            RepoError::InvalidData(format!("session details not serializable: {err}"))
        })?;

        self.conn.execute(
            "INSERT INTO writing_sessions (
                user_id,
                id,
                project_id,
                date,
                word_count,
                data
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (user_id, id) DO UPDATE SET
                project_id = excluded.project_id,
                date = excluded.date,
                word_count = excluded.word_count,
                data = excluded.data,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                user_id.as_str(),
                session.id.as_str(),
                session.project_id.as_deref(),
                session.date.format(DATE_FORMAT).to_string(),
                session.word_count,
                data,
            ],
        )?;
        debug!(
            "event=session_save module=repo status=ok backend=sqlite user_id={} session_id={}",
            user_id, session.id
        );
        Ok(())
    }

    fn delete_session(&self, user_id: &UserId, session_id: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM writing_sessions WHERE user_id = ?1 AND id = ?2;",
            params![user_id.as_str(), session_id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(format!("session:{session_id}")));
        }
        Ok(())
    }

    fn list_projects(&self, user_id: &UserId) -> RepoResult<Vec<Project>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROJECT_SELECT_SQL}
             WHERE user_id = ?1
             ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([user_id.as_str()])?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            projects.push(parse_project_row(row)?);
        }
        Ok(projects)
    }

    fn save_project(&self, user_id: &UserId, project: &Project) -> RepoResult<()> {
        project.validate()?;
        self.conn.execute(
            "INSERT INTO projects (
                user_id,
                id,
                name,
                description,
                target_word_count,
                color,
                status,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT (user_id, id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                target_word_count = excluded.target_word_count,
                color = excluded.color,
                status = excluded.status;",
            params![
                user_id.as_str(),
                project.id.as_str(),
                project.name.as_str(),
                project.description.as_str(),
                project.target_word_count,
                project.color.as_str(),
                project.status.as_str(),
                project.created_at.as_str(),
            ],
        )?;
        Ok(())
    }

    fn get_settings(&self, user_id: &UserId) -> RepoResult<UserSettings> {
        let stored = self
            .conn
            .query_row(
                "SELECT daily_word_goal, weekly_word_goal
                 FROM user_settings
                 WHERE user_id = ?1;",
                [user_id.as_str()],
                |row| {
                    Ok(UserSettings {
                        daily_word_goal: row.get(0)?,
                        weekly_word_goal: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(stored.unwrap_or_default())
    }

    fn save_settings(&self, user_id: &UserId, settings: &UserSettings) -> RepoResult<()> {
        upsert_settings(self.conn, user_id, settings)
    }

    fn clear_user_data(&self, user_id: &UserId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        delete_owned_rows(&tx, user_id, &["writing_sessions", "projects"])?;
        upsert_settings(&tx, user_id, &UserSettings::initial())?;
        tx.commit()?;
        Ok(())
    }

    fn delete_user_data(&self, user_id: &UserId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        delete_owned_rows(&tx, user_id, &["writing_sessions", "projects", "user_settings"])?;
        tx.commit()?;
        Ok(())
    }
}

fn upsert_settings(conn: &Connection, user_id: &UserId, settings: &UserSettings) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO user_settings (user_id, daily_word_goal, weekly_word_goal)
         VALUES (?1, ?2, ?3)
         ON CONFLICT (user_id) DO UPDATE SET
            daily_word_goal = excluded.daily_word_goal,
            weekly_word_goal = excluded.weekly_word_goal,
            updated_at = (strftime('%s', 'now') * 1000);",
        params![
            user_id.as_str(),
            settings.daily_word_goal,
            settings.weekly_word_goal
        ],
    )?;
    Ok(())
}

fn delete_owned_rows(conn: &Connection, user_id: &UserId, tables: &[&str]) -> RepoResult<()> {
    for table in tables {
        conn.execute(
            &format!("DELETE FROM {table} WHERE user_id = ?1;"),
            [user_id.as_str()],
        )?;
    }
    Ok(())
}

fn parse_session_row(row: &Row<'_>) -> RepoResult<WritingSession> {
    let id: String = row.get("id")?;

    let date_text: String = row.get("date")?;
    let date = NaiveDate::parse_from_str(&date_text, DATE_FORMAT).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid date `{date_text}` in writing_sessions.date for `{id}`"
        ))
    })?;

    let word_count = row.get::<_, i64>("word_count")?;
    let word_count = u32::try_from(word_count).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid word_count `{word_count}` in writing_sessions.word_count for `{id}`"
        ))
    })?;

    let data: String = row.get("data")?;
    let details: SessionDetails = serde_json::from_str(&data).map_err(|err| {
        RepoError::InvalidData(format!(
            "invalid JSON in writing_sessions.data for `{id}`: {err}"
        ))
    })?;

    Ok(WritingSession {
        id,
        project_id: row.get("project_id")?,
        date,
        word_count,
        details,
    })
}

fn parse_project_row(row: &Row<'_>) -> RepoResult<Project> {
    let status_text: String = row.get("status")?;
    let status = ProjectStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid project status `{status_text}` in projects.status"))
    })?;

    Ok(Project {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        target_word_count: row.get("target_word_count")?,
        color: row.get("color")?,
        status,
        created_at: row.get("created_at")?,
    })
}

pub(crate) fn ensure_schema_ready(conn: &Connection) -> RepoResult<()> {
    let actual_version = schema_version(conn)?;
    let expected_version = latest_version();
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}
