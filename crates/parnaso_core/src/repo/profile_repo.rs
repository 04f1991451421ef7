//! Profile and credential persistence.
//!
//! # Responsibility
//! - Store writer profiles (`profiles`) and password hashes (`credentials`).
//! - Provide moderation mutations (block flag, role, delete).
//!
//! # Invariants
//! - E-mail uniqueness is case-insensitive.
//! - Deleting a profile cascades to credentials and every owned row.

use crate::model::user::{User, UserId, UserRole};
use crate::repo::writing_repo::ensure_schema_ready;
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

const PROFILE_SELECT_SQL: &str = "SELECT
    id,
    name,
    email,
    role,
    is_blocked
FROM profiles";

/// Data access for writer accounts.
pub trait ProfileRepository {
    /// Inserts a profile and its password hash atomically.
    fn create_profile(&self, user: &User, password_hash: &str) -> RepoResult<()>;
    fn get_profile(&self, user_id: &UserId) -> RepoResult<Option<User>>;
    fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    fn password_hash(&self, user_id: &UserId) -> RepoResult<Option<String>>;
    /// All profiles ordered by creation time.
    fn list_profiles(&self) -> RepoResult<Vec<User>>;
    fn set_blocked(&self, user_id: &UserId, blocked: bool) -> RepoResult<()>;
    fn set_role(&self, user_id: &UserId, role: UserRole) -> RepoResult<()>;
    fn delete_profile(&self, user_id: &UserId) -> RepoResult<()>;
}

impl<T: ProfileRepository + ?Sized> ProfileRepository for &T {
    fn create_profile(&self, user: &User, password_hash: &str) -> RepoResult<()> {
        (**self).create_profile(user, password_hash)
    }

    fn get_profile(&self, user_id: &UserId) -> RepoResult<Option<User>> {
        (**self).get_profile(user_id)
    }

    fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        (**self).find_by_email(email)
    }

    fn password_hash(&self, user_id: &UserId) -> RepoResult<Option<String>> {
        (**self).password_hash(user_id)
    }

    fn list_profiles(&self) -> RepoResult<Vec<User>> {
        (**self).list_profiles()
    }

    fn set_blocked(&self, user_id: &UserId, blocked: bool) -> RepoResult<()> {
        (**self).set_blocked(user_id, blocked)
    }

    fn set_role(&self, user_id: &UserId, role: UserRole) -> RepoResult<()> {
        (**self).set_role(user_id, role)
    }

    fn delete_profile(&self, user_id: &UserId) -> RepoResult<()> {
        (**self).delete_profile(user_id)
    }
}

pub struct SqliteProfileRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProfileRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ProfileRepository for SqliteProfileRepository<'_> {
    fn create_profile(&self, user: &User, password_hash: &str) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO profiles (id, name, email, role, is_blocked)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                user.id.as_str(),
                user.name.as_str(),
                user.email.as_str(),
                user.role.as_str(),
                user.is_blocked,
            ],
        )
        .map_err(|err| email_conflict(err, &user.email))?;
        tx.execute(
            "INSERT INTO credentials (user_id, password_hash) VALUES (?1, ?2);",
            params![user.id.as_str(), password_hash],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn get_profile(&self, user_id: &UserId) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROFILE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([user_id.as_str()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_profile_row(row)?)),
            None => Ok(None),
        }
    }

    fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROFILE_SELECT_SQL} WHERE email = ?1 COLLATE NOCASE;"
        ))?;
        let mut rows = stmt.query([email.trim()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_profile_row(row)?)),
            None => Ok(None),
        }
    }

    fn password_hash(&self, user_id: &UserId) -> RepoResult<Option<String>> {
        let hash = self
            .conn
            .query_row(
                "SELECT password_hash FROM credentials WHERE user_id = ?1;",
                [user_id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(hash)
    }

    fn list_profiles(&self) -> RepoResult<Vec<User>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROFILE_SELECT_SQL} ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_profile_row(row)?);
        }
        Ok(users)
    }

    fn set_blocked(&self, user_id: &UserId, blocked: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE profiles SET is_blocked = ?2 WHERE id = ?1;",
            params![user_id.as_str(), blocked],
        )?;
        ensure_changed(changed, user_id)
    }

    fn set_role(&self, user_id: &UserId, role: UserRole) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE profiles SET role = ?2 WHERE id = ?1;",
            params![user_id.as_str(), role.as_str()],
        )?;
        ensure_changed(changed, user_id)
    }

    fn delete_profile(&self, user_id: &UserId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM profiles WHERE id = ?1;", [user_id.as_str()])?;
        ensure_changed(changed, user_id)
    }
}

fn ensure_changed(changed: usize, user_id: &UserId) -> RepoResult<()> {
    if changed == 0 {
        return Err(RepoError::NotFound(format!("profile:{user_id}")));
    }
    Ok(())
}

/// Maps a unique violation on `profiles.email` to `Conflict`.
fn email_conflict(err: rusqlite::Error, email: &str) -> RepoError {
    if let rusqlite::Error::SqliteFailure(failure, Some(message)) = &err {
        if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
            && message.contains("profiles.email")
        {
            return RepoError::Conflict(format!("email:{email}"));
        }
    }
    err.into()
}

fn parse_profile_row(row: &Row<'_>) -> RepoResult<User> {
    let role_text: String = row.get("role")?;
    let role = UserRole::parse(&role_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid role `{role_text}` in profiles.role"))
    })?;

    let is_blocked = match row.get::<_, i64>("is_blocked")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_blocked value `{other}` in profiles.is_blocked"
            )));
        }
    };

    Ok(User {
        id: UserId::new(row.get::<_, String>("id")?),
        name: row.get("name")?,
        email: row.get("email")?,
        role,
        is_blocked,
    })
}
