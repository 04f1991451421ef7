//! `WritingStore` over a key-value store (offline/demo backend).
//!
//! # Responsibility
//! - Keep sessions, projects and settings of each writer under the
//!   `parnaso_<userId>_*` keys, one JSON document per key.
//!
//! # Invariants
//! - Reads never fail on content: a malformed document reads as
//!   empty/default and an undecodable record is left out, both logged.
//! - Writes never drop what they could not decode. Records that fail the
//!   typed decode are carried over unchanged; a document that is not a
//!   JSON array is refused with `InvalidData` instead of being replaced.
//! - Sessions list by `date` descending; among equal dates the most
//!   recently added comes first.

use crate::model::project::Project;
use crate::model::session::WritingSession;
use crate::model::settings::UserSettings;
use crate::model::user::UserId;
use crate::repo::{RepoError, RepoResult, WritingStore};
use crate::storage::keys::StorageKeys;
use crate::storage::KeyValueStore;
use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Local writing store keyed by `parnaso_<userId>_*`.
#[derive(Debug)]
pub struct LocalWritingStore<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> LocalWritingStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Underlying key-value store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str, fallback: T) -> RepoResult<T> {
        let Some(raw) = self.store.get_item(key)? else {
            return Ok(fallback);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(value),
            Err(err) => {
                warn!(
                    "event=kv_read module=storage status=degraded key={} error={}",
                    key, err
                );
                Ok(fallback)
            }
        }
    }

    /// Decodes every record of the array at `key`, leaving out the ones
    /// that do not fit `T`.
    fn read_records<T: DeserializeOwned>(&self, key: &str) -> RepoResult<Vec<T>> {
        let raw: Vec<Value> = self.read_json(key, Vec::new())?;
        let total = raw.len();
        let records: Vec<T> = raw
            .into_iter()
            .filter_map(|value| serde_json::from_value(value).ok())
            .collect();
        if records.len() < total {
            warn!(
                "event=kv_read module=storage status=degraded key={} skipped_records={}",
                key,
                total - records.len()
            );
        }
        Ok(records)
    }

    /// Raw array at `key` for a read-modify-write.
    fn load_array(&self, key: &str) -> RepoResult<Vec<Value>> {
        let Some(raw) = self.store.get_item(key)? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw).map_err(|err| {
            RepoError::InvalidData(format!("`{key}` is not a JSON array, not overwriting: {err}"))
        })
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> RepoResult<()> {
        let text = serde_json::to_string(value)
            .map_err(|err| RepoError::InvalidData(format!("cannot encode `{key}`: {err}")))?;
        self.store.set_item(key, &text)?;
        Ok(())
    }
}

fn record_id(value: &Value) -> Option<&str> {
    value.get("id").and_then(Value::as_str)
}

fn encode<T: Serialize>(record: &T) -> RepoResult<Value> {
    serde_json::to_value(record)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode record: {err}")))
}

/// Inserts or replaces the record with the same `id`; new records go to
/// `front` or the back of the array.
fn upsert(records: &mut Vec<Value>, id: &str, value: Value, front: bool) {
    match records.iter().position(|existing| record_id(existing) == Some(id)) {
        Some(index) => records[index] = value,
        None if front => records.insert(0, value),
        None => records.push(value),
    }
}

impl<S: KeyValueStore> WritingStore for LocalWritingStore<S> {
    fn list_sessions(&self, user_id: &UserId) -> RepoResult<Vec<WritingSession>> {
        let keys = StorageKeys::for_user(user_id);
        let mut sessions: Vec<WritingSession> = self.read_records(&keys.sessions)?;
        // Stable: equal dates keep stored order, which is newest first.
        sessions.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(sessions)
    }

    fn save_session(&self, user_id: &UserId, session: &WritingSession) -> RepoResult<()> {
        session.validate()?;
        let keys = StorageKeys::for_user(user_id);
        let mut sessions = self.load_array(&keys.sessions)?;
        upsert(&mut sessions, &session.id, encode(session)?, true);
        self.write_json(&keys.sessions, &sessions)
    }

    fn delete_session(&self, user_id: &UserId, session_id: &str) -> RepoResult<()> {
        let keys = StorageKeys::for_user(user_id);
        let mut sessions = self.load_array(&keys.sessions)?;
        let before = sessions.len();
        sessions.retain(|session| record_id(session) != Some(session_id));
        if sessions.len() == before {
            return Err(RepoError::NotFound(format!("session:{session_id}")));
        }
        self.write_json(&keys.sessions, &sessions)
    }

    fn list_projects(&self, user_id: &UserId) -> RepoResult<Vec<Project>> {
        let keys = StorageKeys::for_user(user_id);
        self.read_records(&keys.projects)
    }

    fn save_project(&self, user_id: &UserId, project: &Project) -> RepoResult<()> {
        project.validate()?;
        let keys = StorageKeys::for_user(user_id);
        let mut projects = self.load_array(&keys.projects)?;
        upsert(&mut projects, &project.id, encode(project)?, false);
        self.write_json(&keys.projects, &projects)
    }

    fn get_settings(&self, user_id: &UserId) -> RepoResult<UserSettings> {
        let keys = StorageKeys::for_user(user_id);
        self.read_json(&keys.settings, UserSettings::initial())
    }

    fn save_settings(&self, user_id: &UserId, settings: &UserSettings) -> RepoResult<()> {
        let keys = StorageKeys::for_user(user_id);
        self.write_json(&keys.settings, settings)
    }

    fn clear_user_data(&self, user_id: &UserId) -> RepoResult<()> {
        let keys = StorageKeys::for_user(user_id);
        self.write_json::<[WritingSession]>(&keys.sessions, &[])?;
        self.write_json::<[Project]>(&keys.projects, &[])?;
        self.write_json(&keys.settings, &UserSettings::initial())
    }

    fn delete_user_data(&self, user_id: &UserId) -> RepoResult<()> {
        for key in StorageKeys::for_user(user_id).all() {
            self.store.remove_item(key)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::LocalWritingStore;
    use crate::model::session::WritingSession;
    use crate::model::settings::UserSettings;
    use crate::model::user::UserId;
    use crate::repo::{RepoError, WritingStore};
    use crate::storage::{KeyValueStore, MemoryStore};
    use chrono::NaiveDate;

    #[test]
    fn malformed_documents_read_as_defaults_and_are_not_overwritten() {
        let store = LocalWritingStore::new(MemoryStore::new());
        let user = UserId::new("u1");
        store
            .store()
            .set_item("parnaso_u1_sessions", "{not json")
            .unwrap();
        store
            .store()
            .set_item("parnaso_u1_settings", "42")
            .unwrap();

        assert!(store.list_sessions(&user).unwrap().is_empty());
        assert_eq!(store.get_settings(&user).unwrap(), UserSettings::initial());

        let session = WritingSession::new(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(), 10);
        let err = store.save_session(&user, &session).unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(_)));
        assert_eq!(
            store.store().get_item("parnaso_u1_sessions").unwrap().as_deref(),
            Some("{not json")
        );

        store.clear_user_data(&user).unwrap();
        store.save_session(&user, &session).unwrap();
        assert_eq!(store.list_sessions(&user).unwrap(), vec![session]);
    }

    #[test]
    fn undecodable_records_survive_a_save() {
        let store = LocalWritingStore::new(MemoryStore::new());
        let user = UserId::new("guest");
        store
            .store()
            .set_item(
                "parnaso_guest_sessions",
                r#"[{"id":"1","date":"2024-03-01","wordCount":500},
                    {"id":"2","date":"2024-03-02T10:00:00.000Z","wordCount":700}]"#,
            )
            .unwrap();

        let listed = store.list_sessions(&user).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].word_count, 500);

        let session = WritingSession::new(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(), 250);
        store.save_session(&user, &session).unwrap();

        let raw = store
            .store()
            .get_item("parnaso_guest_sessions")
            .unwrap()
            .unwrap();
        assert!(raw.contains("\"wordCount\":500"));
        assert!(raw.contains("2024-03-02T10:00:00.000Z"));
        let words: Vec<u32> = store
            .list_sessions(&user)
            .unwrap()
            .iter()
            .map(|session| session.word_count)
            .collect();
        assert_eq!(words, vec![250, 500]);

        store.delete_session(&user, "2").unwrap();
        let raw = store
            .store()
            .get_item("parnaso_guest_sessions")
            .unwrap()
            .unwrap();
        assert!(!raw.contains("2024-03-02T10:00:00.000Z"));
        assert!(raw.contains("\"wordCount\":500"));
    }
}
