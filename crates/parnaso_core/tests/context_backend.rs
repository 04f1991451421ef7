use chrono::NaiveDate;
use parnaso_core::context::STORAGE_FILE_NAME;
use parnaso_core::{
    export_backup_json, import_backup_json, update_backend_config, AppContext, BackendConfig,
    ConfigSource, ContextError, FileStore, KeyValueStore, UserSession, WritingSession,
};
use std::path::Path;
use tempfile::tempdir;

fn open_context(data_dir: &Path, env_value: Option<&str>) -> AppContext {
    let kv = FileStore::open(data_dir.join(STORAGE_FILE_NAME)).unwrap();
    let config = BackendConfig::resolve_with_env(&kv, env_value.map(str::to_string)).unwrap();
    AppContext::with_config(data_dir.to_path_buf(), kv, config).unwrap()
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}

#[test]
fn unconfigured_directory_runs_locally_as_guest() {
    let dir = tempdir().unwrap();
    let ctx = open_context(dir.path(), None);

    assert!(!ctx.is_relational());
    assert_eq!(ctx.config().source(), ConfigSource::Unset);
    let session = ctx.current_session().unwrap();
    assert_eq!(session, UserSession::guest());

    let service = ctx.writing_service().unwrap();
    let listed = service
        .log_session(&session, &WritingSession::new(day(1), 321))
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert!(ctx.kv().get_item("parnaso_guest_sessions").unwrap().is_some());

    assert!(matches!(
        ctx.auth_service().err().unwrap(),
        ContextError::NotConfigured
    ));
    assert!(matches!(
        ctx.admin_service().err().unwrap(),
        ContextError::NotConfigured
    ));
}

#[test]
fn stored_relative_path_opens_database_inside_data_dir() {
    let dir = tempdir().unwrap();
    {
        let kv = FileStore::open(dir.path().join(STORAGE_FILE_NAME)).unwrap();
        assert!(update_backend_config(&kv, "db/parnaso.sqlite3").unwrap());
    }

    let ctx = open_context(dir.path(), None);
    assert!(ctx.is_relational());
    assert_eq!(ctx.config().source(), ConfigSource::Stored);
    assert!(dir.path().join("db/parnaso.sqlite3").exists());

    assert!(matches!(
        ctx.current_session().unwrap_err(),
        ContextError::NotSignedIn
    ));
}

#[test]
fn relational_context_restores_signed_in_writer_across_runs() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("shared.sqlite3");
    let db_text = db_path.to_string_lossy().to_string();

    {
        let ctx = open_context(dir.path(), Some(&db_text));
        assert_eq!(ctx.config().source(), ConfigSource::Environment);
        let auth = ctx.auth_service().unwrap();
        auth.register("Cora", "cora@parnaso.app", "segredo1").unwrap();
        auth.login_and_remember(ctx.kv(), "cora@parnaso.app", "segredo1")
            .unwrap();

        let session = ctx.current_session().unwrap();
        ctx.writing_service()
            .unwrap()
            .log_session(&session, &WritingSession::new(day(2), 900))
            .unwrap();
    }

    let ctx = open_context(dir.path(), Some(&db_text));
    let session = ctx.current_session().unwrap();
    assert_eq!(session.user().email, "cora@parnaso.app");
    assert!(session.is_admin());
    let sessions = ctx.writing_service().unwrap().sessions(&session).unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].word_count, 900);

    // local data stays untouched by the relational backend
    assert!(ctx.kv().get_item("parnaso_guest_sessions").unwrap().is_none());
}

#[test]
fn backup_moves_local_data_between_directories() {
    let source_dir = tempdir().unwrap();
    let target_dir = tempdir().unwrap();

    let json = {
        let ctx = open_context(source_dir.path(), None);
        let session = ctx.current_session().unwrap();
        ctx.writing_service()
            .unwrap()
            .log_session(&session, &WritingSession::new(day(3), 1500))
            .unwrap();
        ctx.kv().set_item("unrelated_key", "x").unwrap();
        export_backup_json(ctx.kv()).unwrap()
    };
    assert!(!json.contains("unrelated_key"));

    let ctx = open_context(target_dir.path(), None);
    let report = import_backup_json(ctx.kv(), &json).unwrap();
    assert_eq!(report.imported, 1);
    drop(ctx);

    let ctx = open_context(target_dir.path(), None);
    let session = ctx.current_session().unwrap();
    let progress = ctx
        .writing_service()
        .unwrap()
        .progress(&session, day(3))
        .unwrap();
    assert_eq!(progress.words_today, 1500);
}
