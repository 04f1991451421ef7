use chrono::NaiveDate;
use parnaso_core::db::open_db_in_memory;
use parnaso_core::{
    AdminError, AdminService, AuthService, GlobalStats, Project, ProfileRepository,
    SqliteProfileRepository, SqliteWritingStore, User, UserRole, UserSession, UserSettings,
    WritingSession, WritingStore,
};
use rusqlite::Connection;

struct Fixture {
    admin: UserSession,
    writer: User,
    other: User,
}

fn seed(conn: &Connection) -> Fixture {
    let auth = AuthService::new(SqliteProfileRepository::try_new(conn).unwrap());
    auth.register("Admin", "admin@parnaso.app", "segredo1")
        .unwrap();
    let writer = auth
        .register("Rachel Queiroz", "rachel@parnaso.app", "segredo1")
        .unwrap();
    let other = auth
        .register("Jorge", "jorge@parnaso.app", "segredo1")
        .unwrap();
    Fixture {
        admin: auth.login("admin@parnaso.app", "segredo1").unwrap(),
        writer,
        other,
    }
}

fn log_words(store: &SqliteWritingStore<'_>, user: &User, day: u32, words: u32) {
    let date = NaiveDate::from_ymd_opt(2024, 5, day).unwrap();
    store
        .save_session(&user.id, &WritingSession::new(date, words))
        .unwrap();
}

#[test]
fn non_admin_is_forbidden_everywhere() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let admin = AdminService::new(
        SqliteProfileRepository::try_new(&conn).unwrap(),
        SqliteWritingStore::try_new(&conn).unwrap(),
    );
    let actor = UserSession::new(fixture.writer.clone());

    assert!(matches!(
        admin.list_users(&actor, "").unwrap_err(),
        AdminError::Forbidden
    ));
    assert!(matches!(
        admin.toggle_block(&actor, &fixture.other.id).unwrap_err(),
        AdminError::Forbidden
    ));
    assert!(matches!(
        admin.delete_user(&actor, &fixture.other.id).unwrap_err(),
        AdminError::Forbidden
    ));
    assert!(matches!(
        admin.global_stats(&actor).unwrap_err(),
        AdminError::Forbidden
    ));
    assert!(matches!(
        admin.global_stats(&UserSession::guest()).unwrap_err(),
        AdminError::Forbidden
    ));
}

#[test]
fn search_matches_name_or_email_case_insensitively() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let admin = AdminService::new(
        SqliteProfileRepository::try_new(&conn).unwrap(),
        SqliteWritingStore::try_new(&conn).unwrap(),
    );

    assert_eq!(admin.list_users(&fixture.admin, "").unwrap().len(), 3);

    let by_name = admin.list_users(&fixture.admin, "queiroz").unwrap();
    assert_eq!(by_name, vec![fixture.writer.clone()]);

    let by_email = admin.list_users(&fixture.admin, "JORGE@").unwrap();
    assert_eq!(by_email, vec![fixture.other.clone()]);

    assert!(admin.list_users(&fixture.admin, "nobody").unwrap().is_empty());
}

#[test]
fn toggle_block_flips_the_flag_and_counts_pending_users() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let profiles = SqliteProfileRepository::try_new(&conn).unwrap();
    let admin = AdminService::new(&profiles, SqliteWritingStore::try_new(&conn).unwrap());

    let blocked = admin
        .toggle_block(&fixture.admin, &fixture.writer.id)
        .unwrap();
    assert!(blocked.is_blocked);
    assert!(profiles.get_profile(&fixture.writer.id).unwrap().unwrap().is_blocked);
    assert_eq!(admin.global_stats(&fixture.admin).unwrap().pending_users, 1);

    let approved = admin
        .toggle_block(&fixture.admin, &fixture.writer.id)
        .unwrap();
    assert!(!approved.is_blocked);
    assert_eq!(admin.global_stats(&fixture.admin).unwrap().pending_users, 0);
}

#[test]
fn admin_accounts_are_protected_from_moderation() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let admin = AdminService::new(
        SqliteProfileRepository::try_new(&conn).unwrap(),
        SqliteWritingStore::try_new(&conn).unwrap(),
    );
    let admin_id = fixture.admin.user_id().clone();

    assert!(matches!(
        admin.toggle_block(&fixture.admin, &admin_id).unwrap_err(),
        AdminError::ProtectedAccount(id) if id == admin_id
    ));
    assert!(matches!(
        admin.delete_user(&fixture.admin, &admin_id).unwrap_err(),
        AdminError::ProtectedAccount(_)
    ));
}

#[test]
fn promote_grants_admin_and_unblocks() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let profiles = SqliteProfileRepository::try_new(&conn).unwrap();
    let admin = AdminService::new(&profiles, SqliteWritingStore::try_new(&conn).unwrap());

    admin
        .toggle_block(&fixture.admin, &fixture.other.id)
        .unwrap();
    let promoted = admin.promote(&fixture.admin, &fixture.other.id).unwrap();
    assert_eq!(promoted.role, UserRole::Admin);
    assert!(!promoted.is_blocked);

    let stored = profiles.get_profile(&fixture.other.id).unwrap().unwrap();
    assert_eq!(stored, promoted);
}

#[test]
fn unknown_target_is_reported() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let admin = AdminService::new(
        SqliteProfileRepository::try_new(&conn).unwrap(),
        SqliteWritingStore::try_new(&conn).unwrap(),
    );
    let ghost = parnaso_core::UserId::new("ghost");

    assert!(matches!(
        admin.inspect_user(&fixture.admin, &ghost).unwrap_err(),
        AdminError::UserNotFound(_)
    ));
    assert!(matches!(
        admin.delete_user(&fixture.admin, &ghost).unwrap_err(),
        AdminError::UserNotFound(_)
    ));
}

#[test]
fn inspect_returns_everything_stored_for_a_writer() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let store = SqliteWritingStore::try_new(&conn).unwrap();
    let project = Project::new("Memórias", 30_000);
    store.save_project(&fixture.writer.id, &project).unwrap();
    log_words(&store, &fixture.writer, 2, 400);
    log_words(&store, &fixture.writer, 3, 600);

    let admin = AdminService::new(SqliteProfileRepository::try_new(&conn).unwrap(), &store);
    let data = admin
        .inspect_user(&fixture.admin, &fixture.writer.id)
        .unwrap();

    assert_eq!(data.user, fixture.writer);
    assert_eq!(data.projects, vec![project]);
    assert_eq!(
        data.sessions.iter().map(|s| s.word_count).collect::<Vec<_>>(),
        vec![600, 400]
    );
    assert_eq!(data.settings, UserSettings::initial());
}

#[test]
fn delete_user_removes_profile_and_all_owned_rows() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let store = SqliteWritingStore::try_new(&conn).unwrap();
    store
        .save_project(&fixture.writer.id, &Project::new("Apagar", 100))
        .unwrap();
    store
        .save_settings(
            &fixture.writer.id,
            &UserSettings {
                daily_word_goal: 10,
                weekly_word_goal: 70,
            },
        )
        .unwrap();
    log_words(&store, &fixture.writer, 1, 50);
    log_words(&store, &fixture.other, 1, 75);

    let admin = AdminService::new(SqliteProfileRepository::try_new(&conn).unwrap(), &store);
    admin
        .delete_user(&fixture.admin, &fixture.writer.id)
        .unwrap();

    for table in [
        "profiles",
        "credentials",
        "projects",
        "writing_sessions",
        "user_settings",
    ] {
        let column = if table == "profiles" { "id" } else { "user_id" };
        let remaining: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) FROM {table} WHERE {column} = ?1;"),
                [fixture.writer.id.as_str()],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(remaining, 0, "rows left in {table}");
    }
    assert_eq!(store.list_sessions(&fixture.other.id).unwrap().len(), 1);
}

#[test]
fn global_stats_sum_words_and_sessions_across_users() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let store = SqliteWritingStore::try_new(&conn).unwrap();
    log_words(&store, &fixture.writer, 1, 1200);
    log_words(&store, &fixture.writer, 2, 300);
    log_words(&store, &fixture.other, 2, 500);

    let admin = AdminService::new(SqliteProfileRepository::try_new(&conn).unwrap(), &store);
    admin
        .toggle_block(&fixture.admin, &fixture.other.id)
        .unwrap();

    assert_eq!(
        admin.global_stats(&fixture.admin).unwrap(),
        GlobalStats {
            total_users: 3,
            total_words: 2000,
            total_sessions: 3,
            pending_users: 1,
            skipped_users: 0,
        }
    );
}

#[test]
fn unreadable_user_is_skipped_in_global_stats() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let store = SqliteWritingStore::try_new(&conn).unwrap();
    log_words(&store, &fixture.writer, 1, 100);
    log_words(&store, &fixture.other, 1, 900);
    conn.execute(
        "UPDATE writing_sessions SET data = 'not json' WHERE user_id = ?1;",
        [fixture.other.id.as_str()],
    )
    .unwrap();

    let admin = AdminService::new(SqliteProfileRepository::try_new(&conn).unwrap(), &store);
    let stats = admin.global_stats(&fixture.admin).unwrap();
    assert_eq!(stats.total_users, 3);
    assert_eq!(stats.total_words, 100);
    assert_eq!(stats.skipped_users, 1);
}
