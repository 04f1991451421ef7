use parnaso_core::db::migrations::{latest_version, schema_version};
use parnaso_core::db::{open_db, open_db_in_memory, DbError};
use parnaso_core::{RepoError, SqliteProfileRepository, SqliteWritingStore};
use rusqlite::Connection;

const TABLES: [&str; 5] = [
    "profiles",
    "credentials",
    "projects",
    "writing_sessions",
    "user_settings",
];

fn sqlite_objects(conn: &Connection, kind: &str) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = ?1 ORDER BY name;")
        .unwrap();
    let names = stmt
        .query_map([kind], |row| row.get::<_, String>(0))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    names
}

#[test]
fn fresh_database_gets_every_table_and_index() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn).unwrap(), latest_version());
    let tables = sqlite_objects(&conn, "table");
    for table in TABLES {
        assert!(tables.iter().any(|name| name == table), "missing {table}");
    }
    let indexes = sqlite_objects(&conn, "index");
    assert!(indexes.contains(&"idx_writing_sessions_user_date".to_string()));
    assert!(indexes.contains(&"idx_writing_sessions_project".to_string()));
}

#[test]
fn foreign_keys_are_enforced() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .pragma_query_value(None, "foreign_keys", |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);

    let orphan = conn.execute(
        "INSERT INTO user_settings (user_id, daily_word_goal, weekly_word_goal)
         VALUES ('nobody', 1, 1);",
        [],
    );
    assert!(orphan.is_err());
}

#[test]
fn reopening_a_file_keeps_data_and_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("parnaso.sqlite3");

    let conn = open_db(&path).unwrap();
    conn.execute(
        "INSERT INTO profiles (id, name, email) VALUES ('u1', 'Ana', 'ana@parnaso.app');",
        [],
    )
    .unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn).unwrap(), latest_version());
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM profiles;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn partially_migrated_file_is_upgraded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("v1.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(include_str!("../src/db/migrations/0001_init.sql"))
        .unwrap();
    conn.pragma_update(None, "user_version", 1_u32).unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn).unwrap(), latest_version());
    assert!(sqlite_objects(&conn, "index").contains(&"idx_writing_sessions_project".to_string()));
}

#[test]
fn newer_schema_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");
    let conn = Connection::open(&path).unwrap();
    conn.pragma_update(None, "user_version", 42_u32).unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::SchemaTooNew { found, supported } => {
            assert_eq!(found, 42);
            assert_eq!(supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn database_path_under_a_file_cannot_be_created() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "x").unwrap();

    let err = open_db(blocker.join("parnaso.sqlite3")).unwrap_err();
    assert!(matches!(err, DbError::CreateDir { .. }));
}

#[test]
fn repositories_need_a_migrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    for err in [
        SqliteWritingStore::try_new(&conn).err().unwrap(),
        SqliteProfileRepository::try_new(&conn).err().unwrap(),
    ] {
        assert!(matches!(
            err,
            RepoError::UninitializedConnection {
                actual_version: 0,
                ..
            }
        ));
    }
}
