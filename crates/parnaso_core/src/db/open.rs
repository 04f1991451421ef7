//! Connection setup.
//!
//! # Invariants
//! - Every returned connection enforces foreign keys (profile deletes
//!   cascade to owned rows).
//! - Every returned connection is at `migrations::latest_version()`.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (creating when missing) the database at `path`.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| {
            error!(
                "event=db_open module=db status=error target=file reason=create_dir path={}",
                parent.display()
            );
            DbError::CreateDir {
                path: parent.to_path_buf(),
                source,
            }
        })?;
    }
    prepare("file", Connection::open(path)?)
}

/// Opens a private in-memory database, used by tests and dry runs.
pub fn open_db_in_memory() -> DbResult<Connection> {
    prepare("memory", Connection::open_in_memory()?)
}

fn prepare(target: &'static str, mut conn: Connection) -> DbResult<Connection> {
    let started_at = Instant::now();
    let outcome = configure(&mut conn);
    let elapsed_ms = started_at.elapsed().as_millis();
    match outcome {
        Ok(()) => {
            info!("event=db_open module=db status=ok target={target} duration_ms={elapsed_ms}");
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error target={target} duration_ms={elapsed_ms} error={err}"
            );
            Err(err)
        }
    }
}

fn configure(conn: &mut Connection) -> DbResult<()> {
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    apply_migrations(conn)
}
