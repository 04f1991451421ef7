//! Ordered schema steps for the relational backend.
//!
//! # Invariants
//! - Step versions start at 1 and increase by exactly 1.
//! - Each step commits together with its `PRAGMA user_version` bump, so a
//!   crash never leaves a half-applied step recorded as done.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::{Connection, TransactionBehavior};

struct Step {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const STEPS: &[Step] = &[
    Step {
        version: 1,
        name: "init",
        sql: include_str!("0001_init.sql"),
    },
    Step {
        version: 2,
        name: "session_indexes",
        sql: include_str!("0002_session_indexes.sql"),
    },
];

/// Schema version this build writes.
pub fn latest_version() -> u32 {
    STEPS.len() as u32
}

/// Brings `conn` up to `latest_version()`.
///
/// A database already stamped with a higher version is left untouched and
/// reported as `DbError::SchemaTooNew`.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let found = schema_version(conn)?;
    let supported = latest_version();
    if found > supported {
        return Err(DbError::SchemaTooNew { found, supported });
    }

    for step in STEPS.iter().filter(|step| step.version > found) {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", step.version)?;
        tx.commit()?;
        info!(
            "event=db_migrate module=db status=ok version={} name={}",
            step.version, step.name
        );
    }
    Ok(())
}

/// Version stamped in the database header (0 for a fresh file).
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

#[cfg(test)]
mod tests {
    use super::{latest_version, STEPS};

    #[test]
    fn step_versions_are_contiguous() {
        for (index, step) in STEPS.iter().enumerate() {
            assert_eq!(step.version as usize, index + 1, "step {}", step.name);
        }
        assert_eq!(latest_version(), STEPS.len() as u32);
    }
}
