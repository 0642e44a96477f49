//! Versioned schema migrations.
//!
//! The applied version lives in SQLite's `user_version` pragma. Opening a
//! [`Database`](crate::Database) brings the schema up to date, and `/init-db`
//! re-runs the same check, which is a no-op once everything is applied.

pub mod v001_initial;

use rusqlite::Connection;

use crate::error::{Result, StoreError};

type MigrationFn = fn(&Connection) -> std::result::Result<(), rusqlite::Error>;

/// Every migration in order; entry `i` moves the schema to version `i + 1`.
const MIGRATIONS: &[(&str, MigrationFn)] = &[("v001_initial", v001_initial::up)];

/// Schema version after all migrations have run.
pub const CURRENT_VERSION: u32 = MIGRATIONS.len() as u32;

/// Apply the migrations the database has not seen yet. Returns how many ran.
pub fn run_migrations(conn: &Connection) -> Result<usize> {
    let applied: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if applied > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema v{applied} is newer than this build (v{CURRENT_VERSION})"
        )));
    }

    let pending = &MIGRATIONS[applied as usize..];
    for (offset, (name, up)) in pending.iter().enumerate() {
        let version = applied + offset as u32 + 1;
        tracing::info!(migration = name, version, "applying schema migration");
        up(conn).map_err(|e| StoreError::Migration(format!("{name}: {e}")))?;
        conn.pragma_update(None, "user_version", version)?;
    }

    if pending.is_empty() {
        tracing::debug!(version = applied, "schema up to date");
    }
    Ok(pending.len())
}
