//! Connection pool management.
//!
//! The [`Database`] struct owns an r2d2 pool of SQLite connections. Every
//! pooled connection has foreign keys enabled (SQLite leaves them off per
//! connection by default), and migrations run once when the pool is opened.

use std::path::{Path, PathBuf};
use std::time::Duration;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;

use crate::error::Result;
use crate::migrations;

pub type SqlitePool = Pool<SqliteConnectionManager>;
pub type SqliteConnection = PooledConnection<SqliteConnectionManager>;

/// Pooled handle to the Coffer database.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    path: PathBuf,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .field("pool_size", &self.pool.max_size())
            .finish()
    }
}

impl Database {
    /// Open (or create) a database file and build a pool of `pool_size`
    /// connections over it.
    pub fn open_at(path: &Path, pool_size: u32) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        tracing::info!(path = %path.display(), pool_size, "opening database");

        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.pragma_update(None, "foreign_keys", "ON")?;
            conn.busy_timeout(Duration::from_secs(5))
        });

        let pool = Pool::builder().max_size(pool_size.max(1)).build(manager)?;

        let db = Self {
            pool,
            path: path.to_path_buf(),
        };

        {
            let conn = db.conn()?;
            let mode: String =
                conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
            tracing::debug!(journal_mode = %mode, "database journal mode");
        }
        db.run_migrations()?;

        Ok(db)
    }

    /// Check a connection out of the pool.
    pub fn conn(&self) -> Result<SqliteConnection> {
        Ok(self.pool.get()?)
    }

    /// Apply any outstanding schema migrations and return how many ran.
    /// Safe to call repeatedly.
    pub fn run_migrations(&self) -> Result<usize> {
        let conn = self.conn()?;
        migrations::run_migrations(&conn)
    }

    /// Filesystem path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
