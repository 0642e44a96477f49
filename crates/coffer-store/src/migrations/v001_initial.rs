//! v001 -- Initial schema creation: `users` and `files`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    name            TEXT NOT NULL UNIQUE,
    password_hash   TEXT NOT NULL,             -- bcrypt
    session_token   TEXT UNIQUE,               -- NULL when logged out
    session_timeout TEXT                       -- RFC-3339, NULL when logged out
);

-- ----------------------------------------------------------------
-- Files
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS files (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id INTEGER NOT NULL,                 -- FK -> users(id)
    name     TEXT NOT NULL,
    data     BLOB NOT NULL,

    UNIQUE (owner_id, name),
    FOREIGN KEY (owner_id) REFERENCES users(id) ON DELETE CASCADE
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
