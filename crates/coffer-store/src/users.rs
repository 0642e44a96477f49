use chrono::{DateTime, Utc};
use coffer_shared::crypto::generate_session_token;
use coffer_shared::types::UserId;
use rusqlite::{params, Connection};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::User;

const USER_COLUMNS: &str = "id, name, password_hash, session_token, session_timeout";

impl Database {
    // ------------------------------------------------------------------
    // Accounts
    // ------------------------------------------------------------------

    /// Insert a new user that starts out logged in with `session_token`.
    ///
    /// Fails with [`StoreError::Conflict`] when the name is taken.
    pub fn create_user(
        &self,
        name: &str,
        password_hash: &str,
        session_token: &str,
        session_timeout: DateTime<Utc>,
    ) -> Result<UserId> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (name, password_hash, session_token, session_timeout)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                name,
                password_hash,
                session_token,
                session_timeout.to_rfc3339(),
            ],
        )?;
        Ok(UserId(conn.last_insert_rowid()))
    }

    pub fn get_user_by_name(&self, name: &str) -> Result<User> {
        let conn = self.conn()?;
        let user = conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE name = ?1"),
            params![name],
            row_to_user,
        )?;
        Ok(user)
    }

    // ------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------

    /// Generate a session token that no user currently holds.
    pub fn issue_session_token(&self) -> Result<String> {
        self.issue_session_token_with(generate_session_token)
    }

    /// Draw tokens from `generate` until one is unused.
    ///
    /// Concurrent issuers can still race between the check and the write;
    /// the UNIQUE constraint on `session_token` rejects the loser.
    pub fn issue_session_token_with<F>(&self, mut generate: F) -> Result<String>
    where
        F: FnMut() -> String,
    {
        let conn = self.conn()?;
        loop {
            let token = generate();
            if !token_in_use(&conn, &token)? {
                return Ok(token);
            }
            tracing::debug!("session token collision, regenerating");
        }
    }

    /// Store a fresh session for `user_id`, replacing any previous one.
    pub fn start_session(
        &self,
        user_id: UserId,
        session_token: &str,
        session_timeout: DateTime<Utc>,
    ) -> Result<()> {
        let affected = self.conn()?.execute(
            "UPDATE users SET session_token = ?2, session_timeout = ?3 WHERE id = ?1",
            params![user_id.0, session_token, session_timeout.to_rfc3339()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Clear the session holding `session_token`. Returns `true` if a user
    /// was logged out.
    pub fn end_session(&self, session_token: &str) -> Result<bool> {
        let affected = self.conn()?.execute(
            "UPDATE users SET session_token = NULL, session_timeout = NULL
             WHERE session_token = ?1",
            params![session_token],
        )?;
        Ok(affected > 0)
    }

    /// Resolve a session token to its user.
    ///
    /// Returns [`StoreError::NotFound`] when no user holds the token and
    /// [`StoreError::SessionExpired`] when the holder's session ended at or
    /// before `now`.
    pub fn user_by_session(&self, session_token: &str, now: DateTime<Utc>) -> Result<User> {
        if session_token.is_empty() {
            return Err(StoreError::NotFound);
        }

        let user = self.conn()?.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE session_token = ?1"),
            params![session_token],
            row_to_user,
        )?;

        if !user.session_valid_at(now) {
            return Err(StoreError::SessionExpired);
        }
        Ok(user)
    }
}

fn token_in_use(conn: &Connection, token: &str) -> Result<bool> {
    let mut stmt = conn.prepare_cached("SELECT 1 FROM users WHERE session_token = ?1")?;
    Ok(stmt.exists(params![token])?)
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let id: i64 = row.get(0)?;
    let name: String = row.get(1)?;
    let password_hash: String = row.get(2)?;
    let session_token: Option<String> = row.get(3)?;
    let timeout_str: Option<String> = row.get(4)?;

    let session_timeout = timeout_str
        .map(|s| DateTime::parse_from_rfc3339(&s).map(|dt| dt.with_timezone(&Utc)))
        .transpose()
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(User {
        id: UserId(id),
        name,
        password_hash,
        session_token,
        session_timeout,
    })
}
