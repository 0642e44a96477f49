//! Row types for the `users` and `files` tables.

use chrono::{DateTime, Utc};
use coffer_shared::types::UserId;
use serde::{Deserialize, Serialize};

/// An account row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    /// Unique login name.
    pub name: String,
    /// bcrypt hash of the password.
    pub password_hash: String,
    /// Current session token, `None` when logged out.
    pub session_token: Option<String>,
    /// When the current session stops being valid.
    pub session_timeout: Option<DateTime<Utc>>,
}

impl User {
    /// Whether the stored session is still usable at `now`.
    pub fn session_valid_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.session_timeout, Some(expiry) if expiry > now)
    }
}

/// One entry of a file listing, serialized as `{"name": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
}
