use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;

use crate::constants::{
    MAX_PASSWORD_BYTES, REMEMBER_ME_SESSION_DAYS, SESSION_DAYS, SESSION_TOKEN_BYTES,
};
use crate::error::PasswordError;

/// Fresh session token: random bytes from the OS CSPRNG, base64-encoded.
///
/// Uniqueness against the `users` table is the store's job.
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    STANDARD.encode(bytes)
}

/// Expiry instant for a session starting at `now`.
pub fn session_expiry(now: DateTime<Utc>, remember_me: bool) -> DateTime<Utc> {
    let days = if remember_me {
        REMEMBER_ME_SESSION_DAYS
    } else {
        SESSION_DAYS
    };
    now + Duration::days(days)
}

/// Hash a password with bcrypt. CPU-bound; async callers should run this on
/// a blocking thread.
///
/// Passwords over [`MAX_PASSWORD_BYTES`] are rejected rather than silently
/// truncated by bcrypt.
pub fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    if password.is_empty() {
        return Err(PasswordError::Empty);
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(PasswordError::TooLong {
            max: MAX_PASSWORD_BYTES,
        });
    }
    Ok(bcrypt::hash(password, cost)?)
}

/// Check a password against a stored bcrypt hash.
///
/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_decodes_to_16_bytes() {
        let token = generate_session_token();
        let raw = STANDARD.decode(&token).unwrap();
        assert_eq!(raw.len(), SESSION_TOKEN_BYTES);
    }

    #[test]
    fn test_tokens_differ() {
        assert_ne!(generate_session_token(), generate_session_token());
    }

    #[test]
    fn test_session_expiry() {
        let now = Utc::now();
        assert_eq!(session_expiry(now, false) - now, Duration::days(1));
        assert_eq!(session_expiry(now, true) - now, Duration::days(30));
    }

    #[test]
    fn test_password_roundtrip() {
        let hash = hash_password("hunter2", 4).unwrap();
        assert_ne!(hash, "hunter2");
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn test_empty_password_rejected() {
        assert!(matches!(hash_password("", 4), Err(PasswordError::Empty)));
    }

    #[test]
    fn test_overlong_password_rejected() {
        let at_limit = "a".repeat(MAX_PASSWORD_BYTES);
        assert!(hash_password(&at_limit, 4).is_ok());

        let over = format!("{at_limit}b");
        assert!(matches!(
            hash_password(&over, 4),
            Err(PasswordError::TooLong { max: 72 })
        ));

        // 36 two-byte chars fill the limit exactly, one more goes past it
        assert!(hash_password(&"é".repeat(36), 4).is_ok());
        assert!(hash_password(&"é".repeat(37), 4).is_err());
    }

    #[test]
    fn test_garbage_hash_is_mismatch() {
        assert!(!verify_password("hunter2", "not-a-bcrypt-hash"));
    }
}
