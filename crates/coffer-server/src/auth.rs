//! Session resolution and cookie handling.
//!
//! A session token may arrive as the `session_token` query parameter or as a
//! `session_token` cookie; the query parameter wins when both are present.

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Utc};
use cookie::time::OffsetDateTime;
use cookie::{Cookie, SameSite};
use subtle::ConstantTimeEq;

use coffer_shared::constants::SESSION_COOKIE_NAME;
use coffer_store::{Database, StoreError, User};

use crate::config::ServerConfig;
use crate::error::ServerError;

/// Pick the session token from the query string, falling back to cookies.
pub fn session_token(query_token: Option<&str>, headers: &HeaderMap) -> Option<String> {
    if let Some(token) = query_token.filter(|t| !t.is_empty()) {
        return Some(token.to_string());
    }
    cookie_token(headers)
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| Cookie::split_parse(v))
        .filter_map(Result::ok)
        .find(|c| c.name() == SESSION_COOKIE_NAME)
        .map(|c| c.value().to_string())
}

/// Resolve the caller's session to a user.
///
/// Unknown and expired tokens are indistinguishable to the caller: both
/// become 403.
pub fn authenticate(db: &Database, token: Option<&str>) -> Result<User, ServerError> {
    let Some(token) = token else {
        return Err(ServerError::unauthenticated());
    };

    match db.user_by_session(token, Utc::now()) {
        Ok(user) => Ok(user),
        Err(StoreError::NotFound) => {
            tracing::debug!("Unknown session token");
            Err(ServerError::unauthenticated())
        }
        Err(StoreError::SessionExpired) => {
            tracing::debug!("Expired session token");
            Err(ServerError::unauthenticated())
        }
        Err(e) => Err(e.into()),
    }
}

/// `Set-Cookie` value carrying a freshly issued session token.
pub fn session_cookie(token: &str, expires_at: DateTime<Utc>, secure: bool) -> String {
    let expires = OffsetDateTime::from_unix_timestamp(expires_at.timestamp())
        .unwrap_or_else(|_| OffsetDateTime::now_utc());

    Cookie::build((SESSION_COOKIE_NAME, token.to_string()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .expires(expires)
        .build()
        .to_string()
}

/// `Set-Cookie` value that makes the browser drop the session cookie.
pub fn expired_session_cookie(secure: bool) -> String {
    Cookie::build((SESSION_COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .expires(OffsetDateTime::UNIX_EPOCH)
        .build()
        .to_string()
}

/// Check the `Authorization: Bearer` header against the configured admin
/// token. Without a configured token every caller is let through.
pub fn verify_admin_token(headers: &HeaderMap, config: &ServerConfig) -> Result<(), ServerError> {
    let Some(ref expected) = config.admin_token else {
        return Ok(());
    };

    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or(auth);

    let token_bytes = token.as_bytes();
    let expected_bytes = expected.as_bytes();
    if token_bytes.len() != expected_bytes.len()
        || token_bytes.ct_eq(expected_bytes).unwrap_u8() != 1
    {
        return Err(ServerError::Forbidden("Invalid admin token".into()));
    }

    Ok(())
}
