use serde::{Deserialize, Serialize};

use crate::constants::MAX_NAME_LEN;
use crate::error::ValidationError;

/// Surrogate key of a row in the `users` table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Require a non-empty query parameter.
pub fn require_param<'a>(
    field: &'static str,
    value: Option<&'a str>,
) -> Result<&'a str, ValidationError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(ValidationError::Missing(field))
}

/// Require a non-empty query parameter of at most [`MAX_NAME_LEN`] characters.
pub fn require_name<'a>(
    field: &'static str,
    value: Option<&'a str>,
) -> Result<&'a str, ValidationError> {
    let value = require_param(field, value)?;
    if value.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_NAME_LEN,
        });
    }
    Ok(value)
}

/// Interpret a boolean-ish query flag (`remember_me=true`, `=1`, `=on`).
/// Absent or unrecognised values are false.
pub fn parse_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("true" | "1" | "yes" | "on")
    )
}
