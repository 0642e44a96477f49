/// Application name
pub const APP_NAME: &str = "Coffer";

/// Random bytes in a session token (before base64 encoding)
pub const SESSION_TOKEN_BYTES: usize = 16;

/// Session lifetime without "remember me", in days
pub const SESSION_DAYS: i64 = 1;

/// Session lifetime with "remember me", in days
pub const REMEMBER_ME_SESSION_DAYS: i64 = 30;

/// Cookie carrying the session token
pub const SESSION_COOKIE_NAME: &str = "session_token";

/// Maximum upload size in bytes (2 MiB)
pub const DEFAULT_MAX_FILE_SIZE: usize = 2 * 1024 * 1024;

/// bcrypt work factor used when none is configured
pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// Default HTTP API port
pub const DEFAULT_HTTP_PORT: u16 = 3000;

/// bcrypt only reads the first 72 bytes of its input
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Maximum length of user and file names, in characters
pub const MAX_NAME_LEN: usize = 50;
