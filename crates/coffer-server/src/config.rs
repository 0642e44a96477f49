//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

use coffer_shared::constants::{
    APP_NAME, DEFAULT_BCRYPT_COST, DEFAULT_HTTP_PORT, DEFAULT_MAX_FILE_SIZE,
};

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:3000`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: `./coffer.db`
    pub database_path: PathBuf,

    /// Maximum number of pooled database connections.
    /// Env: `DB_POOL_SIZE`
    /// Default: `8`
    pub db_pool_size: u32,

    /// Largest accepted upload body in bytes.
    /// Env: `MAX_FILE_SIZE`
    /// Default: 2 MiB
    pub max_file_size: usize,

    /// bcrypt work factor for new password hashes (4..=31).
    /// Env: `BCRYPT_COST`
    /// Default: `10`
    pub bcrypt_cost: u32,

    /// Human-readable name for this instance.
    /// Env: `INSTANCE_NAME`
    /// Default: `"Coffer"`
    pub instance_name: String,

    /// Whether `/register` accepts new accounts.
    /// Env: `REGISTRATION_OPEN` (true/false)
    /// Default: `true`
    pub registration_open: bool,

    /// Bearer token guarding `/init-db`.
    /// Env: `ADMIN_TOKEN`
    /// Default: empty (endpoint unguarded).
    pub admin_token: Option<String>,

    /// Mark session cookies `Secure` (HTTPS only).
    /// Env: `COOKIE_SECURE` (true/false)
    /// Default: `false`
    pub cookie_secure: bool,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("http_addr", &self.http_addr)
            .field("database_path", &self.database_path)
            .field("db_pool_size", &self.db_pool_size)
            .field("max_file_size", &self.max_file_size)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("instance_name", &self.instance_name)
            .field("registration_open", &self.registration_open)
            .field("admin_token", &self.admin_token.as_ref().map(|_| "<redacted>"))
            .field("cookie_secure", &self.cookie_secure)
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: PathBuf::from("./coffer.db"),
            db_pool_size: 8,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            instance_name: APP_NAME.to_string(),
            registration_open: true,
            admin_token: None,
            cookie_secure: false,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = var("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Some(path) = var("DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }

        if let Some(val) = var("DB_POOL_SIZE") {
            match val.parse::<u32>() {
                Ok(n) if n > 0 => config.db_pool_size = n,
                _ => tracing::warn!(value = %val, "Invalid DB_POOL_SIZE, using default"),
            }
        }

        if let Some(val) = var("MAX_FILE_SIZE") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.max_file_size = n,
                _ => tracing::warn!(value = %val, "Invalid MAX_FILE_SIZE, using default"),
            }
        }

        if let Some(val) = var("BCRYPT_COST") {
            match val.parse::<u32>() {
                Ok(n) if (4..=31).contains(&n) => config.bcrypt_cost = n,
                _ => tracing::warn!(value = %val, "Invalid BCRYPT_COST, using default"),
            }
        }

        if let Some(name) = var("INSTANCE_NAME") {
            config.instance_name = name;
        }

        if let Some(val) = var("REGISTRATION_OPEN") {
            config.registration_open = val != "false" && val != "0";
        }

        if let Some(token) = var("ADMIN_TOKEN") {
            if !token.is_empty() {
                config.admin_token = Some(token);
            }
        }

        if let Some(val) = var("COOKIE_SECURE") {
            config.cookie_secure = val == "true" || val == "1";
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> ServerConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 3000).into());
        assert_eq!(config.max_file_size, 2 * 1024 * 1024);
        assert_eq!(config.bcrypt_cost, 10);
        assert!(config.registration_open);
        assert!(config.admin_token.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("HTTP_ADDR", "127.0.0.1:8080"),
            ("DATABASE_PATH", "/var/lib/coffer/data.db"),
            ("MAX_FILE_SIZE", "1024"),
            ("REGISTRATION_OPEN", "false"),
            ("ADMIN_TOKEN", "s3cret"),
        ]);
        assert_eq!(config.http_addr, ([127, 0, 0, 1], 8080).into());
        assert_eq!(config.database_path, PathBuf::from("/var/lib/coffer/data.db"));
        assert_eq!(config.max_file_size, 1024);
        assert!(!config.registration_open);
        assert_eq!(config.admin_token.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = from_pairs(&[
            ("HTTP_ADDR", "not-an-addr"),
            ("BCRYPT_COST", "99"),
            ("DB_POOL_SIZE", "0"),
            ("ADMIN_TOKEN", ""),
        ]);
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 3000).into());
        assert_eq!(config.bcrypt_cost, 10);
        assert_eq!(config.db_pool_size, 8);
        assert!(config.admin_token.is_none());
    }

    #[test]
    fn test_admin_token_redacted_in_debug() {
        let config = from_pairs(&[("ADMIN_TOKEN", "s3cret")]);
        assert!(!format!("{config:?}").contains("s3cret"));
    }
}
