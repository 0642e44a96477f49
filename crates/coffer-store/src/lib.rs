//! # coffer-store
//!
//! Persistence for Coffer, backed by SQLite through an r2d2 connection pool.
//!
//! [`Database`] is cheap to clone and hands out pooled connections. Typed
//! helpers cover the two tables: `users` (accounts and their current
//! session) and `files` (binary payloads keyed by owner and name). All
//! helpers are synchronous; async callers should run them on a blocking
//! thread.

pub mod database;
pub mod files;
pub mod migrations;
pub mod models;
pub mod users;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;
