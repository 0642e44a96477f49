//! # coffer-shared
//!
//! Pieces shared by the Coffer store and server: constants, session-token
//! generation, password hashing and input validation.

pub mod constants;
pub mod crypto;
pub mod error;
pub mod types;
