//! Durable storage for settings
//!
//! A single SQLite `settings` key-value table holds one JSON-encoded row per
//! configuration field.

pub mod init;
pub mod settings;

pub use init::{create_settings_table, init_database};
