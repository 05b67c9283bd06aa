//! # Life List Common Library
//!
//! Shared code for the life list engine and CLI:
//! - Error types
//! - TOML configuration and root folder resolution
//! - SQLite settings storage
//! - Dual-mirror settings store (URL query string + durable storage)

pub mod config;
pub mod db;
pub mod error;
pub mod settings;

pub use error::{Error, Result};
pub use settings::{ConfigStore, Configuration};
