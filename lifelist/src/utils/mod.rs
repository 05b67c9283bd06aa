//! Utility modules for lifelist

pub mod retry;

pub use retry::{retry_transient, FETCH_RETRIES};
