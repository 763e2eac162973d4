//! Folio common types, errors, and utilities.
//!
//! This crate provides shared definitions used across all folio components.

pub mod config;
pub mod error;
pub mod types;

pub use config::DatabaseConfig;
pub use error::{FolioError, Result};
pub use types::{DocSpan, Field, KEY_WIDTH};
