//! Session-scoped key/value storage and on-disk configuration.
//!
//! The countdown never touches ambient storage directly; it is handed a
//! [`SessionStorage`] implementation. [`MemoryStorage`] backs tests and
//! in-process hosts, [`SessionDb`] backs the CLI so state survives a
//! process restart the way browser session storage survives a reload.

mod config;
mod memory;
pub mod session_db;

pub use config::{ApiConfig, Config, DisplayConfig, LoggingConfig, TimerConfig};
pub use memory::MemoryStorage;
pub use session_db::SessionDb;

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::StorageError;

/// Get/set/remove over string keys.
///
/// Implementations must tolerate `remove` on a missing key.
pub trait SessionStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<T: SessionStorage + ?Sized> SessionStorage for &T {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

impl<T: SessionStorage + ?Sized> SessionStorage for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// Returns the ClassMate data directory, creating it if needed.
///
/// `CLASSMATE_DATA_DIR` overrides the location outright. Otherwise this is
/// `~/.config/classmate/`, or `~/.config/classmate-dev/` when
/// `CLASSMATE_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("CLASSMATE_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("CLASSMATE_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("classmate-dev")
            } else {
                base_dir.join("classmate")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
