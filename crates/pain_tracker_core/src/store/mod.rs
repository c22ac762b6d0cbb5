//! Key-value persistence collaborator.
//!
//! # Responsibility
//! - Define the narrow get/set/list contract the journal persists through.
//! - Provide SQLite, in-memory and obfuscating implementations.
//!
//! # Invariants
//! - Values are opaque strings (the journal stores JSON).
//! - Every call may fail; callers treat failure as "persistence unavailable".

use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory;
mod obfuscated;
mod sqlite;

pub use memory::MemoryKeyValueStore;
pub use obfuscated::ObfuscatingStore;
pub use sqlite::SqliteKeyValueStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure reported by a key-value store.
#[derive(Debug)]
pub enum StoreError {
    Sqlite(rusqlite::Error),
    /// Database file was written by a newer table layout.
    SchemaTooNew { found: u32, supported: u32 },
    /// Backend refused or could not serve the call.
    Unavailable(String),
    /// Stored value exists but cannot be decoded.
    Corrupt { key: String, message: String },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "database layout version {found} is newer than supported {supported}"
            ),
            Self::Unavailable(message) => write!(f, "storage unavailable: {message}"),
            Self::Corrupt { key, message } => {
                write!(f, "stored value for `{key}` is corrupt: {message}")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::SchemaTooNew { .. } | Self::Unavailable(_) | Self::Corrupt { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Namespaced key-value storage contract.
///
/// `Send` so a store can be moved onto the persistence worker thread.
pub trait KeyValueStore: Send {
    /// Returns the value for `key`, or `None` when absent.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    /// Inserts or replaces the value for `key`.
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
    /// Returns all keys, sorted ascending.
    fn list(&self) -> StoreResult<Vec<String>>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set(key, value)
    }

    fn list(&self) -> StoreResult<Vec<String>> {
        (**self).list()
    }
}
