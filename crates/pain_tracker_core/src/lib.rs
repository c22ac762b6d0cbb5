//! Core domain logic for the Pain Tracker journal.
//! This crate is the single source of truth for entry invariants.

pub mod config;
pub mod export;
pub mod insights;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod service;
pub mod store;

pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::builder::{Clock, EntryBuildError, EntryBuilder, FixedClock, SystemClock};
pub use model::candidate::{CandidateEntry, ScoreInput};
pub use model::entry::{EntryId, PainEntry};
pub use model::validation::{is_admissible, validate_candidate, EntryValidationError};
pub use notify::{Notification, NotificationLevel, NotificationQueue, Notifier};
pub use repo::entry_repo::{EntryRepository, RepoError, RepoResult, DEFAULT_ENTRIES_KEY};
pub use service::entry_service::{
    AddedEntry, EntryServiceError, EntryServiceResult, PainEntryService, LOAD_FAILED_TITLE,
};
pub use service::persistence::{PersistTicket, PersistenceError, PersistenceResult};
pub use service::record::EntryRecord;
pub use store::{
    KeyValueStore, MemoryKeyValueStore, ObfuscatingStore, SqliteKeyValueStore, StoreError,
    StoreResult,
};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
