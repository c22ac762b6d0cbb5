//! Pain entry repository.
//!
//! # Responsibility
//! - Load the stored entry sequence and append single entries to it.
//!
//! # Invariants
//! - Stored order is append order; no de-duplication or merging.
//! - A corrupt stored sequence is never overwritten by `append`.

use crate::model::entry::{PainEntry, SCORE_MAX};
use crate::store::{KeyValueStore, StoreError};
use serde_json::error::Category;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Key holding the full entry sequence.
pub const DEFAULT_ENTRIES_KEY: &str = "pain_tracker_entries";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for entry persistence.
#[derive(Debug)]
pub enum RepoError {
    Store(StoreError),
    /// Stored sequence cannot be decoded or holds an invalid entry.
    InvalidData(String),
    Encode(serde_json::Error),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted entry data: {message}"),
            Self::Encode(err) => write!(f, "failed to encode entries: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::InvalidData(_) => None,
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Entry persistence over a key-value store.
pub struct EntryRepository<S> {
    store: S,
    entries_key: String,
}

impl<S: KeyValueStore> EntryRepository<S> {
    pub fn new(store: S) -> Self {
        Self::with_key(store, DEFAULT_ENTRIES_KEY)
    }

    pub fn with_key(store: S, entries_key: impl Into<String>) -> Self {
        Self {
            store,
            entries_key: entries_key.into(),
        }
    }

    /// Loads the full stored sequence; an absent key is an empty journal.
    pub fn load_all(&self) -> RepoResult<Vec<PainEntry>> {
        match self.store.get(&self.entries_key)? {
            Some(raw) => decode_entries(&raw),
            None => Ok(Vec::new()),
        }
    }

    /// Appends one entry to the stored sequence.
    ///
    /// Returns the stored sequence length after the write.
    pub fn append(&self, entry: &PainEntry) -> RepoResult<usize> {
        let mut entries = self.load_all()?;
        entries.push(entry.clone());
        let encoded = serde_json::to_string(&entries).map_err(RepoError::Encode)?;
        self.store.set(&self.entries_key, &encoded)?;
        Ok(entries.len())
    }
}

fn decode_entries(raw: &str) -> RepoResult<Vec<PainEntry>> {
    let entries: Vec<PainEntry> = serde_json::from_str(raw).map_err(describe_decode_error)?;
    for entry in &entries {
        check_persisted(entry)?;
    }
    Ok(entries)
}

/// serde_json quotes offending values, which may be note or location text;
/// keep only the error category and position.
fn describe_decode_error(err: serde_json::Error) -> RepoError {
    let category = match err.classify() {
        Category::Io => "io",
        Category::Syntax => "syntax",
        Category::Data => "data",
        Category::Eof => "truncated input",
    };
    RepoError::InvalidData(format!(
        "cannot decode entry sequence: {category} error at line {} column {}",
        err.line(),
        err.column()
    ))
}

fn check_persisted(entry: &PainEntry) -> RepoResult<()> {
    let scores = [
        ("baselineData.pain", entry.baseline_data.pain),
        ("qualityOfLife.sleepQuality", entry.quality_of_life.sleep_quality),
        ("qualityOfLife.moodImpact", entry.quality_of_life.mood_impact),
    ];
    for (field, value) in scores {
        if value > SCORE_MAX {
            return Err(RepoError::InvalidData(format!(
                "entry {} has {field} = {value}, expected 0..={SCORE_MAX}",
                entry.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{EntryRepository, RepoError, DEFAULT_ENTRIES_KEY};
    use crate::store::{KeyValueStore, MemoryKeyValueStore};

    #[test]
    fn absent_key_loads_as_empty() {
        let repo = EntryRepository::new(MemoryKeyValueStore::new());
        assert!(repo.load_all().unwrap().is_empty());
    }

    #[test]
    fn out_of_range_persisted_score_is_rejected() {
        let store = MemoryKeyValueStore::new();
        store
            .set(
                DEFAULT_ENTRIES_KEY,
                r#"[{"id":1,"timestamp":"2026-01-01T00:00:00Z","baselineData":{"pain":12}}]"#,
            )
            .unwrap();
        let repo = EntryRepository::new(store);
        let err = repo.load_all().unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(message) if message.contains("baselineData.pain")));
    }

    #[test]
    fn decode_errors_do_not_echo_stored_text() {
        let store = MemoryKeyValueStore::new();
        store
            .set(
                DEFAULT_ENTRIES_KEY,
                r#"[{"id":1,"timestamp":"2026-01-01T00:00:00Z","baselineData":{"pain":3,"locations":"left knee after fall"}}]"#,
            )
            .unwrap();

        let err = EntryRepository::new(store).load_all().unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, RepoError::InvalidData(_)));
        assert!(message.contains("data error at line 1"), "{message}");
        assert!(!message.contains("left knee"), "{message}");
    }

    #[test]
    fn corrupt_sequence_is_not_overwritten_by_append() {
        let store = MemoryKeyValueStore::new();
        store.set(DEFAULT_ENTRIES_KEY, "{not json").unwrap();
        let repo = EntryRepository::new(store.clone());

        let entry = serde_json::from_str(
            r#"{"id":2,"timestamp":"2026-01-02T00:00:00Z","baselineData":{"pain":3}}"#,
        )
        .unwrap();
        assert!(matches!(repo.append(&entry), Err(RepoError::InvalidData(_))));
        assert_eq!(
            store.get(DEFAULT_ENTRIES_KEY).unwrap().as_deref(),
            Some("{not json")
        );
    }
}
