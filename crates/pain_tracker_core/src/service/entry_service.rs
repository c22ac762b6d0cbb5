//! Pain entry lifecycle service.
//!
//! # Responsibility
//! - Run the validate -> build -> append -> persist -> notify pipeline.
//! - Hydrate the session record from storage.
//!
//! # Invariants
//! - Rejected or failed submissions never touch the record or the store.
//! - The record is updated before persistence is even queued; persistence
//!   outcomes never roll it back.
//! - No failure here is fatal; the service degrades to in-memory operation.

use crate::model::builder::{Clock, EntryBuildError, EntryBuilder};
use crate::model::candidate::CandidateEntry;
use crate::model::entry::PainEntry;
use crate::model::validation::{validate_candidate, EntryValidationError};
use crate::notify::Notifier;
use crate::repo::entry_repo::EntryRepository;
use crate::service::persistence::{
    PersistTicket, PersistenceError, PersistenceResult, PersistenceWorker, WRITE_FAILED_MESSAGE,
    WRITE_FAILED_TITLE,
};
use crate::service::record::EntryRecord;
use crate::store::KeyValueStore;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub const LOAD_FAILED_TITLE: &str = "Unable to load pain entries";
const LOAD_FAILED_MESSAGE: &str = "Entries may not have loaded. You can still add new entries.";
const INVALID_ENTRY_TITLE: &str = "Invalid entry";
const UNEXPECTED_TITLE: &str = "Something went wrong";
const UNEXPECTED_MESSAGE: &str = "Your entry could not be added. Please try again.";
const ADDED_TITLE: &str = "Entry added";

pub type EntryServiceResult<T> = Result<T, EntryServiceError>;

/// Service-level error taxonomy.
#[derive(Debug)]
pub enum EntryServiceError {
    /// Candidate rejected; nothing was appended or persisted.
    Validation(EntryValidationError),
    /// Initial load failed; the record stays as it was.
    PersistenceLoad(PersistenceError),
    /// Write failed after the entry was appended in memory.
    PersistenceWrite(PersistenceError),
    /// Entry construction failed; nothing was appended.
    Unexpected(EntryBuildError),
}

impl Display for EntryServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "invalid entry: {err}"),
            Self::PersistenceLoad(err) => write!(f, "unable to load pain entries: {err}"),
            Self::PersistenceWrite(err) => write!(f, "entry may not have been saved: {err}"),
            Self::Unexpected(err) => write!(f, "unexpected error while adding entry: {err}"),
        }
    }
}

impl Error for EntryServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::PersistenceLoad(err) | Self::PersistenceWrite(err) => Some(err),
            Self::Unexpected(err) => Some(err),
        }
    }
}

impl From<EntryValidationError> for EntryServiceError {
    fn from(value: EntryValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<EntryBuildError> for EntryServiceError {
    fn from(value: EntryBuildError) -> Self {
        Self::Unexpected(value)
    }
}

/// Result of a successful submission.
#[derive(Debug)]
pub struct AddedEntry {
    /// The entry as appended to the record.
    pub entry: PainEntry,
    /// Pending write, or `None` when the worker could not accept it.
    pub persistence: Option<PersistTicket>,
}

impl AddedEntry {
    /// Waits for the background write; only needed by callers that care.
    pub async fn confirm(self) -> EntryServiceResult<usize> {
        match self.persistence {
            Some(ticket) => ticket
                .outcome()
                .await
                .map_err(EntryServiceError::PersistenceWrite),
            None => Err(EntryServiceError::PersistenceWrite(
                PersistenceError::WorkerUnavailable,
            )),
        }
    }
}

/// Session-scoped owner of the record and its collaborators.
pub struct PainEntryService {
    record: EntryRecord,
    builder: EntryBuilder,
    persistence: PersistenceWorker,
    notifier: Arc<dyn Notifier>,
    load_error: Option<String>,
}

impl PainEntryService {
    /// Creates a service with an empty record and a running persistence worker.
    ///
    /// # Errors
    /// - `PersistenceError::Spawn` when the worker thread cannot be started;
    ///   this is a host setup failure, not an entry operation outcome.
    pub fn new<S>(
        repo: EntryRepository<S>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> PersistenceResult<Self>
    where
        S: KeyValueStore + 'static,
    {
        let persistence = PersistenceWorker::spawn(repo, notifier.clone())?;
        Ok(Self {
            record: EntryRecord::new(),
            builder: EntryBuilder::new(clock),
            persistence,
            notifier,
            load_error: None,
        })
    }

    /// Replaces the record with the stored sequence.
    ///
    /// On failure the record is left untouched, `load_error()` is set and a
    /// warning is sent; entry creation keeps working.
    pub async fn load_entries(&mut self) -> EntryServiceResult<usize> {
        match self.persistence.handle().load_all().await {
            Ok(entries) => {
                let count = entries.len();
                self.builder.observe_existing(&entries);
                self.record.replace_all(entries);
                self.load_error = None;
                info!("event=entries_load module=service status=ok count={count}");
                Ok(count)
            }
            Err(err) => {
                error!(
                    "event=entries_load module=service status=error error_code=load_failed error={}",
                    err
                );
                self.load_error = Some(format!("{LOAD_FAILED_TITLE}: {err}"));
                self.notifier.warning(LOAD_FAILED_TITLE, LOAD_FAILED_MESSAGE);
                Err(EntryServiceError::PersistenceLoad(err))
            }
        }
    }

    /// Admits one candidate.
    ///
    /// # Contract
    /// - Invalid candidates return `Validation` and notify an error.
    /// - Build failures return `Unexpected` and notify an error.
    /// - Otherwise the entry is appended, a success notification is sent and
    ///   the entry is queued for storage; a write failure only warns.
    pub fn add_entry(&mut self, candidate: CandidateEntry) -> EntryServiceResult<AddedEntry> {
        if let Err(err) = validate_candidate(&candidate) {
            info!("event=entry_add module=service status=rejected reason=validation");
            self.notifier.error(INVALID_ENTRY_TITLE, &err.to_string());
            return Err(err.into());
        }

        let entry = match self.builder.build(candidate) {
            Ok(entry) => entry,
            Err(err) => {
                error!(
                    "event=entry_add module=service status=error error_code=build_failed error={}",
                    err
                );
                self.notifier.error(UNEXPECTED_TITLE, UNEXPECTED_MESSAGE);
                return Err(err.into());
            }
        };

        let count = self.record.append(entry.clone()).len();
        info!(
            "event=entry_add module=service status=ok entry_id={} record_len={}",
            entry.id, count
        );

        // Success first: a worker-side write warning must arrive after it.
        self.notifier.success(
            ADDED_TITLE,
            &format!("Pain level {} recorded.", entry.baseline_data.pain),
        );

        let persistence = match self.persistence.handle().persist_one(entry.clone()) {
            Ok(ticket) => Some(ticket),
            Err(err) => {
                warn!(
                    "event=entry_add module=service status=error entry_id={} error_code=persist_enqueue_failed error={}",
                    entry.id, err
                );
                self.notifier.warning(WRITE_FAILED_TITLE, WRITE_FAILED_MESSAGE);
                None
            }
        };

        Ok(AddedEntry { entry, persistence })
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[PainEntry] {
        self.record.entries()
    }

    /// Entries most recent first, for history views.
    pub fn entries_by_recency(&self) -> Vec<PainEntry> {
        self.record.by_recency()
    }

    /// Entries oldest first, for charts and exports.
    pub fn entries_chronological(&self) -> Vec<PainEntry> {
        self.record.chronological()
    }

    pub fn record(&self) -> &EntryRecord {
        &self.record
    }

    /// User-visible load failure, if the last load failed.
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// Drains queued writes and stops the worker.
    pub fn shutdown(self) {
        self.persistence.shutdown();
    }
}
