//! Background persistence worker.
//!
//! # Responsibility
//! - Run repository reads/writes off the caller's path.
//! - Forward write failures to the notifier without involving the caller.
//!
//! # Invariants
//! - One worker thread owns the repository; commands run in FIFO order, so
//!   writes reach the store in submission order.
//! - Callers never have to await a write; `PersistTicket` is optional.
//! - A failed write never touches the in-memory record.

use crate::model::entry::{EntryId, PainEntry};
use crate::notify::Notifier;
use crate::repo::entry_repo::{EntryRepository, RepoError};
use crate::store::KeyValueStore;
use log::{debug, error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};

const WORKER_THREAD_NAME: &str = "pain-tracker-persist";

pub(crate) const WRITE_FAILED_TITLE: &str = "Entry not saved";
pub(crate) const WRITE_FAILED_MESSAGE: &str =
    "Your entry is shown for now but may not survive a refresh.";

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Failure of a persistence request.
#[derive(Debug)]
pub enum PersistenceError {
    /// Worker thread could not be started.
    Spawn(std::io::Error),
    /// Worker has stopped; the request was not executed.
    WorkerUnavailable,
    Repo(RepoError),
}

impl Display for PersistenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spawn(err) => write!(f, "failed to start persistence worker: {err}"),
            Self::WorkerUnavailable => write!(f, "persistence worker is not running"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PersistenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Spawn(err) => Some(err),
            Self::WorkerUnavailable => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for PersistenceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

enum PersistCommand {
    LoadAll {
        reply: oneshot::Sender<Result<Vec<PainEntry>, RepoError>>,
    },
    Append {
        entry: PainEntry,
        reply: oneshot::Sender<Result<usize, RepoError>>,
    },
    Shutdown,
}

/// Pending outcome of one fire-and-forget write.
///
/// Dropping the ticket is fine; the write still runs and failures still
/// reach the notifier.
#[derive(Debug)]
pub struct PersistTicket {
    entry_id: EntryId,
    reply: oneshot::Receiver<Result<usize, RepoError>>,
}

impl PersistTicket {
    pub fn entry_id(&self) -> EntryId {
        self.entry_id
    }

    /// Waits for the write; returns the stored sequence length.
    pub async fn outcome(self) -> PersistenceResult<usize> {
        match self.reply.await {
            Ok(result) => result.map_err(PersistenceError::from),
            Err(_) => Err(PersistenceError::WorkerUnavailable),
        }
    }

    /// Blocking variant of [`PersistTicket::outcome`].
    ///
    /// Must not be called from inside an async runtime.
    pub fn wait(self) -> PersistenceResult<usize> {
        match self.reply.blocking_recv() {
            Ok(result) => result.map_err(PersistenceError::from),
            Err(_) => Err(PersistenceError::WorkerUnavailable),
        }
    }
}

/// Cloneable sender side of the worker.
#[derive(Debug, Clone)]
pub struct PersistenceHandle {
    commands: mpsc::UnboundedSender<PersistCommand>,
}

impl PersistenceHandle {
    /// Requests the full stored sequence.
    pub async fn load_all(&self) -> PersistenceResult<Vec<PainEntry>> {
        let (reply, receiver) = oneshot::channel();
        self.commands
            .send(PersistCommand::LoadAll { reply })
            .map_err(|_| PersistenceError::WorkerUnavailable)?;
        match receiver.await {
            Ok(result) => result.map_err(PersistenceError::from),
            Err(_) => Err(PersistenceError::WorkerUnavailable),
        }
    }

    /// Queues one entry for storage and returns immediately.
    pub fn persist_one(&self, entry: PainEntry) -> PersistenceResult<PersistTicket> {
        let entry_id = entry.id;
        let (reply, receiver) = oneshot::channel();
        self.commands
            .send(PersistCommand::Append { entry, reply })
            .map_err(|_| PersistenceError::WorkerUnavailable)?;
        Ok(PersistTicket {
            entry_id,
            reply: receiver,
        })
    }
}

impl std::fmt::Debug for PersistCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LoadAll { .. } => write!(f, "LoadAll"),
            Self::Append { entry, .. } => write!(f, "Append({})", entry.id),
            Self::Shutdown => write!(f, "Shutdown"),
        }
    }
}

/// Owner of the worker thread.
pub struct PersistenceWorker {
    handle: PersistenceHandle,
    thread: Option<JoinHandle<()>>,
}

impl PersistenceWorker {
    /// Moves `repo` onto a dedicated worker thread.
    ///
    /// Write failures are reported to `notifier` as warnings.
    pub fn spawn<S>(
        repo: EntryRepository<S>,
        notifier: Arc<dyn Notifier>,
    ) -> PersistenceResult<Self>
    where
        S: KeyValueStore + 'static,
    {
        let (commands, receiver) = mpsc::unbounded_channel();
        let thread = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_worker(repo, receiver, notifier))
            .map_err(PersistenceError::Spawn)?;

        info!("event=persist_worker module=persistence status=ok action=spawn");
        Ok(Self {
            handle: PersistenceHandle { commands },
            thread: Some(thread),
        })
    }

    pub fn handle(&self) -> PersistenceHandle {
        self.handle.clone()
    }

    /// Stops the worker after already-queued commands and joins it.
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        let _ = self.handle.commands.send(PersistCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("event=persist_worker module=persistence status=error action=join error_code=worker_panicked");
            }
        }
    }
}

impl Drop for PersistenceWorker {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

fn run_worker<S: KeyValueStore>(
    repo: EntryRepository<S>,
    mut receiver: mpsc::UnboundedReceiver<PersistCommand>,
    notifier: Arc<dyn Notifier>,
) {
    while let Some(command) = receiver.blocking_recv() {
        match command {
            PersistCommand::LoadAll { reply } => {
                let started_at = Instant::now();
                let result = repo.load_all();
                match &result {
                    Ok(entries) => info!(
                        "event=persist_load module=persistence status=ok count={} duration_ms={}",
                        entries.len(),
                        started_at.elapsed().as_millis()
                    ),
                    Err(err) => error!(
                        "event=persist_load module=persistence status=error duration_ms={} error_code=load_failed error={}",
                        started_at.elapsed().as_millis(),
                        err
                    ),
                }
                let _ = reply.send(result);
            }
            PersistCommand::Append { entry, reply } => {
                let started_at = Instant::now();
                let result = repo.append(&entry);
                match &result {
                    Ok(stored) => debug!(
                        "event=persist_append module=persistence status=ok entry_id={} stored_count={} duration_ms={}",
                        entry.id,
                        stored,
                        started_at.elapsed().as_millis()
                    ),
                    Err(err) => {
                        error!(
                            "event=persist_append module=persistence status=error entry_id={} duration_ms={} error_code=write_failed error={}",
                            entry.id,
                            started_at.elapsed().as_millis(),
                            err
                        );
                        notifier.warning(WRITE_FAILED_TITLE, WRITE_FAILED_MESSAGE);
                    }
                }
                let _ = reply.send(result);
            }
            PersistCommand::Shutdown => break,
        }
    }
    info!("event=persist_worker module=persistence status=ok action=stop");
}

#[cfg(test)]
mod tests {
    use super::{PersistenceError, PersistenceWorker};
    use crate::model::entry::PainEntry;
    use crate::notify::{NotificationLevel, NotificationQueue};
    use crate::repo::entry_repo::EntryRepository;
    use crate::store::MemoryKeyValueStore;
    use std::sync::Arc;

    fn entry(id: i64) -> PainEntry {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "timestamp": "2026-04-01T10:00:00Z",
            "baselineData": { "pain": 2 }
        }))
        .unwrap()
    }

    #[test]
    fn writes_are_applied_in_submission_order() {
        let store = MemoryKeyValueStore::new();
        let worker = PersistenceWorker::spawn(
            EntryRepository::new(store.clone()),
            Arc::new(NotificationQueue::new()),
        )
        .unwrap();
        let handle = worker.handle();

        let tickets = (1..=5)
            .map(|id| handle.persist_one(entry(id)).unwrap())
            .collect::<Vec<_>>();
        let stored = tickets
            .into_iter()
            .map(|ticket| ticket.wait().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(stored, vec![1, 2, 3, 4, 5]);
        worker.shutdown();

        let persisted = EntryRepository::new(store).load_all().unwrap();
        let ids = persisted.iter().map(|entry| entry.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn shutdown_drains_queued_writes_before_joining() {
        let store = MemoryKeyValueStore::new();
        let worker = PersistenceWorker::spawn(
            EntryRepository::new(store.clone()),
            Arc::new(NotificationQueue::new()),
        )
        .unwrap();
        let handle = worker.handle();

        for id in 1..=20 {
            drop(handle.persist_one(entry(id)).unwrap());
        }
        worker.shutdown();

        let ids = EntryRepository::new(store)
            .load_all()
            .unwrap()
            .iter()
            .map(|entry| entry.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, (1..=20).collect::<Vec<_>>());
    }

    #[test]
    fn write_failure_reaches_notifier_and_ticket() {
        let store = MemoryKeyValueStore::new();
        store.fail_writes(true);
        let notifier = Arc::new(NotificationQueue::new());
        let worker =
            PersistenceWorker::spawn(EntryRepository::new(store), notifier.clone()).unwrap();

        let ticket = worker.handle().persist_one(entry(9)).unwrap();
        assert_eq!(ticket.entry_id(), 9);
        assert!(matches!(ticket.wait(), Err(PersistenceError::Repo(_))));
        worker.shutdown();

        let notifications = notifier.drain();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].level, NotificationLevel::Warning);
        assert!(notifications[0].message.contains("may not survive a refresh"));
    }

    #[test]
    fn requests_after_shutdown_report_unavailable_worker() {
        let worker = PersistenceWorker::spawn(
            EntryRepository::new(MemoryKeyValueStore::new()),
            Arc::new(NotificationQueue::new()),
        )
        .unwrap();
        let handle = worker.handle();
        worker.shutdown();

        assert!(matches!(
            handle.persist_one(entry(1)),
            Err(PersistenceError::WorkerUnavailable)
        ));
    }
}
