//! In-memory key-value store with fault injection.
//!
//! Clones share the same map and fault switches, so a host can keep a
//! handle after moving the store onto the persistence worker.

use super::{KeyValueStore, StoreError, StoreResult};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Shared {
    values: Mutex<BTreeMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    write_calls: AtomicUsize,
}

/// Process-local store; contents vanish with the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    shared: Arc<Shared>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `get`/`list` fail until switched off.
    pub fn fail_reads(&self, fail: bool) {
        self.shared.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes `set` fail until switched off.
    pub fn fail_writes(&self, fail: bool) {
        self.shared.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of `set` calls attempted, including failed ones.
    pub fn write_calls(&self) -> usize {
        self.shared.write_calls.load(Ordering::SeqCst)
    }

    fn values(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.shared
            .values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_reads(&self) -> StoreResult<()> {
        if self.shared.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("reads disabled".to_string()));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.check_reads()?;
        Ok(self.values().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.shared.write_calls.fetch_add(1, Ordering::SeqCst);
        if self.shared.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        self.values().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn list(&self) -> StoreResult<Vec<String>> {
        self.check_reads()?;
        Ok(self.values().keys().cloned().collect())
    }
}
