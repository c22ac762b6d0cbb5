//! In-memory session record.
//!
//! # Responsibility
//! - Hold the ordered entry sequence for the running session.
//! - Produce display orderings without touching insertion order.
//!
//! # Invariants
//! - Insertion order is append order; entries are never edited or removed.
//! - Ordering views return new vectors and never mutate the record.

use crate::model::entry::{EntryId, PainEntry};

/// Ordered, append-only collection of admitted entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryRecord {
    entries: Vec<PainEntry>,
}

impl EntryRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one entry and returns the updated sequence.
    pub fn append(&mut self, entry: PainEntry) -> &[PainEntry] {
        self.entries.push(entry);
        &self.entries
    }

    /// Replaces the whole sequence (hydration from storage).
    pub fn replace_all(&mut self, entries: Vec<PainEntry>) {
        self.entries = entries;
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[PainEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find(&self, id: EntryId) -> Option<&PainEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Entries sorted most recent first; ties keep insertion order.
    pub fn by_recency(&self) -> Vec<PainEntry> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|left, right| right.timestamp.cmp(&left.timestamp));
        sorted
    }

    /// Entries sorted oldest first (chart order); ties keep insertion order.
    pub fn chronological(&self) -> Vec<PainEntry> {
        let mut sorted = self.entries.clone();
        sorted.sort_by_key(|entry| entry.timestamp);
        sorted
    }
}
