//! At-rest obfuscation wrapper.
//!
//! Values are stored as `obf1:` followed by standard base64 of the UTF-8
//! payload. This hides entries from casual inspection; it is not encryption.
//!
//! # Invariants
//! - Reads always decode prefixed values, whatever the write mode, so a
//!   store stays readable after obfuscation is switched off.
//! - Values without the prefix are returned as-is (plaintext written by
//!   older builds or with obfuscation off).

use super::{KeyValueStore, StoreError, StoreResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

const PREFIX: &str = "obf1:";

/// Wraps any store; decodes on read and optionally obfuscates on write.
pub struct ObfuscatingStore<S> {
    inner: S,
    obfuscate_writes: bool,
}

impl<S: KeyValueStore> ObfuscatingStore<S> {
    /// Obfuscates every write.
    pub fn new(inner: S) -> Self {
        Self::with_writes(inner, true)
    }

    /// `obfuscate_writes = false` writes plaintext but still reads values
    /// obfuscated earlier.
    pub fn with_writes(inner: S, obfuscate_writes: bool) -> Self {
        Self {
            inner,
            obfuscate_writes,
        }
    }
}

fn encode(value: &str) -> String {
    format!("{PREFIX}{}", STANDARD.encode(value.as_bytes()))
}

fn decode(key: &str, stored: String) -> StoreResult<String> {
    let Some(payload) = stored.strip_prefix(PREFIX) else {
        return Ok(stored);
    };
    let corrupt = |message: String| StoreError::Corrupt {
        key: key.to_string(),
        message,
    };
    let bytes = STANDARD
        .decode(payload)
        .map_err(|err| corrupt(format!("invalid base64: {err}")))?;
    String::from_utf8(bytes).map_err(|err| corrupt(format!("invalid utf-8: {err}")))
}

impl<S: KeyValueStore> KeyValueStore for ObfuscatingStore<S> {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.inner
            .get(key)?
            .map(|stored| decode(key, stored))
            .transpose()
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        if self.obfuscate_writes {
            self.inner.set(key, &encode(value))
        } else {
            self.inner.set(key, value)
        }
    }

    fn list(&self) -> StoreResult<Vec<String>> {
        self.inner.list()
    }
}

#[cfg(test)]
mod tests {
    use super::ObfuscatingStore;
    use crate::store::{KeyValueStore, MemoryKeyValueStore, StoreError};

    #[test]
    fn values_are_not_stored_in_plaintext() {
        let raw = MemoryKeyValueStore::new();
        let store = ObfuscatingStore::new(raw.clone());

        store.set("entries", r#"[{"notes":"knee"}]"#).unwrap();

        let stored = raw.get("entries").unwrap().unwrap();
        assert!(stored.starts_with("obf1:"));
        assert!(!stored.contains("knee"));
        assert_eq!(
            store.get("entries").unwrap().as_deref(),
            Some(r#"[{"notes":"knee"}]"#)
        );
    }

    #[test]
    fn legacy_plaintext_is_passed_through() {
        let raw = MemoryKeyValueStore::new();
        raw.set("entries", "[]").unwrap();
        let store = ObfuscatingStore::new(raw);
        assert_eq!(store.get("entries").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn plaintext_writes_still_read_obfuscated_values() {
        let raw = MemoryKeyValueStore::new();
        ObfuscatingStore::new(raw.clone())
            .set("entries", "[1]")
            .unwrap();

        let store = ObfuscatingStore::with_writes(raw.clone(), false);
        assert_eq!(store.get("entries").unwrap().as_deref(), Some("[1]"));

        store.set("entries", "[1,2]").unwrap();
        assert_eq!(raw.get("entries").unwrap().as_deref(), Some("[1,2]"));
        assert_eq!(store.get("entries").unwrap().as_deref(), Some("[1,2]"));
    }

    #[test]
    fn broken_payload_is_corrupt() {
        let raw = MemoryKeyValueStore::new();
        raw.set("entries", "obf1:@@not-base64@@").unwrap();
        let store = ObfuscatingStore::new(raw);
        assert!(matches!(
            store.get("entries"),
            Err(StoreError::Corrupt { key, .. }) if key == "entries"
        ));
    }
}
