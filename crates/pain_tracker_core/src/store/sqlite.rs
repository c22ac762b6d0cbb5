//! SQLite-backed key-value store.
//!
//! # Responsibility
//! - Open a SQLite file (or in-memory database) holding the `kv_store` table.
//! - Serve namespaced get/set/list over that table.
//!
//! # Invariants
//! - The table layout is versioned through `PRAGMA user_version`; a file
//!   written by a newer layout is refused, never rewritten.
//! - Every read/write is scoped to the store's namespace.
//! - `set` is an upsert; `updated_at` tracks the last write in epoch ms.

use super::{KeyValueStore, StoreError, StoreResult};
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::time::{Duration, Instant};

/// Layout version written to `PRAGMA user_version`.
const SCHEMA_VERSION: u32 = 1;
const SCHEMA_SQL: &str = include_str!("kv_store.sql");
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Key-value store over the `kv_store` table.
pub struct SqliteKeyValueStore {
    conn: Connection,
    namespace: String,
}

impl SqliteKeyValueStore {
    /// Opens (creating if needed) a database file.
    ///
    /// # Side effects
    /// - Creates the file and the `kv_store` table when absent.
    /// - Emits `store_open` logging events with duration and status.
    pub fn open(path: impl AsRef<Path>, namespace: impl Into<String>) -> StoreResult<Self> {
        let path = path.as_ref();
        Self::open_with("file", namespace.into(), || Connection::open(path))
    }

    /// Opens a private in-memory database; contents vanish on drop.
    pub fn open_in_memory(namespace: impl Into<String>) -> StoreResult<Self> {
        Self::open_with("memory", namespace.into(), Connection::open_in_memory)
    }

    fn open_with(
        mode: &'static str,
        namespace: String,
        open: impl FnOnce() -> rusqlite::Result<Connection>,
    ) -> StoreResult<Self> {
        if namespace.trim().is_empty() {
            return Err(StoreError::Unavailable(
                "store namespace cannot be empty".to_string(),
            ));
        }

        let started_at = Instant::now();
        let prepared = open()
            .map_err(StoreError::from)
            .and_then(|mut conn| prepare_schema(&mut conn).map(|()| conn));

        match prepared {
            Ok(conn) => {
                info!(
                    "event=store_open module=store status=ok mode={mode} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(Self { conn, namespace })
            }
            Err(err) => {
                error!(
                    "event=store_open module=store status=error mode={mode} duration_ms={} error_code=store_open_failed error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }
}

/// Creates the table on a fresh database and checks the layout version on
/// an existing one.
fn prepare_schema(conn: &mut Connection) -> StoreResult<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    let found: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;

    match found {
        SCHEMA_VERSION => Ok(()),
        0 => {
            let tx = conn.transaction()?;
            tx.execute_batch(SCHEMA_SQL)?;
            tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
            tx.commit()?;
            info!(
                "event=store_schema module=store status=ok action=create version={SCHEMA_VERSION}"
            );
            Ok(())
        }
        newer => Err(StoreError::SchemaTooNew {
            found: newer,
            supported: SCHEMA_VERSION,
        }),
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE namespace = ?1 AND key = ?2;",
                params![self.namespace.as_str(), key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO kv_store (namespace, key, value)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(namespace, key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![self.namespace.as_str(), key, value],
        )?;
        Ok(())
    }

    fn list(&self) -> StoreResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM kv_store WHERE namespace = ?1 ORDER BY key ASC;")?;
        let mut rows = stmt.query([self.namespace.as_str()])?;
        let mut keys = Vec::new();
        while let Some(row) = rows.next()? {
            keys.push(row.get("key")?);
        }
        Ok(keys)
    }
}
