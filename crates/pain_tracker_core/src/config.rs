//! Core configuration.
//!
//! # Responsibility
//! - Describe where entries are stored and how the core logs.
//! - Load settings from JSON and environment overrides.
//! - Open the configured store stack.
//!
//! # Invariants
//! - Every field has a default; an empty JSON object is a valid config.
//! - `validate()` runs before any store is opened.

use crate::logging::{default_log_level, normalize_level};
use crate::repo::entry_repo::{EntryRepository, DEFAULT_ENTRIES_KEY};
use crate::store::{
    KeyValueStore, MemoryKeyValueStore, ObfuscatingStore, SqliteKeyValueStore, StoreResult,
};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DEFAULT_NAMESPACE: &str = "pain_tracker";

pub const ENV_DB_PATH: &str = "PAIN_TRACKER_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "PAIN_TRACKER_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "PAIN_TRACKER_LOG_DIR";
pub const ENV_OBFUSCATE: &str = "PAIN_TRACKER_OBFUSCATE";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config JSON: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

/// Storage and logging settings for one process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// Key-value namespace inside the SQLite store.
    pub namespace: String,
    /// Key holding the entry sequence.
    pub entries_key: String,
    /// SQLite file; `None` keeps entries in memory only.
    pub db_path: Option<PathBuf>,
    pub obfuscate_at_rest: bool,
    pub log_level: String,
    /// Log directory; `None` disables file logging.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            entries_key: DEFAULT_ENTRIES_KEY.to_string(),
            db_path: None,
            obfuscate_at_rest: false,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    pub fn from_json_str(input: &str) -> ConfigResult<Self> {
        serde_json::from_str(input).map_err(ConfigError::Parse)
    }

    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Applies `PAIN_TRACKER_*` environment overrides.
    pub fn apply_env_overrides(&mut self) -> ConfigResult<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Applies overrides from an arbitrary variable lookup.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> ConfigResult<()> {
        if let Some(path) = lookup(ENV_DB_PATH).filter(|value| !value.trim().is_empty()) {
            self.db_path = Some(PathBuf::from(path.trim()));
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.log_level = level;
        }
        if let Some(dir) = lookup(ENV_LOG_DIR).filter(|value| !value.trim().is_empty()) {
            self.log_dir = Some(PathBuf::from(dir.trim()));
        }
        if let Some(flag) = lookup(ENV_OBFUSCATE) {
            self.obfuscate_at_rest = parse_flag(ENV_OBFUSCATE, &flag)?;
        }
        Ok(())
    }

    /// Rejects settings that cannot be used.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.namespace.trim().is_empty() {
            return Err(ConfigError::Invalid("namespace cannot be empty".to_string()));
        }
        if self.entries_key.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "entries_key cannot be empty".to_string(),
            ));
        }
        normalize_level(&self.log_level).map_err(|err| ConfigError::Invalid(err.to_string()))?;
        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log_dir must be an absolute path, got `{}`",
                    dir.display()
                )));
            }
        }
        Ok(())
    }

    /// Opens the configured store stack.
    pub fn open_store(&self) -> StoreResult<Box<dyn KeyValueStore>> {
        let base: Box<dyn KeyValueStore> = match &self.db_path {
            Some(path) => Box::new(SqliteKeyValueStore::open(path, self.namespace.as_str())?),
            None => Box::new(MemoryKeyValueStore::new()),
        };

        // Prefixed values decode on read whatever the flag says.
        Ok(Box::new(ObfuscatingStore::with_writes(
            base,
            self.obfuscate_at_rest,
        )))
    }

    /// Opens the configured store and wraps it in an entry repository.
    pub fn open_repository(&self) -> StoreResult<EntryRepository<Box<dyn KeyValueStore>>> {
        Ok(EntryRepository::with_key(
            self.open_store()?,
            self.entries_key.as_str(),
        ))
    }
}

fn parse_flag(name: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid(format!(
            "{name} must be a boolean flag, got `{other}`"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, ENV_DB_PATH, ENV_LOG_LEVEL, ENV_OBFUSCATE};
    use crate::model::entry::PainEntry;
    use crate::store::KeyValueStore;
    use std::collections::HashMap;
    use std::path::PathBuf;

    #[test]
    fn empty_object_yields_defaults() {
        let config = CoreConfig::from_json_str("{}").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.entries_key, "pain_tracker_entries");
        config.validate().unwrap();
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = CoreConfig::from_json_str(r#"{"namespce":"x"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn overrides_replace_file_values() {
        let vars = HashMap::from([
            (ENV_DB_PATH, "/tmp/pain.sqlite3"),
            (ENV_LOG_LEVEL, "warning"),
            (ENV_OBFUSCATE, "yes"),
        ]);
        let mut config = CoreConfig::default();
        config
            .apply_overrides(|name| vars.get(name).map(|value| value.to_string()))
            .unwrap();

        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/pain.sqlite3")));
        assert_eq!(config.log_level, "warning");
        assert!(config.obfuscate_at_rest);
        config.validate().unwrap();
    }

    #[test]
    fn bad_flag_and_bad_level_are_invalid() {
        let mut config = CoreConfig::default();
        let err = config
            .apply_overrides(|name| (name == ENV_OBFUSCATE).then(|| "maybe".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("boolean flag"));

        config.log_level = "loud".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn relative_log_dir_is_invalid() {
        let config = CoreConfig {
            log_dir: Some(PathBuf::from("logs")),
            ..CoreConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn entries_stay_readable_after_obfuscation_is_switched_off() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = CoreConfig {
            db_path: Some(dir.path().join("pain.sqlite3")),
            obfuscate_at_rest: true,
            ..CoreConfig::default()
        };
        let entry: PainEntry = serde_json::from_str(
            r#"{"id":1,"timestamp":"2026-02-01T08:00:00Z","baselineData":{"pain":6}}"#,
        )
        .unwrap();
        config.open_repository().unwrap().append(&entry).unwrap();

        config.obfuscate_at_rest = false;
        let repo = config.open_repository().unwrap();
        assert_eq!(repo.load_all().unwrap(), vec![entry.clone()]);

        let second = PainEntry { id: 2, ..entry };
        assert_eq!(repo.append(&second).unwrap(), 2);

        config.obfuscate_at_rest = true;
        let ids = config
            .open_repository()
            .unwrap()
            .load_all()
            .unwrap()
            .into_iter()
            .map(|entry| entry.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn obfuscated_sqlite_store_roundtrips_values() {
        let dir = tempfile::tempdir().unwrap();
        let config = CoreConfig {
            db_path: Some(dir.path().join("pain.sqlite3")),
            obfuscate_at_rest: true,
            ..CoreConfig::default()
        };
        let store = config.open_store().unwrap();
        store.set("k", "value").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("value"));
        assert_eq!(store.list().unwrap(), vec!["k".to_string()]);
    }
}
