use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MigrateError, Result};

pub const MEMORY_DATABASE: &str = ":memory:";

/// Source ids below this value come from the system of record; locally
/// generated ids start here.
pub const DEFAULT_ID_THRESHOLD: i64 = 20_000_000;

pub const ENV_DATABASE: &str = "CONTACT_MIGRATE_DB";
pub const ENV_ID_THRESHOLD: &str = "CONTACT_MIGRATE_ID_THRESHOLD";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub database: PathBuf,
    pub id_threshold: i64,
    pub busy_timeout_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: PathBuf::from("contacts.db"),
            id_threshold: DEFAULT_ID_THRESHOLD,
            busy_timeout_ms: 5_000,
            lock_dir: None,
        }
    }
}

impl Config {
    /// Defaults, then the YAML file if given, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_yaml_str(&fs::read_to_string(path)?)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db) = lookup(ENV_DATABASE).filter(|s| !s.is_empty()) {
            self.database = PathBuf::from(db);
        }
        if let Some(raw) = lookup(ENV_ID_THRESHOLD).filter(|s| !s.is_empty()) {
            self.id_threshold = raw.trim().parse().map_err(|_| {
                MigrateError::Config(format!("{ENV_ID_THRESHOLD} must be an integer, got '{raw}'"))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.id_threshold <= 1 {
            return Err(MigrateError::Config(format!(
                "id_threshold must be greater than 1, got {}",
                self.id_threshold
            )));
        }
        if self.database.as_os_str().is_empty() {
            return Err(MigrateError::Config("database path cannot be empty".into()));
        }
        Ok(())
    }

    pub fn is_memory(&self) -> bool {
        self.database.as_os_str() == MEMORY_DATABASE
    }

    /// Explicit lock directory, else `locks/` beside a file database.
    /// In-memory databases are private to one process and take no file lock.
    pub fn effective_lock_dir(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.lock_dir {
            return Some(dir.clone());
        }
        if self.is_memory() {
            return None;
        }
        let parent = self
            .database
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        Some(parent.join("locks"))
    }
}
