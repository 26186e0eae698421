//! Migration of whole contact aggregates from the system of record.
//!
//! One call to [`Migrator::migrate`] is one unit of work: a prior aggregate for
//! the same person is removed, the new one is written, and the correlation
//! report is built, all inside a single immediate SQLite transaction.

pub mod extract;
pub mod guard;
pub mod report;

use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{MigrateError, Result};
use crate::model::{ElementType, MigrateContactRequest};
use crate::store::db::Db;
use crate::store::lock;
use crate::store::port::{ContactPort, SqlitePort};

pub use report::MigrateContactResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Guarded,
    TopLevelSaved,
    ChildrenSaved,
    Assembled,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Received => write!(f, "received"),
            Self::Guarded => write!(f, "guarded"),
            Self::TopLevelSaved => write!(f, "top_level_saved"),
            Self::ChildrenSaved => write!(f, "children_saved"),
            Self::Assembled => write!(f, "assembled"),
        }
    }
}

/// Result of running the stages against a port.
#[derive(Debug, Clone, PartialEq)]
pub struct Migrated {
    /// A previous migration of the same person was deleted first.
    pub replaced: bool,
    pub response: MigrateContactResponse,
}

/// Reject records carrying ids from the locally generated range.
pub fn check_id_space(request: &MigrateContactRequest, threshold: i64) -> Result<()> {
    match request
        .source_ids()
        .into_iter()
        .find(|(_, id)| *id >= threshold)
    {
        Some((kind, id)) => Err(MigrateError::SourceIdOutOfRange {
            kind,
            id,
            threshold,
        }),
        None => Ok(()),
    }
}

/// Run guard, extraction and assembly against `port`. The caller owns the
/// unit of work and must discard it if this returns an error.
pub fn run<P: ContactPort>(port: &P, request: &MigrateContactRequest) -> Result<Migrated> {
    let contact_id = request.person_id;
    debug!(contact_id, stage = %Stage::Received);

    let replaced = guard::remove_existing(port, contact_id)?;
    if replaced {
        warn!(contact_id, "replacing previously migrated contact");
    }
    debug!(contact_id, stage = %Stage::Guarded, replaced);

    let contact = extract::contact(port, request)?;
    debug!(contact_id, stage = %Stage::TopLevelSaved);

    let extracted = extract::children(port, contact, request)?;
    debug!(contact_id, stage = %Stage::ChildrenSaved);

    let response = report::assemble(&extracted);
    debug!(contact_id, stage = %Stage::Assembled);

    Ok(Migrated { replaced, response })
}

pub struct Migrator {
    db: Db,
    lock_dir: Option<PathBuf>,
}

impl Migrator {
    pub fn new(db: Db) -> Self {
        Self { db, lock_dir: None }
    }

    /// Hold a per-person file lock under `dir` for the duration of each migration.
    pub fn with_lock_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.lock_dir = Some(dir.into());
        self
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let db = if config.is_memory() {
            Db::open_memory(config.id_threshold)?
        } else {
            Db::open(&config.database, config.id_threshold)?
        };
        db.set_busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        let migrator = Self::new(db);
        Ok(match config.effective_lock_dir() {
            Some(dir) => migrator.with_lock_dir(dir),
            None => migrator,
        })
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    pub fn migrate(&mut self, request: &MigrateContactRequest) -> Result<MigrateContactResponse> {
        Ok(self.migrate_detailed(request)?.response)
    }

    /// As [`Migrator::migrate`], also reporting whether an earlier migration
    /// was replaced.
    pub fn migrate_detailed(&mut self, request: &MigrateContactRequest) -> Result<Migrated> {
        let contact_id = request.person_id;
        check_id_space(request, self.db.id_threshold())?;

        let held = match &self.lock_dir {
            Some(dir) => Some(lock::acquire_lock(dir, contact_id)?),
            None => None,
        };

        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("migrate_contact", contact_id, %run_id);
        let _entered = span.enter();
        info!("migration started");

        let tx = self
            .db
            .immediate_transaction()
            .map_err(|e| e.during(contact_id, ElementType::Contact))?;
        let migrated = match run(&SqlitePort::new(&tx), request) {
            Ok(migrated) => migrated,
            Err(err) => {
                warn!(code = err.code(), error = %err, "migration rolled back");
                return Err(err);
            }
        };
        tx.commit()
            .map_err(|e| MigrateError::from(e).during(contact_id, ElementType::Contact))?;

        if let Some(file) = held {
            lock::release_lock(file)?;
        }

        info!(
            replaced = migrated.replaced,
            entries = migrated.response.entries().len(),
            "migration committed"
        );
        Ok(migrated)
    }

    /// Administrative removal of a migrated aggregate.
    pub fn remove(&mut self, contact_id: i64) -> Result<()> {
        let held = match &self.lock_dir {
            Some(dir) => Some(lock::acquire_lock(dir, contact_id)?),
            None => None,
        };
        let tx = self.db.immediate_transaction()?;
        if !guard::remove_existing(&SqlitePort::new(&tx), contact_id)? {
            return Err(MigrateError::ContactNotFound(contact_id));
        }
        tx.commit()?;
        if let Some(file) = held {
            lock::release_lock(file)?;
        }
        info!(contact_id, "contact removed");
        Ok(())
    }
}
