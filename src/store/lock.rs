use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{MigrateError, Result};

pub fn lock_path(lock_dir: &Path, contact_id: i64) -> PathBuf {
    lock_dir.join(format!("contact-{contact_id}.lock"))
}

/// Take the exclusive per-contact migration lock, returning the locked File.
/// The lock is released when the File is dropped.
pub fn acquire_lock(lock_dir: &Path, contact_id: i64) -> Result<File> {
    fs::create_dir_all(lock_dir)?;
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path(lock_dir, contact_id))?;

    file.try_lock_exclusive().map_err(|e| lock_error(contact_id, e))?;

    Ok(file)
}

/// Contention means another migration holds the lock; anything else is a
/// genuine I/O failure.
fn lock_error(contact_id: i64, err: io::Error) -> MigrateError {
    if err.kind() == fs2::lock_contended_error().kind() {
        MigrateError::MigrationInProgress(contact_id)
    } else {
        MigrateError::Io(err)
    }
}

/// Unlock before the handle goes out of scope.
pub fn release_lock(file: File) -> Result<()> {
    FileExt::unlock(&file)?;
    Ok(())
}
