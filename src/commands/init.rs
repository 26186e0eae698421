use std::fs;

use crate::config::Config;
use crate::error::Result;
use crate::migrate::Migrator;

pub fn run(config: &Config) -> Result<()> {
    if !config.is_memory()
        && let Some(parent) = config.database.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let migrator = Migrator::from_config(config)?;
    if let Some(dir) = config.effective_lock_dir() {
        fs::create_dir_all(dir)?;
    }

    eprintln!(
        "Initialized {} (generated ids start at {})",
        config.database.display(),
        migrator.db().id_threshold()
    );
    Ok(())
}
