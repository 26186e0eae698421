use std::fs;
use std::io::{self, Read};
use std::path::Path;

use crate::config::Config;
use crate::error::Result;
use crate::migrate::Migrator;
use crate::model::MigrateContactRequest;
use crate::output::{self, Format};

/// Read one migration record from `input` (`-` for stdin).
pub fn read_request(input: &Path) -> Result<MigrateContactRequest> {
    let raw = if input.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(input)?
    };
    Ok(serde_json::from_str(&raw)?)
}

pub fn run(config: &Config, input: &Path, format: Format) -> Result<()> {
    let request = read_request(input)?;
    let mut migrator = Migrator::from_config(config)?;
    let migrated = migrator.migrate_detailed(&request)?;
    output::print_report(&migrated.response, migrated.replaced, format)
}
