use crate::config::Config;
use crate::error::Result;
use crate::migrate::Migrator;
use crate::output::{self, Format};

pub fn run(config: &Config, contact_id: i64, format: Format) -> Result<()> {
    let mut migrator = Migrator::from_config(config)?;
    migrator.remove(contact_id)?;
    output::print_removed(contact_id, format)
}
