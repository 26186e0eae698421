use crate::config::Config;
use crate::error::{MigrateError, Result};
use crate::migrate::Migrator;
use crate::output::{self, Format};

pub fn run(config: &Config, contact_id: i64, format: Format) -> Result<()> {
    let migrator = Migrator::from_config(config)?;
    let aggregate = migrator
        .db()
        .load_aggregate(contact_id)?
        .ok_or(MigrateError::ContactNotFound(contact_id))?;
    output::print_aggregate(&aggregate, format)
}
