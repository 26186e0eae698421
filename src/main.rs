use std::path::PathBuf;

use clap::{Parser, Subcommand};
use contact_migrate::config::Config;
use contact_migrate::output::Format;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "contact-migrate",
    version,
    about = "Migrate contact records from the system of record into the contacts store"
)]
struct Cli {
    /// Output format
    #[arg(long, global = true, value_enum, default_value = "json")]
    format: Format,
    /// Shorthand for --format pretty
    #[arg(long, global = true, hide = true)]
    pretty: bool,
    /// SQLite database path (overrides config and CONTACT_MIGRATE_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and schema
    Init,
    /// Migrate one contact record (JSON) and print the id correlation report
    Migrate {
        /// Record file, or `-` for stdin
        input: PathBuf,
    },
    /// Display a migrated contact
    Show {
        /// Source person id
        id: i64,
    },
    /// Delete a migrated contact and everything beneath it
    Delete {
        /// Source person id
        id: i64,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli, format: Format) -> contact_migrate::error::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.database = db;
    }
    config.validate()?;

    match cli.command {
        Commands::Init => contact_migrate::commands::init::run(&config),
        Commands::Migrate { input } => {
            contact_migrate::commands::migrate::run(&config, &input, format)
        }
        Commands::Show { id } => contact_migrate::commands::show::run(&config, id, format),
        Commands::Delete { id } => contact_migrate::commands::delete::run(&config, id, format),
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let format = if cli.pretty {
        Format::Pretty
    } else {
        cli.format
    };
    if let Err(e) = run(cli, format) {
        match format {
            Format::Json => {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "error": e.code(),
                        "message": e.to_string()
                    })
                );
            }
            _ => eprintln!("error: {e}"),
        }
        std::process::exit(1);
    }
}
