use thiserror::Error;

use crate::model::ElementType;

#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("contact {0} not found")]
    ContactNotFound(i64),

    #[error("{kind} source id {id} is outside the migrated id space (must be below {threshold})")]
    SourceIdOutOfRange {
        kind: ElementType,
        id: i64,
        threshold: i64,
    },

    #[error("contact {0} is already being migrated by another process")]
    MigrationInProgress(i64),

    #[error("migration of contact {contact_id} failed at {kind}: {source}")]
    Failed {
        contact_id: i64,
        kind: ElementType,
        #[source]
        source: Box<MigrateError>,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
}

impl MigrateError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ContactNotFound(_) => "contact_not_found",
            Self::SourceIdOutOfRange { .. } => "source_id_out_of_range",
            Self::MigrationInProgress(_) => "migration_in_progress",
            Self::Failed { .. } => "migration_failed",
            Self::Config(_) => "invalid_config",
            Self::Io(_) => "io_error",
            Self::Json(_) => "json_error",
            Self::Yaml(_) => "yaml_error",
            Self::Db(_) => "db_error",
        }
    }

    /// Attach the migrating contact and the stage that failed.
    pub fn during(self, contact_id: i64, kind: ElementType) -> Self {
        match self {
            already @ Self::Failed { .. } => already,
            other => Self::Failed {
                contact_id,
                kind,
                source: Box::new(other),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, MigrateError>;
