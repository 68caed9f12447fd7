//! Error types for the database layer.

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// Database error types.
#[derive(Debug, Error, Diagnostic)]
pub enum DbError {
    /// SQLite/sqlx error
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("Migration error: {0}")]
    #[diagnostic(help("The database file may have been created by a newer triage version"))]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Entity not found
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Duplicate entity
    #[error("{entity_type} already exists: {id}")]
    AlreadyExists {
        entity_type: &'static str,
        id: String,
    },

    /// Invalid data
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// IO error (creating the database directory)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DbError {
    /// Create a not found error.
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Create an already exists error.
    pub fn already_exists(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            entity_type,
            id: id.into(),
        }
    }

    /// Create an invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Map a unique-constraint violation onto [`DbError::AlreadyExists`].
    pub(crate) fn from_insert(err: sqlx::Error, entity_type: &'static str, id: &str) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Self::already_exists(entity_type, id)
            }
            _ => Self::Sqlx(err),
        }
    }
}
