use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use triage_db::DbError;

/// Configuration-specific errors
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(String),

    #[error("Invalid value for field {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Error, Diagnostic, Debug)]
pub enum TriageError {
    #[error("Owner directory query failed")]
    #[diagnostic(
        code(triage_core::directory),
        help("The owner directory could not be read; ownership resolution cannot continue")
    )]
    Directory(#[from] DbError),

    #[error("Owner directory unavailable: {details}")]
    #[diagnostic(code(triage_core::directory_unavailable))]
    DirectoryUnavailable { details: String },

    #[error("Configuration error for field '{field}'")]
    #[diagnostic(
        code(triage_core::configuration_error),
        help("Check configuration file at {config_path}\nExpected: {expected}")
    )]
    Configuration {
        config_path: String,
        field: String,
        expected: String,
        #[source]
        cause: ConfigError,
    },

    #[error("Invalid glob pattern '{pattern}': {cause}")]
    #[diagnostic(
        code(triage_core::invalid_pattern),
        help("Patterns use shell glob syntax: `*` stays within one path segment, `**` spans directories")
    )]
    InvalidPattern { pattern: String, cause: String },

    #[error("Error record not found: {id}")]
    #[diagnostic(code(triage_core::error_not_found))]
    ErrorNotFound { id: String },
}

impl TriageError {
    pub fn directory_unavailable(details: impl Into<String>) -> Self {
        Self::DirectoryUnavailable {
            details: details.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TriageError>;
