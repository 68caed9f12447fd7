//! Triage Database Layer
//!
//! SQLite-based record store for the error catalog.
//!
//! # Architecture
//!
//! - **Owner directory** - owners, teams and team membership
//! - **Pattern rules** - owner-scoped path globs consulted by ownership resolution
//! - **Error records** - captured errors and their resolved owner
//!
//! # Usage
//!
//! ```rust,ignore
//! use triage_db::ErrorCatalogDb;
//!
//! let db = ErrorCatalogDb::open("path/to/triage.db").await?;
//! ```

pub mod connection;
pub mod error;
pub mod models;
pub mod queries;

pub use connection::ErrorCatalogDb;
pub use error::{DbError, DbResult};

pub use models::{
    ErrorRecord, ErrorStatus, ExceptionKind, Owner, PatternRule, Severity, Team, TeamMember,
    TeamRole,
};
