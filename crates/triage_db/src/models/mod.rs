//! Database models.
//!
//! These structs map directly to database tables via sqlx.

mod owner;
mod record;
mod team;

pub use owner::{Owner, PatternRule};
pub use record::{ErrorRecord, ErrorStatus, ExceptionKind, Severity};
pub use team::{Team, TeamMember, TeamRole, slugify};
