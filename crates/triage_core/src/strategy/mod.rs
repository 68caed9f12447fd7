//! Ownership resolution strategies.
//!
//! Each strategy looks at the extracted frames and either names an owner or
//! yields nothing. The engine tries them in a configured order and stops at
//! the first owner.
//!
//! Failures that are local to a strategy (no VCS tool, no ownership file,
//! unparseable output, unknown identifiers) are absorbed into `Ok(None)`.
//! Only owner directory failures come back as `Err`.

use core::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use triage_db::Owner;

use crate::Result;
use crate::frame::Frame;

pub mod blame;
pub mod convention;
pub mod glob;
pub mod ownership_file;
pub mod pattern_rule;

pub use blame::{
    BlameAttributor, BlameAuthor, BlameProvider, CachingBlameProvider, GitBlameProvider,
    parse_porcelain,
};
pub use convention::{ConventionResolver, DirectoryRole};
pub use ownership_file::{OwnershipFile, OwnershipFileResolver, OwnershipRule};
pub use pattern_rule::PatternRuleMatcher;

/// Identifies a strategy in configuration, results and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    PatternRule,
    Blame,
    OwnershipFile,
    Convention,
}

impl StrategyKind {
    pub const DEFAULT_ORDER: [StrategyKind; 4] = [
        Self::PatternRule,
        Self::Blame,
        Self::OwnershipFile,
        Self::Convention,
    ];
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PatternRule => write!(f, "pattern_rule"),
            Self::Blame => write!(f, "blame"),
            Self::OwnershipFile => write!(f, "ownership_file"),
            Self::Convention => write!(f, "convention"),
        }
    }
}

/// Why a strategy produced no owner for a frame or for the whole trace.
///
/// These are never returned as errors; they only appear in log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSkip {
    /// Blame tool missing or not usable in the repository
    ToolUnavailable,
    FileAbsent,
    FileUnreadable,
    /// A rule matched but none of its identifiers is a known owner
    NoIdentifierResolved,
    /// An author, rule or team that points at no known owner
    UnknownOwner,
}

impl fmt::Display for ResolutionSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ToolUnavailable => "tool_unavailable",
            Self::FileAbsent => "file_absent",
            Self::FileUnreadable => "file_unreadable",
            Self::NoIdentifierResolved => "no_identifier_resolved",
            Self::UnknownOwner => "unknown_owner",
        };
        f.write_str(s)
    }
}

/// One link in the resolution chain.
#[async_trait]
pub trait OwnershipStrategy: Send + Sync + fmt::Debug {
    fn kind(&self) -> StrategyKind;

    /// Attempt to attribute the frames to an owner.
    ///
    /// `frames` is never empty when called by the engine.
    async fn resolve(&self, frames: &[Frame]) -> Result<Option<Owner>>;
}
