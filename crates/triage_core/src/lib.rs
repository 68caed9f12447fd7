//! Triage Core - Ownership Resolution
//!
//! Given the stack trace of a captured error, work out who owns it. Frames
//! are extracted from the trace and handed to a chain of strategies (pattern
//! rules, VCS blame, the repository's ownership file, directory conventions)
//! until one of them names an owner.

pub mod assign;
pub mod capture;
pub mod config;
pub mod directory;
pub mod engine;
pub mod error;
pub mod frame;
pub mod strategy;

#[cfg(test)]
pub mod test_helpers;

pub use assign::{assign_owner, assign_unassigned, resolve_record};
pub use capture::{CapturePolicy, ErrorReport, capture_error, extract_location};
pub use config::{TriageConfig, load_config, load_config_or_default};
pub use directory::OwnerDirectory;
pub use engine::{
    EngineBuilder, ResolutionEngine, ResolutionOutcome, ResolutionResult, ResolutionState,
};
pub use error::{ConfigError, Result, TriageError};
pub use frame::{Frame, FrameExtractor};
pub use strategy::{OwnershipStrategy, ResolutionSkip, StrategyKind};

/// The record store the engine reads owners from and writes assignments to.
pub use triage_db as db;
