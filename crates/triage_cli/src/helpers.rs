//! Shared helper functions for CLI commands
//!
//! - `get_db()` opens the catalog named by the configuration
//! - `build_engine()` assembles the resolution engine over that catalog
//! - `require_owner()` / `require_team()` look entities up or fail with a
//!   readable error
//! - `read_trace()` loads stack trace text from an argument, a file or stdin

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use miette::{IntoDiagnostic, Result};
use triage_core::{ResolutionEngine, TriageConfig};
use triage_db::{ErrorCatalogDb, Owner, Team, queries};

/// Open the catalog database from the config.
pub async fn get_db(config: &TriageConfig) -> Result<Arc<ErrorCatalogDb>> {
    let db = ErrorCatalogDb::open(&config.database.path)
        .await
        .map_err(|e| miette::miette!("Failed to open database: {}", e))?;
    Ok(Arc::new(db))
}

pub fn build_engine(config: &TriageConfig, db: Arc<ErrorCatalogDb>) -> Result<ResolutionEngine> {
    Ok(ResolutionEngine::from_config(config, db)?)
}

/// Find an owner by id, email or exact name.
pub async fn find_owner(db: &ErrorCatalogDb, key: &str) -> Result<Option<Owner>> {
    let pool = db.pool();
    if let Some(owner) = queries::get_owner(pool, key).await.into_diagnostic()? {
        return Ok(Some(owner));
    }
    if let Some(owner) = queries::get_owner_by_email(pool, key).await.into_diagnostic()? {
        return Ok(Some(owner));
    }
    queries::get_owner_by_name(pool, key).await.into_diagnostic()
}

pub async fn require_owner(db: &ErrorCatalogDb, key: &str) -> Result<Owner> {
    find_owner(db, key).await?.ok_or_else(|| {
        miette::miette!(
            "Owner '{}' not found. List owners with: triage owner list",
            key
        )
    })
}

pub async fn require_team(db: &ErrorCatalogDb, name: &str) -> Result<Team> {
    queries::get_team_by_name(db.pool(), name)
        .await
        .into_diagnostic()?
        .ok_or_else(|| miette::miette!("Team '{}' not found. Create it with: triage team add", name))
}

/// Trace text from `--trace`, `--trace-file`, or stdin when neither is given.
pub fn read_trace(trace: Option<&str>, trace_file: Option<&Path>) -> Result<String> {
    if let Some(trace) = trace {
        return Ok(trace.to_string());
    }
    if let Some(path) = trace_file {
        return std::fs::read_to_string(path)
            .map_err(|e| miette::miette!("Failed to read trace file {}: {}", path.display(), e));
    }
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf).into_diagnostic()?;
    Ok(buf)
}
