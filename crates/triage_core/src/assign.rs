//! Writing resolved owners back onto error records.

use tracing::info;
use triage_db::{ErrorCatalogDb, ErrorRecord, queries};

use crate::engine::{ResolutionEngine, ResolutionResult};
use crate::error::{Result, TriageError};

/// Resolve the owner of a record's trace and log the outcome.
///
/// Does not persist anything; the record is left untouched.
pub async fn resolve_record(
    engine: &ResolutionEngine,
    record: &ErrorRecord,
) -> Result<ResolutionResult> {
    let result = engine.resolve(record.stack_trace.as_deref()).await?;
    match (&result.owner, result.strategy) {
        (Some(owner), Some(strategy)) => {
            info!(
                error_id = %record.id,
                owner_id = %owner.id,
                %strategy,
                "assigned owner {} to error {}",
                owner.name,
                record.id
            );
        }
        _ => {
            info!(
                error_id = %record.id,
                outcome = ?result.outcome,
                "could not resolve owner for error {}",
                record.id
            );
        }
    }
    Ok(result)
}

/// Resolve a stored error and persist its owner.
///
/// The owner is only written on a successful resolution; an unresolved error
/// keeps whatever owner it had.
pub async fn assign_owner(
    db: &ErrorCatalogDb,
    engine: &ResolutionEngine,
    error_id: &str,
) -> Result<ResolutionResult> {
    let record = queries::get_error(db.pool(), error_id)
        .await?
        .ok_or_else(|| TriageError::ErrorNotFound {
            id: error_id.to_string(),
        })?;

    let result = resolve_record(engine, &record).await?;
    if let Some(owner) = &result.owner {
        queries::set_error_owner(db.pool(), &record.id, &owner.id).await?;
    }
    Ok(result)
}

/// Run [`assign_owner`] over every error that has no owner yet.
///
/// Returns how many errors were assigned.
pub async fn assign_unassigned(db: &ErrorCatalogDb, engine: &ResolutionEngine) -> Result<usize> {
    let pending = queries::list_unassigned_errors(db.pool()).await?;
    let mut assigned = 0;
    for record in &pending {
        let result = resolve_record(engine, record).await?;
        if let Some(owner) = &result.owner {
            queries::set_error_owner(db.pool(), &record.id, &owner.id).await?;
            assigned += 1;
        }
    }
    info!(pending = pending.len(), assigned, "Finished assigning unowned errors");
    Ok(assigned)
}
