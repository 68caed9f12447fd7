//! Error record queries.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::DbResult;
use crate::models::ErrorRecord;

const ERROR_COLUMNS: &str = "id, message, exception_kind, stack_trace, location, severity, status, \
     owner_id, occurred_at, created_at, updated_at";

/// Store a captured error.
pub async fn create_error(pool: &SqlitePool, error: &ErrorRecord) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO errors (id, message, exception_kind, stack_trace, location, severity, status,
                            owner_id, occurred_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&error.id)
    .bind(&error.message)
    .bind(error.exception_kind)
    .bind(&error.stack_trace)
    .bind(&error.location)
    .bind(error.severity)
    .bind(error.status)
    .bind(&error.owner_id)
    .bind(error.occurred_at)
    .bind(error.created_at)
    .bind(error.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Get an error by ID.
pub async fn get_error(pool: &SqlitePool, id: &str) -> DbResult<Option<ErrorRecord>> {
    let error = sqlx::query_as::<_, ErrorRecord>(&format!(
        "SELECT {ERROR_COLUMNS} FROM errors WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(error)
}

/// List errors that have no owner yet, oldest first.
pub async fn list_unassigned_errors(pool: &SqlitePool) -> DbResult<Vec<ErrorRecord>> {
    let errors = sqlx::query_as::<_, ErrorRecord>(&format!(
        "SELECT {ERROR_COLUMNS} FROM errors WHERE owner_id IS NULL ORDER BY occurred_at, rowid"
    ))
    .fetch_all(pool)
    .await?;
    Ok(errors)
}

/// Record the resolved owner on an error.
pub async fn set_error_owner(pool: &SqlitePool, id: &str, owner_id: &str) -> DbResult<bool> {
    let result = sqlx::query("UPDATE errors SET owner_id = ?, updated_at = ? WHERE id = ?")
        .bind(owner_id)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
