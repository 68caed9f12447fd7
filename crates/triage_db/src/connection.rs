//! Database connection management.

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::error::DbResult;

/// Connection to the error catalog database.
#[derive(Debug, Clone)]
pub struct ErrorCatalogDb {
    pool: SqlitePool,
}

impl ErrorCatalogDb {
    /// Open the catalog at `path`, creating the file and its directory on first
    /// use, and bring the schema up to date.
    pub async fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        info!("Opening error catalog database: {}", path.display());

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .pragma("synchronous", "NORMAL")
            .pragma("temp_store", "MEMORY")
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        debug!("Catalog pool ready");

        Self::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    /// Open a throwaway catalog held in memory.
    pub async fn open_in_memory() -> DbResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(":memory:")
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            // each connection would otherwise get its own empty catalog
            .max_connections(1)
            .connect_with(options)
            .await?;

        Self::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
        sqlx::migrate!("./migrations").run(pool).await?;
        debug!("Catalog schema up to date");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Round-trip a trivial query.
    pub async fn health_check(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Owner, rule and error counts for `triage config stats`.
    pub async fn stats(&self) -> DbResult<DbStats> {
        let owners: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM owners")
            .fetch_one(&self.pool)
            .await?;

        let rules: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pattern_rules WHERE active = 1")
            .fetch_one(&self.pool)
            .await?;

        let errors: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM errors")
            .fetch_one(&self.pool)
            .await?;

        let unassigned: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM errors WHERE owner_id IS NULL")
                .fetch_one(&self.pool)
                .await?;

        Ok(DbStats {
            owner_count: owners.0 as u64,
            active_rule_count: rules.0 as u64,
            error_count: errors.0 as u64,
            unassigned_error_count: unassigned.0 as u64,
        })
    }
}

#[derive(Debug, Clone)]
pub struct DbStats {
    pub owner_count: u64,
    pub active_rule_count: u64,
    pub error_count: u64,
    pub unassigned_error_count: u64,
}
