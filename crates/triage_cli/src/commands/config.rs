//! Configuration and catalog inspection.

use miette::{IntoDiagnostic, Result};
use triage_core::TriageConfig;

use crate::helpers::get_db;
use crate::output::Output;

/// Print the effective configuration as TOML.
pub fn show(config: &TriageConfig) -> Result<()> {
    println!("{}", config.to_toml()?);
    Ok(())
}

pub async fn stats(config: &TriageConfig) -> Result<()> {
    let output = Output::new();
    let db = get_db(config).await?;
    let stats = db.stats().await.into_diagnostic()?;

    output.info("Database:", &config.database.path.display().to_string());
    output.kv("Owners", &stats.owner_count.to_string());
    output.kv("Active rules", &stats.active_rule_count.to_string());
    output.kv("Errors", &stats.error_count.to_string());
    output.kv("Unassigned", &stats.unassigned_error_count.to_string());
    Ok(())
}
