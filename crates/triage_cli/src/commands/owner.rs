//! Owner directory management.

use miette::{IntoDiagnostic, Result};
use owo_colors::OwoColorize;
use triage_core::TriageConfig;
use triage_db::{Owner, queries};

use crate::helpers::{get_db, require_owner};
use crate::output::{Output, active_label};

pub async fn add(
    name: &str,
    email: &str,
    external_id: Option<&str>,
    config: &TriageConfig,
) -> Result<()> {
    let output = Output::new();
    let db = get_db(config).await?;

    let mut owner = Owner::new(name, email);
    if let Some(handle) = external_id {
        owner = owner.with_external_id(handle);
    }
    queries::create_owner(db.pool(), &owner).await?;

    output.success(&format!("Added owner {}", owner.name.bright_cyan()));
    output.kv("ID", &owner.id);
    output.kv("Email", &owner.email);
    if let Some(handle) = &owner.external_id {
        output.kv("Handle", handle);
    }
    Ok(())
}

pub async fn list(config: &TriageConfig) -> Result<()> {
    let output = Output::new();
    let db = get_db(config).await?;

    let owners = queries::list_owners(db.pool()).await.into_diagnostic()?;
    if owners.is_empty() {
        output.info("No owners found", "Add one with: triage owner add <name> <email>");
        return Ok(());
    }

    let rows = owners
        .into_iter()
        .map(|owner| {
            vec![
                owner.name,
                owner.email,
                owner.external_id.unwrap_or_default(),
                active_label(owner.active),
                owner.id,
            ]
        })
        .collect();
    output.table(&["Name", "Email", "Handle", "Status", "ID"], rows);
    Ok(())
}

pub async fn deactivate(key: &str, config: &TriageConfig) -> Result<()> {
    let output = Output::new();
    let db = get_db(config).await?;

    let owner = require_owner(&db, key).await?;
    queries::set_owner_active(db.pool(), &owner.id, false)
        .await
        .into_diagnostic()?;

    output.success(&format!("Deactivated {}", owner.name.bright_cyan()));
    output.status("Their pattern rules stay registered; team conventions skip inactive owners.");
    Ok(())
}
