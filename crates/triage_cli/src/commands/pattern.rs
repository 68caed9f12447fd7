//! Owner pattern rules.

use miette::{IntoDiagnostic, Result};
use owo_colors::OwoColorize;
use triage_core::TriageConfig;
use triage_core::strategy::glob;
use triage_db::{PatternRule, queries};

use crate::helpers::{find_owner, get_db, require_owner};
use crate::output::{Output, active_label};

pub async fn add(
    owner: &str,
    pattern: &str,
    description: Option<&str>,
    config: &TriageConfig,
) -> Result<()> {
    let output = Output::new();

    // Reject patterns that could never match before touching the database
    glob::compile(pattern)?;

    let db = get_db(config).await?;
    let owner = require_owner(&db, owner).await?;

    let mut rule = PatternRule::new(&owner.id, pattern);
    rule.description = description.map(String::from);
    queries::create_pattern_rule(db.pool(), &rule).await?;

    output.success(&format!(
        "{} now owns {}",
        owner.name.bright_cyan(),
        rule.pattern.bright_yellow()
    ));
    output.kv("Rule ID", &rule.id);
    Ok(())
}

/// List rules, for one owner or all active ones.
pub async fn list(owner: Option<&str>, config: &TriageConfig) -> Result<()> {
    let output = Output::new();
    let db = get_db(config).await?;

    let rules = match owner {
        Some(key) => {
            let owner = require_owner(&db, key).await?;
            queries::list_pattern_rules_for_owner(db.pool(), &owner.id)
                .await
                .into_diagnostic()?
        }
        None => queries::list_active_pattern_rules(db.pool())
            .await
            .into_diagnostic()?,
    };

    if rules.is_empty() {
        output.info(
            "No pattern rules",
            "Add one with: triage pattern add <owner> <glob>",
        );
        return Ok(());
    }

    let mut rows = Vec::with_capacity(rules.len());
    for rule in rules {
        let owner_name = find_owner(&db, &rule.owner_id)
            .await?
            .map(|o| o.name)
            .unwrap_or_else(|| "(unknown)".to_string());
        rows.push(vec![
            rule.pattern,
            owner_name,
            rule.description.unwrap_or_default(),
            active_label(rule.active),
            rule.id,
        ]);
    }
    output.table(&["Pattern", "Owner", "Description", "Status", "ID"], rows);
    Ok(())
}

pub async fn disable(rule_id: &str, config: &TriageConfig) -> Result<()> {
    let output = Output::new();
    let db = get_db(config).await?;

    let updated = queries::set_pattern_rule_active(db.pool(), rule_id, false)
        .await
        .into_diagnostic()?;
    if !updated {
        return Err(miette::miette!("Pattern rule '{}' not found", rule_id));
    }
    output.success(&format!("Disabled pattern rule {rule_id}"));
    Ok(())
}
