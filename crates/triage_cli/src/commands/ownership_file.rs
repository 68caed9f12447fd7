//! Inspecting the repository's ownership file.

use miette::Result;
use owo_colors::OwoColorize;
use triage_core::TriageConfig;
use triage_core::strategy::OwnershipFileResolver;

use crate::helpers::get_db;
use crate::output::Output;

/// Show which rule covers `path` and who its identifiers resolve to.
pub async fn check(path: &str, config: &TriageConfig) -> Result<()> {
    let output = Output::new();
    let db = get_db(config).await?;
    let ownership = &config.ownership;
    let resolver = OwnershipFileResolver::new(
        db,
        &ownership.repository_root,
        ownership.ownership_file_paths.clone(),
        &ownership.email_domain,
    );

    let Some((file_path, file)) = resolver.load().await else {
        let candidates: Vec<String> = ownership
            .ownership_file_paths
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        output.warning(&format!(
            "No ownership file under {} (looked for {})",
            ownership.repository_root.display(),
            candidates.join(", ")
        ));
        return Ok(());
    };

    output.info("File:", &file_path.display().to_string());
    output.kv("Rules", &file.rules.len().to_string());

    let Some(rule) = file.matching_rule(path) else {
        output.warning(&format!("No rule covers {path}"));
        return Ok(());
    };
    output.info(
        "Rule:",
        &format!("line {}: {}", rule.line, rule.pattern.bright_yellow()),
    );

    let mut rows = Vec::with_capacity(rule.identifiers.len());
    for identifier in &rule.identifiers {
        let resolved = resolver
            .resolve_identifier(identifier)
            .await?
            .map(|owner| format!("{} <{}>", owner.name, owner.email))
            .unwrap_or_else(|| "(unknown)".dimmed().to_string());
        rows.push(vec![identifier.clone(), resolved]);
    }
    output.table(&["Identifier", "Owner"], rows);
    Ok(())
}
