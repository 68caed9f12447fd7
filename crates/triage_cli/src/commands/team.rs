//! Team management. Teams feed the directory convention strategy.

use miette::{IntoDiagnostic, Result};
use owo_colors::OwoColorize;
use triage_core::TriageConfig;
use triage_db::{Team, TeamRole, queries};

use crate::helpers::{get_db, require_owner, require_team};
use crate::output::{Output, active_label};

pub async fn add(name: &str, config: &TriageConfig) -> Result<()> {
    let output = Output::new();
    let db = get_db(config).await?;

    let team = Team::new(name);
    queries::create_team(db.pool(), &team).await?;

    output.success(&format!("Created team {}", team.name.bright_cyan()));
    output.kv("ID", &team.id);
    output.kv("Slug", &team.slug);

    let mapped: Vec<&str> = config
        .conventions
        .team_keywords
        .iter()
        .filter(|mapping| mapping.team == team.name)
        .map(|mapping| mapping.keyword.as_str())
        .collect();
    if mapped.is_empty() {
        output.warning("No convention keyword maps to this team; it will only be used once one does");
    } else {
        output.kv("Keywords", &mapped.join(", "));
    }
    Ok(())
}

pub async fn add_member(team: &str, owner: &str, lead: bool, config: &TriageConfig) -> Result<()> {
    let output = Output::new();
    let db = get_db(config).await?;

    let team = require_team(&db, team).await?;
    let owner = require_owner(&db, owner).await?;
    let role = if lead { TeamRole::Lead } else { TeamRole::Member };

    queries::add_team_member(db.pool(), &team.id, &owner.id, role)
        .await
        .into_diagnostic()?;

    output.success(&format!(
        "Added {} to {} as {}",
        owner.name.bright_cyan(),
        team.name.bright_cyan(),
        role
    ));
    Ok(())
}

pub async fn members(team: &str, config: &TriageConfig) -> Result<()> {
    let output = Output::new();
    let db = get_db(config).await?;

    let team = require_team(&db, team).await?;
    let members = queries::list_team_members(db.pool(), &team.id)
        .await
        .into_diagnostic()?;

    if members.is_empty() {
        output.info(
            "No members",
            &format!("Add one with: triage team add-member \"{}\" <owner>", team.name),
        );
        return Ok(());
    }

    output.status(&format!("{} ({} members), in join order:", team.name.bright_cyan(), members.len()));
    let rows = members
        .into_iter()
        .map(|owner| vec![owner.name, owner.email, active_label(owner.active)])
        .collect();
    output.table(&["Name", "Email", "Status"], rows);
    Ok(())
}

pub async fn list(config: &TriageConfig) -> Result<()> {
    let output = Output::new();
    let db = get_db(config).await?;

    let teams = queries::list_teams(db.pool()).await.into_diagnostic()?;
    if teams.is_empty() {
        output.info("No teams found", "Create one with: triage team add <name>");
        return Ok(());
    }

    let rows = teams
        .into_iter()
        .map(|team| vec![team.name, team.slug, active_label(team.active)])
        .collect();
    output.table(&["Name", "Slug", "Status"], rows);
    Ok(())
}
