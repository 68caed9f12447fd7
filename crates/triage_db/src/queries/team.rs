//! Team queries.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::{DbError, DbResult};
use crate::models::{Owner, Team, TeamRole};

/// Create a new team.
pub async fn create_team(pool: &SqlitePool, team: &Team) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO teams (id, name, slug, active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&team.id)
    .bind(&team.name)
    .bind(&team.slug)
    .bind(team.active)
    .bind(team.created_at)
    .bind(team.updated_at)
    .execute(pool)
    .await
    .map_err(|e| DbError::from_insert(e, "Team", &team.name))?;
    Ok(())
}

/// Get a team by its exact name.
pub async fn get_team_by_name(pool: &SqlitePool, name: &str) -> DbResult<Option<Team>> {
    let team = sqlx::query_as::<_, Team>(
        "SELECT id, name, slug, active, created_at, updated_at FROM teams WHERE name = ?",
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;
    Ok(team)
}

/// List all teams.
pub async fn list_teams(pool: &SqlitePool) -> DbResult<Vec<Team>> {
    let teams = sqlx::query_as::<_, Team>(
        "SELECT id, name, slug, active, created_at, updated_at FROM teams ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(teams)
}

/// Add an owner to a team. Adding an existing member updates their role.
pub async fn add_team_member(
    pool: &SqlitePool,
    team_id: &str,
    owner_id: &str,
    role: TeamRole,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO team_members (team_id, owner_id, role, joined_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(team_id, owner_id) DO UPDATE SET role = excluded.role
        "#,
    )
    .bind(team_id)
    .bind(owner_id)
    .bind(role)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}

/// List a team's members in the order they joined.
pub async fn list_team_members(pool: &SqlitePool, team_id: &str) -> DbResult<Vec<Owner>> {
    let owners = sqlx::query_as::<_, Owner>(
        r#"
        SELECT o.id, o.name, o.email, o.external_id, o.active, o.created_at, o.updated_at
        FROM team_members tm
        JOIN owners o ON o.id = tm.owner_id
        WHERE tm.team_id = ?
        ORDER BY tm.joined_at, tm.rowid
        "#,
    )
    .bind(team_id)
    .fetch_all(pool)
    .await?;
    Ok(owners)
}

/// First active owner (by join order) of the active team with this exact name.
pub async fn first_active_team_owner(pool: &SqlitePool, team_name: &str) -> DbResult<Option<Owner>> {
    let owner = sqlx::query_as::<_, Owner>(
        r#"
        SELECT o.id, o.name, o.email, o.external_id, o.active, o.created_at, o.updated_at
        FROM teams t
        JOIN team_members tm ON tm.team_id = t.id
        JOIN owners o ON o.id = tm.owner_id
        WHERE t.name = ? AND t.active = 1 AND o.active = 1
        ORDER BY tm.joined_at, tm.rowid
        LIMIT 1
        "#,
    )
    .bind(team_name)
    .fetch_optional(pool)
    .await?;
    Ok(owner)
}
