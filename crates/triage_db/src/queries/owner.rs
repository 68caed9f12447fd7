//! Owner and pattern rule queries.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::{DbError, DbResult};
use crate::models::{Owner, PatternRule};

const OWNER_COLUMNS: &str = "id, name, email, external_id, active, created_at, updated_at";
const RULE_COLUMNS: &str = "id, owner_id, pattern, description, active, created_at";

// ============================================================================
// Owner CRUD
// ============================================================================

/// Create a new owner.
pub async fn create_owner(pool: &SqlitePool, owner: &Owner) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO owners (id, name, email, external_id, active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&owner.id)
    .bind(&owner.name)
    .bind(&owner.email)
    .bind(&owner.external_id)
    .bind(owner.active)
    .bind(owner.created_at)
    .bind(owner.updated_at)
    .execute(pool)
    .await
    .map_err(|e| DbError::from_insert(e, "Owner", &owner.email))?;
    Ok(())
}

/// Get an owner by ID.
pub async fn get_owner(pool: &SqlitePool, id: &str) -> DbResult<Option<Owner>> {
    let owner = sqlx::query_as::<_, Owner>(&format!(
        "SELECT {OWNER_COLUMNS} FROM owners WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(owner)
}

/// Get an owner by exact email address.
pub async fn get_owner_by_email(pool: &SqlitePool, email: &str) -> DbResult<Option<Owner>> {
    let owner = sqlx::query_as::<_, Owner>(&format!(
        "SELECT {OWNER_COLUMNS} FROM owners WHERE email = ?"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(owner)
}

/// Get an owner by code-host handle.
pub async fn get_owner_by_external_id(
    pool: &SqlitePool,
    external_id: &str,
) -> DbResult<Option<Owner>> {
    let owner = sqlx::query_as::<_, Owner>(&format!(
        "SELECT {OWNER_COLUMNS} FROM owners WHERE external_id = ?"
    ))
    .bind(external_id)
    .fetch_optional(pool)
    .await?;
    Ok(owner)
}

/// Get the earliest-registered owner with exactly this display name.
pub async fn get_owner_by_name(pool: &SqlitePool, name: &str) -> DbResult<Option<Owner>> {
    let owner = sqlx::query_as::<_, Owner>(&format!(
        "SELECT {OWNER_COLUMNS} FROM owners WHERE name = ? ORDER BY created_at, rowid LIMIT 1"
    ))
    .bind(name)
    .fetch_optional(pool)
    .await?;
    Ok(owner)
}

/// List all owners.
pub async fn list_owners(pool: &SqlitePool) -> DbResult<Vec<Owner>> {
    let owners = sqlx::query_as::<_, Owner>(&format!(
        "SELECT {OWNER_COLUMNS} FROM owners ORDER BY name"
    ))
    .fetch_all(pool)
    .await?;
    Ok(owners)
}

/// Activate or deactivate an owner.
pub async fn set_owner_active(pool: &SqlitePool, id: &str, active: bool) -> DbResult<bool> {
    let result = sqlx::query("UPDATE owners SET active = ?, updated_at = ? WHERE id = ?")
        .bind(active)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ============================================================================
// PatternRule
// ============================================================================

/// Register a pattern rule for an owner.
pub async fn create_pattern_rule(pool: &SqlitePool, rule: &PatternRule) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO pattern_rules (id, owner_id, pattern, description, active, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&rule.id)
    .bind(&rule.owner_id)
    .bind(&rule.pattern)
    .bind(&rule.description)
    .bind(rule.active)
    .bind(rule.created_at)
    .execute(pool)
    .await
    .map_err(|e| DbError::from_insert(e, "PatternRule", &rule.pattern))?;
    Ok(())
}

/// List active pattern rules in registration order.
pub async fn list_active_pattern_rules(pool: &SqlitePool) -> DbResult<Vec<PatternRule>> {
    let rules = sqlx::query_as::<_, PatternRule>(&format!(
        "SELECT {RULE_COLUMNS} FROM pattern_rules WHERE active = 1 ORDER BY created_at, rowid"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rules)
}

/// List every rule (active or not) registered for an owner.
pub async fn list_pattern_rules_for_owner(
    pool: &SqlitePool,
    owner_id: &str,
) -> DbResult<Vec<PatternRule>> {
    let rules = sqlx::query_as::<_, PatternRule>(&format!(
        "SELECT {RULE_COLUMNS} FROM pattern_rules WHERE owner_id = ? ORDER BY created_at, rowid"
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await?;
    Ok(rules)
}

/// Enable or disable a pattern rule.
pub async fn set_pattern_rule_active(pool: &SqlitePool, id: &str, active: bool) -> DbResult<bool> {
    let result = sqlx::query("UPDATE pattern_rules SET active = ? WHERE id = ?")
        .bind(active)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCatalogDb;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_owner_lookups() {
        let db = ErrorCatalogDb::open_in_memory().await.unwrap();
        let owner = Owner::new("Jane Doe", "jane@example.com").with_external_id("jdoe");
        create_owner(db.pool(), &owner).await.unwrap();

        let by_email = get_owner_by_email(db.pool(), "jane@example.com")
            .await
            .unwrap();
        assert_eq!(by_email.as_ref().map(|o| o.id.as_str()), Some(owner.id.as_str()));

        let by_handle = get_owner_by_external_id(db.pool(), "jdoe").await.unwrap();
        assert_eq!(by_handle, by_email);

        let by_name = get_owner_by_name(db.pool(), "Jane Doe").await.unwrap();
        assert_eq!(by_name, by_email);

        assert!(get_owner_by_name(db.pool(), "jane").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_already_exists() {
        let db = ErrorCatalogDb::open_in_memory().await.unwrap();
        create_owner(db.pool(), &Owner::new("A", "a@example.com"))
            .await
            .unwrap();

        let err = create_owner(db.pool(), &Owner::new("B", "a@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_only_active_rules_listed_in_registration_order() {
        let db = ErrorCatalogDb::open_in_memory().await.unwrap();
        let owner = Owner::new("Jane Doe", "jane@example.com");
        create_owner(db.pool(), &owner).await.unwrap();

        let first = PatternRule::new(&owner.id, "app/models/*");
        let disabled = PatternRule::new(&owner.id, "app/jobs/*").inactive();
        let second = PatternRule::new(&owner.id, "app/controllers/*");
        for rule in [&first, &disabled, &second] {
            create_pattern_rule(db.pool(), rule).await.unwrap();
        }

        let active: Vec<String> = list_active_pattern_rules(db.pool())
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.pattern)
            .collect();
        assert_eq!(active, vec!["app/models/*", "app/controllers/*"]);

        assert!(set_pattern_rule_active(db.pool(), &first.id, false)
            .await
            .unwrap());
        let active = list_active_pattern_rules(db.pool()).await.unwrap();
        assert_eq!(active.len(), 1);

        let all = list_pattern_rules_for_owner(db.pool(), &owner.id)
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
    }
}
