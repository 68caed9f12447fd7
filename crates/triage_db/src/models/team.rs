//! Team models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A named group of owners.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Team {
    /// Unique identifier
    pub id: String,

    /// Display name (unique), e.g. "Payment"
    pub name: String,

    /// URL-safe form of the name (unique)
    pub slug: String,

    pub active: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Team {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let now = Utc::now();
        Self {
            id: format!("team_{}", uuid::Uuid::new_v4().simple()),
            slug: slugify(&name),
            name,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Lowercase the name and collapse every run of non-alphanumerics into `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Membership of an owner in a team.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct TeamMember {
    pub team_id: String,
    pub owner_id: String,
    pub role: TeamRole,
    pub joined_at: DateTime<Utc>,
}

/// Role of a member within a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    #[default]
    Member,
    Lead,
}

impl std::fmt::Display for TeamRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Member => write!(f, "member"),
            Self::Lead => write!(f, "lead"),
        }
    }
}
