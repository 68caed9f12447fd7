//! Owner directory models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A person errors can be assigned to.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Owner {
    /// Unique identifier
    pub id: String,

    /// Display name, matched against VCS author names
    pub name: String,

    /// Email address (unique), matched against VCS author emails
    pub email: String,

    /// Handle on the code host (e.g. a GitHub username), matched against
    /// ownership-file identifiers
    pub external_id: Option<String>,

    /// Inactive owners keep their history but are skipped by team lookups
    pub active: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Owner {
    /// Build a new active owner with a fresh id.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: format!("own_{}", uuid::Uuid::new_v4().simple()),
            name: name.into(),
            email: email.into(),
            external_id: None,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// An owner-scoped path glob.
///
/// Active rules are consulted in registration order by the pattern rule
/// strategy.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct PatternRule {
    /// Unique identifier
    pub id: String,

    /// Owner the rule attributes matching paths to
    pub owner_id: String,

    /// Path glob, e.g. `app/controllers/*`
    pub pattern: String,

    /// Optional free-form note
    pub description: Option<String>,

    /// Only active rules participate in matching
    pub active: bool,

    /// Registration timestamp, defines rule order
    pub created_at: DateTime<Utc>,
}

impl PatternRule {
    pub fn new(owner_id: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            id: format!("rule_{}", uuid::Uuid::new_v4().simple()),
            owner_id: owner_id.into(),
            pattern: pattern.into(),
            description: None,
            active: true,
            created_at: Utc::now(),
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}
