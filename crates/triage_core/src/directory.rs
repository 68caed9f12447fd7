//! Read surface over the owner directory.
//!
//! Strategies only ever read owners and pattern rules; the directory itself
//! (and its persistence) belongs to the record store.

use core::fmt;

use async_trait::async_trait;
use triage_db::queries;
use triage_db::{ErrorCatalogDb, Owner, PatternRule};

use crate::Result;

/// Lookups the resolution strategies need.
///
/// Errors returned here are infrastructure failures and abort the resolution.
/// "Not found" is always `Ok(None)`.
#[async_trait]
pub trait OwnerDirectory: Send + Sync + fmt::Debug {
    /// Active pattern rules in registration order
    async fn active_pattern_rules(&self) -> Result<Vec<PatternRule>>;

    async fn owner(&self, id: &str) -> Result<Option<Owner>>;

    async fn owner_by_email(&self, email: &str) -> Result<Option<Owner>>;

    /// Lookup by code-host handle
    async fn owner_by_external_id(&self, external_id: &str) -> Result<Option<Owner>>;

    /// Lookup by exact display name
    async fn owner_by_name(&self, name: &str) -> Result<Option<Owner>>;

    /// First active member of the team with exactly this name
    async fn first_active_team_owner(&self, team_name: &str) -> Result<Option<Owner>>;
}

#[async_trait]
impl OwnerDirectory for ErrorCatalogDb {
    async fn active_pattern_rules(&self) -> Result<Vec<PatternRule>> {
        Ok(queries::list_active_pattern_rules(self.pool()).await?)
    }

    async fn owner(&self, id: &str) -> Result<Option<Owner>> {
        Ok(queries::get_owner(self.pool(), id).await?)
    }

    async fn owner_by_email(&self, email: &str) -> Result<Option<Owner>> {
        Ok(queries::get_owner_by_email(self.pool(), email).await?)
    }

    async fn owner_by_external_id(&self, external_id: &str) -> Result<Option<Owner>> {
        Ok(queries::get_owner_by_external_id(self.pool(), external_id).await?)
    }

    async fn owner_by_name(&self, name: &str) -> Result<Option<Owner>> {
        Ok(queries::get_owner_by_name(self.pool(), name).await?)
    }

    async fn first_active_team_owner(&self, team_name: &str) -> Result<Option<Owner>> {
        Ok(queries::first_active_team_owner(self.pool(), team_name).await?)
    }
}
