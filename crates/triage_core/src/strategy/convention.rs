//! Directory-convention fallback.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use triage_db::Owner;

use super::{OwnershipStrategy, ResolutionSkip, StrategyKind};
use crate::Result;
use crate::config::{ConventionConfig, TeamKeyword};
use crate::directory::OwnerDirectory;
use crate::frame::Frame;

/// Roles recognized from a directory segment of the frame path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryRole {
    Controllers,
    Models,
    Services,
}

impl DirectoryRole {
    /// Checked in this order when a path has more than one role segment.
    pub const ALL: [DirectoryRole; 3] = [Self::Controllers, Self::Models, Self::Services];

    pub fn segment(&self) -> &'static str {
        match self {
            Self::Controllers => "controllers",
            Self::Models => "models",
            Self::Services => "services",
        }
    }

    /// Filename suffix stripped before keyword matching.
    pub fn file_suffix(&self) -> &'static str {
        match self {
            Self::Controllers => "_controller",
            Self::Models => "",
            Self::Services => "_service",
        }
    }

    pub fn detect(frame: &Frame) -> Option<Self> {
        let directories: Vec<&str> = {
            let mut segments: Vec<&str> = frame.segments().collect();
            segments.pop();
            segments
        };
        Self::ALL
            .into_iter()
            .find(|role| directories.contains(&role.segment()))
    }

    /// Short name of the file: final segment without extension or role suffix.
    pub fn derive_name(&self, frame: &Frame) -> Option<String> {
        let file_name = frame.segments().last()?;
        let stem = file_name
            .rsplit_once('.')
            .map_or(file_name, |(stem, _)| stem);
        let name = stem.strip_suffix(self.file_suffix()).unwrap_or(stem);
        Some(name.to_lowercase())
    }
}

/// Maps controller names onto teams by keyword.
///
/// Only controllers carry a mapping today. Models and services are
/// recognized so they stop the search for that frame's role, but yield no
/// owner.
#[derive(Debug, Clone)]
pub struct ConventionResolver {
    directory: Arc<dyn OwnerDirectory>,
    team_keywords: Vec<TeamKeyword>,
}

impl ConventionResolver {
    pub fn new(directory: Arc<dyn OwnerDirectory>, conventions: &ConventionConfig) -> Self {
        Self {
            directory,
            team_keywords: conventions.team_keywords.clone(),
        }
    }

    /// First configured keyword contained in `name`.
    pub fn team_for(&self, name: &str) -> Option<&TeamKeyword> {
        self.team_keywords
            .iter()
            .find(|mapping| name.contains(&mapping.keyword.to_lowercase()))
    }

    async fn resolve_controller(&self, frame: &Frame) -> Result<Option<Owner>> {
        let Some(name) = DirectoryRole::Controllers.derive_name(frame) else {
            return Ok(None);
        };
        let Some(mapping) = self.team_for(&name) else {
            return Ok(None);
        };

        let owner = self.directory.first_active_team_owner(&mapping.team).await?;
        match &owner {
            Some(owner) => {
                debug!(%frame, team = %mapping.team, owner = %owner.name, "Convention matched");
            }
            None => {
                debug!(
                    %frame,
                    team = %mapping.team,
                    skip = %ResolutionSkip::UnknownOwner,
                    "Team has no active owner"
                );
            }
        }
        Ok(owner)
    }
}

#[async_trait]
impl OwnershipStrategy for ConventionResolver {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Convention
    }

    async fn resolve(&self, frames: &[Frame]) -> Result<Option<Owner>> {
        for frame in frames {
            let owner = match DirectoryRole::detect(frame) {
                Some(DirectoryRole::Controllers) => self.resolve_controller(frame).await?,
                Some(role) => {
                    debug!(%frame, role = role.segment(), "No convention for role");
                    None
                }
                None => None,
            };
            if owner.is_some() {
                return Ok(owner);
            }
        }
        Ok(None)
    }
}
