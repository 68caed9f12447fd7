//! Owner-registered path globs.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};
use triage_db::Owner;

use super::{OwnershipStrategy, ResolutionSkip, StrategyKind, glob};
use crate::Result;
use crate::directory::OwnerDirectory;
use crate::frame::Frame;

/// Matches frames against the directory's active pattern rules.
///
/// Frames are the outer loop: the most recent call site that matches any
/// rule decides the owner, regardless of which rule or when it was
/// registered.
#[derive(Debug, Clone)]
pub struct PatternRuleMatcher {
    directory: Arc<dyn OwnerDirectory>,
    repository_root: PathBuf,
}

impl PatternRuleMatcher {
    pub fn new(directory: Arc<dyn OwnerDirectory>, repository_root: impl Into<PathBuf>) -> Self {
        Self {
            directory,
            repository_root: repository_root.into(),
        }
    }
}

#[async_trait]
impl OwnershipStrategy for PatternRuleMatcher {
    fn kind(&self) -> StrategyKind {
        StrategyKind::PatternRule
    }

    async fn resolve(&self, frames: &[Frame]) -> Result<Option<Owner>> {
        let rules = self.directory.active_pattern_rules().await?;
        if rules.is_empty() {
            return Ok(None);
        }

        let matchers: Vec<_> = rules
            .iter()
            .filter(|rule| rule.active)
            .filter_map(|rule| match glob::compile(&rule.pattern) {
                Ok(matcher) => Some((rule, matcher)),
                Err(e) => {
                    warn!(rule_id = %rule.id, error = %e, "Skipping pattern rule with invalid glob");
                    None
                }
            })
            .collect();

        for frame in frames {
            let path = frame.repo_relative_path(&self.repository_root);
            for (rule, matcher) in &matchers {
                if !matcher.is_match(path) {
                    continue;
                }
                match self.directory.owner(&rule.owner_id).await? {
                    Some(owner) => {
                        debug!(%frame, pattern = %rule.pattern, owner = %owner.name, "Pattern rule matched");
                        return Ok(Some(owner));
                    }
                    None => {
                        warn!(
                            rule_id = %rule.id,
                            owner_id = %rule.owner_id,
                            skip = %ResolutionSkip::UnknownOwner,
                            "Pattern rule references unknown owner"
                        );
                    }
                }
            }
        }

        Ok(None)
    }
}
