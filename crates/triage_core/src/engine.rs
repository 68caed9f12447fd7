//! The ownership resolution waterfall.
//!
//! A resolution moves through a fixed sequence of states:
//!
//! ```text
//! NotStarted -> ExtractingFrames -> NoFrames
//!                                -> Trying(s1) -> Trying(s2) -> ... -> Exhausted
//!                                        \-> Resolved(s)
//! ```
//!
//! Absent or blank traces go straight from `NotStarted` to `NoFrames`
//! without touching any collaborator. The first strategy that names an owner
//! ends the resolution; later strategies are never invoked.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;
use triage_db::Owner;

use crate::Result;
use crate::config::{ConventionConfig, OwnershipConfig, TriageConfig};
use crate::directory::OwnerDirectory;
use crate::frame::{Frame, FrameExtractor};
use crate::strategy::{
    BlameAttributor, BlameProvider, CachingBlameProvider, ConventionResolver, GitBlameProvider,
    OwnershipFileResolver, OwnershipStrategy, PatternRuleMatcher, StrategyKind,
};

/// Where a resolution currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    NotStarted,
    ExtractingFrames,
    Trying(StrategyKind),
    NoFrames,
    Exhausted,
    Resolved(StrategyKind),
}

impl ResolutionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::NoFrames | Self::Exhausted | Self::Resolved(_))
    }
}

/// How a resolution ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionOutcome {
    Resolved,
    /// The trace had no application frames
    NoFrames,
    /// Every strategy ran without naming an owner
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionResult {
    pub owner: Option<Owner>,
    /// Strategy that produced the owner
    pub strategy: Option<StrategyKind>,
    pub outcome: ResolutionOutcome,
    pub frames: Vec<Frame>,
    /// Strategies invoked, in order
    pub attempted: Vec<StrategyKind>,
}

impl ResolutionResult {
    fn no_frames(frames: Vec<Frame>) -> Self {
        Self {
            owner: None,
            strategy: None,
            outcome: ResolutionOutcome::NoFrames,
            frames,
            attempted: Vec::new(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.outcome == ResolutionOutcome::Resolved
    }
}

/// Tracks state transitions for one resolution and logs each of them.
struct Transitions {
    state: ResolutionState,
}

impl Transitions {
    fn new() -> Self {
        Self {
            state: ResolutionState::NotStarted,
        }
    }

    fn advance(&mut self, next: ResolutionState) {
        debug_assert!(!self.state.is_terminal(), "resolution already finished");
        debug!(from = ?self.state, to = ?next, "Resolution transition");
        self.state = next;
    }
}

/// Ordered chain of ownership strategies over a frame extractor.
#[derive(Debug, Clone)]
pub struct ResolutionEngine {
    extractor: FrameExtractor,
    strategies: Vec<Arc<dyn OwnershipStrategy>>,
}

impl ResolutionEngine {
    pub fn new(extractor: FrameExtractor, strategies: Vec<Arc<dyn OwnershipStrategy>>) -> Self {
        Self {
            extractor,
            strategies,
        }
    }

    /// Start building the standard strategy chain from configuration.
    pub fn builder(config: &TriageConfig, directory: Arc<dyn OwnerDirectory>) -> EngineBuilder {
        EngineBuilder {
            ownership: config.ownership.clone(),
            conventions: config.conventions.clone(),
            directory,
            blame_provider: None,
        }
    }

    pub fn from_config(config: &TriageConfig, directory: Arc<dyn OwnerDirectory>) -> Result<Self> {
        Self::builder(config, directory).build()
    }

    pub fn extractor(&self) -> &FrameExtractor {
        &self.extractor
    }

    /// Strategy order this engine runs.
    pub fn strategy_order(&self) -> Vec<StrategyKind> {
        self.strategies.iter().map(|s| s.kind()).collect()
    }

    /// Resolve the owner of a stack trace.
    ///
    /// Only owner directory failures are returned as errors.
    pub async fn resolve(&self, stack_trace: Option<&str>) -> Result<ResolutionResult> {
        let mut transitions = Transitions::new();

        let Some(trace) = stack_trace.filter(|t| !t.trim().is_empty()) else {
            transitions.advance(ResolutionState::NoFrames);
            return Ok(ResolutionResult::no_frames(Vec::new()));
        };

        transitions.advance(ResolutionState::ExtractingFrames);
        let frames = self.extractor.extract(Some(trace));
        if frames.is_empty() {
            transitions.advance(ResolutionState::NoFrames);
            return Ok(ResolutionResult::no_frames(frames));
        }
        debug!(frames = frames.len(), "Extracted application frames");

        let mut attempted = Vec::with_capacity(self.strategies.len());
        for strategy in &self.strategies {
            let kind = strategy.kind();
            transitions.advance(ResolutionState::Trying(kind));
            attempted.push(kind);

            if let Some(owner) = strategy.resolve(&frames).await? {
                transitions.advance(ResolutionState::Resolved(kind));
                return Ok(ResolutionResult {
                    owner: Some(owner),
                    strategy: Some(kind),
                    outcome: ResolutionOutcome::Resolved,
                    frames,
                    attempted,
                });
            }
        }

        transitions.advance(ResolutionState::Exhausted);
        Ok(ResolutionResult {
            owner: None,
            strategy: None,
            outcome: ResolutionOutcome::Exhausted,
            frames,
            attempted,
        })
    }
}

/// Assembles the configured strategies.
#[derive(Debug)]
pub struct EngineBuilder {
    ownership: OwnershipConfig,
    conventions: ConventionConfig,
    directory: Arc<dyn OwnerDirectory>,
    blame_provider: Option<Arc<dyn BlameProvider>>,
}

impl EngineBuilder {
    /// Use this provider instead of the git binary from configuration.
    pub fn blame_provider(mut self, provider: Arc<dyn BlameProvider>) -> Self {
        self.blame_provider = Some(provider);
        self
    }

    fn build_blame_provider(&self) -> Arc<dyn BlameProvider> {
        let provider: Arc<dyn BlameProvider> = match &self.blame_provider {
            Some(provider) => provider.clone(),
            None => Arc::new(GitBlameProvider::new(
                &self.ownership.vcs_binary,
                &self.ownership.repository_root,
                self.ownership.blame_timeout(),
            )),
        };

        match self.ownership.blame_cache_capacity {
            0 => provider,
            capacity => Arc::new(CachingBlameProvider::new(provider, capacity)),
        }
    }

    fn build_strategy(&self, kind: StrategyKind) -> Arc<dyn OwnershipStrategy> {
        let root = &self.ownership.repository_root;
        match kind {
            StrategyKind::PatternRule => {
                Arc::new(PatternRuleMatcher::new(self.directory.clone(), root))
            }
            StrategyKind::Blame => Arc::new(BlameAttributor::new(
                self.directory.clone(),
                self.build_blame_provider(),
            )),
            StrategyKind::OwnershipFile => Arc::new(OwnershipFileResolver::new(
                self.directory.clone(),
                root,
                self.ownership.ownership_file_paths.clone(),
                &self.ownership.email_domain,
            )),
            StrategyKind::Convention => Arc::new(ConventionResolver::new(
                self.directory.clone(),
                &self.conventions,
            )),
        }
    }

    pub fn build(self) -> Result<ResolutionEngine> {
        let extractor = FrameExtractor::from_config(&self.ownership)?;
        let strategies = self
            .ownership
            .strategies
            .iter()
            .map(|kind| self.build_strategy(*kind))
            .collect();
        Ok(ResolutionEngine::new(extractor, strategies))
    }
}
