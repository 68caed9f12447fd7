//! CODEOWNERS-style ownership files.
//!
//! The file is located and parsed fresh on every resolution so edits take
//! effect immediately. Later lines override earlier ones: for each frame the
//! last matching rule decides which identifiers are tried.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use globset::GlobMatcher;
use tracing::{debug, warn};
use triage_db::Owner;

use super::{OwnershipStrategy, ResolutionSkip, StrategyKind, glob};
use crate::Result;
use crate::directory::OwnerDirectory;
use crate::frame::Frame;

/// One `pattern identifier...` line.
#[derive(Debug, Clone)]
pub struct OwnershipRule {
    /// Pattern as written in the file
    pub pattern: String,
    /// Owner identifiers in file order, markers included (e.g. `@team-a`)
    pub identifiers: Vec<String>,
    /// 1-based line number in the file
    pub line: usize,
    matcher: Option<GlobMatcher>,
}

impl OwnershipRule {
    pub fn new(pattern: impl Into<String>, identifiers: Vec<String>, line: usize) -> Self {
        let pattern = pattern.into();
        let matcher = glob::compile(&normalize_pattern(&pattern)).ok();
        Self {
            pattern,
            identifiers,
            line,
            matcher,
        }
    }

    /// Whether this rule covers a repository-relative path. Rules with
    /// invalid globs never match.
    pub fn matches(&self, path: &str) -> bool {
        self.matcher
            .as_ref()
            .is_some_and(|matcher| matcher.is_match(path))
    }
}

/// A leading `/` anchors to the repository root (all patterns are anchored),
/// and a trailing `/` covers everything beneath the directory.
fn normalize_pattern(pattern: &str) -> String {
    let anchored = pattern.trim_start_matches('/');
    if anchored.ends_with('/') {
        format!("{anchored}**")
    } else {
        anchored.to_string()
    }
}

/// A parsed ownership file.
#[derive(Debug, Clone, Default)]
pub struct OwnershipFile {
    pub rules: Vec<OwnershipRule>,
}

impl OwnershipFile {
    /// Parse file content. Blank lines, `#` comments and lines without any
    /// identifier are skipped.
    pub fn parse(content: &str) -> Self {
        let rules = content
            .lines()
            .enumerate()
            .filter_map(|(index, line)| {
                let line_text = line.trim();
                if line_text.is_empty() || line_text.starts_with('#') {
                    return None;
                }
                let mut parts = line_text.split_whitespace();
                let pattern = parts.next()?;
                let identifiers: Vec<String> = parts.map(String::from).collect();
                if identifiers.is_empty() {
                    return None;
                }
                Some(OwnershipRule::new(pattern, identifiers, index + 1))
            })
            .collect();
        Self { rules }
    }

    /// The last rule in file order that matches `path`.
    pub fn matching_rule(&self, path: &str) -> Option<&OwnershipRule> {
        self.rules.iter().rev().find(|rule| rule.matches(path))
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Find the first existing candidate file under `root` and read it.
///
/// Returns `None` when no candidate exists or the one found is unreadable.
pub async fn locate(root: &Path, candidates: &[PathBuf]) -> Option<(PathBuf, String)> {
    for candidate in candidates {
        let path = root.join(candidate);
        match tokio::fs::try_exists(&path).await {
            Ok(true) => {}
            Ok(false) => continue,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Cannot stat ownership file candidate");
                continue;
            }
        }
        return match tokio::fs::read_to_string(&path).await {
            Ok(content) => Some((path, content)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, skip = %ResolutionSkip::FileUnreadable, "Ownership file is unreadable");
                None
            }
        };
    }
    None
}

/// Resolves owners from the repository's ownership file.
#[derive(Debug, Clone)]
pub struct OwnershipFileResolver {
    directory: Arc<dyn OwnerDirectory>,
    repository_root: PathBuf,
    candidates: Vec<PathBuf>,
    email_domain: String,
}

impl OwnershipFileResolver {
    pub fn new(
        directory: Arc<dyn OwnerDirectory>,
        repository_root: impl Into<PathBuf>,
        candidates: Vec<PathBuf>,
        email_domain: impl Into<String>,
    ) -> Self {
        Self {
            directory,
            repository_root: repository_root.into(),
            candidates,
            email_domain: email_domain.into(),
        }
    }

    /// Load and parse the ownership file, if any.
    pub async fn load(&self) -> Option<(PathBuf, OwnershipFile)> {
        let (path, content) = locate(&self.repository_root, &self.candidates).await?;
        let file = OwnershipFile::parse(&content);
        debug!(path = %path.display(), rules = file.rules.len(), "Loaded ownership file");
        Some((path, file))
    }

    /// Map one identifier to an owner.
    ///
    /// The leading marker is stripped, then the handle is tried as
    /// `handle@<email domain>`, as an external id and as an exact name.
    /// Handles that are already email addresses are tried as-is first.
    pub async fn resolve_identifier(&self, identifier: &str) -> Result<Option<Owner>> {
        let handle = identifier.strip_prefix('@').unwrap_or(identifier);
        if handle.is_empty() {
            return Ok(None);
        }

        if handle.contains('@') {
            if let Some(owner) = self.directory.owner_by_email(handle).await? {
                return Ok(Some(owner));
            }
        }

        let email = format!("{handle}@{}", self.email_domain);
        if let Some(owner) = self.directory.owner_by_email(&email).await? {
            return Ok(Some(owner));
        }
        if let Some(owner) = self.directory.owner_by_external_id(handle).await? {
            return Ok(Some(owner));
        }
        self.directory.owner_by_name(handle).await
    }
}

#[async_trait]
impl OwnershipStrategy for OwnershipFileResolver {
    fn kind(&self) -> StrategyKind {
        StrategyKind::OwnershipFile
    }

    async fn resolve(&self, frames: &[Frame]) -> Result<Option<Owner>> {
        let Some((path, file)) = self.load().await else {
            debug!(skip = %ResolutionSkip::FileAbsent, "No ownership file found");
            return Ok(None);
        };
        if file.is_empty() {
            return Ok(None);
        }

        for frame in frames {
            let relative = frame.repo_relative_path(&self.repository_root);
            let Some(rule) = file.matching_rule(relative) else {
                continue;
            };

            for identifier in &rule.identifiers {
                if let Some(owner) = self.resolve_identifier(identifier).await? {
                    debug!(
                        %frame,
                        file = %path.display(),
                        line = rule.line,
                        identifier = %identifier,
                        owner = %owner.name,
                        "Ownership file rule matched"
                    );
                    return Ok(Some(owner));
                }
            }
            debug!(
                %frame,
                line = rule.line,
                skip = %ResolutionSkip::NoIdentifierResolved,
                "No identifier in matching rule resolved to an owner"
            );
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::directory::MockDirectory;
    use pretty_assertions::assert_eq;

    fn candidates() -> Vec<PathBuf> {
        vec![
            PathBuf::from(".github/CODEOWNERS"),
            PathBuf::from(".gitlab/CODEOWNERS"),
            PathBuf::from("CODEOWNERS"),
        ]
    }

    #[test]
    fn test_parse_skips_comments_blanks_and_bare_patterns() {
        let file = OwnershipFile::parse(
            "# This is a comment\n\
             *.rb @ruby-team\n\
             app/controllers/ @backend-team @team-lead\n\
             \n\
             orphaned/path\n\
             docs/ @docs-team",
        );

        let parsed: Vec<(&str, Vec<&str>, usize)> = file
            .rules
            .iter()
            .map(|r| {
                (
                    r.pattern.as_str(),
                    r.identifiers.iter().map(String::as_str).collect(),
                    r.line,
                )
            })
            .collect();
        assert_eq!(
            parsed,
            vec![
                ("*.rb", vec!["@ruby-team"], 2),
                ("app/controllers/", vec!["@backend-team", "@team-lead"], 3),
                ("docs/", vec!["@docs-team"], 6),
            ]
        );
    }

    #[test]
    fn test_last_matching_rule_wins() {
        let file = OwnershipFile::parse(
            "*.rb @ruby-team\n\
             app/controllers/* @backend-team\n\
             app/controllers/admin/* @admin-team",
        );

        let admin = file
            .matching_rule("app/controllers/admin/users_controller.rb")
            .unwrap();
        assert_eq!(admin.pattern, "app/controllers/admin/*");

        let general = file
            .matching_rule("app/controllers/users_controller.rb")
            .unwrap();
        assert_eq!(general.pattern, "app/controllers/*");

        assert!(file.matching_rule("lib/tasks/cleanup.rb").is_none());
    }

    #[test]
    fn test_directory_and_anchored_patterns() {
        let file = OwnershipFile::parse("/app/services/ @services\n");
        assert!(file
            .matching_rule("app/services/payment/charge_service.rb")
            .is_some());
        assert!(file.matching_rule("lib/app/services/x.rb").is_none());
    }

    #[tokio::test]
    async fn test_identifier_resolution_order() {
        let by_email = Owner::new("Someone", "john.doe@example.com");
        let by_handle = Owner::new("Other", "other@example.com").with_external_id("john.doe");
        let by_name = Owner::new("john.doe", "third@example.com");

        let resolver = |directory: MockDirectory| {
            OwnershipFileResolver::new(Arc::new(directory), ".", candidates(), "example.com")
        };

        let all = resolver(
            MockDirectory::new()
                .with_owner(by_name.clone())
                .with_owner(by_handle.clone())
                .with_owner(by_email.clone()),
        );
        assert_eq!(
            all.resolve_identifier("@john.doe").await.unwrap(),
            Some(by_email)
        );

        let handle_and_name = resolver(
            MockDirectory::new()
                .with_owner(by_name.clone())
                .with_owner(by_handle.clone()),
        );
        assert_eq!(
            handle_and_name.resolve_identifier("@john.doe").await.unwrap(),
            Some(by_handle)
        );

        let name_only = resolver(MockDirectory::new().with_owner(by_name.clone()));
        assert_eq!(
            name_only.resolve_identifier("@john.doe").await.unwrap(),
            Some(by_name)
        );
    }

    #[tokio::test]
    async fn test_plain_email_identifier() {
        let owner = Owner::new("Jane", "jane@corp.test");
        let resolver = OwnershipFileResolver::new(
            Arc::new(MockDirectory::new().with_owner(owner.clone())),
            ".",
            candidates(),
            "example.com",
        );
        assert_eq!(
            resolver.resolve_identifier("jane@corp.test").await.unwrap(),
            Some(owner)
        );
        assert_eq!(resolver.resolve_identifier("@").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_first_candidate_file_wins() {
        let repo = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(repo.path().join(".gitlab")).unwrap();
        std::fs::write(repo.path().join(".gitlab/CODEOWNERS"), "app/* @gitlab\n").unwrap();
        std::fs::write(repo.path().join("CODEOWNERS"), "app/* @root\n").unwrap();

        let (path, content) = locate(repo.path(), &candidates()).await.unwrap();
        assert_eq!(path, repo.path().join(".gitlab/CODEOWNERS"));
        assert_eq!(content, "app/* @gitlab\n");
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn test_unreadable_candidate_stops_the_search() {
        let repo = tempfile::tempdir().unwrap();
        // A directory where the first candidate file should be
        std::fs::create_dir_all(repo.path().join(".github/CODEOWNERS")).unwrap();
        std::fs::write(repo.path().join("CODEOWNERS"), "app/* @root\n").unwrap();

        assert_eq!(locate(repo.path(), &candidates()).await, None);
        assert!(logs_contain("file_unreadable"));

        let owner = Owner::new("Root", "root@example.com");
        let resolver = OwnershipFileResolver::new(
            Arc::new(MockDirectory::new().with_owner(owner)),
            repo.path(),
            candidates(),
            "example.com",
        );
        let frames = vec![Frame::new("app/models/user.rb", 1)];
        assert_eq!(resolver.resolve(&frames).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_file_yields_nothing() {
        let repo = tempfile::tempdir().unwrap();
        let owner = Owner::new("Jane", "jane@example.com");
        let resolver = OwnershipFileResolver::new(
            Arc::new(MockDirectory::new().with_owner(owner)),
            repo.path(),
            candidates(),
            "example.com",
        );
        let frames = vec![Frame::new("app/models/user.rb", 1)];
        assert_eq!(resolver.resolve(&frames).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unresolved_identifiers_fall_through_to_later_frames() {
        let repo = tempfile::tempdir().unwrap();
        std::fs::write(
            repo.path().join("CODEOWNERS"),
            "app/controllers/* @ghost\napp/models/* @modeler\n",
        )
        .unwrap();

        let owner = Owner::new("Modeler", "m@example.com").with_external_id("modeler");
        let resolver = OwnershipFileResolver::new(
            Arc::new(MockDirectory::new().with_owner(owner.clone())),
            repo.path(),
            candidates(),
            "example.com",
        );
        let frames = vec![
            Frame::new("app/controllers/users_controller.rb", 10),
            Frame::new("app/models/user.rb", 25),
        ];
        assert_eq!(resolver.resolve(&frames).await.unwrap(), Some(owner));
    }
}
