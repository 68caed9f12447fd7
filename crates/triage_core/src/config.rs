//! Configuration system for triage
//!
//! Every setting the engine and capture flow consult lives here and is handed
//! to constructors explicitly. All fields have defaults, so an empty or
//! missing file yields a working configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use triage_db::{ExceptionKind, Severity};

use crate::Result;
use crate::error::{ConfigError, TriageError};
use crate::strategy::StrategyKind;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    pub database: DatabaseConfig,
    pub capture: CaptureConfig,
    pub ownership: OwnershipConfig,
    pub conventions: ConventionConfig,
}

/// Database configuration for SQLite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the catalog database file.
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let path = dirs::data_dir()
            .map(|dir| dir.join("triage").join("triage.db"))
            .unwrap_or_else(|| PathBuf::from("triage.db"));
        Self { path }
    }
}

/// Which errors get recorded, and whether they are auto-assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub enabled: bool,
    /// Environments in which capture is active
    pub environments: Vec<String>,
    /// Environment this process runs in
    pub environment: String,
    /// Exception kinds that are never recorded
    pub ignored_kinds: Vec<ExceptionKind>,
    /// Run ownership resolution on every captured error
    pub auto_assign_owners: bool,
    pub default_severity: Severity,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            environments: ["development", "test", "staging", "production"]
                .into_iter()
                .map(String::from)
                .collect(),
            environment: "development".to_string(),
            ignored_kinds: vec![
                ExceptionKind::RoutingError,
                ExceptionKind::InvalidAuthenticityToken,
                ExceptionKind::RecordNotFound,
            ],
            auto_assign_owners: true,
            default_severity: Severity::Medium,
        }
    }
}

/// Settings for frame extraction and the resolution strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OwnershipConfig {
    /// Root of the application's repository; blame runs here and ownership
    /// files are looked up relative to it
    pub repository_root: PathBuf,
    /// Domain appended to ownership-file handles when looking owners up by email
    pub email_domain: String,
    /// Candidate ownership files, relative to the repository root, in priority order
    pub ownership_file_paths: Vec<PathBuf>,
    /// File extensions recognised as source files in stack frames
    pub source_extensions: Vec<String>,
    /// Path segments marking the application's own source tree
    pub app_roots: Vec<String>,
    /// Path segments marking dependency trees, whose frames are always dropped
    pub dependency_markers: Vec<String>,
    /// Version control binary used for blame
    pub vcs_binary: String,
    pub blame_timeout_ms: u64,
    /// Number of blame lookups to keep; 0 disables caching
    pub blame_cache_capacity: usize,
    /// Strategy chain, tried in order until one yields an owner
    pub strategies: Vec<StrategyKind>,
}

impl OwnershipConfig {
    pub fn blame_timeout(&self) -> Duration {
        Duration::from_millis(self.blame_timeout_ms)
    }
}

impl Default for OwnershipConfig {
    fn default() -> Self {
        Self {
            repository_root: PathBuf::from("."),
            email_domain: "example.com".to_string(),
            ownership_file_paths: vec![
                PathBuf::from(".github/CODEOWNERS"),
                PathBuf::from(".gitlab/CODEOWNERS"),
                PathBuf::from("CODEOWNERS"),
            ],
            source_extensions: vec!["rb".to_string()],
            app_roots: vec!["app".to_string()],
            dependency_markers: vec!["gems".to_string(), "vendor".to_string()],
            vcs_binary: "git".to_string(),
            blame_timeout_ms: 5_000,
            blame_cache_capacity: 0,
            strategies: StrategyKind::DEFAULT_ORDER.to_vec(),
        }
    }
}

/// Keyword-to-team mapping used by the directory convention strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConventionConfig {
    /// Checked in order; the first keyword contained in the derived name wins
    pub team_keywords: Vec<TeamKeyword>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamKeyword {
    pub keyword: String,
    pub team: String,
}

impl TeamKeyword {
    pub fn new(keyword: impl Into<String>, team: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            team: team.into(),
        }
    }
}

impl Default for ConventionConfig {
    fn default() -> Self {
        Self {
            team_keywords: vec![
                TeamKeyword::new("admin", "Admin"),
                TeamKeyword::new("api", "API"),
                TeamKeyword::new("payment", "Payment"),
            ],
        }
    }
}

impl TriageConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml(content: &str, config_path: &Path) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| TriageError::Configuration {
            config_path: config_path.display().to_string(),
            field: "file".to_string(),
            expected: "valid triage configuration".to_string(),
            cause: ConfigError::TomlParse(e.to_string()),
        })?;
        config.validate(config_path)?;
        Ok(config)
    }

    /// Serialize to TOML, e.g. for `config show`.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| TriageError::Configuration {
            config_path: "<memory>".to_string(),
            field: "config".to_string(),
            expected: "serializable configuration".to_string(),
            cause: ConfigError::TomlSerialize(e.to_string()),
        })
    }

    fn validate(&self, config_path: &Path) -> Result<()> {
        let invalid = |field: &str, reason: &str| TriageError::Configuration {
            config_path: config_path.display().to_string(),
            field: field.to_string(),
            expected: reason.to_string(),
            cause: ConfigError::InvalidValue {
                field: field.to_string(),
                reason: reason.to_string(),
            },
        };

        if self.ownership.source_extensions.is_empty() {
            return Err(invalid(
                "ownership.source_extensions",
                "at least one source file extension",
            ));
        }
        if self.ownership.blame_timeout_ms == 0 {
            return Err(invalid("ownership.blame_timeout_ms", "a timeout above zero"));
        }
        for (i, kind) in self.ownership.strategies.iter().enumerate() {
            if self.ownership.strategies[..i].contains(kind) {
                return Err(invalid(
                    "ownership.strategies",
                    "each strategy listed at most once",
                ));
            }
        }
        Ok(())
    }
}

/// Load configuration from a TOML file.
pub async fn load_config(path: &Path) -> Result<TriageConfig> {
    let content =
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| TriageError::Configuration {
                config_path: path.display().to_string(),
                field: "file".to_string(),
                expected: "readable TOML file".to_string(),
                cause: ConfigError::Io(e.to_string()),
            })?;

    let mut config = TriageConfig::from_toml(&content, path)?;

    // Resolve the repository root relative to the config file's directory
    if config.ownership.repository_root.is_relative() {
        let base_dir = path.parent().unwrap_or(Path::new("."));
        config.ownership.repository_root = base_dir.join(&config.ownership.repository_root);
    }

    tracing::debug!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

/// Load the configuration at `path`, or defaults when no path is given.
pub async fn load_config_or_default(path: Option<&Path>) -> Result<TriageConfig> {
    match path {
        Some(path) => load_config(path).await,
        None => Ok(TriageConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TriageConfig::from_toml("", Path::new("triage.toml")).unwrap();
        assert_eq!(config, TriageConfig::default());
        assert_eq!(
            config.ownership.strategies,
            vec![
                StrategyKind::PatternRule,
                StrategyKind::Blame,
                StrategyKind::OwnershipFile,
                StrategyKind::Convention,
            ]
        );
    }

    #[test]
    fn test_partial_sections_override() {
        let config = TriageConfig::from_toml(
            r#"
            [capture]
            environment = "production"
            ignored_kinds = ["timeout_error"]

            [ownership]
            email_domain = "corp.test"
            strategies = ["ownership_file", "pattern_rule"]

            [[conventions.team_keywords]]
            keyword = "billing"
            team = "Payment"
            "#,
            Path::new("triage.toml"),
        )
        .unwrap();

        assert_eq!(config.capture.environment, "production");
        assert_eq!(config.capture.ignored_kinds, vec![ExceptionKind::TimeoutError]);
        assert!(config.capture.auto_assign_owners);
        assert_eq!(config.ownership.email_domain, "corp.test");
        assert_eq!(config.ownership.vcs_binary, "git");
        assert_eq!(
            config.ownership.strategies,
            vec![StrategyKind::OwnershipFile, StrategyKind::PatternRule]
        );
        assert_eq!(
            config.conventions.team_keywords,
            vec![TeamKeyword::new("billing", "Payment")]
        );
    }

    #[test]
    fn test_duplicate_strategy_rejected() {
        let err = TriageConfig::from_toml(
            "[ownership]\nstrategies = [\"blame\", \"blame\"]",
            Path::new("triage.toml"),
        )
        .unwrap_err();
        assert!(matches!(err, TriageError::Configuration { ref field, .. } if field == "ownership.strategies"));
    }

    #[test]
    fn test_unknown_strategy_is_parse_error() {
        let err = TriageConfig::from_toml(
            "[ownership]\nstrategies = [\"astrology\"]",
            Path::new("triage.toml"),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TriageError::Configuration {
                cause: ConfigError::TomlParse(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_load_config_resolves_repository_root() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("triage.toml");
        std::fs::write(&path, "[ownership]\nrepository_root = \"repo\"\n").unwrap();

        let config = load_config(&path).await.unwrap();
        assert_eq!(config.ownership.repository_root, dir.path().join("repo"));
    }

    #[tokio::test]
    async fn test_load_missing_config_is_error() {
        let err = load_config(Path::new("/nonexistent/triage.toml"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TriageError::Configuration {
                cause: ConfigError::Io(_),
                ..
            }
        ));
    }
}
