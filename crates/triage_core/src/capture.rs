//! Error capture: filtering, recording and optional auto-assignment.

use serde::{Deserialize, Serialize};
use tracing::debug;
use triage_db::{ErrorCatalogDb, ErrorRecord, ExceptionKind, Severity, queries};

use crate::assign::resolve_record;
use crate::config::{CaptureConfig, TriageConfig};
use crate::engine::ResolutionEngine;
use crate::error::Result;

/// Structured description of a raised error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub message: String,
    pub kind: ExceptionKind,
    /// Raw trace text, most recent call first
    pub stack_trace: Option<String>,
    /// Overrides the configured default severity
    pub severity: Option<Severity>,
}

impl ErrorReport {
    pub fn new(message: impl Into<String>, kind: ExceptionKind) -> Self {
        Self {
            message: message.into(),
            kind,
            stack_trace: None,
            severity: None,
        }
    }

    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = Some(stack_trace.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }
}

/// Decides which reports are recorded.
#[derive(Debug, Clone)]
pub struct CapturePolicy {
    capture: CaptureConfig,
    dependency_markers: Vec<String>,
}

impl CapturePolicy {
    pub fn new(capture: CaptureConfig, dependency_markers: Vec<String>) -> Self {
        Self {
            capture,
            dependency_markers,
        }
    }

    pub fn from_config(config: &TriageConfig) -> Self {
        Self::new(
            config.capture.clone(),
            config.ownership.dependency_markers.clone(),
        )
    }

    /// Capture is on and the current environment is listed.
    pub fn capture_enabled(&self) -> bool {
        self.capture.enabled
            && self
                .capture
                .environments
                .iter()
                .any(|env| env == &self.capture.environment)
    }

    pub fn is_ignored(&self, kind: ExceptionKind) -> bool {
        self.capture.ignored_kinds.contains(&kind)
    }

    pub fn should_capture(&self, report: &ErrorReport) -> bool {
        self.capture_enabled() && !self.is_ignored(report.kind)
    }

    pub fn auto_assign(&self) -> bool {
        self.capture.auto_assign_owners
    }

    /// Build the record a report is stored as.
    pub fn record_for(&self, report: &ErrorReport) -> ErrorRecord {
        let mut record = ErrorRecord::new(&report.message, report.kind)
            .with_severity(report.severity.unwrap_or(self.capture.default_severity));
        if let Some(trace) = &report.stack_trace {
            record.location = extract_location(trace, &self.dependency_markers);
            record.stack_trace = Some(trace.clone());
        }
        record
    }
}

/// The first trace line outside any dependency tree, falling back to the
/// first line. `None` for a blank trace.
pub fn extract_location(stack_trace: &str, dependency_markers: &[String]) -> Option<String> {
    let mut lines = stack_trace
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .peekable();
    let first = *lines.peek()?;

    let in_dependency = |line: &str| -> bool {
        line.split('/')
            .any(|segment| dependency_markers.iter().any(|m| m == segment))
    };
    let location = lines.find(|line| !in_dependency(*line)).unwrap_or(first);
    Some(location.to_string())
}

/// Record a report if the policy allows it.
///
/// With auto-assignment on, the owner is resolved before the record is
/// stored so it is written in a single insert. Returns `None` for filtered
/// reports.
pub async fn capture_error(
    db: &ErrorCatalogDb,
    engine: &ResolutionEngine,
    policy: &CapturePolicy,
    report: &ErrorReport,
) -> Result<Option<ErrorRecord>> {
    if !policy.capture_enabled() {
        debug!(kind = %report.kind, "Capture disabled for this environment");
        return Ok(None);
    }
    if policy.is_ignored(report.kind) {
        debug!(kind = %report.kind, "Ignoring error kind");
        return Ok(None);
    }

    let mut record = policy.record_for(report);
    if policy.auto_assign() {
        let result = resolve_record(engine, &record).await?;
        record.owner_id = result.owner.map(|owner| owner.id);
    }

    queries::create_error(db.pool(), &record).await?;
    debug!(error_id = %record.id, kind = %record.exception_kind, "Captured error");
    Ok(Some(record))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::test_helpers::blame::MockBlameProvider;
    use pretty_assertions::assert_eq;
    use triage_db::{Owner, PatternRule};

    fn markers() -> Vec<String> {
        vec!["gems".to_string(), "vendor".to_string()]
    }

    #[test]
    fn test_extract_location() {
        let trace = "/gems/activerecord/lib/active_record.rb:123\n\
                     /app/controllers/users_controller.rb:45\n\
                     /gems/rack/lib/rack.rb:67";
        assert_eq!(
            extract_location(trace, &markers()).as_deref(),
            Some("/app/controllers/users_controller.rb:45")
        );

        let deps_only = "/gems/activerecord/lib/active_record.rb:123\n/gems/rack/lib/rack.rb:67";
        assert_eq!(
            extract_location(deps_only, &markers()).as_deref(),
            Some("/gems/activerecord/lib/active_record.rb:123")
        );

        assert_eq!(extract_location("", &markers()), None);
        assert_eq!(extract_location("\n  \n", &markers()), None);
    }

    #[test]
    fn test_policy_filters() {
        let config = TriageConfig::default();
        let policy = CapturePolicy::from_config(&config);
        assert!(policy.should_capture(&ErrorReport::new("x", ExceptionKind::RuntimeError)));
        assert!(!policy.should_capture(&ErrorReport::new("x", ExceptionKind::RoutingError)));

        let mut config = TriageConfig::default();
        config.capture.environment = "ci".to_string();
        let policy = CapturePolicy::from_config(&config);
        assert!(!policy.should_capture(&ErrorReport::new("x", ExceptionKind::RuntimeError)));

        let mut config = TriageConfig::default();
        config.capture.enabled = false;
        let policy = CapturePolicy::from_config(&config);
        assert!(!policy.should_capture(&ErrorReport::new("x", ExceptionKind::RuntimeError)));
    }

    #[test]
    fn test_record_uses_default_severity() {
        let policy = CapturePolicy::from_config(&TriageConfig::default());
        let record = policy.record_for(&ErrorReport::new("x", ExceptionKind::RuntimeError));
        assert_eq!(record.severity, Severity::Medium);
        assert_eq!(record.location, None);

        let record = policy.record_for(
            &ErrorReport::new("x", ExceptionKind::RuntimeError).with_severity(Severity::Critical),
        );
        assert_eq!(record.severity, Severity::Critical);
    }

    #[tokio::test]
    async fn test_capture_stores_and_assigns() {
        let db = Arc::new(ErrorCatalogDb::open_in_memory().await.unwrap());
        let owner = Owner::new("Jane", "jane@example.com");
        queries::create_owner(db.pool(), &owner).await.unwrap();
        queries::create_pattern_rule(db.pool(), &PatternRule::new(&owner.id, "app/models/*"))
            .await
            .unwrap();

        let config = TriageConfig::default();
        let engine = ResolutionEngine::builder(&config, db.clone())
            .blame_provider(Arc::new(MockBlameProvider::new().unavailable()))
            .build()
            .unwrap();
        let policy = CapturePolicy::from_config(&config);

        let report = ErrorReport::new("invalid amount", ExceptionKind::ArgumentError)
            .with_stack_trace("app/models/order.rb:12:in `total'\n/gems/rack/lib/rack.rb:1");
        let record = capture_error(&db, &engine, &policy, &report)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(record.owner_id.as_deref(), Some(owner.id.as_str()));
        assert_eq!(record.location.as_deref(), Some("app/models/order.rb:12:in `total'"));
        let stored = queries::get_error(db.pool(), &record.id).await.unwrap();
        assert_eq!(stored.map(|r| r.owner_id), Some(Some(owner.id)));

        let ignored = ErrorReport::new("no route", ExceptionKind::RoutingError);
        assert_eq!(capture_error(&db, &engine, &policy, &ignored).await.unwrap(), None);
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn test_capture_without_trace_logs_unresolved() {
        let db = Arc::new(ErrorCatalogDb::open_in_memory().await.unwrap());
        let config = TriageConfig::default();
        let engine = ResolutionEngine::builder(&config, db.clone())
            .blame_provider(Arc::new(MockBlameProvider::new().unavailable()))
            .build()
            .unwrap();
        let policy = CapturePolicy::from_config(&config);

        let report = ErrorReport::new("timed out", ExceptionKind::TimeoutError);
        let record = capture_error(&db, &engine, &policy, &report)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(record.owner_id, None);
        assert!(logs_contain(&format!(
            "could not resolve owner for error {}",
            record.id
        )));
    }
}
