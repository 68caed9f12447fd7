//! Captured error records.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A captured error.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Unique identifier
    pub id: String,

    /// Human-readable error message
    pub message: String,

    /// Closed classification of the raised exception
    pub exception_kind: ExceptionKind,

    /// Raw stack trace text, most recent call first
    pub stack_trace: Option<String>,

    /// First application frame of the trace, for display
    pub location: Option<String>,

    pub severity: Severity,

    pub status: ErrorStatus,

    /// Resolved owner, unset until ownership resolution succeeds
    pub owner_id: Option<String>,

    /// When the error was raised
    pub occurred_at: DateTime<Utc>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl ErrorRecord {
    pub fn new(message: impl Into<String>, exception_kind: ExceptionKind) -> Self {
        let now = Utc::now();
        Self {
            id: format!("err_{}", uuid::Uuid::new_v4().simple()),
            message: message.into(),
            exception_kind,
            stack_trace: None,
            location: None,
            severity: Severity::default(),
            status: ErrorStatus::default(),
            owner_id: None,
            occurred_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = Some(stack_trace.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

/// Error severity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}

/// Triage status of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ErrorStatus {
    #[default]
    New,
    InProgress,
    Resolved,
    Ignored,
}

impl std::fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Resolved => write!(f, "resolved"),
            Self::Ignored => write!(f, "ignored"),
        }
    }
}

/// Closed set of exception classifications accepted at capture time.
///
/// Reports carry one of these tags rather than an arbitrary class name, so
/// nothing is ever instantiated from caller-supplied text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ExceptionKind {
    RoutingError,
    InvalidAuthenticityToken,
    RecordNotFound,
    ArgumentError,
    NoMethodError,
    NameError,
    RuntimeError,
    TimeoutError,
    StandardError,
    Unknown,
}

impl ExceptionKind {
    pub const ALL: [ExceptionKind; 10] = [
        Self::RoutingError,
        Self::InvalidAuthenticityToken,
        Self::RecordNotFound,
        Self::ArgumentError,
        Self::NoMethodError,
        Self::NameError,
        Self::RuntimeError,
        Self::TimeoutError,
        Self::StandardError,
        Self::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoutingError => "routing_error",
            Self::InvalidAuthenticityToken => "invalid_authenticity_token",
            Self::RecordNotFound => "record_not_found",
            Self::ArgumentError => "argument_error",
            Self::NoMethodError => "no_method_error",
            Self::NameError => "name_error",
            Self::RuntimeError => "runtime_error",
            Self::TimeoutError => "timeout_error",
            Self::StandardError => "standard_error",
            Self::Unknown => "unknown",
        }
    }

    /// Classify a fully qualified exception class name.
    ///
    /// Only the final `::` segment is considered; anything unrecognised maps
    /// to [`ExceptionKind::Unknown`].
    pub fn from_class_name(class_name: &str) -> Self {
        let short = class_name.rsplit("::").next().unwrap_or(class_name);
        match short {
            "RoutingError" => Self::RoutingError,
            "InvalidAuthenticityToken" => Self::InvalidAuthenticityToken,
            "RecordNotFound" => Self::RecordNotFound,
            "ArgumentError" => Self::ArgumentError,
            "NoMethodError" => Self::NoMethodError,
            "NameError" => Self::NameError,
            "RuntimeError" => Self::RuntimeError,
            "TimeoutError" | "Timeout" => Self::TimeoutError,
            "StandardError" => Self::StandardError,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExceptionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown exception kind '{s}'"))
    }
}
