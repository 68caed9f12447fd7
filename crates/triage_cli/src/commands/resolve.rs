//! Capturing errors and resolving their owners.

use std::path::Path;

use miette::{IntoDiagnostic, Result};
use owo_colors::OwoColorize;
use triage_core::{
    CapturePolicy, ErrorReport, ResolutionOutcome, ResolutionResult, TriageConfig, assign_owner,
    assign_unassigned, capture_error,
};
use triage_db::{ExceptionKind, Severity};

use crate::helpers::{build_engine, get_db, read_trace};
use crate::output::Output;

fn show_result(output: &Output, result: &ResolutionResult) {
    match (&result.owner, result.strategy) {
        (Some(owner), Some(strategy)) => {
            output.success(&format!(
                "Owner: {} <{}>",
                owner.name.bright_cyan(),
                owner.email
            ));
            output.kv("Strategy", &strategy.to_string());
        }
        _ => {
            let reason = match result.outcome {
                ResolutionOutcome::NoFrames => "no application frames in the trace",
                _ => "no strategy named an owner",
            };
            output.warning(&format!("Could not resolve an owner: {reason}"));
        }
    }

    if !result.attempted.is_empty() {
        let attempted: Vec<String> = result.attempted.iter().map(|k| k.to_string()).collect();
        output.kv("Attempted", &attempted.join(" -> "));
    }
    if !result.frames.is_empty() {
        let rows = result
            .frames
            .iter()
            .enumerate()
            .map(|(i, frame)| {
                vec![
                    i.to_string(),
                    frame.file_path.clone(),
                    frame.line_number.to_string(),
                ]
            })
            .collect();
        output.table(&["#", "File", "Line"], rows);
    }
}

/// Resolve a trace without recording anything.
pub async fn resolve(
    trace: Option<&str>,
    trace_file: Option<&Path>,
    json: bool,
    config: &TriageConfig,
) -> Result<()> {
    let trace = read_trace(trace, trace_file)?;
    let db = get_db(config).await?;
    let engine = build_engine(config, db)?;

    let result = engine.resolve(Some(&trace)).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&result).into_diagnostic()?);
    } else {
        show_result(&Output::new(), &result);
    }
    Ok(())
}

/// Record an error through the capture policy.
pub async fn capture(
    message: &str,
    kind: ExceptionKind,
    trace_file: Option<&Path>,
    severity: Option<Severity>,
    config: &TriageConfig,
) -> Result<()> {
    let output = Output::new();
    let db = get_db(config).await?;
    let engine = build_engine(config, db.clone())?;
    let policy = CapturePolicy::from_config(config);

    let mut report = ErrorReport::new(message, kind);
    if let Some(path) = trace_file {
        report = report.with_stack_trace(read_trace(None, Some(path))?);
    }
    report.severity = severity;

    let Some(record) = capture_error(&db, &engine, &policy, &report).await? else {
        output.warning(&format!(
            "Not captured: {} errors are ignored or capture is off in '{}'",
            kind, config.capture.environment
        ));
        return Ok(());
    };

    output.success(&format!("Captured error {}", record.id.bright_cyan()));
    output.kv("Kind", record.exception_kind.as_str());
    output.kv("Severity", &record.severity.to_string());
    if let Some(location) = &record.location {
        output.kv("Location", location);
    }
    match &record.owner_id {
        Some(owner_id) => output.kv("Owner", owner_id),
        None => output.kv("Owner", "unassigned"),
    }
    Ok(())
}

/// Resolve and persist the owner of one stored error, or of every unassigned one.
pub async fn assign(error_id: Option<&str>, config: &TriageConfig) -> Result<()> {
    let output = Output::new();
    let db = get_db(config).await?;
    let engine = build_engine(config, db.clone())?;

    match error_id {
        Some(id) => {
            let result = assign_owner(&db, &engine, id).await?;
            show_result(&output, &result);
        }
        None => {
            let assigned = assign_unassigned(&db, &engine).await?;
            output.success(&format!("Assigned {assigned} error(s)"));
        }
    }
    Ok(())
}
