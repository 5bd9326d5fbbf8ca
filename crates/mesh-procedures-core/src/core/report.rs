// crates/mesh-procedures-core/src/core/report.rs
// ============================================================================
// Module: Run Report
// Description: Results of a procedure run and their human-readable summary.
// Purpose: Provide the artifact written to disk and posted to webhooks.
// Dependencies: serde, serde_json, time
// ============================================================================

//! ## Overview
//! A [`RunReport`] lists one [`StepResult`] per executed, failed, or skipped
//! step (login included), the final entity map, and wall-clock bounds in Unix
//! milliseconds. [`RunReport::summary_text`] renders the plain-text summary
//! used for terminal output and chat webhooks.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use crate::core::call::ApiCallRecord;
use crate::core::id_map::IdMap;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Timestamp layout used in summaries (UTC).
const SUMMARY_TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[day]/[month]/[year] [hour]:[minute]:[second]");

// ============================================================================
// SECTION: Types
// ============================================================================

/// Outcome of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Step completed and its assertions held.
    Passed,
    /// Step ran and failed.
    Failed,
    /// Step did not run.
    Skipped,
}

impl StepStatus {
    /// Returns the short tag used in progress output.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Passed => "PASS",
            Self::Failed => "FAIL",
            Self::Skipped => "SKIP",
        }
    }
}

/// Result recorded for one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepResult {
    /// Zero-based procedure position; `None` for the login result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    /// Display label, e.g. `Step 3: create_source_source-1`.
    pub label: String,
    /// Step type as written in the procedure.
    pub step_type: String,
    /// Outcome.
    pub status: StepStatus,
    /// Failure or skip reason, or a short note on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Time spent in the step.
    pub duration_ms: u64,
    /// Last API call made by a failed step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_call: Option<ApiCallRecord>,
}

/// Aggregate counts for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunCounts {
    /// Results recorded.
    pub total: usize,
    /// Passed results.
    pub passed: usize,
    /// Failed results.
    pub failed: usize,
    /// Skipped results.
    pub skipped: usize,
}

/// Complete record of a procedure run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Procedure display name.
    pub procedure: String,
    /// Run start in Unix milliseconds.
    pub started_at_ms: i64,
    /// Run end in Unix milliseconds.
    pub finished_at_ms: i64,
    /// Aggregate counts.
    pub counts: RunCounts,
    /// Per-step results in execution order.
    pub results: Vec<StepResult>,
    /// Entities registered by the end of the run.
    pub id_map: IdMap,
}

// ============================================================================
// SECTION: Run Report
// ============================================================================

impl RunReport {
    /// Builds a report and computes its counts.
    #[must_use]
    pub fn new(
        procedure: impl Into<String>,
        started_at_ms: i64,
        finished_at_ms: i64,
        results: Vec<StepResult>,
        id_map: IdMap,
    ) -> Self {
        let counts = RunCounts::from_results(&results);
        Self {
            procedure: procedure.into(),
            started_at_ms,
            finished_at_ms,
            counts,
            results,
            id_map,
        }
    }

    /// Returns true when any result failed.
    #[must_use]
    pub const fn has_failures(&self) -> bool {
        self.counts.failed > 0
    }

    /// Iterates failed results.
    pub fn failures(&self) -> impl Iterator<Item = &StepResult> {
        self.results.iter().filter(|result| result.status == StepStatus::Failed)
    }

    /// Returns the run duration in seconds.
    #[must_use]
    pub fn duration_secs(&self) -> f64 {
        let elapsed = u64::try_from(self.finished_at_ms.saturating_sub(self.started_at_ms))
            .unwrap_or_default();
        Duration::from_millis(elapsed).as_secs_f64()
    }

    /// Renders the plain-text summary.
    #[must_use]
    pub fn summary_text(&self) -> String {
        let mut out = String::new();
        out.push_str("Test Summary\n");
        let _ = writeln!(out, "Procedure: {}", self.procedure);
        let _ = writeln!(out, "Start Time: {}", format_timestamp(self.started_at_ms));
        let _ = writeln!(out, "End Time: {}", format_timestamp(self.finished_at_ms));
        let _ = writeln!(out, "Total: {}", self.counts.total);
        let _ = writeln!(out, "Passed: {}", self.counts.passed);
        let _ = writeln!(out, "Failed: {}", self.counts.failed);
        let _ = writeln!(out, "Skipped: {}", self.counts.skipped);
        let _ = writeln!(out, "Duration: {:.2}s", self.duration_secs());
        if !self.has_failures() {
            return out;
        }
        out.push_str("\nFailures Details:\n");
        for (position, failure) in self.failures().enumerate() {
            let _ = writeln!(out, "--- Failure {} ---", position + 1);
            let _ = writeln!(out, "Test: {}", failure.label);
            if let Some(message) = &failure.message {
                let _ = writeln!(out, "Message: {message}");
            }
            if let Some(call) = &failure.api_call {
                let _ = writeln!(out, "API Called: {} {}", call.method, call.target());
                let _ = writeln!(out, "Payload: {}", render_value(call.payload.as_ref()));
                let _ = writeln!(out, "Response: {}", render_response(call));
            }
        }
        out
    }
}

impl RunCounts {
    /// Counts results by status.
    #[must_use]
    pub fn from_results(results: &[StepResult]) -> Self {
        let mut counts = Self {
            total: results.len(),
            ..Self::default()
        };
        for result in results {
            match result.status {
                StepStatus::Passed => counts.passed += 1,
                StepStatus::Failed => counts.failed += 1,
                StepStatus::Skipped => counts.skipped += 1,
            }
        }
        counts
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Formats Unix milliseconds with [`SUMMARY_TIME_FORMAT`], falling back to the raw number.
fn format_timestamp(unix_ms: i64) -> String {
    let nanos = i128::from(unix_ms) * 1_000_000;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()
        .and_then(|timestamp| timestamp.format(SUMMARY_TIME_FORMAT).ok())
        .unwrap_or_else(|| unix_ms.to_string())
}

/// Renders an optional JSON value compactly.
fn render_value(value: Option<&Value>) -> String {
    value.map_or_else(|| "{}".to_string(), Value::to_string)
}

/// Renders the response part of a call record.
fn render_response(call: &ApiCallRecord) -> String {
    match (&call.response, &call.error, call.status) {
        (Some(body), _, Some(status)) => format!("{status} {body}"),
        (Some(body), _, None) => body.to_string(),
        (None, Some(error), _) => error.clone(),
        (None, None, Some(status)) => status.to_string(),
        (None, None, None) => "none".to_string(),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
