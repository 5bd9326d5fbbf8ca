// crates/mesh-procedures-core/src/core/compute.rs
// ============================================================================
// Module: Compute Status
// Description: Lifecycle states reported for asynchronous compute jobs.
// Purpose: Parse compute status responses into a closed set of states.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Mutating operations on sources, objects, and products start backend
//! compute jobs. The compute status endpoint reports one of a fixed set of
//! states, either as a bare string or wrapped in a nested object.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Compute job state reported by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComputeStatus {
    /// Job accepted and waiting for capacity.
    Scheduled,
    /// Executors are starting.
    StartingUp,
    /// Job is running.
    Running,
    /// Job finished successfully.
    Completed,
    /// Job finished with an error.
    Failed,
    /// Job is not scheduled.
    Unscheduled,
}

impl ComputeStatus {
    /// All known states.
    pub const ALL: [Self; 6] = [
        Self::Scheduled,
        Self::StartingUp,
        Self::Running,
        Self::Completed,
        Self::Failed,
        Self::Unscheduled,
    ];

    /// Returns the wire name of the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "SCHEDULED",
            Self::StartingUp => "STARTING_UP",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Unscheduled => "UNSCHEDULED",
        }
    }

    /// Parses a wire name. Matching is exact.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == value)
    }

    /// Returns true when the job will not change state again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Extracts the state from a compute status response body.
    ///
    /// Accepts `{"status": "RUNNING"}` and `{"status": {"status": "RUNNING"}}`.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when the field is missing or
    /// names an unknown state.
    pub fn from_response(body: &Value) -> Result<Self, String> {
        let field = body.get("status").ok_or_else(|| "response missing 'status'".to_string())?;
        let raw = match field {
            Value::String(text) => text.as_str(),
            Value::Object(nested) => nested
                .get("status")
                .and_then(Value::as_str)
                .ok_or_else(|| "nested 'status' must be a string".to_string())?,
            _ => return Err("'status' must be a string or object".to_string()),
        };
        Self::parse(raw).ok_or_else(|| format!("unknown compute status: {raw}"))
    }
}

impl fmt::Display for ComputeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
