// crates/mesh-procedures-core/src/core/procedure.rs
// ============================================================================
// Module: Procedure Model
// Description: Declarative step lists executed against the data mesh API.
// Purpose: Parse and label procedure definitions from JSON or YAML.
// Dependencies: serde, serde_json, serde_yaml, thiserror
// ============================================================================

//! ## Overview
//! A procedure is an ordered list of steps. Each step names a step type and
//! carries the fields that type reads: an `id` for steps that create
//! entities, a `ref` for steps that act on one, and a free-form `input`
//! payload. Procedure files are untrusted input and are loaded with size and
//! encoding limits.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::identifiers::StepRef;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum procedure file size in bytes.
pub const MAX_PROCEDURE_FILE_SIZE: usize = 1024 * 1024;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Ordered list of steps run against one API session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Procedure {
    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Steps in execution order.
    pub steps: Vec<StepDefinition>,
}

/// Single declarative step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepDefinition {
    /// Step type resolved through the step registry.
    #[serde(rename = "type")]
    pub step_type: String,
    /// Reference registered by steps that create an entity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<StepRef>,
    /// Reference of the entity the step acts on.
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<StepRef>,
    /// Free-form label kept for older procedure files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    /// Step payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    /// Host mesh reference for product creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh_ref: Option<StepRef>,
    /// Maximum compute status attempts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    /// Seconds between compute status attempts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_interval: Option<u64>,
    /// Seconds to wait before the first compute status attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_delay: Option<u64>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Procedure loading errors.
#[derive(Debug, Error)]
pub enum ProcedureError {
    /// I/O failure while reading a procedure file.
    #[error("procedure io error: {0}")]
    Io(String),
    /// JSON or YAML parsing error.
    #[error("procedure parse error: {0}")]
    Parse(String),
    /// Structurally invalid procedure.
    #[error("invalid procedure: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Step Definition
// ============================================================================

impl StepDefinition {
    /// Creates a step with only a type.
    #[must_use]
    pub fn new(step_type: impl Into<String>) -> Self {
        Self {
            step_type: step_type.into(),
            id: None,
            reference: None,
            identifier: None,
            input: None,
            mesh_ref: None,
            max_retries: None,
            retry_interval: None,
            initial_delay: None,
        }
    }

    /// Sets the reference this step registers.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<StepRef>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the reference this step acts on.
    #[must_use]
    pub fn with_ref(mut self, reference: impl Into<StepRef>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Sets the step payload.
    #[must_use]
    pub fn with_input(mut self, input: Value) -> Self {
        self.input = Some(input);
        self
    }

    /// Sets the host mesh reference.
    #[must_use]
    pub fn with_mesh_ref(mut self, mesh_ref: impl Into<StepRef>) -> Self {
        self.mesh_ref = Some(mesh_ref.into());
        self
    }

    /// Sets compute polling attempts and interval in seconds.
    #[must_use]
    pub const fn with_polling(mut self, max_retries: u32, retry_interval: u64) -> Self {
        self.max_retries = Some(max_retries);
        self.retry_interval = Some(retry_interval);
        self
    }

    /// Returns the display label for the step at a zero-based position.
    ///
    /// The label reads `Step {n}: {type}_{suffix}` where the suffix is the
    /// first of `id`, `identifier`, or `ref` that is present.
    #[must_use]
    pub fn label(&self, index: usize) -> String {
        let suffix = self
            .id
            .as_ref()
            .map(StepRef::as_str)
            .or(self.identifier.as_deref())
            .or_else(|| self.reference.as_ref().map(StepRef::as_str))
            .unwrap_or("");
        format!("Step {}: {}_{}", index + 1, self.step_type, suffix)
    }

    /// Returns the string stored under an input key, if present.
    #[must_use]
    pub fn input_str(&self, key: &str) -> Option<&str> {
        self.input.as_ref().and_then(|input| input.get(key)).and_then(Value::as_str)
    }
}

// ============================================================================
// SECTION: Procedure
// ============================================================================

impl Procedure {
    /// Creates a named procedure from steps.
    #[must_use]
    pub fn new(name: impl Into<String>, steps: Vec<StepDefinition>) -> Self {
        Self {
            name: Some(name.into()),
            description: None,
            steps,
        }
    }

    /// Returns the display name, defaulting to `procedure`.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("procedure")
    }

    /// Parses a procedure from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ProcedureError`] when parsing or validation fails.
    pub fn from_json_str(content: &str) -> Result<Self, ProcedureError> {
        let procedure: Self =
            serde_json::from_str(content).map_err(|err| ProcedureError::Parse(err.to_string()))?;
        procedure.validate()?;
        Ok(procedure)
    }

    /// Parses a procedure from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`ProcedureError`] when parsing or validation fails.
    pub fn from_yaml_str(content: &str) -> Result<Self, ProcedureError> {
        let procedure: Self =
            serde_yaml::from_str(content).map_err(|err| ProcedureError::Parse(err.to_string()))?;
        procedure.validate()?;
        Ok(procedure)
    }

    /// Loads a procedure file, choosing the format from the extension.
    ///
    /// # Errors
    ///
    /// Returns [`ProcedureError`] when the file cannot be read, exceeds the
    /// size limit, is not UTF-8, or does not parse.
    pub fn load(path: &Path) -> Result<Self, ProcedureError> {
        let bytes = fs::read(path).map_err(|err| ProcedureError::Io(err.to_string()))?;
        if bytes.len() > MAX_PROCEDURE_FILE_SIZE {
            return Err(ProcedureError::Invalid("procedure file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ProcedureError::Invalid("procedure file must be utf-8".to_string()))?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "json" => Self::from_json_str(content),
            "yaml" | "yml" => Self::from_yaml_str(content),
            other => Err(ProcedureError::Invalid(format!(
                "unsupported procedure file extension: {other:?} (expected json, yaml, or yml)"
            ))),
        }
    }

    /// Checks structural requirements that do not depend on step types.
    ///
    /// # Errors
    ///
    /// Returns [`ProcedureError::Invalid`] when the procedure has no steps or
    /// a step type is blank.
    pub fn validate(&self) -> Result<(), ProcedureError> {
        if self.steps.is_empty() {
            return Err(ProcedureError::Invalid(
                "procedure must contain at least one step".to_string(),
            ));
        }
        for (index, step) in self.steps.iter().enumerate() {
            if step.step_type.trim().is_empty() {
                return Err(ProcedureError::Invalid(format!(
                    "step {} has an empty type",
                    index + 1
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
