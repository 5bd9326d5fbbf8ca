// crates/mesh-procedures-core/src/runtime/step.rs
// ============================================================================
// Module: Step Contract
// Description: Handler trait, execution context, and step errors.
// Purpose: Define what every step type implements and what it may touch.
// Dependencies: crate::{core, interfaces, runtime::session}, thiserror
// ============================================================================

//! ## Overview
//! A step handler receives the step definition and a [`StepContext`] holding
//! the API session, the run's [`IdMap`], the clock, and default compute
//! polling settings. Handlers also describe, without running, which
//! references they consume and which they register so procedures can be
//! validated offline.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::core::compute::ComputeStatus;
use crate::core::entity::EntityKind;
use crate::core::id_map::IdMap;
use crate::core::id_map::IdMapError;
use crate::core::identifiers::ComputeIdentifier;
use crate::core::identifiers::StepRef;
use crate::core::procedure::StepDefinition;
use crate::interfaces::ApiResponse;
use crate::interfaces::Clock;
use crate::interfaces::TransportError;
use crate::runtime::poller::ComputeDefaults;
use crate::runtime::session::ApiSession;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Step execution failures.
#[derive(Debug, Error)]
pub enum StepError {
    /// No handler is registered for the step type.
    #[error("Unknown step type: {0}")]
    UnknownStepType(String),
    /// A required input is absent.
    #[error("{0}")]
    MissingInput(String),
    /// Input is present but malformed.
    #[error("invalid step input: {0}")]
    InvalidInput(String),
    /// A step reference did not resolve.
    #[error(transparent)]
    Reference(#[from] IdMapError),
    /// The request never produced a response.
    #[error("request failed: {0}")]
    Transport(#[from] TransportError),
    /// The API answered with a non-2xx status.
    #[error("request failed: {status} - {body}")]
    UnexpectedStatus {
        /// HTTP status.
        status: u16,
        /// Raw response body.
        body: String,
    },
    /// The API answered 2xx with an unusable body.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// The entity has no compute job to poll.
    #[error("Compute identifier not found for {0}")]
    ComputeIdentifierMissing(StepRef),
    /// The compute job reported `FAILED`.
    #[error("compute {identifier} reported FAILED on attempt {attempt}")]
    ComputeFailed {
        /// Compute job.
        identifier: ComputeIdentifier,
        /// Attempt that observed the failure.
        attempt: u32,
    },
    /// The compute job never reached `COMPLETED`.
    #[error(
        "Compute failed after retries: {identifier} still {} after {attempts} attempt(s)",
        .last_status.map_or("unknown", ComputeStatus::as_str)
    )]
    ComputeNotCompleted {
        /// Compute job.
        identifier: ComputeIdentifier,
        /// Attempts made.
        attempts: u32,
        /// Last observed state.
        last_status: Option<ComputeStatus>,
    },
}

impl StepError {
    /// Returns true for compute polling failures.
    #[must_use]
    pub const fn is_compute_failure(&self) -> bool {
        matches!(
            self,
            Self::ComputeIdentifierMissing(_)
                | Self::ComputeFailed { .. }
                | Self::ComputeNotCompleted { .. }
        )
    }
}

// ============================================================================
// SECTION: Context and Outcome
// ============================================================================

/// Mutable state a step may use.
pub struct StepContext<'r, 'a> {
    /// API session.
    pub session: &'r mut ApiSession<'a>,
    /// Entity references registered so far.
    pub id_map: &'r mut IdMap,
    /// Clock used for compute polling waits.
    pub clock: &'r dyn Clock,
    /// Compute polling defaults for steps that omit them.
    pub compute: &'r ComputeDefaults,
}

/// Successful step result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepOutcome {
    /// Short note shown with the result.
    pub message: Option<String>,
}

impl StepOutcome {
    /// Outcome without a note.
    #[must_use]
    pub const fn done() -> Self {
        Self {
            message: None,
        }
    }

    /// Outcome with a note.
    #[must_use]
    pub fn note(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }
}

// ============================================================================
// SECTION: Handler Trait
// ============================================================================

/// Behavior behind one step type.
pub trait StepHandler {
    /// Runs the step.
    ///
    /// # Errors
    ///
    /// Returns [`StepError`] when inputs are missing, references do not
    /// resolve, or the API response fails the step's assertions.
    fn execute(
        &self,
        step: &StepDefinition,
        ctx: &mut StepContext<'_, '_>,
    ) -> Result<StepOutcome, StepError>;

    /// References the step resolves through the id map.
    fn references(&self, _step: &StepDefinition) -> Vec<StepRef> {
        Vec::new()
    }

    /// Kind of entity the step creates, if it creates one.
    fn creates(&self) -> Option<EntityKind> {
        None
    }

    /// Reference and kind the step registers, if any.
    fn produces(&self, step: &StepDefinition) -> Option<(StepRef, EntityKind)> {
        self.creates().and_then(|kind| step.id.clone().map(|id| (id, kind)))
    }

    /// References the step removes from the id map.
    fn removes(&self, _step: &StepDefinition) -> Option<StepRef> {
        None
    }
}

// ============================================================================
// SECTION: Shared Helpers
// ============================================================================

/// Fails unless the response status is 2xx.
///
/// # Errors
///
/// Returns [`StepError::UnexpectedStatus`] for non-2xx responses.
pub fn ensure_success(response: &ApiResponse) -> Result<(), StepError> {
    if response.is_success() {
        return Ok(());
    }
    Err(StepError::UnexpectedStatus {
        status: response.status,
        body: response.raw.clone(),
    })
}

/// Returns the step input as a JSON object.
///
/// # Errors
///
/// Returns [`StepError::MissingInput`] when `input` is absent and
/// [`StepError::InvalidInput`] when it is not an object.
pub fn input_object<'s>(
    step: &'s StepDefinition,
    operation: &str,
) -> Result<&'s Map<String, Value>, StepError> {
    let input = step
        .input
        .as_ref()
        .ok_or_else(|| StepError::MissingInput(format!("input {operation} not found")))?;
    input
        .as_object()
        .ok_or_else(|| StepError::InvalidInput(format!("input {operation} must be an object")))
}

/// Returns the `id` a creating step registers.
///
/// # Errors
///
/// Returns [`StepError::MissingInput`] when `id` is absent.
pub fn require_id<'s>(step: &'s StepDefinition, operation: &str) -> Result<&'s StepRef, StepError> {
    step.id.as_ref().ok_or_else(|| StepError::MissingInput(format!("id {operation} not found")))
}

/// Resolves the target reference from `input.<key>`, falling back to `ref`.
#[must_use]
pub fn target_reference(step: &StepDefinition, key: &str) -> Option<StepRef> {
    step.input_str(key).map(StepRef::new).or_else(|| step.reference.clone())
}

/// Resolves a required target reference for an entity kind.
///
/// # Errors
///
/// Returns [`StepError::MissingInput`] naming the kind when neither
/// `input.<kind>_ref` nor `ref` is present.
pub fn require_target(step: &StepDefinition, kind: EntityKind) -> Result<StepRef, StepError> {
    target_reference(step, kind.ref_key())
        .ok_or_else(|| StepError::MissingInput(format!("{kind} not found")))
}

/// Resolves a required `input.<key>` reference.
///
/// # Errors
///
/// Returns [`StepError::MissingInput`] when the key is absent.
pub fn require_input_ref(step: &StepDefinition, key: &str) -> Result<StepRef, StepError> {
    step.input_str(key)
        .map(StepRef::new)
        .ok_or_else(|| StepError::MissingInput(format!("input {key} not found")))
}
