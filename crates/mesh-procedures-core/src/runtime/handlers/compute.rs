// crates/mesh-procedures-core/src/runtime/handlers/compute.rs
// ============================================================================
// Module: Compute Status Step Handler
// Description: Waits for the compute job behind an entity to complete.
// Purpose: Resolve the entity's compute handle and poll it to completion.
// Dependencies: crate::{core, runtime}
// ============================================================================

//! ## Overview
//! The compute handle is read from the entity record. When an earlier read
//! did not capture it, the entity is fetched once by identifier and the
//! response merged before giving up.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::entity::EntityRecord;
use crate::core::identifiers::ComputeIdentifier;
use crate::core::identifiers::StepRef;
use crate::core::procedure::StepDefinition;
use crate::runtime::poller::PollPolicy;
use crate::runtime::poller::poll_compute;
use crate::runtime::step::StepContext;
use crate::runtime::step::StepError;
use crate::runtime::step::StepHandler;
use crate::runtime::step::StepOutcome;
use crate::runtime::step::ensure_success;

// ============================================================================
// SECTION: Handler
// ============================================================================

/// Polls the compute job of the entity named by `ref`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckComputeStatus;

impl StepHandler for CheckComputeStatus {
    fn execute(
        &self,
        step: &StepDefinition,
        ctx: &mut StepContext<'_, '_>,
    ) -> Result<StepOutcome, StepError> {
        let reference = step.reference.clone().ok_or_else(|| {
            StepError::MissingInput("ref check status compute not found".to_string())
        })?;
        let policy = PollPolicy::for_step(step, ctx.compute)?;
        let compute = resolve_compute_identifier(ctx, &reference)?;
        let outcome = poll_compute(ctx.session, &compute, &policy, ctx.clock)?;
        Ok(StepOutcome::note(format!(
            "compute {compute} completed on attempt {}/{}",
            outcome.attempts, policy.max_retries
        )))
    }

    fn references(&self, step: &StepDefinition) -> Vec<StepRef> {
        step.reference.clone().into_iter().collect()
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the compute handle recorded for a reference.
///
/// # Errors
///
/// Returns [`StepError::MissingInput`] when the reference is not registered
/// and [`StepError::ComputeIdentifierMissing`] when no handle is found even
/// after fetching the entity.
pub fn resolve_compute_identifier(
    ctx: &mut StepContext<'_, '_>,
    reference: &StepRef,
) -> Result<ComputeIdentifier, StepError> {
    let record = ctx
        .id_map
        .find(reference)
        .ok_or_else(|| StepError::MissingInput(format!("Entity not found: {reference}")))?;
    if let Some(compute) = record.compute_identifier() {
        return Ok(compute);
    }
    let kind = record.kind;
    let identifier = record.identifier.clone();
    let response = ctx.session.get_entity(kind, &identifier)?;
    ensure_success(&response)?;
    if let Some(details) = response.body.as_object() {
        ctx.id_map.merge_details(reference, details)?;
    }
    ctx.id_map
        .find(reference)
        .and_then(EntityRecord::compute_identifier)
        .ok_or_else(|| StepError::ComputeIdentifierMissing(reference.clone()))
}
