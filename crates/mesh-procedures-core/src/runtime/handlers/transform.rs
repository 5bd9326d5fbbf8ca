// crates/mesh-procedures-core/src/runtime/handlers/transform.rs
// ============================================================================
// Module: Transformation Step Handler
// Description: Submits a product's transformation builder.
// Purpose: Resolve builder input references and PUT the builder payload.
// Dependencies: crate::{core, runtime}, serde_json
// ============================================================================

//! ## Overview
//! The builder payload names its inputs by step reference. Those references
//! are rewritten into API input keys before the payload is PUT to the target
//! product.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

use crate::core::entity::EntityKind;
use crate::core::identifiers::StepRef;
use crate::core::procedure::StepDefinition;
use crate::runtime::step::StepContext;
use crate::runtime::step::StepError;
use crate::runtime::step::StepHandler;
use crate::runtime::step::StepOutcome;
use crate::runtime::step::ensure_success;
use crate::runtime::step::input_object;
use crate::runtime::step::require_input_ref;
use crate::runtime::transform::input_refs;
use crate::runtime::transform::resolve_transformation_payload;

// ============================================================================
// SECTION: Handler
// ============================================================================

/// Applies `input.transformations` to the product named by `input.product_ref`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyTransformation;

impl StepHandler for ApplyTransformation {
    fn execute(
        &self,
        step: &StepDefinition,
        ctx: &mut StepContext<'_, '_>,
    ) -> Result<StepOutcome, StepError> {
        let input = input_object(step, "create transformation builder")?;
        let product_ref = require_input_ref(step, "product_ref")?;
        let builder = match input.get("transformations") {
            Some(Value::Object(builder)) => builder,
            Some(_) => {
                return Err(StepError::InvalidInput(
                    "transformations must be a builder object".to_string(),
                ));
            }
            None => {
                return Err(StepError::MissingInput("input transformations not found".to_string()));
            }
        };
        let product =
            ctx.id_map.require_kind(&product_ref, &[EntityKind::Product])?.identifier.clone();
        let payload = resolve_transformation_payload(builder, ctx.id_map)?;
        let inputs = payload.get("inputs").and_then(Value::as_array).map_or(0, Vec::len);
        let response = ctx.session.apply_transformation(&product, Value::Object(payload))?;
        ensure_success(&response)?;
        Ok(StepOutcome::note(format!("{inputs} input(s)")))
    }

    fn references(&self, step: &StepDefinition) -> Vec<StepRef> {
        let mut refs: Vec<StepRef> =
            step.input_str("product_ref").map(StepRef::new).into_iter().collect();
        if let Some(builder) = step
            .input
            .as_ref()
            .and_then(|input| input.get("transformations"))
            .and_then(Value::as_object)
        {
            refs.extend(input_refs(builder));
        }
        refs
    }
}
