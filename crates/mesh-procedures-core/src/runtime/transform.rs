// crates/mesh-procedures-core/src/runtime/transform.rs
// ============================================================================
// Module: Transformation Resolution
// Description: Rewrites builder payloads from step references to API inputs.
// Purpose: Turn `input_refs`/`input_ref`/`other_ref` into builder input keys.
// Dependencies: crate::core, serde_json
// ============================================================================

//! ## Overview
//! Builder payloads in procedures name their inputs by step reference. The
//! API expects an `inputs` list keyed by `input_<identifier>` (dashes become
//! underscores) and transformations that point at those keys. Resolution is
//! pure: it reads the [`IdMap`] and returns the rewritten payload.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use crate::core::id_map::IdMap;
use crate::core::identifiers::EntityIdentifier;
use crate::core::identifiers::StepRef;
use crate::runtime::step::StepError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Rows returned by builder previews.
pub const PREVIEW_LIMIT: u64 = 10;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Builder input derived from a step reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderInput {
    /// Step reference named in `input_refs`.
    pub reference: StepRef,
    /// Key used inside the builder payload.
    pub input_key: String,
    /// `product` or `resource`.
    pub input_type: &'static str,
}

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Returns the builder key for an entity identifier.
#[must_use]
pub fn input_key(identifier: &EntityIdentifier) -> String {
    format!("input_{}", identifier.as_str().replace('-', "_"))
}

/// References listed under `input_refs`, in order.
#[must_use]
pub fn input_refs(payload: &Map<String, Value>) -> Vec<StepRef> {
    payload
        .get("input_refs")
        .and_then(Value::as_array)
        .map(|refs| refs.iter().filter_map(Value::as_str).map(StepRef::new).collect())
        .unwrap_or_default()
}

/// Rewrites a builder payload against the entities registered so far.
///
/// # Errors
///
/// Returns [`StepError`] when `input_refs` or `transformations` are
/// malformed, a listed reference is not registered, or a transformation
/// names a reference missing from `input_refs`.
pub fn resolve_transformation_payload(
    payload: &Map<String, Value>,
    id_map: &IdMap,
) -> Result<Map<String, Value>, StepError> {
    let mut resolved = payload.clone();
    let refs = match resolved.remove("input_refs") {
        None => Vec::new(),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(reference) => Ok(StepRef::new(reference)),
                _ => Err(StepError::InvalidInput("input_refs must contain strings".to_string())),
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => {
            return Err(StepError::InvalidInput("input_refs must be a list".to_string()));
        }
    };
    let transformations = match resolved.remove("transformations") {
        None => Vec::new(),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(StepError::InvalidInput("transformations must be a list".to_string()));
        }
    };

    let mut inputs = Vec::with_capacity(refs.len());
    for reference in refs {
        let record = id_map.require(&reference).map_err(|_| {
            StepError::MissingInput(format!("Input entity not found: {reference}"))
        })?;
        inputs.push(BuilderInput {
            input_key: input_key(&record.identifier),
            input_type: record.kind.transformation_input_type(),
            reference,
        });
    }

    let mut rewritten = Vec::with_capacity(transformations.len());
    for transformation in transformations {
        rewritten.push(rewrite_transformation(transformation, &inputs)?);
    }

    resolved.insert("transformations".to_string(), Value::Array(rewritten));
    resolved.insert(
        "inputs".to_string(),
        Value::Array(
            inputs
                .iter()
                .map(|input| {
                    json!({
                        "input_type": input.input_type,
                        "identifier": input.input_key,
                        "preview_limit": PREVIEW_LIMIT,
                    })
                })
                .collect(),
        ),
    );
    Ok(resolved)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Replaces `input_ref`/`other_ref` with `input`/`other` builder keys.
fn rewrite_transformation(
    transformation: Value,
    inputs: &[BuilderInput],
) -> Result<Value, StepError> {
    let Value::Object(mut fields) = transformation else {
        return Err(StepError::InvalidInput("each transformation must be an object".to_string()));
    };
    for (ref_key, target_key) in [("input_ref", "input"), ("other_ref", "other")] {
        let Some(raw) = fields.remove(ref_key) else {
            continue;
        };
        let reference = raw.as_str().ok_or_else(|| {
            StepError::InvalidInput(format!("{ref_key} must be a string"))
        })?;
        let matched = inputs
            .iter()
            .find(|input| input.reference.as_str() == reference)
            .ok_or_else(|| {
                StepError::InvalidInput(format!(
                    "{ref_key} {reference} is not listed in input_refs"
                ))
            })?;
        fields.insert(target_key.to_string(), Value::String(matched.input_key.clone()));
    }
    Ok(Value::Object(fields))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
