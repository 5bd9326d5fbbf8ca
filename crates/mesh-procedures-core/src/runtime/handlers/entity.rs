// crates/mesh-procedures-core/src/runtime/handlers/entity.rs
// ============================================================================
// Module: Entity Step Handlers
// Description: List, create, read, and delete steps for every entity kind.
// Purpose: Register created entities and keep the id map in sync with the API.
// Dependencies: crate::{core, runtime}, serde_json
// ============================================================================

//! ## Overview
//! Create steps register `{id, identifier, kind}`. Read steps require the
//! response to carry `entity.identifier` and merge the response into the
//! record so later compute polls can find their job handle. Delete steps
//! remove the record once the API confirms.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

use crate::core::entity::EntityKind;
use crate::core::entity::EntityRecord;
use crate::core::identifiers::EntityIdentifier;
use crate::core::identifiers::StepRef;
use crate::core::procedure::StepDefinition;
use crate::runtime::step::StepContext;
use crate::runtime::step::StepError;
use crate::runtime::step::StepHandler;
use crate::runtime::step::StepOutcome;
use crate::runtime::step::ensure_success;
use crate::runtime::step::input_object;
use crate::runtime::step::require_id;
use crate::runtime::step::require_target;
use crate::runtime::step::target_reference;

// ============================================================================
// SECTION: List
// ============================================================================

/// Lists every entity of a kind.
#[derive(Debug, Clone, Copy)]
pub struct ListEntities {
    /// Collection to list.
    pub kind: EntityKind,
}

impl StepHandler for ListEntities {
    fn execute(
        &self,
        _step: &StepDefinition,
        ctx: &mut StepContext<'_, '_>,
    ) -> Result<StepOutcome, StepError> {
        let response = ctx.session.list_entities(self.kind)?;
        ensure_success(&response)?;
        Ok(response.body.as_array().map_or_else(StepOutcome::done, |items| {
            StepOutcome::note(format!("{} {} entities", items.len(), self.kind))
        }))
    }
}

// ============================================================================
// SECTION: Create
// ============================================================================

/// Creates a mesh, system, source, or object from the step input.
#[derive(Debug, Clone, Copy)]
pub struct CreateEntity {
    /// Collection to create in.
    pub kind: EntityKind,
}

impl StepHandler for CreateEntity {
    fn execute(
        &self,
        step: &StepDefinition,
        ctx: &mut StepContext<'_, '_>,
    ) -> Result<StepOutcome, StepError> {
        let operation = format!("create {}", self.kind);
        let payload = input_object(step, &operation)?.clone();
        let reference = require_id(step, &operation)?.clone();
        let response = ctx.session.create_entity(self.kind, Value::Object(payload))?;
        ensure_success(&response)?;
        let identifier = created_identifier(self.kind, &response.body)?;
        Ok(register_created(ctx, reference, identifier, self.kind))
    }

    fn creates(&self) -> Option<EntityKind> {
        Some(self.kind)
    }
}

/// Creates a product hosted by a mesh created earlier in the run.
///
/// The mesh comes from `input.mesh_ref` (removed from the payload) or the
/// step-level `mesh_ref` and is sent as `host_mesh_identifier`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateProduct;

impl CreateProduct {
    /// Returns the mesh reference, preferring the input payload.
    fn mesh_reference(step: &StepDefinition) -> Option<StepRef> {
        step.input_str("mesh_ref")
            .filter(|value| !value.is_empty())
            .map(StepRef::new)
            .or_else(|| step.mesh_ref.clone())
    }
}

impl StepHandler for CreateProduct {
    fn execute(
        &self,
        step: &StepDefinition,
        ctx: &mut StepContext<'_, '_>,
    ) -> Result<StepOutcome, StepError> {
        let operation = "create product";
        let mut payload = input_object(step, operation)?.clone();
        let reference = require_id(step, operation)?.clone();
        if let Some(raw) = payload.remove("mesh_ref") {
            if !raw.is_string() {
                return Err(StepError::InvalidInput("mesh_ref must be a string".to_string()));
            }
        }
        if let Some(mesh_ref) = Self::mesh_reference(step) {
            let mesh = ctx.id_map.require_kind(&mesh_ref, &[EntityKind::Mesh])?;
            payload.insert(
                "host_mesh_identifier".to_string(),
                Value::String(mesh.identifier.to_string()),
            );
        }
        let response = ctx.session.create_entity(EntityKind::Product, Value::Object(payload))?;
        ensure_success(&response)?;
        let identifier = created_identifier(EntityKind::Product, &response.body)?;
        Ok(register_created(ctx, reference, identifier, EntityKind::Product))
    }

    fn references(&self, step: &StepDefinition) -> Vec<StepRef> {
        Self::mesh_reference(step).into_iter().collect()
    }

    fn creates(&self) -> Option<EntityKind> {
        Some(EntityKind::Product)
    }
}

// ============================================================================
// SECTION: Read
// ============================================================================

/// Reads one entity and merges the response into its record.
#[derive(Debug, Clone, Copy)]
pub struct GetEntity {
    /// Kind of the target entity.
    pub kind: EntityKind,
}

impl StepHandler for GetEntity {
    fn execute(
        &self,
        step: &StepDefinition,
        ctx: &mut StepContext<'_, '_>,
    ) -> Result<StepOutcome, StepError> {
        let reference = require_target(step, self.kind)?;
        let identifier = ctx.id_map.require_kind(&reference, &[self.kind])?.identifier.clone();
        let response = ctx.session.get_entity(self.kind, &identifier)?;
        ensure_success(&response)?;
        let details = response
            .body
            .as_object()
            .filter(|body| entity_identifier(body).is_some())
            .ok_or_else(|| {
                StepError::InvalidResponse("missing 'entity' or 'identifier' field".to_string())
            })?;
        ctx.id_map.merge_details(&reference, details)?;
        let healthy = ctx.id_map.find(&reference).and_then(EntityRecord::healthy);
        Ok(healthy.map_or_else(StepOutcome::done, |healthy| {
            StepOutcome::note(format!("healthy: {healthy}"))
        }))
    }

    fn references(&self, step: &StepDefinition) -> Vec<StepRef> {
        target_reference(step, self.kind.ref_key()).into_iter().collect()
    }
}

// ============================================================================
// SECTION: Delete
// ============================================================================

/// Deletes one entity and drops its record.
#[derive(Debug, Clone, Copy)]
pub struct DeleteEntity {
    /// Kind of the target entity.
    pub kind: EntityKind,
}

impl StepHandler for DeleteEntity {
    fn execute(
        &self,
        step: &StepDefinition,
        ctx: &mut StepContext<'_, '_>,
    ) -> Result<StepOutcome, StepError> {
        let reference = delete_target(step, self.kind)
            .ok_or_else(|| StepError::MissingInput(format!("{} not found", self.kind)))?;
        let identifier = ctx.id_map.require_kind(&reference, &[self.kind])?.identifier.clone();
        let response = ctx.session.delete_entity(self.kind, &identifier)?;
        ensure_success(&response)?;
        ctx.id_map.remove(&reference);
        Ok(StepOutcome::note(format!("deleted {reference} ({identifier})")))
    }

    fn references(&self, step: &StepDefinition) -> Vec<StepRef> {
        delete_target(step, self.kind).into_iter().collect()
    }

    fn removes(&self, step: &StepDefinition) -> Option<StepRef> {
        delete_target(step, self.kind)
    }
}

/// Resolves the entity a delete step removes.
///
/// System and object deletes name their target with `ref` and only fall back
/// to `input.<kind>_ref`; the other kinds read the input key first.
fn delete_target(step: &StepDefinition, kind: EntityKind) -> Option<StepRef> {
    match kind {
        EntityKind::System | EntityKind::Object => step
            .reference
            .clone()
            .or_else(|| step.input_str(kind.ref_key()).map(StepRef::new)),
        EntityKind::Mesh | EntityKind::Source | EntityKind::Product => {
            target_reference(step, kind.ref_key())
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Extracts the identifier assigned by a create call.
///
/// Systems answer with a top-level `identifier`; the other kinds wrap it in
/// `entity`. Each form falls back to the other.
///
/// # Errors
///
/// Returns [`StepError::InvalidResponse`] when neither form is present.
pub fn created_identifier(kind: EntityKind, body: &Value) -> Result<EntityIdentifier, StepError> {
    let top_level = body.get("identifier").and_then(Value::as_str);
    let nested = body
        .get("entity")
        .and_then(|entity| entity.get("identifier"))
        .and_then(Value::as_str);
    let identifier = match kind {
        EntityKind::System => top_level.or(nested),
        EntityKind::Mesh | EntityKind::Source | EntityKind::Object | EntityKind::Product => {
            nested.or(top_level)
        }
    };
    identifier
        .filter(|value| !value.is_empty())
        .map(EntityIdentifier::new)
        .ok_or_else(|| {
            StepError::InvalidResponse(format!("created {kind} is missing an identifier"))
        })
}

/// Returns `entity.identifier` from a read response.
fn entity_identifier(body: &serde_json::Map<String, Value>) -> Option<&str> {
    body.get("entity")
        .and_then(|entity| entity.get("identifier"))
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

/// Registers a freshly created entity and describes it.
fn register_created(
    ctx: &mut StepContext<'_, '_>,
    reference: StepRef,
    identifier: EntityIdentifier,
    kind: EntityKind,
) -> StepOutcome {
    let outcome = StepOutcome::note(format!("{reference} -> {identifier}"));
    ctx.id_map.register(EntityRecord::new(reference, identifier, kind));
    outcome
}

// ============================================================================
// SECTION: Tests
// ============================================================================
