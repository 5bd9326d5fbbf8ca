// crates/mesh-procedures-core/src/runtime/handlers/configure.rs
// ============================================================================
// Module: Configuration Step Handler
// Description: Steps that PUT or POST a configuration payload to one entity.
// Purpose: Configure source connections, secrets, objects, and product schemas.
// Dependencies: crate::{core, runtime}, serde_json
// ============================================================================

//! ## Overview
//! Each configuration step targets one entity of a fixed kind, sends the
//! step input unchanged, and merges nothing back into the id map.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

use crate::core::entity::EntityKind;
use crate::core::identifiers::EntityIdentifier;
use crate::core::identifiers::StepRef;
use crate::core::procedure::StepDefinition;
use crate::interfaces::ApiResponse;
use crate::interfaces::TransportError;
use crate::runtime::session::ApiSession;
use crate::runtime::step::StepContext;
use crate::runtime::step::StepError;
use crate::runtime::step::StepHandler;
use crate::runtime::step::StepOutcome;
use crate::runtime::step::ensure_success;
use crate::runtime::step::input_object;

// ============================================================================
// SECTION: Targets
// ============================================================================

/// Configuration endpoints addressed by a single entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigureTarget {
    /// Source connection details.
    SourceConnection,
    /// Source connection secrets.
    SourceSecret,
    /// Object file/format configuration.
    ObjectDetails,
    /// Product schema.
    ProductSchema,
}

impl ConfigureTarget {
    /// Kind of entity the configuration applies to.
    #[must_use]
    pub const fn kind(self) -> EntityKind {
        match self {
            Self::SourceConnection | Self::SourceSecret => EntityKind::Source,
            Self::ObjectDetails => EntityKind::Object,
            Self::ProductSchema => EntityKind::Product,
        }
    }

    /// Operation name used in error messages.
    #[must_use]
    pub const fn operation(self) -> &'static str {
        match self {
            Self::SourceConnection => "configure connection details",
            Self::SourceSecret => "set connection secrets",
            Self::ObjectDetails => "configure object details",
            Self::ProductSchema => "create data product schema",
        }
    }

    /// Sends the configuration payload.
    fn send(
        self,
        session: &mut ApiSession<'_>,
        identifier: &EntityIdentifier,
        payload: Value,
    ) -> Result<ApiResponse, TransportError> {
        match self {
            Self::SourceConnection => session.configure_source_connection(identifier, payload),
            Self::SourceSecret => session.set_source_secret(identifier, payload),
            Self::ObjectDetails => session.configure_object(identifier, payload),
            Self::ProductSchema => session.define_product_schema(identifier, payload),
        }
    }
}

// ============================================================================
// SECTION: Handler
// ============================================================================

/// Sends the step input to the configuration endpoint of `ref`.
#[derive(Debug, Clone, Copy)]
pub struct ConfigureEntity {
    /// Endpoint to call.
    pub target: ConfigureTarget,
}

impl StepHandler for ConfigureEntity {
    fn execute(
        &self,
        step: &StepDefinition,
        ctx: &mut StepContext<'_, '_>,
    ) -> Result<StepOutcome, StepError> {
        let kind = self.target.kind();
        let reference = step
            .reference
            .as_ref()
            .ok_or_else(|| StepError::MissingInput(format!("{kind} not found")))?;
        let payload = input_object(step, self.target.operation())?.clone();
        let identifier = ctx.id_map.require_kind(reference, &[kind])?.identifier.clone();
        let response = self.target.send(ctx.session, &identifier, Value::Object(payload))?;
        ensure_success(&response)?;
        Ok(StepOutcome::done())
    }

    fn references(&self, step: &StepDefinition) -> Vec<StepRef> {
        step.reference.clone().into_iter().collect()
    }
}
