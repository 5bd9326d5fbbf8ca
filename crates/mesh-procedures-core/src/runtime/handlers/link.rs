// crates/mesh-procedures-core/src/runtime/handlers/link.rs
// ============================================================================
// Module: Link Step Handler
// Description: Relationship creation between previously created entities.
// Purpose: Resolve parent and child references and call the link endpoint.
// Dependencies: crate::{core, runtime}
// ============================================================================

//! ## Overview
//! One handler serves every link kind. The parent and child input keys come
//! from the link kind, and both references must already be registered with
//! the expected entity kinds.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::endpoints::LinkKind;
use crate::core::identifiers::StepRef;
use crate::core::procedure::StepDefinition;
use crate::runtime::step::StepContext;
use crate::runtime::step::StepError;
use crate::runtime::step::StepHandler;
use crate::runtime::step::StepOutcome;
use crate::runtime::step::ensure_success;
use crate::runtime::step::input_object;
use crate::runtime::step::require_input_ref;

// ============================================================================
// SECTION: Handler
// ============================================================================

/// Links two entities named by input references.
#[derive(Debug, Clone, Copy)]
pub struct LinkEntities {
    /// Relationship to create.
    pub link: LinkKind,
}

impl LinkEntities {
    /// Input keys naming the parent and the child.
    #[must_use]
    pub const fn input_keys(self) -> (&'static str, &'static str) {
        match self.link {
            LinkKind::SystemToSource => ("system_ref", "source_ref"),
            LinkKind::ObjectToSource => ("source_ref", "object_ref"),
            LinkKind::ProductToObject => ("object_ref", "product_ref"),
            LinkKind::ProductToProduct => ("product_ref", "product_child_ref"),
        }
    }
}

impl StepHandler for LinkEntities {
    fn execute(
        &self,
        step: &StepDefinition,
        ctx: &mut StepContext<'_, '_>,
    ) -> Result<StepOutcome, StepError> {
        input_object(step, &format!("link {}", self.link))?;
        let (parent_key, child_key) = self.input_keys();
        let parent_ref = require_input_ref(step, parent_key)?;
        let child_ref = require_input_ref(step, child_key)?;
        let parent =
            ctx.id_map.require_kind(&parent_ref, &[self.link.parent_kind()])?.identifier.clone();
        let child =
            ctx.id_map.require_kind(&child_ref, &[self.link.child_kind()])?.identifier.clone();
        let response = ctx.session.link(self.link, &parent, &child)?;
        ensure_success(&response)?;
        Ok(StepOutcome::note(format!("{parent_ref} -> {child_ref}")))
    }

    fn references(&self, step: &StepDefinition) -> Vec<StepRef> {
        let (parent_key, child_key) = self.input_keys();
        [parent_key, child_key]
            .into_iter()
            .filter_map(|key| step.input_str(key))
            .map(StepRef::new)
            .collect()
    }
}
