// crates/mesh-procedures-core/src/runtime/validate.rs
// ============================================================================
// Module: Procedure Validation
// Description: Offline checks of a procedure against a step registry.
// Purpose: Catch unknown step types and dangling references before a run.
// Dependencies: crate::{core, runtime}, serde
// ============================================================================

//! ## Overview
//! Validation walks the steps in order and tracks which references earlier
//! steps produce, using each handler's static description. It never touches
//! the network, so it only reports what can be known from the file.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::entity::EntityKind;
use crate::core::identifiers::StepRef;
use crate::core::procedure::Procedure;
use crate::runtime::registry::StepRegistry;

// ============================================================================
// SECTION: Types
// ============================================================================

/// One validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Zero-based step position.
    pub index: usize,
    /// Step label.
    pub label: String,
    /// Finding.
    pub message: String,
}

/// Validation findings for a procedure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Findings in step order.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Returns true when nothing was found.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Validates a procedure without running it.
#[must_use]
pub fn validate_procedure(procedure: &Procedure, registry: &StepRegistry) -> ValidationReport {
    let mut report = ValidationReport::default();
    let mut produced: BTreeMap<StepRef, EntityKind> = BTreeMap::new();
    for (index, step) in procedure.steps.iter().enumerate() {
        let label = step.label(index);
        let mut issue = |message: String| {
            report.issues.push(ValidationIssue {
                index,
                label: label.clone(),
                message,
            });
        };
        let handler = match registry.resolve(&step.step_type) {
            Ok(handler) => handler,
            Err(err) => {
                issue(err.to_string());
                continue;
            }
        };
        for reference in handler.references(step) {
            if !produced.contains_key(&reference) {
                issue(format!("reference {reference} is used before any step produces it"));
            }
        }
        if let Some(kind) = handler.creates() {
            match handler.produces(step) {
                Some((id, _)) if produced.contains_key(&id) => {
                    issue(format!("duplicate id {id}"));
                }
                Some((id, _)) => {
                    produced.insert(id, kind);
                }
                None => issue(format!("create step for {kind} has no id")),
            }
        }
        if let Some(removed) = handler.removes(step) {
            produced.remove(&removed);
        }
    }
    report
}

// ============================================================================
// SECTION: Tests
// ============================================================================
