// crates/mesh-procedures-core/src/core/id_map.rs
// ============================================================================
// Module: Entity Reference Map
// Description: Resolution table from step references to created entities.
// Purpose: Thread API identifiers produced by earlier steps into later steps.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Every create step registers the entity it produced under its step
//! reference. Later steps resolve references through [`IdMap`] instead of
//! hard-coding API identifiers. Registering an existing reference updates the
//! entry in place; a reference never maps to two entities.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Serialize;
use serde::Serializer;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::core::entity::EntityKind;
use crate::core::entity::EntityRecord;
use crate::core::identifiers::StepRef;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Reference resolution failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdMapError {
    /// No entity was registered under the reference.
    #[error("reference {0} not found")]
    MissingReference(StepRef),
    /// The entity exists but has an unexpected kind.
    #[error("reference {reference} is a {actual}, expected {expected}")]
    KindMismatch {
        /// Reference that was resolved.
        reference: StepRef,
        /// Kind of the registered entity.
        actual: EntityKind,
        /// Accepted kinds, joined for display.
        expected: String,
    },
}

// ============================================================================
// SECTION: Id Map
// ============================================================================

/// Step reference to entity record table for a single run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdMap {
    /// Records keyed by step reference.
    entries: BTreeMap<StepRef, EntityRecord>,
}

impl IdMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entity, updating the existing entry for the same reference.
    ///
    /// On update the identifier and kind are replaced and details are merged.
    pub fn register(&mut self, record: EntityRecord) {
        match self.entries.get_mut(&record.reference) {
            Some(existing) => {
                existing.identifier = record.identifier;
                existing.kind = record.kind;
                existing.merge_details(&record.details);
            }
            None => {
                self.entries.insert(record.reference.clone(), record);
            }
        }
    }

    /// Merges response details into a registered entity.
    ///
    /// # Errors
    ///
    /// Returns [`IdMapError::MissingReference`] when nothing is registered.
    pub fn merge_details(
        &mut self,
        reference: &StepRef,
        details: &Map<String, Value>,
    ) -> Result<(), IdMapError> {
        let entry = self
            .entries
            .get_mut(reference)
            .ok_or_else(|| IdMapError::MissingReference(reference.clone()))?;
        entry.merge_details(details);
        Ok(())
    }

    /// Looks up a reference.
    #[must_use]
    pub fn find(&self, reference: &StepRef) -> Option<&EntityRecord> {
        self.entries.get(reference)
    }

    /// Resolves a reference that must exist.
    ///
    /// # Errors
    ///
    /// Returns [`IdMapError::MissingReference`] when nothing is registered.
    pub fn require(&self, reference: &StepRef) -> Result<&EntityRecord, IdMapError> {
        self.find(reference).ok_or_else(|| IdMapError::MissingReference(reference.clone()))
    }

    /// Resolves a reference that must exist with one of the given kinds.
    ///
    /// # Errors
    ///
    /// Returns [`IdMapError`] when the reference is unknown or has another kind.
    pub fn require_kind(
        &self,
        reference: &StepRef,
        kinds: &[EntityKind],
    ) -> Result<&EntityRecord, IdMapError> {
        let record = self.require(reference)?;
        if kinds.contains(&record.kind) {
            return Ok(record);
        }
        Err(IdMapError::KindMismatch {
            reference: reference.clone(),
            actual: record.kind,
            expected: kinds.iter().map(|kind| kind.as_str()).collect::<Vec<_>>().join(" or "),
        })
    }

    /// Removes a reference, returning the record that was registered.
    pub fn remove(&mut self, reference: &StepRef) -> Option<EntityRecord> {
        self.entries.remove(reference)
    }

    /// Iterates the registered records in reference order.
    pub fn records(&self) -> impl Iterator<Item = &EntityRecord> {
        self.entries.values()
    }

    /// Returns the number of registered entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for IdMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.values())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
