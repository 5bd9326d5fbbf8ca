// crates/mesh-procedures-core/src/core/entity.rs
// ============================================================================
// Module: Mesh Entities
// Description: Entity kinds and the records procedures keep about them.
// Purpose: Describe mesh, system, source, object, and product entities.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! The data mesh API exposes five entity kinds. A procedure records every
//! entity it creates as an [`EntityRecord`]: the step reference, the API
//! identifier, and whatever details later reads returned (compute handles,
//! health flags, connection state).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::core::identifiers::ComputeIdentifier;
use crate::core::identifiers::EntityIdentifier;
use crate::core::identifiers::StepRef;

// ============================================================================
// SECTION: Entity Kind
// ============================================================================

/// Entity kinds managed by the data mesh API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Top-level governance grouping.
    Mesh,
    /// External system of record.
    System,
    /// Ingestion origin attached to a system.
    Source,
    /// Data resource read from a source.
    Object,
    /// Derived data product.
    Product,
}

impl EntityKind {
    /// All entity kinds in graph order.
    pub const ALL: [Self; 5] =
        [Self::Mesh, Self::System, Self::Source, Self::Object, Self::Product];

    /// Returns the stable procedure label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mesh => "mesh",
            Self::System => "system",
            Self::Source => "source",
            Self::Object => "object",
            Self::Product => "product",
        }
    }

    /// Returns the entity type name used by the API payloads.
    #[must_use]
    pub const fn api_label(self) -> &'static str {
        match self {
            Self::Mesh => "mesh",
            Self::System => "data_system",
            Self::Source => "origin",
            Self::Object => "resource",
            Self::Product => "product",
        }
    }

    /// Returns the input type used when this entity feeds a transformation.
    #[must_use]
    pub const fn transformation_input_type(self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Mesh | Self::System | Self::Source | Self::Object => "resource",
        }
    }

    /// Returns the step input key naming a reference of this kind.
    #[must_use]
    pub const fn ref_key(self) -> &'static str {
        match self {
            Self::Mesh => "mesh_ref",
            Self::System => "system_ref",
            Self::Source => "source_ref",
            Self::Object => "object_ref",
            Self::Product => "product_ref",
        }
    }

    /// Parses either the procedure label or the API entity type name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value || kind.api_label() == value)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Entity Record
// ============================================================================

/// Entity created during a procedure run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Step reference that created the entity.
    #[serde(rename = "id")]
    pub reference: StepRef,
    /// Identifier assigned by the API.
    pub identifier: EntityIdentifier,
    /// Entity kind.
    #[serde(rename = "type")]
    pub kind: EntityKind,
    /// Details merged from later reads of the entity.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub details: Map<String, Value>,
}

impl EntityRecord {
    /// Creates a record without details.
    #[must_use]
    pub fn new(reference: StepRef, identifier: EntityIdentifier, kind: EntityKind) -> Self {
        Self {
            reference,
            identifier,
            kind,
            details: Map::new(),
        }
    }

    /// Merges response fields into the record details.
    ///
    /// The `id` key is skipped so an API field cannot shadow the step reference.
    pub fn merge_details(&mut self, details: &Map<String, Value>) {
        for (key, value) in details {
            if key == "id" {
                continue;
            }
            self.details.insert(key.clone(), value.clone());
        }
    }

    /// Returns the compute identifier recorded for this entity, if any.
    ///
    /// Products carry `compute.identifier`; other kinds carry a top-level
    /// `compute_identifier`. Both fall back to `entity.compute_identifier`.
    #[must_use]
    pub fn compute_identifier(&self) -> Option<ComputeIdentifier> {
        let nested = self.details.get("compute").and_then(|compute| compute.get("identifier"));
        let top_level = self.details.get("compute_identifier");
        let primary = match self.kind {
            EntityKind::Product => nested.or(top_level),
            EntityKind::Mesh | EntityKind::System | EntityKind::Source | EntityKind::Object => {
                top_level
            }
        };
        primary
            .or_else(|| {
                self.details.get("entity").and_then(|entity| entity.get("compute_identifier"))
            })
            .and_then(Value::as_str)
            .filter(|value| !value.trim().is_empty())
            .map(ComputeIdentifier::new)
    }

    /// Returns the `healthy` flag reported by the API, if present.
    #[must_use]
    pub fn healthy(&self) -> Option<bool> {
        self.details.get("healthy").and_then(Value::as_bool)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
