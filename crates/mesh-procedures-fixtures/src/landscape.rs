// crates/mesh-procedures-fixtures/src/landscape.rs
// ============================================================================
// Module: Landscapes
// Description: YAML entity graphs expanded into procedures.
// Purpose: Describe a mesh landscape declaratively and build it phase by phase.
// Dependencies: crate::{env, payloads}, mesh-procedures-core, serde, serde_yaml
// ============================================================================

//! ## Overview
//! A landscape lists meshes, systems, sources (each under a system), objects
//! (each under a source), and products (each hosted by a mesh and fed by
//! objects or other products). Expansion emits one phase at a time: every
//! entity of a phase is created before any of them is wired, so products can
//! consume products declared after them.
//!
//! Landscape files are untrusted input: they are size-limited, must be
//! UTF-8, and every reference must name an entity of the right kind.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use mesh_procedures_core::EntityKind;
use mesh_procedures_core::Procedure;
use mesh_procedures_core::StepDefinition;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::env::FixtureEnv;
use crate::payloads::DEFAULT_CSV_PATH;
use crate::payloads::EntityText;
use crate::payloads::LOREM_PURPOSE;
use crate::payloads::connection_payload;
use crate::payloads::csv_object_config;
use crate::payloads::default_schema_payload;
use crate::payloads::mesh_payload;
use crate::payloads::object_payload;
use crate::payloads::product_payload;
use crate::payloads::secret_payload;
use crate::payloads::source_payload;
use crate::payloads::system_payload;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum landscape file size in bytes.
pub const MAX_LANDSCAPE_FILE_SIZE: usize = 1024 * 1024;

// ============================================================================
// SECTION: Model
// ============================================================================

/// Entity graph description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Landscape {
    /// Procedure name used for the expansion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Meshes.
    #[serde(default)]
    pub mesh: Vec<LandscapeEntity>,
    /// Data systems.
    #[serde(default)]
    pub systems: Vec<LandscapeEntity>,
    /// Sources.
    #[serde(default)]
    pub sources: Vec<LandscapeSource>,
    /// Objects.
    #[serde(default)]
    pub objects: Vec<LandscapeObject>,
    /// Products.
    #[serde(default)]
    pub products: Vec<LandscapeProduct>,
}

/// Mesh or system entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LandscapeEntity {
    /// Step reference.
    pub id: String,
    /// Display name; a random one is generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Source entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LandscapeSource {
    /// Step reference.
    pub id: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Owning system reference.
    pub system: String,
}

/// Object entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LandscapeObject {
    /// Step reference.
    pub id: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Source the object is read from.
    pub source: String,
}

/// Product entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LandscapeProduct {
    /// Step reference.
    pub id: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Hosting mesh reference.
    pub mesh: String,
    /// Object or product references feeding this product.
    #[serde(default)]
    pub input: Vec<String>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Landscape loading and expansion errors.
#[derive(Debug, Error)]
pub enum LandscapeError {
    /// I/O failure while reading a landscape file.
    #[error("landscape io error: {0}")]
    Io(String),
    /// YAML parsing error.
    #[error("landscape parse error: {0}")]
    Parse(String),
    /// Structurally invalid landscape.
    #[error("invalid landscape: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl Landscape {
    /// Parses and validates a landscape from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`LandscapeError`] when parsing or validation fails.
    pub fn from_yaml_str(content: &str) -> Result<Self, LandscapeError> {
        let landscape: Self =
            serde_yaml::from_str(content).map_err(|err| LandscapeError::Parse(err.to_string()))?;
        landscape.validate()?;
        Ok(landscape)
    }

    /// Loads and validates a landscape file.
    ///
    /// # Errors
    ///
    /// Returns [`LandscapeError`] when the file cannot be read, exceeds the
    /// size limit, is not UTF-8, or does not validate.
    pub fn load(path: &Path) -> Result<Self, LandscapeError> {
        let bytes = fs::read(path).map_err(|err| LandscapeError::Io(err.to_string()))?;
        if bytes.len() > MAX_LANDSCAPE_FILE_SIZE {
            return Err(LandscapeError::Invalid("landscape file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| LandscapeError::Invalid("landscape file must be utf-8".to_string()))?;
        Self::from_yaml_str(content)
    }

    /// Returns the expansion's procedure name, defaulting to `landscape`.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("landscape")
    }

    /// Number of entities the landscape declares.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.mesh.len()
            + self.systems.len()
            + self.sources.len()
            + self.objects.len()
            + self.products.len()
    }

    // ========================================================================
    // SECTION: Validation
    // ========================================================================

    /// Checks ids are unique and every reference names an entity of the
    /// expected kind.
    ///
    /// # Errors
    ///
    /// Returns [`LandscapeError::Invalid`] describing the first problem.
    pub fn validate(&self) -> Result<(), LandscapeError> {
        if self.entity_count() == 0 {
            return Err(LandscapeError::Invalid("landscape declares no entities".to_string()));
        }
        let kinds = self.declared_kinds()?;
        let expect = |owner: &str, field: &str, reference: &str, allowed: &[EntityKind]| {
            match kinds.get(reference) {
                Some(kind) if allowed.contains(kind) => Ok(()),
                Some(kind) => Err(LandscapeError::Invalid(format!(
                    "{owner}: {field} {reference} is a {kind}"
                ))),
                None => Err(LandscapeError::Invalid(format!(
                    "{owner}: unknown {field} {reference}"
                ))),
            }
        };
        for source in &self.sources {
            expect(&source.id, "system", &source.system, &[EntityKind::System])?;
        }
        for object in &self.objects {
            expect(&object.id, "source", &object.source, &[EntityKind::Source])?;
        }
        for product in &self.products {
            expect(&product.id, "mesh", &product.mesh, &[EntityKind::Mesh])?;
            for input in &product.input {
                if input == &product.id {
                    return Err(LandscapeError::Invalid(format!(
                        "{}: product cannot consume itself",
                        product.id
                    )));
                }
                expect(&product.id, "input", input, &[EntityKind::Object, EntityKind::Product])?;
            }
        }
        Ok(())
    }

    /// Maps every declared id to its kind, rejecting blanks and duplicates.
    fn declared_kinds(&self) -> Result<BTreeMap<&str, EntityKind>, LandscapeError> {
        let ids = self
            .mesh
            .iter()
            .map(|entry| (entry.id.as_str(), EntityKind::Mesh))
            .chain(self.systems.iter().map(|entry| (entry.id.as_str(), EntityKind::System)))
            .chain(self.sources.iter().map(|entry| (entry.id.as_str(), EntityKind::Source)))
            .chain(self.objects.iter().map(|entry| (entry.id.as_str(), EntityKind::Object)))
            .chain(self.products.iter().map(|entry| (entry.id.as_str(), EntityKind::Product)));
        let mut kinds = BTreeMap::new();
        for (id, kind) in ids {
            if id.trim().is_empty() {
                return Err(LandscapeError::Invalid(format!("{kind} with an empty id")));
            }
            if kinds.insert(id, kind).is_some() {
                return Err(LandscapeError::Invalid(format!("duplicate id {id}")));
            }
        }
        Ok(kinds)
    }

    // ========================================================================
    // SECTION: Expansion
    // ========================================================================

    /// Expands the landscape into a procedure.
    ///
    /// # Errors
    ///
    /// Returns [`LandscapeError::Invalid`] when the landscape does not
    /// validate.
    pub fn to_procedure(&self, env: &FixtureEnv) -> Result<Procedure, LandscapeError> {
        self.validate()?;
        let kinds = self.declared_kinds()?;
        let mut steps = Vec::new();

        for mesh in &self.mesh {
            let text = EntityText::generic(EntityKind::Mesh, mesh.name.as_deref());
            steps.push(
                StepDefinition::new("create_mesh")
                    .with_id(mesh.id.as_str())
                    .with_input(mesh_payload(env, &text, LOREM_PURPOSE)),
            );
        }
        for system in &self.systems {
            let text = EntityText::generic(EntityKind::System, system.name.as_deref());
            steps.push(
                StepDefinition::new("create_system")
                    .with_id(system.id.as_str())
                    .with_input(system_payload(env, &text)),
            );
        }

        for source in &self.sources {
            let text = EntityText::generic(EntityKind::Source, source.name.as_deref());
            steps.push(
                StepDefinition::new("create_source")
                    .with_id(source.id.as_str())
                    .with_input(source_payload(env, &text)),
            );
        }
        for source in &self.sources {
            steps.push(
                StepDefinition::new("link_system_to_source")
                    .with_input(json!({"system_ref": source.system, "source_ref": source.id})),
            );
        }
        for source in &self.sources {
            steps.push(
                StepDefinition::new("configure_source")
                    .with_ref(source.id.as_str())
                    .with_input(connection_payload(env)),
            );
        }
        for source in &self.sources {
            steps.push(
                StepDefinition::new("set_source_secret")
                    .with_ref(source.id.as_str())
                    .with_input(secret_payload(env)),
            );
        }

        for object in &self.objects {
            let text = EntityText::generic(EntityKind::Object, object.name.as_deref());
            steps.push(
                StepDefinition::new("create_object")
                    .with_id(object.id.as_str())
                    .with_input(object_payload(env, &text)),
            );
        }
        for object in &self.objects {
            steps.push(
                StepDefinition::new("link_object_to_source")
                    .with_input(json!({"source_ref": object.source, "object_ref": object.id})),
            );
        }
        for object in &self.objects {
            steps.push(
                StepDefinition::new("configure_object_details")
                    .with_ref(object.id.as_str())
                    .with_input(csv_object_config(DEFAULT_CSV_PATH)),
            );
        }

        for product in &self.products {
            let text = EntityText::generic(EntityKind::Product, product.name.as_deref());
            steps.push(
                StepDefinition::new("create_product")
                    .with_id(product.id.as_str())
                    .with_input(product_payload(env, &text, &product.mesh)),
            );
        }
        for product in &self.products {
            for input in &product.input {
                let step = if kinds.get(input.as_str()) == Some(&EntityKind::Object) {
                    StepDefinition::new("link_product_to_object")
                        .with_input(json!({"object_ref": input, "product_ref": product.id}))
                } else {
                    StepDefinition::new("link_product_to_product")
                        .with_input(json!({"product_ref": input, "product_child_ref": product.id}))
                };
                steps.push(step);
            }
        }
        for product in &self.products {
            steps.push(
                StepDefinition::new("define_product_schema")
                    .with_ref(product.id.as_str())
                    .with_input(default_schema_payload()),
            );
        }

        let mut procedure = Procedure::new(self.display_name(), steps);
        procedure.description = Some(format!("Landscape of {} entities", self.entity_count()));
        Ok(procedure)
    }
}
