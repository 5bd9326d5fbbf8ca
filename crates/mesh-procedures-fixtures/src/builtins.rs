// crates/mesh-procedures-fixtures/src/builtins.rs
// ============================================================================
// Module: Built-in Procedures
// Description: Named procedures shipped with the runner.
// Purpose: Offer ready-made runs without writing a procedure file.
// Dependencies: crate::{env, payloads, velora}, mesh-procedures-core, serde_json
// ============================================================================

//! ## Overview
//! Built-ins are rebuilt from a [`FixtureEnv`] on every lookup so names stay
//! unique between runs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use mesh_procedures_core::EntityKind;
use mesh_procedures_core::Procedure;
use mesh_procedures_core::StepDefinition;
use serde_json::json;

use crate::env::FixtureEnv;
use crate::payloads::EntityText;
use crate::payloads::LOREM_PURPOSE;
use crate::payloads::mesh_payload;
use crate::payloads::product_payload;
use crate::payloads::system_payload;
use crate::velora::velora_pipeline;

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Built-in procedure entry.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinProcedure {
    /// Name accepted by `--builtin`.
    pub name: &'static str,
    /// One-line summary.
    pub summary: &'static str,
    /// Builder.
    build: fn(&FixtureEnv) -> Procedure,
}

impl BuiltinProcedure {
    /// Builds the procedure with fresh entity names.
    #[must_use]
    pub fn build(&self, env: &FixtureEnv) -> Procedure {
        (self.build)(env)
    }
}

/// Every built-in procedure, in listing order.
pub const BUILTINS: [BuiltinProcedure; 3] = [
    BuiltinProcedure {
        name: "velora-pipeline",
        summary: "Construction demo graph with compute waits",
        build: velora_pipeline,
    },
    BuiltinProcedure {
        name: "product-lifecycle",
        summary: "Create a mesh, system, and product, read it back, then delete",
        build: product_lifecycle,
    },
    BuiltinProcedure {
        name: "catalog-listing",
        summary: "Read-only listing of every entity collection",
        build: catalog_listing,
    },
];

/// Names of the built-in procedures.
#[must_use]
pub fn builtin_names() -> Vec<&'static str> {
    BUILTINS.iter().map(|builtin| builtin.name).collect()
}

/// Builds a built-in procedure by name.
#[must_use]
pub fn builtin_procedure(name: &str, env: &FixtureEnv) -> Option<Procedure> {
    BUILTINS.iter().find(|builtin| builtin.name == name).map(|builtin| builtin.build(env))
}

// ============================================================================
// SECTION: Procedures
// ============================================================================

/// Creates a product in a fresh mesh, reads it, and tears both down.
#[must_use]
pub fn product_lifecycle(env: &FixtureEnv) -> Procedure {
    let mesh = EntityText::generic(EntityKind::Mesh, None);
    let system = EntityText::generic(EntityKind::System, None);
    let product = EntityText::generic(EntityKind::Product, None);
    let mut procedure = Procedure::new("product-lifecycle", vec![
        StepDefinition::new("create_mesh")
            .with_id("mesh-abc")
            .with_input(mesh_payload(env, &mesh, LOREM_PURPOSE)),
        StepDefinition::new("create_system")
            .with_id("system-abc")
            .with_input(system_payload(env, &system)),
        StepDefinition::new("create_product")
            .with_id("product-a")
            .with_input(product_payload(env, &product, "mesh-abc")),
        StepDefinition::new("get_product_by_id").with_input(json!({"product_ref": "product-a"})),
        StepDefinition::new("delete_product").with_input(json!({"product_ref": "product-a"})),
        StepDefinition::new("delete_mesh").with_input(json!({"mesh_ref": "mesh-abc"})),
        StepDefinition::new("get_all_mesh"),
    ]);
    procedure.description = Some("Product create, read, and delete round trip".to_string());
    procedure
}

/// Lists every entity collection.
#[must_use]
pub fn catalog_listing(_env: &FixtureEnv) -> Procedure {
    let steps = EntityKind::ALL
        .iter()
        .map(|kind| StepDefinition::new(format!("get_all_{kind}")))
        .collect();
    let mut procedure = Procedure::new("catalog-listing", steps);
    procedure.description = Some("Read-only listing of every entity collection".to_string());
    procedure
}

// ============================================================================
// SECTION: Tests
// ============================================================================
