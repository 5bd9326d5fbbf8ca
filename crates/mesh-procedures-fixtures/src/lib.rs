// crates/mesh-procedures-fixtures/src/lib.rs
// ============================================================================
// Module: Mesh Procedures Fixtures Library
// Description: Payloads, procedures, landscapes, and probes for the mesh API.
// Purpose: Provide the test data every procedure run starts from.
// Dependencies: mesh-procedures-core, rand, serde, serde_json, serde_yaml
// ============================================================================

//! ## Overview
//! Fixtures build the request bodies the data mesh API expects, assemble
//! them into built-in procedures, expand landscape descriptions into
//! procedures, and enumerate the API contract probes. Values that depend on
//! the deployment (owner, S3 location and keys, builder image tag) come from
//! a [`FixtureEnv`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod builtins;
pub mod env;
pub mod landscape;
pub mod naming;
pub mod payloads;
pub mod probes;
pub mod velora;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use builtins::BuiltinProcedure;
pub use builtins::builtin_names;
pub use builtins::builtin_procedure;
pub use env::FixtureEnv;
pub use landscape::Landscape;
pub use landscape::LandscapeError;
pub use naming::entity_name;
pub use naming::make_id;
pub use probes::probe_cases;
pub use velora::velora_pipeline;
