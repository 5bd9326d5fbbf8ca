// crates/mesh-procedures-core/src/core/mod.rs
// ============================================================================
// Module: Mesh Procedures Core Types
// Description: Data model shared by the runtime, transports, and fixtures.
// Purpose: Group identifiers, entities, procedures, endpoints, and reports.
// Dependencies: serde, serde_json, serde_yaml, time
// ============================================================================

//! ## Overview
//! Core types are plain data: no I/O beyond procedure file loading, no
//! network access, and no global state.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod call;
pub mod compute;
pub mod endpoints;
pub mod entity;
pub mod id_map;
pub mod identifiers;
pub mod procedure;
pub mod report;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use call::ApiCallRecord;
pub use call::HttpMethod;
pub use call::QueryParam;
pub use compute::ComputeStatus;
pub use endpoints::Endpoint;
pub use endpoints::LinkKind;
pub use entity::EntityKind;
pub use entity::EntityRecord;
pub use id_map::IdMap;
pub use id_map::IdMapError;
pub use identifiers::AccessToken;
pub use identifiers::ComputeIdentifier;
pub use identifiers::EntityIdentifier;
pub use identifiers::StepRef;
pub use procedure::Procedure;
pub use procedure::ProcedureError;
pub use procedure::StepDefinition;
pub use report::RunCounts;
pub use report::RunReport;
pub use report::StepResult;
pub use report::StepStatus;
