// crates/mesh-procedures-core/src/lib.rs
// ============================================================================
// Module: Mesh Procedures Core Library
// Description: Public API surface for the mesh procedure runner.
// Purpose: Expose core types, interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Mesh procedures drive a data mesh REST API through declarative step lists:
//! create meshes, systems, sources, objects, and products, wire them
//! together, and wait for their compute jobs. The core is transport-agnostic
//! and talks to the API only through [`MeshTransport`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::ApiCallSink;
pub use interfaces::ApiRequest;
pub use interfaces::ApiResponse;
pub use interfaces::Clock;
pub use interfaces::MemoryCallSink;
pub use interfaces::MeshTransport;
pub use interfaces::NoopCallSink;
pub use interfaces::NoopRunObserver;
pub use interfaces::NotifyError;
pub use interfaces::RequestAuth;
pub use interfaces::RequestBody;
pub use interfaces::RunNotifier;
pub use interfaces::RunObserver;
pub use interfaces::SystemClock;
pub use interfaces::TransportError;
pub use runtime::ApiSession;
pub use runtime::ComputeDefaults;
pub use runtime::Credentials;
pub use runtime::ExecutorSettings;
pub use runtime::ProbeAuth;
pub use runtime::ProbeBody;
pub use runtime::ProbeCase;
pub use runtime::ProbeExpectation;
pub use runtime::ProbeOutcome;
pub use runtime::ProbeReport;
pub use runtime::ProcedureExecutor;
pub use runtime::RunEnvironment;
pub use runtime::StepError;
pub use runtime::StepHandler;
pub use runtime::StepRegistry;
pub use runtime::ValidationIssue;
pub use runtime::ValidationReport;
pub use runtime::run_probes;
pub use runtime::validate_procedure;
