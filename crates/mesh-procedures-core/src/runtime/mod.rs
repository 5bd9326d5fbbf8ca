// crates/mesh-procedures-core/src/runtime/mod.rs
// ============================================================================
// Module: Mesh Procedures Runtime
// Description: Session, step handlers, polling, execution, and validation.
// Purpose: Run procedures against the data mesh API through core interfaces.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules turn a [`crate::core::Procedure`] into API calls. All
//! network access goes through [`session::ApiSession`], and all waiting goes
//! through [`crate::interfaces::Clock`], so runs are fully scriptable in
//! tests.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod executor;
pub mod handlers;
pub mod poller;
pub mod probe;
pub mod registry;
pub mod session;
pub mod step;
pub mod transform;
pub mod validate;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use executor::ExecutorSettings;
pub use executor::ProcedureExecutor;
pub use executor::RunEnvironment;
pub use poller::ComputeDefaults;
pub use poller::PollOutcome;
pub use poller::PollPolicy;
pub use poller::poll_compute;
pub use probe::ProbeAuth;
pub use probe::ProbeBody;
pub use probe::ProbeCase;
pub use probe::ProbeExpectation;
pub use probe::ProbeOutcome;
pub use probe::ProbeReport;
pub use probe::run_probes;
pub use registry::StepRegistry;
pub use session::ApiSession;
pub use session::Credentials;
pub use step::StepContext;
pub use step::StepError;
pub use step::StepHandler;
pub use step::StepOutcome;
pub use transform::resolve_transformation_payload;
pub use validate::ValidationIssue;
pub use validate::ValidationReport;
pub use validate::validate_procedure;
