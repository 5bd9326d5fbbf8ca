// system-tests/tests/helpers/mod.rs
// ============================================================================
// Module: System Test Helpers
// Description: Shared helpers for mesh-procedures system-tests.
// Purpose: Provide the mesh API mock, run wiring, and artifact utilities.
// Dependencies: system-tests, mesh-procedures-core, mesh-procedures-api
// ============================================================================

//! ## Overview
//! Shared helpers for mesh-procedures system-tests.
//! Invariants:
//! - Runs go through the real HTTP transport; only the server is mocked.
//! - Polling waits are recorded, never slept.

#![allow(dead_code, reason = "Shared helpers are reused across multiple test suites.")]

pub mod artifacts;
pub mod mesh_mock;
pub mod runner;
pub mod timeouts;
