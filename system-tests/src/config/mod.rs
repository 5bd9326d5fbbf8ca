// system-tests/src/config/mod.rs
// ============================================================================
// Module: System Test Configuration
// Description: Centralized configuration for mesh-procedures system tests.
// Purpose: Provide typed access to test environment settings and defaults.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Harness settings come from `MESH_PROCEDURES_SYSTEM_TEST_*` variables and are
//! shared by the mock, artifact, and timeout helpers.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod env;

// ============================================================================
// SECTION: Tests
// ============================================================================


// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use env::ALLOW_OVERWRITE_VAR;
pub use env::HARNESS_VARS;
pub use env::HarnessEnvError;
pub use env::MOCK_BIND_VAR;
pub use env::RUN_ROOT_VAR;
pub use env::SystemTestConfig;
pub use env::TIMEOUT_VAR;
