// system-tests/tests/helpers/timeouts.rs
// ============================================================================
// Module: System Test Timeouts
// Description: Centralized timeout configuration with env overrides.
// Purpose: Keep request timeouts consistent and configurable across suites.
// Dependencies: system-tests
// ============================================================================

//! Timeout resolution for system tests.

use std::time::Duration;

use system_tests::config::SystemTestConfig;

/// Returns the effective timeout, honoring `MESH_PROCEDURES_SYSTEM_TEST_TIMEOUT_SEC`.
/// The override acts as a minimum so explicitly longer timeouts are kept.
#[must_use]
#[allow(clippy::panic, reason = "An invalid test environment aborts the suite.")]
pub fn resolve_timeout(requested: Duration) -> Duration {
    match SystemTestConfig::load() {
        Ok(config) => config.timeout_for(requested),
        Err(err) => panic!("invalid system-test environment: {err}"),
    }
}
