// crates/mesh-procedures-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic example for docs and the CLI.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example of `mesh-procedures.toml`. The output is deterministic
//! and loads cleanly through [`crate::MeshProceduresConfig::from_toml_str`].

/// Returns a canonical example `mesh-procedures.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"# Environment variables API_URL, X_ACCOUNT, QA_USERNAME, QA_PASSWORD,
# WEB_HOOK_GLUE and ID_GROUP_GLUE override the matching values below.

[api]
base_url = "https://mesh.example.com"
account = "qa-account"
timeout_ms = 30000
max_response_bytes = 4194304
user_agent = "mesh-procedures/0.1"

[credentials]
username = "qa@example.com"
password = "change-me"

[compute]
max_retries = 5
retry_interval_secs = 60
# initial_delay_secs = 60

[run]
fail_fast = false
abort_on_compute_failure = true

[report]
webhook_url = "https://chat.example.com/v1/spaces/qa/messages"
webhook_target = "qa-group"
notify = true
"#,
    )
}
