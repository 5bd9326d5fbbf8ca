// crates/mesh-procedures-fixtures/src/env.rs
// ============================================================================
// Module: Fixture Environment
// Description: Deployment-specific values injected into payloads.
// Purpose: Read owner, S3, and builder image settings from the environment.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Payloads carry the owner contact, the S3 bucket URL and keys, and the
//! transformation builder image tag. These differ per deployment and are
//! read from environment variables; unset or non-UTF-8 variables fall back
//! to empty strings, except the image tag which has a fixed default.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Owner e-mail variable.
pub const OWNER_EMAIL_ENV: &str = "OWNER_EMAIL";
/// Owner full-name variable.
pub const OWNER_NAME_ENV: &str = "OWNER_NAME";
/// S3 bucket URL variable.
pub const S3_URL_ENV: &str = "S3_URL";
/// S3 access key variable.
pub const S3_ACCESS_KEY_ENV: &str = "S3_ACCESS_KEY";
/// S3 secret key variable.
pub const S3_SECRET_KEY_ENV: &str = "S3_SECRET_KEY";
/// Builder image tag variable.
pub const DOCKER_TAG_ENV: &str = "DOCKER_TAG";
/// Builder image tag used when none is configured.
pub const DEFAULT_DOCKER_TAG: &str = "0.0.23";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Deployment values used by payload builders.
#[derive(Clone, PartialEq, Eq)]
pub struct FixtureEnv {
    /// Owner contact e-mail.
    pub owner_email: String,
    /// Owner full name.
    pub owner_name: String,
    /// S3 bucket URL for source connections.
    pub s3_url: String,
    /// S3 access key stored as a source secret.
    pub s3_access_key: String,
    /// S3 secret key stored as a source secret.
    pub s3_secret_key: String,
    /// Transformation builder image tag.
    pub docker_tag: String,
}

impl FixtureEnv {
    /// Reads values from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads values through a lookup function.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).unwrap_or_default();
        let docker_tag = lookup(DOCKER_TAG_ENV)
            .filter(|tag| !tag.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DOCKER_TAG.to_string());
        Self {
            owner_email: read(OWNER_EMAIL_ENV),
            owner_name: read(OWNER_NAME_ENV),
            s3_url: read(S3_URL_ENV),
            s3_access_key: read(S3_ACCESS_KEY_ENV),
            s3_secret_key: read(S3_SECRET_KEY_ENV),
            docker_tag,
        }
    }
}

impl Default for FixtureEnv {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl std::fmt::Debug for FixtureEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixtureEnv")
            .field("owner_email", &self.owner_email)
            .field("owner_name", &self.owner_name)
            .field("s3_url", &self.s3_url)
            .field("s3_access_key", &"<redacted>")
            .field("s3_secret_key", &"<redacted>")
            .field("docker_tag", &self.docker_tag)
            .finish()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
