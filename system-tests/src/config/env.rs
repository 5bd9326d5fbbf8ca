// system-tests/src/config/env.rs
// ============================================================================
// Module: System Test Environment
// Description: Harness knobs read from environment variables.
// Purpose: Pin the mock address, artifact root, and timeouts for a run.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! The harness reads four optional variables through a lookup function, so
//! tests feed values in directly instead of mutating the process environment.
//! Blank values count as unset. Anything else must parse, and a single bad
//! value fails the whole load.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::ffi::OsString;
use std::net::Ipv4Addr;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

// ============================================================================
// SECTION: Variables
// ============================================================================

/// Directory receiving one artifact folder per test.
pub const RUN_ROOT_VAR: &str = "MESH_PROCEDURES_SYSTEM_TEST_RUN_ROOT";
/// Fixed `host:port` for the mesh mock.
pub const MOCK_BIND_VAR: &str = "MESH_PROCEDURES_SYSTEM_TEST_MOCK_BIND";
/// Lower bound for request timeouts, in whole seconds.
pub const TIMEOUT_VAR: &str = "MESH_PROCEDURES_SYSTEM_TEST_TIMEOUT_SEC";
/// Permits writing into a run root that already holds files.
pub const ALLOW_OVERWRITE_VAR: &str = "MESH_PROCEDURES_SYSTEM_TEST_ALLOW_OVERWRITE";

/// Every variable the harness reads.
pub const HARNESS_VARS: [&str; 4] = [RUN_ROOT_VAR, MOCK_BIND_VAR, TIMEOUT_VAR, ALLOW_OVERWRITE_VAR];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Harness environment errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HarnessEnvError {
    /// A variable holds bytes that are not UTF-8.
    #[error("{0} must be valid UTF-8")]
    NotUtf8(String),
    /// A variable holds a value that does not parse.
    #[error("{0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Config
// ============================================================================

/// Harness settings for one test process.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SystemTestConfig {
    /// Artifact root override.
    pub run_root: Option<PathBuf>,
    /// Pinned mock address.
    pub mock_bind: Option<SocketAddr>,
    /// Minimum request timeout.
    pub timeout_floor: Option<Duration>,
    /// Whether a non-empty run root may be reused.
    pub allow_overwrite: bool,
}

impl SystemTestConfig {
    /// Reads the harness variables from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessEnvError`] when any set variable is invalid.
    pub fn load() -> Result<Self, HarnessEnvError> {
        Self::from_lookup(|name| std::env::var_os(name))
    }

    /// Reads the harness variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessEnvError`] when any set variable is invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, HarnessEnvError>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let value = |name: &str| setting(lookup(name), name);
        let mock_bind = value(MOCK_BIND_VAR)?
            .map(|raw| {
                raw.parse::<SocketAddr>().map_err(|_| {
                    HarnessEnvError::Invalid(format!(
                        "{MOCK_BIND_VAR} must be an ip:port address, got {raw}"
                    ))
                })
            })
            .transpose()?;
        let timeout_floor = value(TIMEOUT_VAR)?.map(|raw| whole_seconds(&raw)).transpose()?;
        let allow_overwrite = value(ALLOW_OVERWRITE_VAR)?.map(|raw| flag(&raw)).transpose()?;
        Ok(Self {
            run_root: value(RUN_ROOT_VAR)?.map(PathBuf::from),
            mock_bind,
            timeout_floor,
            allow_overwrite: allow_overwrite.unwrap_or(false),
        })
    }

    /// Raises `requested` to the configured floor.
    #[must_use]
    pub fn timeout_for(&self, requested: Duration) -> Duration {
        self.timeout_floor.map_or(requested, |floor| requested.max(floor))
    }

    /// Address the mock binds: the pinned one, else an ephemeral loopback port.
    #[must_use]
    pub fn mock_addr(&self) -> SocketAddr {
        self.mock_bind.unwrap_or_else(|| SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))
    }
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

/// Decodes one variable; blank counts as unset.
fn setting(raw: Option<OsString>, name: &str) -> Result<Option<String>, HarnessEnvError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let text = raw.into_string().map_err(|_| HarnessEnvError::NotUtf8(name.to_string()))?;
    let trimmed = text.trim();
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}

/// Parses a positive number of seconds.
fn whole_seconds(raw: &str) -> Result<Duration, HarnessEnvError> {
    match raw.parse::<u64>() {
        Ok(0) | Err(_) => Err(HarnessEnvError::Invalid(format!(
            "{TIMEOUT_VAR} must be a positive number of seconds, got {raw}"
        ))),
        Ok(secs) => Ok(Duration::from_secs(secs)),
    }
}

/// Parses an on/off flag.
fn flag(raw: &str) -> Result<bool, HarnessEnvError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(HarnessEnvError::Invalid(format!(
            "{ALLOW_OVERWRITE_VAR} must be one of 1, 0, true, false, yes, no; got {raw}"
        ))),
    }
}
