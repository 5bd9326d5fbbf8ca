// crates/mesh-procedures-config/src/config.rs
// ============================================================================
// Module: Mesh Procedures Configuration
// Description: Configuration loading, env overrides, and validation.
// Purpose: Provide strict config parsing with hard limits.
// Dependencies: mesh-procedures-core, serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits,
//! then overlaid with the deployment environment variables the runner has
//! always honored (`API_URL`, `QA_USERNAME`, ...). Environment values win
//! over file values. Invalid configuration fails closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use mesh_procedures_core::ComputeDefaults;
use mesh_procedures_core::Credentials;
use mesh_procedures_core::ExecutorSettings;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "mesh-procedures.toml";
/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "MESH_PROCEDURES_CONFIG";
/// Environment variable overriding `api.base_url`.
pub const API_URL_ENV: &str = "API_URL";
/// Environment variable overriding `api.account`.
pub const ACCOUNT_ENV: &str = "X_ACCOUNT";
/// Environment variable overriding `credentials.username`.
pub const USERNAME_ENV: &str = "QA_USERNAME";
/// Environment variable overriding `credentials.password`.
pub const PASSWORD_ENV: &str = "QA_PASSWORD";
/// Environment variable overriding `report.webhook_url`.
pub const WEBHOOK_URL_ENV: &str = "WEB_HOOK_GLUE";
/// Environment variable overriding `report.webhook_target`.
pub const WEBHOOK_TARGET_ENV: &str = "ID_GROUP_GLUE";

/// Maximum config file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of one path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum length of a full path.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default API base URL.
pub(crate) const DEFAULT_BASE_URL: &str = "http://localhost:8000";
/// Default request timeout in milliseconds.
pub(crate) const DEFAULT_TIMEOUT_MS: u64 = 30_000;
/// Smallest accepted request timeout in milliseconds.
pub(crate) const MIN_TIMEOUT_MS: u64 = 100;
/// Largest accepted request timeout in milliseconds.
pub(crate) const MAX_TIMEOUT_MS: u64 = 600_000;
/// Default response size limit in bytes.
pub(crate) const DEFAULT_MAX_RESPONSE_BYTES: usize = 4 * 1024 * 1024;
/// Largest accepted response size limit in bytes.
pub(crate) const MAX_MAX_RESPONSE_BYTES: usize = 64 * 1024 * 1024;
/// Default user agent.
pub(crate) const DEFAULT_USER_AGENT: &str = "mesh-procedures/0.1";
/// Largest accepted compute attempt count.
pub(crate) const MAX_COMPUTE_RETRIES: u32 = 1_000;
/// Largest accepted compute wait in seconds.
pub(crate) const MAX_COMPUTE_WAIT_SECS: u64 = 3_600;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Mesh procedures configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeshProceduresConfig {
    /// Data mesh API connection settings.
    #[serde(default)]
    pub api: ApiConfig,
    /// Login credentials.
    #[serde(default)]
    pub credentials: CredentialsConfig,
    /// Compute polling defaults.
    #[serde(default)]
    pub compute: ComputeConfig,
    /// Run behavior.
    #[serde(default)]
    pub run: RunConfig,
    /// Report delivery.
    #[serde(default)]
    pub report: ReportConfig,
    /// File the configuration was read from, if any.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl MeshProceduresConfig {
    /// Loads configuration using the default resolution rules and the
    /// process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, |name| env::var_os(name))
    }

    /// Loads configuration reading environment variables through `lookup`.
    ///
    /// Resolution order: the explicit path, then `MESH_PROCEDURES_CONFIG`,
    /// then `mesh-procedures.toml` when it exists, then built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load_with_env<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let mut config = match resolve_path(path, &lookup)? {
            Some(resolved) => {
                let mut config = Self::from_file(&resolved)?;
                config.source_path = Some(resolved);
                config
            }
            None => Self::default(),
        };
        config.apply_env_overrides(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from TOML text without env overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses one file.
    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        validate_path(path)?;
        let bytes = fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Overlays environment variables onto the loaded values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a variable is not valid UTF-8.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        if let Some(value) = env_value(&lookup, API_URL_ENV)? {
            self.api.base_url = value;
        }
        if let Some(value) = env_value(&lookup, ACCOUNT_ENV)? {
            self.api.account = Some(value);
        }
        if let Some(value) = env_value(&lookup, USERNAME_ENV)? {
            self.credentials.username = value;
        }
        if let Some(value) = env_value(&lookup, PASSWORD_ENV)? {
            self.credentials.password = value;
        }
        if let Some(value) = env_value(&lookup, WEBHOOK_URL_ENV)? {
            self.report.webhook_url = Some(value);
        }
        if let Some(value) = env_value(&lookup, WEBHOOK_TARGET_ENV)? {
            self.report.webhook_target = Some(value);
        }
        Ok(())
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.api.validate()?;
        self.compute.validate()?;
        self.report.validate()
    }

    /// Returns the login credentials.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.credentials.username.clone(), self.credentials.password.clone())
    }

    /// Returns the executor settings for a run.
    #[must_use]
    pub const fn executor_settings(&self) -> ExecutorSettings {
        ExecutorSettings {
            fail_fast: self.run.fail_fast,
            abort_on_compute_failure: self.run.abort_on_compute_failure,
            compute: self.compute.defaults(),
        }
    }
}

/// Data mesh API connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Base URL of the API, e.g. `https://mesh.example.com`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Value of the `x-account` header.
    #[serde(default)]
    pub account: Option<String>,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Largest response body read, in bytes.
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
    /// `User-Agent` header value.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            account: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
            user_agent: default_user_agent(),
        }
    }
}

impl ApiConfig {
    /// Returns the parsed base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the URL does not parse or is not
    /// http(s).
    pub fn parsed_base_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(self.base_url.trim())
            .map_err(|err| ConfigError::Invalid(format!("api.base_url is invalid: {err}")))?;
        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(ConfigError::Invalid(format!(
                    "api.base_url scheme must be http or https, got {other}"
                )));
            }
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(ConfigError::Invalid("api.base_url must include a host".to_string()));
        }
        Ok(url)
    }

    /// Returns the request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validates API settings.
    fn validate(&self) -> Result<(), ConfigError> {
        self.parsed_base_url()?;
        if !(MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(&self.timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "api.timeout_ms must be between {MIN_TIMEOUT_MS} and {MAX_TIMEOUT_MS}"
            )));
        }
        if self.max_response_bytes == 0 || self.max_response_bytes > MAX_MAX_RESPONSE_BYTES {
            return Err(ConfigError::Invalid(format!(
                "api.max_response_bytes must be between 1 and {MAX_MAX_RESPONSE_BYTES}"
            )));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid("api.user_agent must be non-empty".to_string()));
        }
        if self.account.as_deref().is_some_and(|account| account.trim().is_empty()) {
            return Err(ConfigError::Invalid("api.account must be non-empty when set".to_string()));
        }
        Ok(())
    }
}

/// Login credentials.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialsConfig {
    /// Account user name.
    #[serde(default)]
    pub username: String,
    /// Account password.
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Compute polling defaults applied to steps without their own values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComputeConfig {
    /// Attempts per poll.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Seconds between attempts.
    #[serde(default = "default_retry_interval_secs")]
    pub retry_interval_secs: u64,
    /// Seconds before the first attempt; unset waits one retry interval.
    #[serde(default)]
    pub initial_delay_secs: Option<u64>,
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_interval_secs: default_retry_interval_secs(),
            initial_delay_secs: None,
        }
    }
}

impl ComputeConfig {
    /// Converts to runtime polling defaults.
    #[must_use]
    pub const fn defaults(&self) -> ComputeDefaults {
        ComputeDefaults {
            max_retries: self.max_retries,
            retry_interval: Duration::from_secs(self.retry_interval_secs),
            initial_delay: match self.initial_delay_secs {
                Some(secs) => Some(Duration::from_secs(secs)),
                None => None,
            },
        }
    }

    /// Validates polling bounds.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_retries == 0 || self.max_retries > MAX_COMPUTE_RETRIES {
            return Err(ConfigError::Invalid(format!(
                "compute.max_retries must be between 1 and {MAX_COMPUTE_RETRIES}"
            )));
        }
        if self.retry_interval_secs > MAX_COMPUTE_WAIT_SECS {
            return Err(ConfigError::Invalid(format!(
                "compute.retry_interval_secs must be at most {MAX_COMPUTE_WAIT_SECS}"
            )));
        }
        if self.initial_delay_secs.is_some_and(|secs| secs > MAX_COMPUTE_WAIT_SECS) {
            return Err(ConfigError::Invalid(format!(
                "compute.initial_delay_secs must be at most {MAX_COMPUTE_WAIT_SECS}"
            )));
        }
        Ok(())
    }
}

/// Run behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Skip remaining steps after any failure.
    #[serde(default)]
    pub fail_fast: bool,
    /// Skip remaining steps after a compute poll fails.
    #[serde(default = "default_true")]
    pub abort_on_compute_failure: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            fail_fast: false,
            abort_on_compute_failure: true,
        }
    }
}

/// Report delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    /// Chat webhook receiving the run summary.
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// Group or channel identifier sent with the summary.
    #[serde(default)]
    pub webhook_target: Option<String>,
    /// Whether to deliver the summary after a run.
    #[serde(default = "default_true")]
    pub notify: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            webhook_target: None,
            notify: true,
        }
    }
}

impl ReportConfig {
    /// Returns the webhook URL when delivery is enabled and configured.
    #[must_use]
    pub fn active_webhook(&self) -> Option<&str> {
        if self.notify { self.webhook_url.as_deref() } else { None }
    }

    /// Validates report delivery settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(webhook) = &self.webhook_url {
            let url = Url::parse(webhook.trim()).map_err(|err| {
                ConfigError::Invalid(format!("report.webhook_url is invalid: {err}"))
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::Invalid(
                    "report.webhook_url scheme must be http or https".to_string(),
                ));
            }
        }
        if self.webhook_target.is_some() && self.webhook_url.is_none() {
            return Err(ConfigError::Invalid(
                "report.webhook_target requires report.webhook_url".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the argument, environment, or default file.
fn resolve_path<F>(path: Option<&Path>, lookup: &F) -> Result<Option<PathBuf>, ConfigError>
where
    F: Fn(&str) -> Option<OsString>,
{
    if let Some(path) = path {
        return Ok(Some(path.to_path_buf()));
    }
    if let Some(env_path) = env_value(lookup, CONFIG_ENV_VAR)? {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(Some(PathBuf::from(env_path)));
    }
    let default = PathBuf::from(DEFAULT_CONFIG_NAME);
    Ok(default.is_file().then_some(default))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Reads one environment variable strictly; empty values count as unset.
fn env_value<F>(lookup: &F, name: &str) -> Result<Option<String>, ConfigError>
where
    F: Fn(&str) -> Option<OsString>,
{
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };
    let value = raw
        .into_string()
        .map_err(|_| ConfigError::Invalid(format!("environment variable {name} must be utf-8")))?;
    if value.trim().is_empty() { Ok(None) } else { Ok(Some(value)) }
}

/// Default for `api.base_url`.
fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

/// Default for `api.timeout_ms`.
const fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Default for `api.max_response_bytes`.
const fn default_max_response_bytes() -> usize {
    DEFAULT_MAX_RESPONSE_BYTES
}

/// Default for `api.user_agent`.
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

/// Default for `compute.max_retries`.
const fn default_max_retries() -> u32 {
    mesh_procedures_core::runtime::poller::DEFAULT_MAX_RETRIES
}

/// Default for `compute.retry_interval_secs`.
const fn default_retry_interval_secs() -> u64 {
    mesh_procedures_core::runtime::poller::DEFAULT_RETRY_INTERVAL.as_secs()
}

/// Serde default for flags that start enabled.
const fn default_true() -> bool {
    true
}

// ============================================================================
// SECTION: Tests
// ============================================================================
