// crates/mesh-procedures-core/src/interfaces/mod.rs
// ============================================================================
// Module: Mesh Procedures Interfaces
// Description: Backend-agnostic seams for transport, time, and reporting.
// Purpose: Define the contract surfaces used by the procedure runtime.
// Dependencies: crate::core, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The runtime never touches the network, the wall clock, or the terminal
//! directly. It talks to the data mesh API through [`MeshTransport`], waits
//! through [`Clock`], and reports through [`ApiCallSink`], [`RunObserver`],
//! and [`RunNotifier`]. Tests substitute scripted implementations.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde_json::Value;
use thiserror::Error;

use crate::core::call::ApiCallRecord;
use crate::core::call::HttpMethod;
use crate::core::call::QueryParam;
use crate::core::identifiers::AccessToken;
use crate::core::report::RunReport;
use crate::core::report::StepResult;

// ============================================================================
// SECTION: Transport
// ============================================================================

/// Request body variants.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// No body.
    Empty,
    /// JSON document.
    Json(Value),
    /// Raw text sent as-is with a JSON content type.
    Raw(String),
}

impl RequestBody {
    /// Returns the body as it should appear in call records.
    #[must_use]
    pub fn recorded(&self) -> Option<Value> {
        match self {
            Self::Empty => None,
            Self::Json(value) => Some(value.clone()),
            Self::Raw(text) => Some(Value::String(text.clone())),
        }
    }
}

/// Authorization attached to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestAuth {
    /// No `Authorization` header.
    Anonymous,
    /// `Authorization: Bearer <token>`.
    Bearer(AccessToken),
}

/// Transport-neutral API request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// Request method.
    pub method: HttpMethod,
    /// Path relative to the API base URL.
    pub path: String,
    /// Query parameters in order.
    pub query: Vec<QueryParam>,
    /// Request body.
    pub body: RequestBody,
    /// Authorization header policy.
    pub auth: RequestAuth,
    /// Whether the account header is attached.
    pub include_account: bool,
}

impl ApiRequest {
    /// Creates an anonymous request without body or query.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            auth: RequestAuth::Anonymous,
            include_account: true,
        }
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push(QueryParam::new(name, value));
        self
    }

    /// Sets a JSON body.
    #[must_use]
    pub fn with_json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    /// Sets a raw body.
    #[must_use]
    pub fn with_raw(mut self, body: impl Into<String>) -> Self {
        self.body = RequestBody::Raw(body.into());
        self
    }

    /// Sets the authorization policy.
    #[must_use]
    pub fn with_auth(mut self, auth: RequestAuth) -> Self {
        self.auth = auth;
        self
    }

    /// Omits the account header.
    #[must_use]
    pub const fn without_account(mut self) -> Self {
        self.include_account = false;
        self
    }
}

/// Transport-neutral API response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Parsed JSON body, or `Null` when the body is not JSON.
    pub body: Value,
    /// Raw body text.
    pub raw: String,
}

impl ApiResponse {
    /// Builds a response, parsing the body as JSON when possible.
    #[must_use]
    pub fn from_text(status: u16, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let body = serde_json::from_str(&raw).unwrap_or(Value::Null);
        Self {
            status,
            body,
            raw,
        }
    }

    /// Builds a response from a JSON value.
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let raw = body.to_string();
        Self {
            status,
            body,
            raw,
        }
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Returns the body as recorded in call transcripts.
    #[must_use]
    pub fn recorded_body(&self) -> Value {
        if self.body.is_null() && !self.raw.is_empty() {
            return Value::String(self.raw.clone());
        }
        self.body.clone()
    }
}

/// Transport failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// Connection, timeout, or protocol failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// The response body exceeded the configured limit.
    #[error("response exceeds size limit: {0}")]
    ResponseTooLarge(String),
}

/// Sends requests to the data mesh API.
pub trait MeshTransport {
    /// Sends one request and returns the response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when no HTTP response was obtained.
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Time source for timestamps and waits.
pub trait Clock {
    /// Returns the current time in Unix milliseconds.
    fn now_unix_millis(&self) -> i64;

    /// Blocks for the given duration.
    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by [`SystemTime`] and [`std::thread::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix_millis(&self) -> i64 {
        let millis = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        i64::try_from(millis).unwrap_or(i64::MAX)
    }

    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

// ============================================================================
// SECTION: Call Sinks
// ============================================================================

/// Receives every API call record as it is made.
pub trait ApiCallSink {
    /// Records one call.
    fn record(&self, call: &ApiCallRecord);
}

/// Call sink that discards records.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCallSink;

impl ApiCallSink for NoopCallSink {
    fn record(&self, _call: &ApiCallRecord) {}
}

/// Call sink that keeps records in memory.
#[derive(Debug, Default)]
pub struct MemoryCallSink {
    /// Recorded calls.
    calls: Mutex<Vec<ApiCallRecord>>,
}

impl MemoryCallSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded calls.
    #[must_use]
    pub fn calls(&self) -> Vec<ApiCallRecord> {
        self.calls.lock().map_or_else(|_| Vec::new(), |calls| calls.clone())
    }
}

impl ApiCallSink for MemoryCallSink {
    fn record(&self, call: &ApiCallRecord) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call.clone());
        }
    }
}

// ============================================================================
// SECTION: Run Observers
// ============================================================================

/// Receives step results as the run progresses.
pub trait RunObserver {
    /// Called once per recorded result.
    fn step_finished(&self, result: &StepResult);
}

/// Observer that ignores progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRunObserver;

impl RunObserver for NoopRunObserver {
    fn step_finished(&self, _result: &StepResult) {}
}

// ============================================================================
// SECTION: Notifiers
// ============================================================================

/// Notification delivery errors.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Delivery failed.
    #[error("notification failed: {0}")]
    Delivery(String),
}

/// Publishes a finished run report.
pub trait RunNotifier {
    /// Publishes the report.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] when delivery fails.
    fn notify(&self, report: &RunReport) -> Result<(), NotifyError>;
}
