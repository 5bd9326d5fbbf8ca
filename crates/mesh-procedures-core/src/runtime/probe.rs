// crates/mesh-procedures-core/src/runtime/probe.rs
// ============================================================================
// Module: API Contract Probes
// Description: Single-request negative and edge-case checks against the API.
// Purpose: Observe how create endpoints treat malformed or unauthorized input.
// Dependencies: crate::{core, interfaces, runtime}, serde, serde_json
// ============================================================================

//! ## Overview
//! A probe POSTs one body to an entity collection with a chosen
//! authorization and account-header policy, then classifies the status.
//! Anything a probe manages to create is deleted with the session token so
//! probes leave no residue behind.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use serde_json::Value;

use crate::core::call::HttpMethod;
use crate::core::endpoints::Endpoint;
use crate::core::entity::EntityKind;
use crate::core::identifiers::AccessToken;
use crate::core::identifiers::EntityIdentifier;
use crate::core::report::RunCounts;
use crate::core::report::StepStatus;
use crate::interfaces::ApiCallSink;
use crate::interfaces::ApiRequest;
use crate::interfaces::MeshTransport;
use crate::interfaces::RequestAuth;
use crate::runtime::handlers::entity::created_identifier;
use crate::runtime::session::ApiSession;
use crate::runtime::session::Credentials;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Token sent by probes that exercise invalid credentials.
pub const INVALID_TOKEN: &str = "invalid-token";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Body sent by a probe.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "format", content = "value")]
pub enum ProbeBody {
    /// JSON document.
    Json(Value),
    /// Raw text, used for malformed JSON.
    Raw(String),
}

/// Authorization a probe presents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeAuth {
    /// The session's bearer token.
    Valid,
    /// No `Authorization` header.
    Missing,
    /// A bearer token the API never issued.
    Invalid,
}

/// Status class a probe expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeExpectation {
    /// 2xx.
    Accepted,
    /// 4xx.
    Rejected,
    /// Any status; recorded only.
    Observe,
}

impl ProbeExpectation {
    /// Returns true when the status satisfies the expectation.
    #[must_use]
    pub const fn matches(self, status: u16) -> bool {
        match self {
            Self::Accepted => status >= 200 && status < 300,
            Self::Rejected => status >= 400 && status < 500,
            Self::Observe => true,
        }
    }
}

/// One probe request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeCase {
    /// Case name.
    pub name: String,
    /// Collection the probe posts to.
    pub kind: EntityKind,
    /// Request body.
    pub body: ProbeBody,
    /// Authorization policy.
    pub auth: ProbeAuth,
    /// Whether the account header is sent.
    pub include_account: bool,
    /// Expected status class.
    pub expectation: ProbeExpectation,
}

/// Result of one probe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeOutcome {
    /// Case that ran.
    pub case: ProbeCase,
    /// Classification.
    pub status: StepStatus,
    /// HTTP status, when a response arrived.
    pub http_status: Option<u16>,
    /// Explanation.
    pub message: String,
    /// Entity created by the probe and deleted afterwards.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<EntityIdentifier>,
    /// Cleanup failure, if deletion did not succeed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanup_error: Option<String>,
}

/// Results of a probe run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeReport {
    /// Whether login produced a token.
    pub logged_in: bool,
    /// One outcome per case, in order.
    pub outcomes: Vec<ProbeOutcome>,
}

impl ProbeReport {
    /// Counts outcomes by status.
    #[must_use]
    pub fn counts(&self) -> RunCounts {
        let mut counts = RunCounts {
            total: self.outcomes.len(),
            ..RunCounts::default()
        };
        for outcome in &self.outcomes {
            match outcome.status {
                StepStatus::Passed => counts.passed += 1,
                StepStatus::Failed => counts.failed += 1,
                StepStatus::Skipped => counts.skipped += 1,
            }
        }
        counts
    }

    /// Returns true when any probe failed or left an entity behind.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(|outcome| {
            outcome.status == StepStatus::Failed || outcome.cleanup_error.is_some()
        })
    }
}

// ============================================================================
// SECTION: Runner
// ============================================================================

/// Logs in and runs every probe case in order.
///
/// Without a token every case is skipped.
#[must_use]
pub fn run_probes(
    cases: &[ProbeCase],
    transport: &dyn MeshTransport,
    credentials: &Credentials,
    sink: &dyn ApiCallSink,
) -> ProbeReport {
    let mut session = ApiSession::new(transport, sink);
    let logged_in = matches!(session.login(credentials), Ok(Some(_)));
    let outcomes = cases
        .iter()
        .map(|case| {
            if logged_in {
                run_probe(&mut session, case)
            } else {
                ProbeOutcome {
                    case: case.clone(),
                    status: StepStatus::Skipped,
                    http_status: None,
                    message: "no access token".to_string(),
                    created: None,
                    cleanup_error: None,
                }
            }
        })
        .collect();
    ProbeReport {
        logged_in,
        outcomes,
    }
}

/// Runs one probe and removes anything it created.
fn run_probe(session: &mut ApiSession<'_>, case: &ProbeCase) -> ProbeOutcome {
    let auth = match case.auth {
        ProbeAuth::Valid => {
            session.token().cloned().map_or(RequestAuth::Anonymous, RequestAuth::Bearer)
        }
        ProbeAuth::Missing => RequestAuth::Anonymous,
        ProbeAuth::Invalid => RequestAuth::Bearer(AccessToken::new(INVALID_TOKEN)),
    };
    let mut request =
        ApiRequest::new(HttpMethod::Post, Endpoint::Entity(case.kind).path()).with_auth(auth);
    request = match &case.body {
        ProbeBody::Json(body) => request.with_json(body.clone()),
        ProbeBody::Raw(body) => request.with_raw(body.clone()),
    };
    if !case.include_account {
        request = request.without_account();
    }

    let response = match session.execute(&request) {
        Ok(response) => response,
        Err(err) => {
            return ProbeOutcome {
                case: case.clone(),
                status: StepStatus::Failed,
                http_status: None,
                message: err.to_string(),
                created: None,
                cleanup_error: None,
            };
        }
    };

    let passed = case.expectation.matches(response.status);
    let expectation = match case.expectation {
        ProbeExpectation::Accepted => "2xx",
        ProbeExpectation::Rejected => "4xx",
        ProbeExpectation::Observe => "any status",
    };
    let message = format!("status {} (expected {expectation})", response.status);
    let created = if response.is_success() {
        created_identifier(case.kind, &response.body).ok()
    } else {
        None
    };
    let cleanup_error = created.as_ref().and_then(|identifier| {
        match session.delete_entity(case.kind, identifier) {
            Ok(deleted) if deleted.is_success() => None,
            Ok(deleted) => Some(format!("delete {identifier} returned {}", deleted.status)),
            Err(err) => Some(format!("delete {identifier} failed: {err}")),
        }
    });
    ProbeOutcome {
        case: case.clone(),
        status: if passed { StepStatus::Passed } else { StepStatus::Failed },
        http_status: Some(response.status),
        message,
        created,
        cleanup_error,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
