// crates/mesh-procedures-core/src/runtime/session.rs
// ============================================================================
// Module: API Session
// Description: Authenticated, recorded access to the data mesh operations.
// Purpose: Build typed requests for every endpoint and capture each call.
// Dependencies: crate::{core, interfaces}, serde_json
// ============================================================================

//! ## Overview
//! [`ApiSession`] is the only path from the runtime to a [`MeshTransport`].
//! It attaches the bearer token, builds the request shape each endpoint
//! expects, and records every call so a failing step can report the last
//! request it made.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::time::Instant;

use serde_json::Value;
use serde_json::json;

use crate::core::call::ApiCallRecord;
use crate::core::call::HttpMethod;
use crate::core::endpoints::CHILD_IDENTIFIER_PARAM;
use crate::core::endpoints::Endpoint;
use crate::core::endpoints::IDENTIFIER_PARAM;
use crate::core::endpoints::LinkKind;
use crate::core::entity::EntityKind;
use crate::core::identifiers::AccessToken;
use crate::core::identifiers::ComputeIdentifier;
use crate::core::identifiers::EntityIdentifier;
use crate::interfaces::ApiCallSink;
use crate::interfaces::ApiRequest;
use crate::interfaces::ApiResponse;
use crate::interfaces::MeshTransport;
use crate::interfaces::RequestAuth;
use crate::interfaces::TransportError;

// ============================================================================
// SECTION: Credentials
// ============================================================================

/// Login credentials.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Credentials {
    /// Account user name.
    pub username: String,
    /// Account password.
    pub password: String,
}

impl Credentials {
    /// Creates credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ============================================================================
// SECTION: Session
// ============================================================================

/// Recorded API session bound to one transport.
pub struct ApiSession<'a> {
    /// Underlying transport.
    transport: &'a dyn MeshTransport,
    /// Sink receiving every call record.
    sink: &'a dyn ApiCallSink,
    /// Bearer token once logged in.
    token: Option<AccessToken>,
    /// Calls made through this session.
    calls: Vec<ApiCallRecord>,
}

impl<'a> ApiSession<'a> {
    /// Creates an unauthenticated session.
    #[must_use]
    pub fn new(transport: &'a dyn MeshTransport, sink: &'a dyn ApiCallSink) -> Self {
        Self {
            transport,
            sink,
            token: None,
            calls: Vec::new(),
        }
    }

    /// Returns the bearer token, if logged in.
    #[must_use]
    pub const fn token(&self) -> Option<&AccessToken> {
        self.token.as_ref()
    }

    /// Sets the bearer token used by later calls.
    pub fn set_token(&mut self, token: Option<AccessToken>) {
        self.token = token;
    }

    /// Returns every call made through the session.
    #[must_use]
    pub fn calls(&self) -> &[ApiCallRecord] {
        &self.calls
    }

    /// Returns the most recent call.
    #[must_use]
    pub fn last_call(&self) -> Option<&ApiCallRecord> {
        self.calls.last()
    }

    /// Returns the number of calls made so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.len()
    }

    /// Sends a request and records the call.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the transport produced no response.
    pub fn execute(&mut self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        self.execute_recorded(request, request.body.recorded())
    }

    /// Exchanges credentials for a bearer token and stores it.
    ///
    /// A non-2xx answer or a body without `access_token` yields `None`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the login request could not be sent.
    pub fn login(
        &mut self,
        credentials: &Credentials,
    ) -> Result<Option<AccessToken>, TransportError> {
        let request = ApiRequest::new(HttpMethod::Post, Endpoint::Login.path())
            .with_json(json!({"user": credentials.username, "password": credentials.password}));
        let recorded = json!({"user": credentials.username, "password": "<redacted>"});
        let response = self.execute_recorded(&request, Some(recorded))?;
        let token = if response.is_success() {
            response
                .body
                .get("access_token")
                .and_then(Value::as_str)
                .filter(|token| !token.is_empty())
                .map(AccessToken::new)
        } else {
            None
        };
        self.token.clone_from(&token);
        Ok(token)
    }

    // ------------------------------------------------------------------------
    // Entity collections
    // ------------------------------------------------------------------------

    /// Lists all entities of a kind.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the call fails to complete.
    pub fn list_entities(&mut self, kind: EntityKind) -> Result<ApiResponse, TransportError> {
        let request = self.authorized(HttpMethod::Get, Endpoint::Entity(kind).path());
        self.execute(&request)
    }

    /// Creates an entity.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the call fails to complete.
    pub fn create_entity(
        &mut self,
        kind: EntityKind,
        payload: Value,
    ) -> Result<ApiResponse, TransportError> {
        let request =
            self.authorized(HttpMethod::Post, Endpoint::Entity(kind).path()).with_json(payload);
        self.execute(&request)
    }

    /// Reads one entity.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the call fails to complete.
    pub fn get_entity(
        &mut self,
        kind: EntityKind,
        identifier: &EntityIdentifier,
    ) -> Result<ApiResponse, TransportError> {
        let request = self.addressed(HttpMethod::Get, Endpoint::Entity(kind), identifier.as_str());
        self.execute(&request)
    }

    /// Deletes one entity.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the call fails to complete.
    pub fn delete_entity(
        &mut self,
        kind: EntityKind,
        identifier: &EntityIdentifier,
    ) -> Result<ApiResponse, TransportError> {
        let request =
            self.addressed(HttpMethod::Delete, Endpoint::Entity(kind), identifier.as_str());
        self.execute(&request)
    }

    /// Links a parent entity to a child entity.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the call fails to complete.
    pub fn link(
        &mut self,
        link: LinkKind,
        parent: &EntityIdentifier,
        child: &EntityIdentifier,
    ) -> Result<ApiResponse, TransportError> {
        let request = self
            .authorized(HttpMethod::Post, Endpoint::Link(link).path())
            .with_query(IDENTIFIER_PARAM, parent.as_str())
            .with_query(CHILD_IDENTIFIER_PARAM, child.as_str());
        self.execute(&request)
    }

    // ------------------------------------------------------------------------
    // Entity configuration
    // ------------------------------------------------------------------------

    /// Sets the connection details of a source.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the call fails to complete.
    pub fn configure_source_connection(
        &mut self,
        source: &EntityIdentifier,
        payload: Value,
    ) -> Result<ApiResponse, TransportError> {
        self.send_addressed(HttpMethod::Put, Endpoint::SourceConnection, source, payload)
    }

    /// Stores the connection secrets of a source.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the call fails to complete.
    pub fn set_source_secret(
        &mut self,
        source: &EntityIdentifier,
        payload: Value,
    ) -> Result<ApiResponse, TransportError> {
        self.send_addressed(HttpMethod::Post, Endpoint::SourceSecret, source, payload)
    }

    /// Sets the file/format configuration of an object.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the call fails to complete.
    pub fn configure_object(
        &mut self,
        object: &EntityIdentifier,
        payload: Value,
    ) -> Result<ApiResponse, TransportError> {
        self.send_addressed(HttpMethod::Put, Endpoint::ObjectConfig, object, payload)
    }

    /// Defines the schema of a product.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the call fails to complete.
    pub fn define_product_schema(
        &mut self,
        product: &EntityIdentifier,
        payload: Value,
    ) -> Result<ApiResponse, TransportError> {
        self.send_addressed(HttpMethod::Put, Endpoint::ProductSchema, product, payload)
    }

    /// Submits the transformation builder of a product.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the call fails to complete.
    pub fn apply_transformation(
        &mut self,
        product: &EntityIdentifier,
        payload: Value,
    ) -> Result<ApiResponse, TransportError> {
        self.send_addressed(HttpMethod::Put, Endpoint::TransformationBuilder, product, payload)
    }

    /// Reads the status of a compute job.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the call fails to complete.
    pub fn compute_status(
        &mut self,
        compute: &ComputeIdentifier,
    ) -> Result<ApiResponse, TransportError> {
        let request = self.addressed(HttpMethod::Get, Endpoint::ComputeStatus, compute.as_str());
        self.execute(&request)
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    /// Builds a request carrying the session token.
    #[must_use]
    pub fn authorized(&self, method: HttpMethod, path: impl Into<String>) -> ApiRequest {
        let request = ApiRequest::new(method, path);
        match &self.token {
            Some(token) => request.with_auth(RequestAuth::Bearer(token.clone())),
            None => request,
        }
    }

    /// Builds an authorized request addressed by `identifier`.
    fn addressed(&self, method: HttpMethod, endpoint: Endpoint, identifier: &str) -> ApiRequest {
        self.authorized(method, endpoint.addressed_path()).with_query(IDENTIFIER_PARAM, identifier)
    }

    /// Sends an addressed request with a JSON body.
    fn send_addressed(
        &mut self,
        method: HttpMethod,
        endpoint: Endpoint,
        identifier: &EntityIdentifier,
        payload: Value,
    ) -> Result<ApiResponse, TransportError> {
        let request = self.addressed(method, endpoint, identifier.as_str()).with_json(payload);
        self.execute(&request)
    }

    /// Sends a request and records it with the given payload.
    fn execute_recorded(
        &mut self,
        request: &ApiRequest,
        payload: Option<Value>,
    ) -> Result<ApiResponse, TransportError> {
        let started = Instant::now();
        let outcome = self.transport.send(request);
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let record = ApiCallRecord {
            method: request.method,
            path: request.path.clone(),
            query: request.query.clone(),
            payload,
            status: outcome.as_ref().ok().map(|response| response.status),
            response: outcome.as_ref().ok().map(ApiResponse::recorded_body),
            error: outcome.as_ref().err().map(ToString::to_string),
            elapsed_ms,
        };
        self.sink.record(&record);
        self.calls.push(record);
        outcome
    }
}
