// system-tests/tests/helpers/mesh_mock.rs
// ============================================================================
// Module: Mesh API Mock
// Description: Local HTTP mock of the data mesh API for system-tests.
// Purpose: Exercise the real HTTP transport against realistic API behavior.
// Dependencies: axum, mesh-procedures-core, serde_json, tokio
// ============================================================================

//! ## Overview
//! [`spawn_mesh_mock`] serves the login, entity, link, configuration, and
//! compute endpoints from an in-memory store on a background tokio runtime.
//! Every request is recorded with its headers so suites can assert on what
//! actually crossed the wire.
//!
//! The mock is stricter than a happy-path stub: every kind needs a non-empty
//! `entity.name`, `entity.entity_type` must match the kind, products must name
//! a live host mesh, links must join the right kinds, and builder inputs must
//! resolve to live entities.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::net::TcpListener as StdTcpListener;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::Method;
use axum::http::StatusCode;
use axum::http::Uri;
use axum::response::IntoResponse;
use axum::response::Response;
use mesh_procedures_core::Endpoint;
use mesh_procedures_core::EntityKind;
use mesh_procedures_core::LinkKind;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use system_tests::config::SystemTestConfig;
use tokio::runtime::Builder;
use tokio::sync::oneshot;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Token issued by the mock login endpoint.
pub const MOCK_TOKEN: &str = "mock-token-5d1c";
/// Password the mock login endpoint accepts.
pub const MOCK_PASSWORD: &str = "mock-password";
/// Account header value the runner sends.
pub const MOCK_ACCOUNT: &str = "qa-account";

/// Link kinds routed by the mock.
const LINKS: [LinkKind; 4] = [
    LinkKind::SystemToSource,
    LinkKind::ObjectToSource,
    LinkKind::ProductToObject,
    LinkKind::ProductToProduct,
];

/// Configuration endpoints that address one entity.
const CONFIGURE: [(Endpoint, EntityKind); 5] = [
    (Endpoint::SourceConnection, EntityKind::Source),
    (Endpoint::SourceSecret, EntityKind::Source),
    (Endpoint::ObjectConfig, EntityKind::Object),
    (Endpoint::ProductSchema, EntityKind::Product),
    (Endpoint::TransformationBuilder, EntityKind::Product),
];

// ============================================================================
// SECTION: Recorded Traffic
// ============================================================================

/// Request metadata captured by the mock.
#[derive(Debug, Clone, Serialize)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: String,
    /// Request path without the query string.
    pub path: String,
    /// Decoded query parameters.
    pub query: BTreeMap<String, String>,
    /// Raw `Authorization` header.
    pub authorization: Option<String>,
    /// Raw `x-account` header.
    pub account: Option<String>,
    /// Raw `User-Agent` header.
    pub user_agent: Option<String>,
    /// Raw `Content-Type` header.
    pub content_type: Option<String>,
    /// Parsed JSON body, when it parsed.
    pub body: Option<Value>,
}

/// Link created through the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedLink {
    /// Link endpoint.
    pub kind: LinkKind,
    /// Parent identifier.
    pub parent: String,
    /// Child identifier.
    pub child: String,
}

/// Configuration call accepted by the mock.
#[derive(Debug, Clone)]
pub struct RecordedConfig {
    /// Addressed endpoint path.
    pub path: String,
    /// Target identifier.
    pub identifier: String,
    /// Request body.
    pub body: Value,
}

// ============================================================================
// SECTION: Options
// ============================================================================

/// Behavior switches for a mock instance.
#[derive(Debug, Clone)]
pub struct MeshMockOptions {
    /// Answer every login with 401.
    pub reject_login: bool,
    /// Compute statuses per job; the last one repeats.
    pub compute_script: Vec<String>,
    /// Forced `(method, path, status)` answers checked before routing.
    pub failures: Vec<(Method, String, u16)>,
}

impl Default for MeshMockOptions {
    fn default() -> Self {
        Self {
            reject_login: false,
            compute_script: vec!["COMPLETED".to_string()],
            failures: Vec::new(),
        }
    }
}

impl MeshMockOptions {
    /// Answers logins with 401.
    #[must_use]
    pub fn rejecting_login(mut self) -> Self {
        self.reject_login = true;
        self
    }

    /// Sets the compute status script.
    #[must_use]
    pub fn with_compute_script(mut self, script: &[&str]) -> Self {
        self.compute_script = script.iter().map(ToString::to_string).collect();
        self
    }

    /// Forces a status for one method and path.
    #[must_use]
    pub fn failing(mut self, method: Method, path: &str, status: u16) -> Self {
        self.failures.push((method, path.to_string(), status));
        self
    }
}

// ============================================================================
// SECTION: State
// ============================================================================

/// Entity held by the mock.
#[derive(Debug, Clone)]
struct StoredEntity {
    kind: EntityKind,
    body: Value,
    compute: String,
}

/// Mutable mock state.
#[derive(Debug, Default)]
struct MockStore {
    next_id: u64,
    entities: BTreeMap<String, StoredEntity>,
    compute_polls: BTreeMap<String, usize>,
    requests: Vec<RecordedRequest>,
    links: Vec<RecordedLink>,
    configured: Vec<RecordedConfig>,
}

#[derive(Clone)]
struct MockState {
    options: Arc<MeshMockOptions>,
    store: Arc<Mutex<MockStore>>,
}

/// Parsed request handed to the router.
struct MockRequest {
    method: Method,
    path: String,
    query: BTreeMap<String, String>,
    bearer: Option<String>,
    body: Result<Value, String>,
}

impl MockRequest {
    fn param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }
}

// ============================================================================
// SECTION: Handle
// ============================================================================

/// Handle for a running mock; dropping it stops the server.
pub struct MeshMockHandle {
    base_url: String,
    store: Arc<Mutex<MockStore>>,
    shutdown: Option<oneshot::Sender<()>>,
    join: Option<thread::JoinHandle<()>>,
}

impl MeshMockHandle {
    /// Returns the mock base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns every request received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.store.lock().map_or_else(|_| Vec::new(), |store| store.requests.clone())
    }

    /// Returns the links created so far.
    pub fn links(&self) -> Vec<RecordedLink> {
        self.store.lock().map_or_else(|_| Vec::new(), |store| store.links.clone())
    }

    /// Returns the accepted configuration calls.
    pub fn configured(&self) -> Vec<RecordedConfig> {
        self.store.lock().map_or_else(|_| Vec::new(), |store| store.configured.clone())
    }

    /// Returns the number of live entities of a kind.
    pub fn entity_count(&self, kind: EntityKind) -> usize {
        self.store.lock().map_or(0, |store| {
            store.entities.values().filter(|entity| entity.kind == kind).count()
        })
    }

    /// Returns the total number of live entities.
    pub fn total_entities(&self) -> usize {
        self.store.lock().map_or(0, |store| store.entities.len())
    }

    /// Returns the number of compute status reads.
    pub fn compute_polls(&self) -> usize {
        self.store.lock().map_or(0, |store| store.compute_polls.values().sum())
    }
}

impl Drop for MeshMockHandle {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

// ============================================================================
// SECTION: Spawn
// ============================================================================

/// Spawns a mock with default behavior.
pub fn spawn_default_mock() -> Result<MeshMockHandle, String> {
    spawn_mesh_mock(MeshMockOptions::default())
}

/// Spawns a mock on its own runtime thread.
///
/// Binds `MESH_PROCEDURES_SYSTEM_TEST_MOCK_BIND` when set, else an ephemeral
/// loopback port.
pub fn spawn_mesh_mock(options: MeshMockOptions) -> Result<MeshMockHandle, String> {
    let bind = SystemTestConfig::load().map_err(|err| err.to_string())?.mock_addr();
    let listener =
        StdTcpListener::bind(&bind).map_err(|err| format!("mesh mock bind {bind} failed: {err}"))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| format!("mesh mock listener nonblocking failed: {err}"))?;
    let addr = listener.local_addr().map_err(|err| format!("mesh mock local addr failed: {err}"))?;
    let base_url = format!("http://{addr}");

    let store = Arc::new(Mutex::new(MockStore::default()));
    let state = MockState {
        options: Arc::new(options),
        store: Arc::clone(&store),
    };
    let app = Router::new().fallback(handle_request).with_state(state);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let join = thread::spawn(move || {
        let Ok(runtime) = Builder::new_current_thread().enable_all().build() else {
            return;
        };
        runtime.block_on(async move {
            let Ok(listener) = tokio::net::TcpListener::from_std(listener) else {
                return;
            };
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = server.await;
        });
    });
    Ok(MeshMockHandle {
        base_url,
        store,
        shutdown: Some(shutdown_tx),
        join: Some(join),
    })
}

// ============================================================================
// SECTION: Handler
// ============================================================================

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|value| value.to_str().ok()).map(ToString::to_string)
}

#[allow(clippy::unused_async, reason = "axum handlers must be async.")]
async fn handle_request(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<BTreeMap<String, String>>,
    body: Bytes,
) -> Response {
    let parsed = if body.is_empty() {
        Ok(Value::Null)
    } else {
        serde_json::from_slice::<Value>(&body).map_err(|err| err.to_string())
    };
    let authorization = header(&headers, "authorization");
    let request = MockRequest {
        method: method.clone(),
        path: uri.path().to_string(),
        query: query.clone(),
        bearer: authorization
            .as_deref()
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(ToString::to_string),
        body: parsed,
    };
    let Ok(mut store) = state.store.lock() else {
        return reply(500, &json!({"error": "mock state poisoned"}));
    };
    store.requests.push(RecordedRequest {
        method: method.to_string(),
        path: request.path.clone(),
        query,
        authorization,
        account: header(&headers, "x-account"),
        user_agent: header(&headers, "user-agent"),
        content_type: header(&headers, "content-type"),
        body: request.body.clone().ok().filter(|value| !value.is_null()),
    });
    let (status, body) = route(&state.options, &mut store, &request);
    reply(status, &body)
}

fn reply(status: u16, body: &Value) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(body.clone())).into_response()
}

// ============================================================================
// SECTION: Routing
// ============================================================================

fn route(options: &MeshMockOptions, store: &mut MockStore, request: &MockRequest) -> (u16, Value) {
    if let Some((_, _, status)) = options
        .failures
        .iter()
        .find(|(method, path, _)| *method == request.method && *path == request.path)
    {
        return (*status, json!({"error": "forced failure"}));
    }
    if request.path == Endpoint::Login.path() {
        return login(options, request);
    }
    if request.bearer.as_deref() != Some(MOCK_TOKEN) {
        return (401, json!({"error": "unauthorized"}));
    }
    let body = match &request.body {
        Ok(body) => body.clone(),
        Err(err) => return (400, json!({"error": format!("malformed json: {err}")})),
    };

    for kind in EntityKind::ALL {
        let endpoint = Endpoint::Entity(kind);
        if request.path == endpoint.path() {
            return match request.method {
                Method::GET => list(store, kind),
                Method::POST => create(store, kind, body),
                _ => (405, json!({"error": "method not allowed"})),
            };
        }
        if request.path == endpoint.addressed_path() {
            let Some(identifier) = request.param("identifier") else {
                return (400, json!({"error": "identifier required"}));
            };
            return match request.method {
                Method::GET => read(store, kind, identifier),
                Method::DELETE => delete(store, kind, identifier),
                _ => (405, json!({"error": "method not allowed"})),
            };
        }
    }
    for link in LINKS {
        if request.path == Endpoint::Link(link).path() {
            return create_link(store, link, request);
        }
    }
    for (endpoint, kind) in CONFIGURE {
        if request.path == endpoint.addressed_path() {
            return configure(store, endpoint, kind, request, body);
        }
    }
    if request.path == Endpoint::ComputeStatus.addressed_path() {
        return compute_status(options, store, request);
    }
    (404, json!({"error": format!("no route for {}", request.path)}))
}

fn login(options: &MeshMockOptions, request: &MockRequest) -> (u16, Value) {
    let password = request
        .body
        .as_ref()
        .ok()
        .and_then(|body| body.get("password"))
        .and_then(Value::as_str);
    if options.reject_login || password != Some(MOCK_PASSWORD) {
        return (401, json!({"detail": "invalid credentials"}));
    }
    (200, json!({"access_token": MOCK_TOKEN, "token_type": "bearer"}))
}

fn list(store: &MockStore, kind: EntityKind) -> (u16, Value) {
    let items: Vec<Value> = store
        .entities
        .iter()
        .filter(|(_, entity)| entity.kind == kind)
        .map(|(identifier, entity)| {
            json!({"identifier": identifier, "name": entity_name(&entity.body)})
        })
        .collect();
    (200, Value::Array(items))
}

fn entity_name(body: &Value) -> Option<&str> {
    body.get("entity").and_then(|entity| entity.get("name")).and_then(Value::as_str)
}

fn create(store: &mut MockStore, kind: EntityKind, body: Value) -> (u16, Value) {
    if entity_name(&body).is_none_or(str::is_empty) {
        return (422, json!({"error": "entity.name is required"}));
    }
    let entity_type =
        body.get("entity").and_then(|entity| entity.get("entity_type")).and_then(Value::as_str);
    if entity_type.is_some_and(|value| value != kind.api_label()) {
        return (422, json!({"error": "entity.entity_type does not match the endpoint"}));
    }
    if kind == EntityKind::Product {
        let host = body.get("host_mesh_identifier").and_then(Value::as_str).unwrap_or_default();
        let hosted = store.entities.get(host).is_some_and(|entity| entity.kind == EntityKind::Mesh);
        if !hosted {
            return (422, json!({"error": "host_mesh_identifier must name a mesh"}));
        }
    }
    store.next_id += 1;
    let identifier = format!("{}-{:04}", kind.as_str(), store.next_id);
    store.entities.insert(identifier.clone(), StoredEntity {
        kind,
        body,
        compute: format!("compute-{identifier}"),
    });
    if kind == EntityKind::System {
        (201, json!({"identifier": identifier}))
    } else {
        (201, json!({"entity": {"identifier": identifier}}))
    }
}

fn read(store: &MockStore, kind: EntityKind, identifier: &str) -> (u16, Value) {
    let Some(entity) = store.entities.get(identifier).filter(|entity| entity.kind == kind) else {
        return (404, json!({"error": "not found"}));
    };
    let mut body = json!({
        "entity": {
            "identifier": identifier,
            "name": entity_name(&entity.body),
        },
        "healthy": true,
    });
    if kind == EntityKind::Product {
        body["compute"] = json!({"identifier": entity.compute});
    } else {
        body["compute_identifier"] = json!(entity.compute);
    }
    (200, body)
}

fn delete(store: &mut MockStore, kind: EntityKind, identifier: &str) -> (u16, Value) {
    if !store.entities.get(identifier).is_some_and(|entity| entity.kind == kind) {
        return (404, json!({"error": "not found"}));
    }
    store.entities.remove(identifier);
    (200, json!({"deleted": identifier}))
}

fn is_kind(store: &MockStore, identifier: &str, kind: EntityKind) -> bool {
    store.entities.get(identifier).is_some_and(|entity| entity.kind == kind)
}

fn create_link(store: &mut MockStore, link: LinkKind, request: &MockRequest) -> (u16, Value) {
    let (Some(parent), Some(child)) =
        (request.param("identifier"), request.param("child_identifier"))
    else {
        return (400, json!({"error": "identifier and child_identifier required"}));
    };
    if !is_kind(store, parent, link.parent_kind()) || !is_kind(store, child, link.child_kind()) {
        return (404, json!({"error": "link target not found"}));
    }
    store.links.push(RecordedLink {
        kind: link,
        parent: parent.to_string(),
        child: child.to_string(),
    });
    (200, json!({"linked": true}))
}

fn configure(
    store: &mut MockStore,
    endpoint: Endpoint,
    kind: EntityKind,
    request: &MockRequest,
    body: Value,
) -> (u16, Value) {
    let Some(identifier) = request.param("identifier").filter(|id| is_kind(store, id, kind)) else {
        return (404, json!({"error": "not found"}));
    };
    if endpoint == Endpoint::TransformationBuilder {
        let inputs = body.get("inputs").and_then(Value::as_array).cloned().unwrap_or_default();
        for input in inputs {
            let key = input.get("identifier").and_then(Value::as_str).unwrap_or_default();
            let known = store
                .entities
                .keys()
                .any(|live| format!("input_{}", live.replace('-', "_")) == key);
            if !known {
                return (422, json!({"error": format!("unknown builder input {key}")}));
            }
        }
    }
    store.configured.push(RecordedConfig {
        path: request.path.clone(),
        identifier: identifier.to_string(),
        body,
    });
    (200, json!({"ok": true}))
}

fn compute_status(
    options: &MeshMockOptions,
    store: &mut MockStore,
    request: &MockRequest,
) -> (u16, Value) {
    let Some(identifier) = request.param("identifier") else {
        return (400, json!({"error": "identifier required"}));
    };
    let known = store.entities.values().any(|entity| entity.compute == identifier);
    if !known {
        return (404, json!({"error": "unknown compute"}));
    }
    let polls = store.compute_polls.entry(identifier.to_string()).or_insert(0);
    let status = options
        .compute_script
        .get(*polls)
        .or_else(|| options.compute_script.last())
        .map_or("RUNNING", String::as_str);
    *polls += 1;
    (200, json!({"identifier": identifier, "status": {"status": status}}))
}
