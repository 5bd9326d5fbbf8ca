// crates/mesh-procedures-core/tests/common/mod.rs
// ============================================================================
// Module: Core Test Fixtures
// Description: In-memory data mesh API and scripted clock for runtime tests.
// Purpose: Exercise the runtime against realistic request shapes offline.
// Dependencies: mesh-procedures-core, serde_json
// ============================================================================

//! ## Overview
//! [`FakeMeshApi`] implements the transport trait over an in-memory entity
//! store so runtime tests exercise real request shapes without a network.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use mesh_procedures_core::ApiRequest;
use mesh_procedures_core::ApiResponse;
use mesh_procedures_core::Clock;
use mesh_procedures_core::EntityKind;
use mesh_procedures_core::Endpoint;
use mesh_procedures_core::HttpMethod;
use mesh_procedures_core::LinkKind;
use mesh_procedures_core::MeshTransport;
use mesh_procedures_core::RequestAuth;
use mesh_procedures_core::RequestBody;
use mesh_procedures_core::TransportError;
use serde_json::Value;
use serde_json::json;

/// Token issued by the fake login endpoint.
pub const TOKEN: &str = "token-123";

/// Link kinds routed by the fake API.
const LINKS: [LinkKind; 4] = [
    LinkKind::SystemToSource,
    LinkKind::ObjectToSource,
    LinkKind::ProductToObject,
    LinkKind::ProductToProduct,
];

// ============================================================================
// SECTION: Fake API
// ============================================================================

/// Entity held by the fake API.
#[derive(Debug, Clone)]
struct StoredEntity {
    kind: EntityKind,
    body: Value,
    compute: String,
}

/// Mutable fake API state.
#[derive(Debug, Default)]
struct FakeState {
    next_id: u64,
    entities: BTreeMap<String, StoredEntity>,
    compute_polls: BTreeMap<String, usize>,
    requests: Vec<ApiRequest>,
    links: Vec<(LinkKind, String, String)>,
    configured: Vec<(String, String, Value)>,
}

/// In-memory data mesh API.
pub struct FakeMeshApi {
    state: Mutex<FakeState>,
    login_token: Option<String>,
    compute_script: Vec<&'static str>,
    overrides: Vec<(HttpMethod, String, u16)>,
    omit_compute_handle: bool,
}

impl Default for FakeMeshApi {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeMeshApi {
    /// Creates a fake that accepts logins and completes compute on the second poll.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
            login_token: Some(TOKEN.to_string()),
            compute_script: vec!["RUNNING", "COMPLETED"],
            overrides: Vec::new(),
            omit_compute_handle: false,
        }
    }

    /// Answers logins with 401.
    pub fn rejecting_login(mut self) -> Self {
        self.login_token = None;
        self
    }

    /// Sets the compute statuses returned per job; the last one repeats.
    pub fn with_compute_script(mut self, script: Vec<&'static str>) -> Self {
        self.compute_script = script;
        self
    }

    /// Forces a status for one method and path.
    pub fn failing(mut self, method: HttpMethod, path: &str, status: u16) -> Self {
        self.overrides.push((method, path.to_string(), status));
        self
    }

    /// Omits compute handles from entity reads.
    pub fn without_compute_handles(mut self) -> Self {
        self.omit_compute_handle = true;
        self
    }

    /// Returns every request received.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Returns the number of live entities.
    pub fn entity_count(&self) -> usize {
        self.state.lock().unwrap().entities.len()
    }

    /// Returns the links created so far.
    pub fn links(&self) -> Vec<(LinkKind, String, String)> {
        self.state.lock().unwrap().links.clone()
    }

    /// Returns `(path, identifier, body)` for every configuration call.
    pub fn configured(&self) -> Vec<(String, String, Value)> {
        self.state.lock().unwrap().configured.clone()
    }

    /// Routes one request.
    fn handle(&self, state: &mut FakeState, request: &ApiRequest) -> ApiResponse {
        if let Some((_, _, status)) = self
            .overrides
            .iter()
            .find(|(method, path, _)| *method == request.method && *path == request.path)
        {
            return ApiResponse::json(*status, json!({"error": "forced failure"}));
        }
        if request.path == Endpoint::Login.path() {
            return match &self.login_token {
                Some(token) => ApiResponse::json(200, json!({"access_token": token})),
                None => ApiResponse::json(401, json!({"error": "invalid credentials"})),
            };
        }
        match &request.auth {
            RequestAuth::Bearer(token) if token.expose() == TOKEN => {}
            _ => return ApiResponse::json(401, json!({"error": "unauthorized"})),
        }
        let identifier = request
            .query
            .iter()
            .find(|param| param.name == "identifier")
            .map(|param| param.value.clone());
        let body = match &request.body {
            RequestBody::Json(value) => value.clone(),
            RequestBody::Raw(_) => return ApiResponse::json(400, json!({"error": "bad json"})),
            RequestBody::Empty => Value::Null,
        };

        for kind in EntityKind::ALL {
            let endpoint = Endpoint::Entity(kind);
            if request.path == endpoint.path() {
                return match request.method {
                    HttpMethod::Get => self.list(state, kind),
                    HttpMethod::Post => self.create(state, kind, body),
                    _ => ApiResponse::json(405, json!({})),
                };
            }
            if request.path == endpoint.addressed_path() {
                let Some(identifier) = identifier else {
                    return ApiResponse::json(400, json!({"error": "identifier required"}));
                };
                return match request.method {
                    HttpMethod::Get => self.read(state, kind, &identifier),
                    HttpMethod::Delete => match state.entities.remove(&identifier) {
                        Some(_) => ApiResponse::json(200, json!({"deleted": identifier})),
                        None => ApiResponse::json(404, json!({"error": "not found"})),
                    },
                    _ => ApiResponse::json(405, json!({})),
                };
            }
        }
        for link in LINKS {
            if request.path == Endpoint::Link(link).path() {
                let child = request
                    .query
                    .iter()
                    .find(|param| param.name == "child_identifier")
                    .map(|param| param.value.clone());
                return match (identifier, child) {
                    (Some(parent), Some(child))
                        if state.entities.contains_key(&parent)
                            && state.entities.contains_key(&child) =>
                    {
                        state.links.push((link, parent, child));
                        ApiResponse::json(200, json!({"linked": true}))
                    }
                    _ => ApiResponse::json(404, json!({"error": "link target not found"})),
                };
            }
        }
        for endpoint in [
            Endpoint::SourceConnection,
            Endpoint::SourceSecret,
            Endpoint::ObjectConfig,
            Endpoint::ProductSchema,
            Endpoint::TransformationBuilder,
        ] {
            if request.path == endpoint.addressed_path() {
                return match identifier {
                    Some(identifier) if state.entities.contains_key(&identifier) => {
                        state.configured.push((request.path.clone(), identifier, body));
                        ApiResponse::json(200, json!({"ok": true}))
                    }
                    _ => ApiResponse::json(404, json!({"error": "not found"})),
                };
            }
        }
        if request.path == Endpoint::ComputeStatus.addressed_path() {
            let Some(identifier) = identifier else {
                return ApiResponse::json(400, json!({}));
            };
            let polls = state.compute_polls.entry(identifier.clone()).or_insert(0);
            let status = self
                .compute_script
                .get(*polls)
                .or_else(|| self.compute_script.last())
                .copied()
                .unwrap_or("RUNNING");
            *polls += 1;
            return ApiResponse::json(
                200,
                json!({"identifier": identifier, "status": {"status": status}}),
            );
        }
        ApiResponse::json(404, json!({"error": format!("no route for {}", request.path)}))
    }

    /// Lists entities of a kind.
    fn list(&self, state: &FakeState, kind: EntityKind) -> ApiResponse {
        let items: Vec<Value> = state
            .entities
            .values()
            .filter(|entity| entity.kind == kind)
            .map(|entity| entity.body.clone())
            .collect();
        ApiResponse::json(200, Value::Array(items))
    }

    /// Creates an entity; non-system kinds require `entity.name`.
    fn create(&self, state: &mut FakeState, kind: EntityKind, body: Value) -> ApiResponse {
        let name = body.get("entity").and_then(|entity| entity.get("name")).and_then(Value::as_str);
        if kind != EntityKind::System && name.is_none_or(str::is_empty) {
            return ApiResponse::json(422, json!({"error": "entity.name is required"}));
        }
        state.next_id += 1;
        let identifier = format!("{}-{:04}", kind.as_str(), state.next_id);
        state.entities.insert(identifier.clone(), StoredEntity {
            kind,
            body,
            compute: format!("compute-{identifier}"),
        });
        if kind == EntityKind::System {
            ApiResponse::json(201, json!({"identifier": identifier}))
        } else {
            ApiResponse::json(201, json!({"entity": {"identifier": identifier}}))
        }
    }

    /// Reads one entity with its compute handle.
    fn read(&self, state: &FakeState, kind: EntityKind, identifier: &str) -> ApiResponse {
        let Some(entity) = state.entities.get(identifier).filter(|entity| entity.kind == kind)
        else {
            return ApiResponse::json(404, json!({"error": "not found"}));
        };
        let mut body = json!({
            "entity": {
                "identifier": identifier,
                "name": entity.body.get("entity").and_then(|inner| inner.get("name")),
            },
            "healthy": true,
        });
        if !self.omit_compute_handle {
            if kind == EntityKind::Product {
                body["compute"] = json!({"identifier": entity.compute});
            } else {
                body["compute_identifier"] = json!(entity.compute);
            }
        }
        ApiResponse::json(200, body)
    }
}

impl MeshTransport for FakeMeshApi {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(request.clone());
        Ok(self.handle(&mut state, request))
    }
}

/// Transport that never reaches the server.
pub struct UnreachableApi;

impl MeshTransport for UnreachableApi {
    fn send(&self, _request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        Err(TransportError::Transport("connection refused".to_string()))
    }
}

// ============================================================================
// SECTION: Fake Clock
// ============================================================================

/// Clock that records sleeps instead of blocking.
#[derive(Default)]
pub struct FakeClock {
    now_ms: Mutex<i64>,
    sleeps: Mutex<Vec<Duration>>,
}

impl FakeClock {
    /// Creates a clock at the given Unix milliseconds.
    pub fn starting_at(now_ms: i64) -> Self {
        Self {
            now_ms: Mutex::new(now_ms),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    /// Returns every requested sleep.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }

    /// Returns the sum of requested sleeps.
    pub fn total_slept(&self) -> Duration {
        self.sleeps().into_iter().sum()
    }
}

impl Clock for FakeClock {
    fn now_unix_millis(&self) -> i64 {
        *self.now_ms.lock().unwrap()
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        let millis = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
        *self.now_ms.lock().unwrap() += millis;
    }
}
