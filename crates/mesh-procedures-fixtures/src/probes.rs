// crates/mesh-procedures-fixtures/src/probes.rs
// ============================================================================
// Module: Probe Cases
// Description: Negative and edge-case requests for entity create endpoints.
// Purpose: Enumerate the contract checks run by `mesh-procedures probe`.
// Dependencies: crate::{env, payloads}, mesh-procedures-core, serde_json
// ============================================================================

//! ## Overview
//! Each entity kind gets the same battery: a valid body, bodies with a
//! missing, empty, or oversized name, a wrong `entity_type`, requests
//! without authorization, with an unknown token, or without the account
//! header, and a body that is not JSON at all.

// ============================================================================
// SECTION: Imports
// ============================================================================

use mesh_procedures_core::EntityKind;
use mesh_procedures_core::ProbeAuth;
use mesh_procedures_core::ProbeBody;
use mesh_procedures_core::ProbeCase;
use mesh_procedures_core::ProbeExpectation;
use serde_json::Value;

use crate::env::FixtureEnv;
use crate::payloads::EntityText;
use crate::payloads::LOREM_PURPOSE;
use crate::payloads::mesh_payload;
use crate::payloads::object_payload;
use crate::payloads::product_payload;
use crate::payloads::source_payload;
use crate::payloads::system_payload;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Length of the oversized name probe.
pub const LONG_NAME_LEN: usize = 1000;
/// Body sent by the malformed JSON probe.
pub const MALFORMED_JSON: &str = "{";

// ============================================================================
// SECTION: Cases
// ============================================================================

/// Builds the probe battery for the given kinds, in order.
#[must_use]
pub fn probe_cases(env: &FixtureEnv, kinds: &[EntityKind]) -> Vec<ProbeCase> {
    kinds.iter().flat_map(|kind| cases_for_kind(env, *kind)).collect()
}

/// Probe battery for one kind.
fn cases_for_kind(env: &FixtureEnv, kind: EntityKind) -> Vec<ProbeCase> {
    let valid = valid_payload(env, kind);
    let case = |name: &str, body: ProbeBody, expectation: ProbeExpectation| ProbeCase {
        name: format!("{kind}/{name}"),
        kind,
        body,
        auth: ProbeAuth::Valid,
        include_account: true,
        expectation,
    };
    // Products need a real host mesh to be accepted.
    let valid_expectation = match kind {
        EntityKind::Product => ProbeExpectation::Observe,
        EntityKind::Mesh | EntityKind::System | EntityKind::Source | EntityKind::Object => {
            ProbeExpectation::Accepted
        }
    };

    vec![
        case("valid-payload", ProbeBody::Json(valid.clone()), valid_expectation),
        case(
            "missing-name",
            ProbeBody::Json(with_entity_field(&valid, "name", None)),
            ProbeExpectation::Rejected,
        ),
        case(
            "empty-name",
            ProbeBody::Json(with_entity_field(&valid, "name", Some(Value::from("")))),
            ProbeExpectation::Rejected,
        ),
        case(
            "long-name",
            ProbeBody::Json(with_entity_field(
                &valid,
                "name",
                Some(Value::from("A".repeat(LONG_NAME_LEN))),
            )),
            ProbeExpectation::Observe,
        ),
        case(
            "invalid-entity-type",
            ProbeBody::Json(with_entity_field(
                &valid,
                "entity_type",
                Some(Value::from("invalid_type")),
            )),
            ProbeExpectation::Rejected,
        ),
        ProbeCase {
            auth: ProbeAuth::Missing,
            ..case(
                "without-authorization",
                ProbeBody::Json(valid.clone()),
                ProbeExpectation::Rejected,
            )
        },
        ProbeCase {
            auth: ProbeAuth::Invalid,
            ..case("invalid-token", ProbeBody::Json(valid.clone()), ProbeExpectation::Rejected)
        },
        ProbeCase {
            include_account: false,
            ..case("without-account-header", ProbeBody::Json(valid), ProbeExpectation::Observe)
        },
        case(
            "malformed-json",
            ProbeBody::Raw(MALFORMED_JSON.to_string()),
            ProbeExpectation::Rejected,
        ),
    ]
}

/// Create body the API should accept for a kind.
fn valid_payload(env: &FixtureEnv, kind: EntityKind) -> Value {
    let text = EntityText::generic(kind, Some("Probe"));
    match kind {
        EntityKind::Mesh => mesh_payload(env, &text, LOREM_PURPOSE),
        EntityKind::System => system_payload(env, &text),
        EntityKind::Source => source_payload(env, &text),
        EntityKind::Object => object_payload(env, &text),
        EntityKind::Product => {
            let mut body = product_payload(env, &text, "");
            if let Some(map) = body.as_object_mut() {
                map.remove("mesh_ref");
            }
            body
        }
    }
}

/// Returns a copy of `payload` with `entity.<field>` replaced or removed.
fn with_entity_field(payload: &Value, field: &str, value: Option<Value>) -> Value {
    let mut payload = payload.clone();
    if let Some(entity) = payload.get_mut("entity").and_then(Value::as_object_mut) {
        match value {
            Some(value) => {
                entity.insert(field.to_string(), value);
            }
            None => {
                entity.remove(field);
            }
        }
    }
    payload
}

// ============================================================================
// SECTION: Tests
// ============================================================================
