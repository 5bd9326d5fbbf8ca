// crates/mesh-procedures-fixtures/src/payloads.rs
// ============================================================================
// Module: Payload Builders
// Description: Request bodies for entity creation, wiring, and builders.
// Purpose: Produce the JSON documents the data mesh API accepts.
// Dependencies: crate::{env, naming}, mesh-procedures-core, serde_json
// ============================================================================

//! ## Overview
//! Every entity body shares an `entity` block (name, type, label,
//! description) and an `entity_info` block naming the owner. Product bodies
//! carry a `mesh_ref` that the create step swaps for the mesh identifier.
//! Builder bodies name their inputs through `input_refs`/`input_ref`/
//! `other_ref`, which are resolved against the run's id map when submitted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use mesh_procedures_core::EntityKind;
use serde_json::Value;
use serde_json::json;

use crate::env::FixtureEnv;
use crate::naming::entity_name;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Placeholder description for generic entities.
pub const LOREM_DESCRIPTION: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit, \
     sed do eiusmod tempor incididunt aliqua.";
/// Placeholder mesh purpose.
pub const LOREM_PURPOSE: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit";
/// Secret name holding the S3 access key.
pub const S3_ACCESS_SECRET_NAME: &str = "MY_S3_ACCESS";
/// Secret name holding the S3 secret key.
pub const S3_SECRET_SECRET_NAME: &str = "MY_S3_SECRET";
/// CSV file used by generic object configurations.
pub const DEFAULT_CSV_PATH: &str = "/samples/construction_demo/daily_reports.csv";

// ============================================================================
// SECTION: Entity Text
// ============================================================================

/// Display fields of an entity body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityText {
    /// Display name.
    pub name: String,
    /// Short label shown in the catalog.
    pub label: String,
    /// Free-form description.
    pub description: String,
}

impl EntityText {
    /// Creates display fields.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            description: description.into(),
        }
    }

    /// Placeholder fields for a kind, with a random name suffix.
    #[must_use]
    pub fn generic(kind: EntityKind, custom_name: Option<&str>) -> Self {
        Self::new(
            entity_name(name_prefix(kind), custom_name),
            default_label(kind),
            LOREM_DESCRIPTION,
        )
    }
}

/// Name prefix for generated names.
#[must_use]
pub const fn name_prefix(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Mesh => "Mesh",
        EntityKind::System => "System",
        EntityKind::Source => "Source",
        EntityKind::Object => "Object",
        EntityKind::Product => "Product",
    }
}

/// Catalog label used by generic bodies.
#[must_use]
pub const fn default_label(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Mesh => "MSH",
        EntityKind::System => "DSS",
        EntityKind::Source => "SCD",
        EntityKind::Object => "DR",
        EntityKind::Product => "EP",
    }
}

// ============================================================================
// SECTION: Entity Bodies
// ============================================================================

/// `entity_info` block with the configured owner.
fn entity_info(env: &FixtureEnv, contacts: &[String]) -> Value {
    json!({
        "owner": env.owner_email,
        "contact_ids": contacts,
        "links": [],
    })
}

/// Mesh body with the owner as sole assignee.
#[must_use]
pub fn mesh_payload(env: &FixtureEnv, text: &EntityText, purpose: &str) -> Value {
    json!({
        "entity": {
            "name": text.name,
            "entity_type": EntityKind::Mesh.api_label(),
            "label": text.label,
            "description": text.description,
            "purpose": purpose,
            "assignees": [{
                "email": env.owner_email,
                "full_name": env.owner_name,
                "role": "Owner",
            }],
            "security_policy": [],
        },
        "entity_info": entity_info(env, &[]),
    })
}

/// Data system body owned by the configured owner.
#[must_use]
pub fn system_payload(env: &FixtureEnv, text: &EntityText) -> Value {
    json!({
        "entity": {
            "name": text.name,
            "entity_type": EntityKind::System.api_label(),
            "label": text.label,
            "description": text.description,
            "owner_person": {
                "email": env.owner_email,
                "full_name": env.owner_name,
            },
        },
        "entity_info": entity_info(env, &[]),
    })
}

/// Source (origin) body.
#[must_use]
pub fn source_payload(env: &FixtureEnv, text: &EntityText) -> Value {
    json!({
        "entity": {
            "name": text.name,
            "entity_type": EntityKind::Source.api_label(),
            "label": text.label,
            "description": text.description,
        },
        "entity_info": entity_info(env, &[]),
    })
}

/// Object (resource) body listing the owner as contact.
#[must_use]
pub fn object_payload(env: &FixtureEnv, text: &EntityText) -> Value {
    json!({
        "entity": {
            "name": text.name,
            "entity_type": EntityKind::Object.api_label(),
            "label": text.label,
            "description": text.description,
        },
        "entity_info": entity_info(env, std::slice::from_ref(&env.owner_name)),
    })
}

/// Product body hosted by the mesh registered under `mesh_ref`.
#[must_use]
pub fn product_payload(env: &FixtureEnv, text: &EntityText, mesh_ref: &str) -> Value {
    json!({
        "entity": {
            "name": text.name,
            "entity_type": EntityKind::Product.api_label(),
            "label": text.label,
            "description": text.description,
        },
        "host_mesh_identifier": "",
        "mesh_ref": mesh_ref,
        "entity_info": entity_info(env, &[]),
    })
}

// ============================================================================
// SECTION: Source Wiring
// ============================================================================

/// S3 connection whose keys are read from the source's secrets.
#[must_use]
pub fn connection_payload(env: &FixtureEnv) -> Value {
    json!({
        "connection": {
            "connection_type": "s3",
            "url": env.s3_url,
            "access_key": {"env_key": S3_ACCESS_SECRET_NAME},
            "access_secret": {"env_key": S3_SECRET_SECRET_NAME},
        }
    })
}

/// Secrets referenced by [`connection_payload`].
#[must_use]
pub fn secret_payload(env: &FixtureEnv) -> Value {
    json!({
        S3_ACCESS_SECRET_NAME: env.s3_access_key,
        S3_SECRET_SECRET_NAME: env.s3_secret_key,
    })
}

/// CSV file configuration for an object.
#[must_use]
pub fn csv_object_config(path: &str) -> Value {
    json!({
        "configuration": {
            "resource_type": "csv",
            "path": path,
            "has_header": true,
            "delimiter": ",",
            "quote_char": null,
            "escape_char": null,
            "multi_line": null,
        }
    })
}

// ============================================================================
// SECTION: Product Schema
// ============================================================================

/// Column of a stored product schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaField {
    /// Column name.
    pub name: &'static str,
    /// SQL column type, e.g. `VARCHAR`.
    pub column_type: &'static str,
    /// Whether the column is part of the primary key.
    pub primary: bool,
}

impl SchemaField {
    /// Non-key column.
    #[must_use]
    pub const fn column(name: &'static str, column_type: &'static str) -> Self {
        Self {
            name,
            column_type,
            primary: false,
        }
    }

    /// Primary-key column.
    #[must_use]
    pub const fn key(name: &'static str, column_type: &'static str) -> Self {
        Self {
            name,
            column_type,
            primary: true,
        }
    }
}

/// Stored product schema body. Every field is classified `internal`.
#[must_use]
pub fn schema_payload(fields: &[SchemaField]) -> Value {
    let fields: Vec<Value> = fields
        .iter()
        .map(|field| {
            json!({
                "name": field.name,
                "description": null,
                "primary": field.primary,
                "optional": false,
                "data_type": {
                    "meta": {},
                    "column_type": field.column_type,
                },
                "classification": "internal",
                "sensitivity": null,
                "tags": [],
            })
        })
        .collect();
    json!({
        "details": {
            "product_type": "stored",
            "fields": fields,
        }
    })
}

/// Schema used by generic products.
#[must_use]
pub fn default_schema_payload() -> Value {
    schema_payload(&[
        SchemaField::key("report_id", "INTEGER"),
        SchemaField::column("contractor_id", "VARCHAR"),
        SchemaField::column("project", "VARCHAR"),
        SchemaField::column("report_date", "VARCHAR"),
        SchemaField::column("shift", "VARCHAR"),
    ])
}

// ============================================================================
// SECTION: Transformation Builder
// ============================================================================

/// Executor and driver resources of a builder job.
#[must_use]
pub fn builder_config(env: &FixtureEnv) -> Value {
    json!({
        "docker_tag": env.docker_tag,
        "executor_core_request": "800m",
        "executor_core_limit": "1500m",
        "executor_instances": 1,
        "min_executor_instances": 1,
        "max_executor_instances": 1,
        "executor_memory": "5120m",
        "driver_core_request": "0.3",
        "driver_core_limit": "800m",
        "driver_memory": "2048m",
    })
}

/// Builder body reading `input_refs` and writing the `final_output` frame.
#[must_use]
pub fn builder_payload(
    env: &FixtureEnv,
    input_refs: &[&str],
    transformations: &[Value],
    final_output: &str,
) -> Value {
    json!({
        "config": builder_config(env),
        "input_refs": input_refs,
        "transformations": transformations,
        "finalisers": {
            "input": final_output,
            "enable_quality": true,
            "write_config": {"mode": "overwrite"},
            "enable_profiling": true,
            "enable_classification": false,
        },
        "preview": false,
    })
}

/// `cast` reading a referenced input. `changes` pairs columns with types.
#[must_use]
pub fn cast_transform(input_ref: &str, output: &str, changes: &[(&str, &str)]) -> Value {
    let changes: Vec<Value> = changes
        .iter()
        .map(|(column, data_type)| json!({"column": column, "data_type": data_type, "kwargs": {}}))
        .collect();
    json!({
        "transform": "cast",
        "input_ref": input_ref,
        "output": output,
        "changes": changes,
    })
}

/// `select_columns` over an intermediate frame.
#[must_use]
pub fn select_columns_transform(input: &str, output: &str, columns: &[&str]) -> Value {
    json!({
        "transform": "select_columns",
        "input": input,
        "output": output,
        "columns": columns,
    })
}

/// Single-input builder that casts `report_id` and keeps the report columns.
#[must_use]
pub fn default_builder_payload(env: &FixtureEnv, input_ref: &str) -> Value {
    builder_payload(
        env,
        &[input_ref],
        &[
            cast_transform(input_ref, "casted_columns", &[("report_id", "integer")]),
            select_columns_transform("casted_columns", "select_all", &[
                "report_id",
                "contractor_id",
                "project",
                "report_date",
                "shift",
            ]),
        ],
        "select_all",
    )
}

// ============================================================================
// SECTION: Tests
// ============================================================================
