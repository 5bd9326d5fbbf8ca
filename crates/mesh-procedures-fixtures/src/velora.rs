// crates/mesh-procedures-fixtures/src/velora.rs
// ============================================================================
// Module: Construction Demo Dataset
// Description: Entities, schemas, and builders of the construction demo.
// Purpose: Assemble the full mesh graph used by the velora pipeline.
// Dependencies: crate::{env, naming, payloads}, mesh-procedures-core, serde_json
// ============================================================================

//! ## Overview
//! The demo models a construction project: contractors file daily reports
//! and excavation measurements as CSV files in S3. Two source-aligned
//! products clean each file and a consumer-aligned product joins them into
//! excavation progress metrics. [`velora_pipeline`] creates the whole graph
//! and waits for every compute job along the way.

// ============================================================================
// SECTION: Imports
// ============================================================================

use mesh_procedures_core::Procedure;
use mesh_procedures_core::StepDefinition;
use serde_json::Value;
use serde_json::json;

use crate::env::FixtureEnv;
use crate::naming::DEFAULT_ID_LEN;
use crate::naming::make_id;
use crate::payloads::EntityText;
use crate::payloads::SchemaField;
use crate::payloads::builder_payload;
use crate::payloads::cast_transform;
use crate::payloads::connection_payload;
use crate::payloads::csv_object_config;
use crate::payloads::mesh_payload;
use crate::payloads::object_payload;
use crate::payloads::product_payload;
use crate::payloads::schema_payload;
use crate::payloads::secret_payload;
use crate::payloads::select_columns_transform;
use crate::payloads::source_payload;
use crate::payloads::system_payload;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Built-in procedure name.
pub const PIPELINE_NAME: &str = "velora-pipeline";
/// Compute status attempts per check.
pub const POLL_MAX_RETRIES: u32 = 10;
/// Seconds between compute status attempts.
pub const POLL_INTERVAL_SECS: u64 = 20;

/// Mesh reference.
pub const MESH_REF: &str = "mesh-1";
/// Data system reference.
pub const SYSTEM_REF: &str = "system-1";
/// S3 source reference.
pub const SOURCE_REF: &str = "source-1";
/// Daily reports object reference.
pub const DAILY_REPORTS_OBJECT_REF: &str = "object-1";
/// Excavation object reference.
pub const EXCAVATION_OBJECT_REF: &str = "object-2";
/// Daily reports product reference.
pub const DAILY_REPORTS_PRODUCT_REF: &str = "sadp-1";
/// Excavation product reference.
pub const EXCAVATION_PRODUCT_REF: &str = "sadp-2";
/// Excavation progress product reference.
pub const PROGRESS_PRODUCT_REF: &str = "cadp";

/// Daily reports CSV file.
const DAILY_REPORTS_CSV: &str = "/samples/construction_demo/daily_reports.csv";
/// Excavation CSV file.
const EXCAVATION_CSV: &str = "/samples/construction_demo/excavation.csv";

/// Description shared by the daily reports object and product.
const DAILY_REPORTS_DESCRIPTION: &str = "Daily reports submitted by contractors. Each record \
     has a unique report_id and is tied to a contractor_id and a report_date.";
/// Description shared by the excavation object and product.
const EXCAVATION_DESCRIPTION: &str = "Excavation volumes per daily report: planned_quantity, \
     daily_quantity, cumulative_quantity, and any adjustments_delta corrections.";

// ============================================================================
// SECTION: Entities
// ============================================================================

/// Randomised display name for a demo entity.
fn demo_name(prefix: &str) -> String {
    format!("{prefix} {}", make_id(DEFAULT_ID_LEN))
}

/// Construction project mesh.
#[must_use]
pub fn mesh(env: &FixtureEnv) -> Value {
    let text = EntityText::new(
        demo_name("Mesh"),
        "MSH",
        "Construction project data mesh with synthetic demo data",
    );
    mesh_payload(env, &text, "Demo and testing of construction data workflows and analytics")
}

/// Field management system the reports come from.
#[must_use]
pub fn system(env: &FixtureEnv) -> Value {
    let text = EntityText::new(
        demo_name("System"),
        "DSS",
        "Construction management platform capturing daily field activity, crew attendance, \
         and material usage.",
    );
    system_payload(env, &text)
}

/// S3 drop of mobile field logs.
#[must_use]
pub fn source(env: &FixtureEnv) -> Value {
    let text = EntityText::new(
        demo_name("Source"),
        "SCD",
        "Mobile app logs of daily field activity, work progress, and on-site operations.",
    );
    source_payload(env, &text)
}

/// Daily reports object.
#[must_use]
pub fn daily_reports_object(env: &FixtureEnv) -> Value {
    let text = EntityText::new(demo_name("Daily reports"), "DR", DAILY_REPORTS_DESCRIPTION);
    object_payload(env, &text)
}

/// Excavation object.
#[must_use]
pub fn excavation_object(env: &FixtureEnv) -> Value {
    let text = EntityText::new(demo_name("Excavation"), "ECV", EXCAVATION_DESCRIPTION);
    object_payload(env, &text)
}

/// Daily reports product hosted by the demo mesh.
#[must_use]
pub fn daily_reports_product(env: &FixtureEnv) -> Value {
    let text = EntityText::new(demo_name("Daily Reports"), "DR", DAILY_REPORTS_DESCRIPTION);
    product_payload(env, &text, MESH_REF)
}

/// Excavation product hosted by the demo mesh.
#[must_use]
pub fn excavation_product(env: &FixtureEnv) -> Value {
    let text = EntityText::new(demo_name("Excavation"), "ECV", EXCAVATION_DESCRIPTION);
    product_payload(env, &text, MESH_REF)
}

/// Excavation progress product hosted by the demo mesh.
#[must_use]
pub fn excavation_progress_product(env: &FixtureEnv) -> Value {
    let text = EntityText::new(
        demo_name("Excavation progress"),
        "EP",
        "Daily and planned excavation volumes, variances, and cumulative progress for \
         tracking excavation efficiency.",
    );
    product_payload(env, &text, MESH_REF)
}

// ============================================================================
// SECTION: Schemas
// ============================================================================

/// Daily reports product columns.
#[must_use]
pub fn daily_reports_schema() -> Value {
    schema_payload(&[
        SchemaField::key("report_id", "INTEGER"),
        SchemaField::column("contractor_id", "VARCHAR"),
        SchemaField::column("project", "VARCHAR"),
        SchemaField::column("report_date", "VARCHAR"),
        SchemaField::column("shift", "VARCHAR"),
    ])
}

/// Excavation product columns.
#[must_use]
pub fn excavation_schema() -> Value {
    schema_payload(&[
        SchemaField::key("excavation_id", "INTEGER"),
        SchemaField::column("report_id", "INTEGER"),
        SchemaField::column("planned_quantity", "DOUBLE"),
        SchemaField::column("daily_quantity", "DOUBLE"),
        SchemaField::column("cumulative_quantity", "DOUBLE"),
        SchemaField::column("adjustments_delta", "DOUBLE"),
    ])
}

/// Excavation progress product columns.
#[must_use]
pub fn excavation_progress_schema() -> Value {
    schema_payload(&[
        SchemaField::column("contractor_id", "VARCHAR"),
        SchemaField::column("project", "VARCHAR"),
        SchemaField::column("date", "DATE"),
        SchemaField::column("shift", "VARCHAR"),
        SchemaField::column("daily_excavation_volume", "DOUBLE"),
        SchemaField::column("planned_excavation", "DOUBLE"),
        SchemaField::column("excavation_variance", "DOUBLE"),
        SchemaField::column("cumulative_excavation_progress", "DOUBLE"),
        SchemaField::column("schedule_adherence", "DOUBLE"),
    ])
}

// ============================================================================
// SECTION: Builders
// ============================================================================

/// Casts `report_id` and keeps the report columns.
#[must_use]
pub fn daily_reports_builder(env: &FixtureEnv) -> Value {
    builder_payload(
        env,
        &[DAILY_REPORTS_OBJECT_REF],
        &[
            cast_transform(DAILY_REPORTS_OBJECT_REF, "casted_columns", &[(
                "report_id",
                "integer",
            )]),
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

/// Casts the excavation identifiers and quantities.
#[must_use]
pub fn excavation_builder(env: &FixtureEnv) -> Value {
    let columns = [
        ("excavation_id", "integer"),
        ("report_id", "integer"),
        ("planned_quantity", "double"),
        ("daily_quantity", "double"),
        ("cumulative_quantity", "double"),
        ("adjustments_delta", "double"),
    ];
    let names: Vec<&str> = columns.iter().map(|(column, _)| *column).collect();
    builder_payload(
        env,
        &[EXCAVATION_OBJECT_REF],
        &[
            cast_transform(EXCAVATION_OBJECT_REF, "casted_columns", &columns),
            select_columns_transform("casted_columns", "select_all", &names),
        ],
        "select_all",
    )
}

/// Joins both source-aligned products on `report_id` and derives progress
/// metrics.
#[must_use]
pub fn excavation_progress_builder(env: &FixtureEnv) -> Value {
    let join = json!({
        "transform": "join_rename_select",
        "input_ref": DAILY_REPORTS_PRODUCT_REF,
        "other_ref": EXCAVATION_PRODUCT_REF,
        "output": "joined_data",
        "join": "inner",
        "conditions": [{"left": "report_id", "operator": "eq", "right": "report_id"}],
        "select_columns": [
            "contractor_id",
            "project",
            "report_date",
            "planned_quantity",
            "daily_quantity",
            "cumulative_quantity",
            "shift",
        ],
        "select_all_columns": false,
        "rename_columns": {
            "left_contractor_id": "contractor_id",
            "left_project": "project",
            "left_report_date": "report_date",
            "right_planned_quantity": "planned_quantity",
            "right_daily_quantity": "daily_quantity",
            "right_cumulative_quantity": "cumulative_quantity",
            "left_shift": "shift",
        },
    });
    let metrics = json!({
        "transform": "select_expression",
        "input": "joined_data",
        "output": "final_output",
        "expressions": [
            "contractor_id",
            "project",
            "to_date(report_date) as date",
            "shift",
            "daily_quantity as daily_excavation_volume",
            "planned_quantity as planned_excavation",
            "daily_quantity - planned_quantity as excavation_variance",
            "cumulative_quantity as cumulative_excavation_progress",
            "CAST(daily_quantity/planned_quantity*100 as DOUBLE) as schedule_adherence",
        ],
    });
    builder_payload(
        env,
        &[DAILY_REPORTS_PRODUCT_REF, EXCAVATION_PRODUCT_REF],
        &[join, metrics],
        "final_output",
    )
}

// ============================================================================
// SECTION: Procedure
// ============================================================================

/// Compute status check with the pipeline's polling budget.
fn compute_check(reference: &str) -> StepDefinition {
    StepDefinition::new("check_status_compute")
        .with_ref(reference)
        .with_polling(POLL_MAX_RETRIES, POLL_INTERVAL_SECS)
}

/// Object creation, wiring, configuration, and compute wait.
fn object_steps(reference: &str, payload: Value, csv_path: &str) -> Vec<StepDefinition> {
    vec![
        StepDefinition::new("create_object").with_id(reference).with_input(payload),
        StepDefinition::new("link_object_to_source")
            .with_input(json!({"source_ref": SOURCE_REF, "object_ref": reference})),
        StepDefinition::new("configure_object_details")
            .with_ref(reference)
            .with_input(csv_object_config(csv_path)),
        StepDefinition::new("get_object_by_id").with_input(json!({"object_ref": reference})),
        compute_check(reference),
    ]
}

/// Product schema, builder submission, read-back, and compute wait.
fn product_build_steps(reference: &str, schema: Value, builder: Value) -> Vec<StepDefinition> {
    vec![
        StepDefinition::new("define_product_schema").with_ref(reference).with_input(schema),
        StepDefinition::new("apply_product_transformation")
            .with_input(json!({"product_ref": reference, "transformations": builder})),
        StepDefinition::new("get_product_by_id").with_input(json!({"product_ref": reference})),
        compute_check(reference),
    ]
}

/// Full construction demo: mesh, system, S3 source, two objects, two
/// source-aligned products, and the joined progress product.
#[must_use]
pub fn velora_pipeline(env: &FixtureEnv) -> Procedure {
    let mut steps = vec![
        StepDefinition::new("create_mesh").with_id(MESH_REF).with_input(mesh(env)),
        StepDefinition::new("create_system").with_id(SYSTEM_REF).with_input(system(env)),
        StepDefinition::new("create_source").with_id(SOURCE_REF).with_input(source(env)),
        StepDefinition::new("link_system_to_source")
            .with_input(json!({"system_ref": SYSTEM_REF, "source_ref": SOURCE_REF})),
        StepDefinition::new("configure_source")
            .with_ref(SOURCE_REF)
            .with_input(connection_payload(env)),
        StepDefinition::new("set_source_secret")
            .with_ref(SOURCE_REF)
            .with_input(secret_payload(env)),
        StepDefinition::new("get_source_by_id").with_input(json!({"source_ref": SOURCE_REF})),
        compute_check(SOURCE_REF),
    ];
    steps.extend(object_steps(
        DAILY_REPORTS_OBJECT_REF,
        daily_reports_object(env),
        DAILY_REPORTS_CSV,
    ));
    steps.extend(object_steps(EXCAVATION_OBJECT_REF, excavation_object(env), EXCAVATION_CSV));

    for (product, object, payload, schema, builder) in [
        (
            DAILY_REPORTS_PRODUCT_REF,
            DAILY_REPORTS_OBJECT_REF,
            daily_reports_product(env),
            daily_reports_schema(),
            daily_reports_builder(env),
        ),
        (
            EXCAVATION_PRODUCT_REF,
            EXCAVATION_OBJECT_REF,
            excavation_product(env),
            excavation_schema(),
            excavation_builder(env),
        ),
    ] {
        steps.push(StepDefinition::new("create_product").with_id(product).with_input(payload));
        steps.push(
            StepDefinition::new("link_product_to_object")
                .with_input(json!({"object_ref": object, "product_ref": product})),
        );
        steps.extend(product_build_steps(product, schema, builder));
    }

    steps.push(
        StepDefinition::new("create_product")
            .with_id(PROGRESS_PRODUCT_REF)
            .with_input(excavation_progress_product(env)),
    );
    for upstream in [DAILY_REPORTS_PRODUCT_REF, EXCAVATION_PRODUCT_REF] {
        steps.push(StepDefinition::new("link_product_to_product").with_input(json!({
            "product_ref": upstream,
            "product_child_ref": PROGRESS_PRODUCT_REF,
        })));
    }
    steps.extend(product_build_steps(
        PROGRESS_PRODUCT_REF,
        excavation_progress_schema(),
        excavation_progress_builder(env),
    ));

    let mut procedure = Procedure::new(PIPELINE_NAME, steps);
    procedure.description =
        Some("Construction demo graph with compute waits after every build".to_string());
    procedure
}

// ============================================================================
// SECTION: Tests
// ============================================================================
