// system-tests/tests/suites/pipelines.rs
// ============================================================================
// Module: Pipeline Tests
// Description: Full builtin and landscape procedures over HTTP.
// Purpose: Prove entity wiring, builder resolution, and compute polling end to end.
// Dependencies: system-tests helpers, mesh-procedures-fixtures
// ============================================================================

//! Pipeline system tests.

use std::time::Duration;

use axum::http::Method;
use mesh_procedures_core::Endpoint;
use mesh_procedures_core::EntityKind;
use mesh_procedures_core::LinkKind;
use mesh_procedures_core::StepStatus;
use mesh_procedures_fixtures::FixtureEnv;
use mesh_procedures_fixtures::Landscape;
use mesh_procedures_fixtures::builtin_procedure;

use crate::helpers::artifacts::TestReporter;
use crate::helpers::mesh_mock::MeshMockHandle;
use crate::helpers::mesh_mock::MeshMockOptions;
use crate::helpers::mesh_mock::spawn_default_mock;
use crate::helpers::mesh_mock::spawn_mesh_mock;
use crate::helpers::runner::run_procedure;

type TestResult = Result<(), Box<dyn std::error::Error>>;

const CONSTRUCTION: &str = r"
name: construction
mesh:
  - id: mesh-1
    name: Construction
systems:
  - id: sys-1
sources:
  - id: src-1
    system: sys-1
objects:
  - id: reports
    source: src-1
  - id: excavation
    source: src-1
products:
  - id: progress
    mesh: mesh-1
    input: [daily, excavation]
  - id: daily
    mesh: mesh-1
    input: [reports]
";

fn links_of(mock: &MeshMockHandle, kind: LinkKind) -> usize {
    mock.links().iter().filter(|link| link.kind == kind).count()
}

fn configured_at(mock: &MeshMockHandle, endpoint: Endpoint) -> usize {
    let path = endpoint.addressed_path();
    mock.configured().iter().filter(|config| config.path == path).count()
}

#[test]
fn velora_pipeline_builds_the_full_graph() -> TestResult {
    let mut reporter = TestReporter::new("velora_pipeline_builds_the_full_graph")?;
    let mock = spawn_default_mock()?;
    let procedure = builtin_procedure("velora-pipeline", &FixtureEnv::default())
        .ok_or("velora-pipeline builtin missing")?;

    let output = run_procedure(&mock, &procedure)?;
    let report = &output.report;
    if report.has_failures() || report.results.len() != 38 {
        return Err(format!("unexpected run: {}", report.summary_text()).into());
    }
    if mock.total_entities() != 8 || mock.entity_count(EntityKind::Product) != 3 {
        return Err(format!("expected 8 entities, found {}", mock.total_entities()).into());
    }
    let link_counts = [
        links_of(&mock, LinkKind::SystemToSource),
        links_of(&mock, LinkKind::ObjectToSource),
        links_of(&mock, LinkKind::ProductToObject),
        links_of(&mock, LinkKind::ProductToProduct),
    ];
    if link_counts != [1, 2, 2, 2] {
        return Err(format!("unexpected link counts {link_counts:?}").into());
    }
    if mock.configured().len() != 10
        || configured_at(&mock, Endpoint::TransformationBuilder) != 3
        || configured_at(&mock, Endpoint::ProductSchema) != 3
    {
        return Err(format!("expected 10 configuration calls, got {}", mock.configured().len())
            .into());
    }

    // Every compute job completes on its first read after the initial wait.
    if output.sleeps != vec![Duration::from_secs(20); 6] || mock.compute_polls() != 6 {
        return Err(format!("unexpected polling waits {:?}", output.sleeps).into());
    }
    if report.finished_at_ms - report.started_at_ms != 120_000 {
        return Err("run duration must follow the recorded waits".into());
    }

    let hosted = mock
        .requests()
        .into_iter()
        .filter(|request| request.method == "POST" && request.path == "/api/data/product")
        .filter_map(|request| request.body)
        .filter_map(|body| body["host_mesh_identifier"].as_str().map(ToString::to_string))
        .collect::<Vec<_>>();
    if hosted.len() != 3 || hosted.iter().any(|host| !host.starts_with("mesh-")) {
        return Err(format!("products must be hosted by the created mesh: {hosted:?}").into());
    }

    let report_path = reporter.artifacts().write_json("run_report.json", report)?;
    reporter.finish(
        "pass",
        vec![report.summary_text()],
        vec![report_path.display().to_string()],
    )?;
    Ok(())
}

#[test]
fn progress_builder_reads_both_upstream_products() -> TestResult {
    let mock = spawn_default_mock()?;
    let procedure = builtin_procedure("velora-pipeline", &FixtureEnv::default())
        .ok_or("velora-pipeline builtin missing")?;
    let output = run_procedure(&mock, &procedure)?;
    if output.report.has_failures() {
        return Err(output.report.summary_text().into());
    }

    let builder_path = Endpoint::TransformationBuilder.addressed_path();
    let builders: Vec<_> =
        mock.configured().into_iter().filter(|config| config.path == builder_path).collect();
    let progress = builders.last().ok_or("no builder submitted")?;
    let inputs = progress.body["inputs"].as_array().ok_or("builder inputs missing")?;
    if inputs.len() != 2 || inputs.iter().any(|input| input["input_type"] != "product") {
        return Err(format!("progress builder inputs: {inputs:?}").into());
    }
    let text = progress.body.to_string();
    if text.contains("input_refs") || text.contains("sadp-1") || text.contains("sadp-2") {
        return Err("step references must be rewritten before sending".into());
    }
    Ok(())
}

#[test]
fn product_lifecycle_cleans_up_after_itself() -> TestResult {
    let mock = spawn_default_mock()?;
    let procedure = builtin_procedure("product-lifecycle", &FixtureEnv::default())
        .ok_or("product-lifecycle builtin missing")?;

    let output = run_procedure(&mock, &procedure)?;
    if output.report.has_failures() || output.report.counts.passed != 8 {
        return Err(output.report.summary_text().into());
    }
    if mock.entity_count(EntityKind::Product) != 0 || mock.entity_count(EntityKind::Mesh) != 0 {
        return Err("product and mesh must be deleted".into());
    }
    if mock.entity_count(EntityKind::System) != 1 {
        return Err("the system is never deleted".into());
    }
    let deletes =
        mock.requests().into_iter().filter(|request| request.method == "DELETE").count();
    if deletes != 2 {
        return Err(format!("expected 2 deletes, got {deletes}").into());
    }
    Ok(())
}

#[test]
fn landscape_expansion_runs_over_http() -> TestResult {
    let mock = spawn_default_mock()?;
    let landscape = Landscape::from_yaml_str(CONSTRUCTION)?;
    let procedure = landscape.to_procedure(&FixtureEnv::default())?;

    let output = run_procedure(&mock, &procedure)?;
    if output.report.has_failures() || output.report.results.len() != 20 {
        return Err(output.report.summary_text().into());
    }
    if mock.total_entities() != 7 || mock.links().len() != 6 || mock.configured().len() != 6 {
        return Err(format!(
            "unexpected graph: {} entities, {} links, {} configs",
            mock.total_entities(),
            mock.links().len(),
            mock.configured().len()
        )
        .into());
    }
    if links_of(&mock, LinkKind::ProductToProduct) != 1 || !output.sleeps.is_empty() {
        return Err("one product link and no compute waits expected".into());
    }
    Ok(())
}

#[test]
fn failed_compute_aborts_the_rest_of_the_run() -> TestResult {
    let mock = spawn_mesh_mock(MeshMockOptions::default().with_compute_script(&["FAILED"]))?;
    let procedure = builtin_procedure("velora-pipeline", &FixtureEnv::default())
        .ok_or("velora-pipeline builtin missing")?;

    let output = run_procedure(&mock, &procedure)?;
    let counts = output.report.counts;
    if counts.passed != 8 || counts.failed != 1 || counts.skipped != 29 {
        return Err(output.report.summary_text().into());
    }
    let failed = output
        .report
        .failures()
        .next()
        .ok_or("missing failed result")?;
    if failed.step_type != "check_status_compute" {
        return Err(format!("unexpected failure {}", failed.label).into());
    }
    let aborted = output.report.results.iter().filter(|result| {
        result.status == StepStatus::Skipped && result.message.as_deref() == Some("run aborted")
    });
    if aborted.count() != 29 || mock.compute_polls() != 1 {
        return Err("steps after a failed compute job must be skipped".into());
    }
    Ok(())
}

#[test]
fn server_errors_fail_only_the_affected_steps() -> TestResult {
    let options = MeshMockOptions::default().failing(Method::POST, "/api/data/product", 500);
    let mock = spawn_mesh_mock(options)?;
    let procedure = builtin_procedure("product-lifecycle", &FixtureEnv::default())
        .ok_or("product-lifecycle builtin missing")?;

    let output = run_procedure(&mock, &procedure)?;
    let create = output
        .report
        .results
        .iter()
        .find(|result| result.step_type == "create_product")
        .ok_or("missing create_product result")?;
    let status = create.api_call.as_ref().and_then(|call| call.status);
    if create.status != StepStatus::Failed || status != Some(500) {
        return Err(format!("create_product should fail with 500, got {status:?}").into());
    }
    // The read and delete reference the product that was never created.
    if output.report.counts.failed != 3 || output.report.counts.skipped != 0 {
        return Err(output.report.summary_text().into());
    }
    if mock.entity_count(EntityKind::Mesh) != 0 {
        return Err("later independent steps still run".into());
    }
    Ok(())
}
