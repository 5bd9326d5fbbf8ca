// system-tests/tests/suites/probes.rs
// ============================================================================
// Module: Probe Tests
// Description: Negative-input probe battery over HTTP.
// Purpose: Confirm probe classification and cleanup against a strict API.
// Dependencies: system-tests helpers, mesh-procedures-fixtures
// ============================================================================

//! ## Overview
//! Runs the generated cases for every entity kind against the mock and checks
//! that each case lands on the status the mock enforces.

use mesh_procedures_core::EntityKind;
use mesh_procedures_core::ProbeOutcome;
use mesh_procedures_core::ProbeReport;
use mesh_procedures_core::StepStatus;
use mesh_procedures_fixtures::FixtureEnv;
use mesh_procedures_fixtures::probe_cases;

use crate::helpers::artifacts::TestReporter;
use crate::helpers::mesh_mock::MeshMockOptions;
use crate::helpers::mesh_mock::spawn_default_mock;
use crate::helpers::mesh_mock::spawn_mesh_mock;
use crate::helpers::runner::run_probe_cases;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn outcome<'r>(report: &'r ProbeReport, name: &str) -> Result<&'r ProbeOutcome, String> {
    report
        .outcomes
        .iter()
        .find(|outcome| outcome.case.name == name)
        .ok_or_else(|| format!("probe {name} missing"))
}

#[test]
fn full_battery_passes_and_leaves_no_entities() -> TestResult {
    let mut reporter = TestReporter::new("full_battery_passes_and_leaves_no_entities")?;
    let mock = spawn_default_mock()?;
    let cases = probe_cases(&FixtureEnv::default(), &EntityKind::ALL);

    let report = run_probe_cases(&mock, &cases)?;
    if !report.logged_in {
        return Err("probe login failed".into());
    }
    let counts = report.counts();
    if report.has_failures() || counts.total != cases.len() || counts.passed != cases.len() {
        let failed: Vec<String> = report
            .outcomes
            .iter()
            .filter(|outcome| outcome.status != StepStatus::Passed)
            .map(|outcome| format!("{}: {}", outcome.case.name, outcome.message))
            .collect();
        return Err(format!("probe failures: {failed:?}").into());
    }
    if mock.total_entities() != 0 {
        return Err(format!("{} probe entities were not cleaned up", mock.total_entities()).into());
    }

    let outcomes_path = reporter.artifacts().write_json("probe_outcomes.json", &report.outcomes)?;
    reporter.finish(
        "pass",
        vec![format!("{} probes passed", counts.passed)],
        vec![outcomes_path.display().to_string()],
    )?;
    Ok(())
}

#[test]
fn outcomes_record_statuses_and_cleanup() -> TestResult {
    let mock = spawn_default_mock()?;
    let cases = probe_cases(&FixtureEnv::default(), &[EntityKind::Mesh, EntityKind::Product]);
    let report = run_probe_cases(&mock, &cases)?;

    let valid = outcome(&report, "mesh/valid-payload")?;
    if valid.http_status != Some(201) || valid.created.is_none() || valid.cleanup_error.is_some() {
        return Err(format!("valid mesh probe: {}", valid.message).into());
    }
    for (name, status) in [
        ("mesh/missing-name", 422),
        ("mesh/empty-name", 422),
        ("mesh/invalid-entity-type", 422),
        ("mesh/without-authorization", 401),
        ("mesh/invalid-token", 401),
        ("mesh/malformed-json", 400),
        ("product/valid-payload", 422),
    ] {
        let probe = outcome(&report, name)?;
        if probe.http_status != Some(status) || probe.created.is_some() {
            return Err(format!("{name} returned {:?}", probe.http_status).into());
        }
    }

    let unaccounted = mock
        .requests()
        .into_iter()
        .filter(|request| request.method == "POST" && request.path == "/api/data/mesh")
        .filter(|request| request.account.is_none())
        .count();
    if unaccounted != 1 {
        return Err(format!("expected one request without x-account, got {unaccounted}").into());
    }
    Ok(())
}

#[test]
fn rejected_login_skips_every_probe() -> TestResult {
    let mock = spawn_mesh_mock(MeshMockOptions::default().rejecting_login())?;
    let cases = probe_cases(&FixtureEnv::default(), &[EntityKind::System]);
    let report = run_probe_cases(&mock, &cases)?;
    if report.logged_in || report.counts().skipped != cases.len() {
        return Err("probes must be skipped without a token".into());
    }
    if mock.requests().len() != 1 {
        return Err("only the login may reach the API".into());
    }
    Ok(())
}
