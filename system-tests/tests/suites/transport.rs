// system-tests/tests/suites/transport.rs
// ============================================================================
// Module: Transport Tests
// Description: Wire-level checks of the HTTP transport.
// Purpose: Verify headers, query encoding, redaction, and connection failures.
// Dependencies: system-tests helpers, mesh-procedures-fixtures
// ============================================================================

//! ## Overview
//! Inspects the requests the mock recorded to check what the HTTP transport
//! actually put on the wire.

use mesh_procedures_core::ExecutorSettings;
use mesh_procedures_core::HttpMethod;
use mesh_procedures_core::StepStatus;
use mesh_procedures_fixtures::FixtureEnv;
use mesh_procedures_fixtures::builtin_procedure;

use crate::helpers::mesh_mock::MOCK_ACCOUNT;
use crate::helpers::mesh_mock::MOCK_PASSWORD;
use crate::helpers::mesh_mock::MOCK_TOKEN;
use crate::helpers::mesh_mock::spawn_default_mock;
use crate::helpers::runner::run_procedure;
use crate::helpers::runner::run_procedure_at;

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[test]
fn requests_carry_auth_account_and_agent_headers() -> TestResult {
    let mock = spawn_default_mock()?;
    let procedure = builtin_procedure("product-lifecycle", &FixtureEnv::default())
        .ok_or("product-lifecycle builtin missing")?;
    let output = run_procedure(&mock, &procedure)?;
    if output.report.has_failures() {
        return Err(output.report.summary_text().into());
    }

    let requests = mock.requests();
    let bearer = format!("Bearer {MOCK_TOKEN}");
    for (index, request) in requests.iter().enumerate() {
        if request.account.as_deref() != Some(MOCK_ACCOUNT) {
            return Err(format!("{} is missing the account header", request.path).into());
        }
        if request.user_agent.as_deref() != Some("mesh-procedures-system-tests") {
            return Err(format!("{} has user agent {:?}", request.path, request.user_agent).into());
        }
        let expected_auth = if index == 0 { None } else { Some(bearer.as_str()) };
        if request.authorization.as_deref() != expected_auth {
            return Err(format!("{} has authorization {:?}", request.path, request.authorization)
                .into());
        }
        if request.content_type.as_deref() != Some("application/json") {
            return Err(format!("{} {} is not sent as JSON", request.method, request.path).into());
        }
    }
    Ok(())
}

#[test]
fn addressed_requests_use_identifier_query() -> TestResult {
    let mock = spawn_default_mock()?;
    let procedure = builtin_procedure("product-lifecycle", &FixtureEnv::default())
        .ok_or("product-lifecycle builtin missing")?;
    let output = run_procedure(&mock, &procedure)?;
    if output.report.has_failures() {
        return Err(output.report.summary_text().into());
    }

    let read = mock
        .requests()
        .into_iter()
        .find(|request| request.method == "GET" && request.path == "/api/data/product/")
        .ok_or("product read missing")?;
    let identifier = read.query.get("identifier").ok_or("identifier query missing")?;
    if !identifier.starts_with("product-") {
        return Err(format!("unexpected identifier {identifier}").into());
    }
    let call = output
        .calls
        .iter()
        .find(|call| call.method == HttpMethod::Get && call.path == "/api/data/product/")
        .ok_or("product read not recorded")?;
    let recorded = call.query.iter().any(|param| param.value == *identifier);
    if !recorded {
        return Err("recorded call must keep the query parameters".into());
    }
    Ok(())
}

#[test]
fn login_password_is_sent_but_never_recorded() -> TestResult {
    let mock = spawn_default_mock()?;
    let procedure = builtin_procedure("catalog-listing", &FixtureEnv::default())
        .ok_or("catalog-listing builtin missing")?;
    let output = run_procedure(&mock, &procedure)?;

    let wire = mock.requests().into_iter().next().ok_or("no requests")?;
    let sent = wire.body.as_ref().and_then(|body| body["password"].as_str().map(str::to_string));
    if sent.as_deref() != Some(MOCK_PASSWORD) {
        return Err("login must send the real password".into());
    }
    let login = output.calls.first().ok_or("no recorded calls")?;
    let payload = login.payload.as_ref().ok_or("login payload not recorded")?;
    if payload["password"] != "<redacted>" {
        return Err("recorded login payload must be redacted".into());
    }
    let transcript = serde_json::to_string(&output.calls)?;
    if transcript.contains(MOCK_PASSWORD) {
        return Err("password leaked into recorded calls".into());
    }
    Ok(())
}

#[test]
fn unreachable_server_fails_login_cleanly() -> TestResult {
    let base_url = {
        let mock = spawn_default_mock()?;
        mock.base_url().to_string()
    };
    let procedure = builtin_procedure("catalog-listing", &FixtureEnv::default())
        .ok_or("catalog-listing builtin missing")?;

    let output = run_procedure_at(&base_url, &procedure, ExecutorSettings::default())?;
    let login = output.report.results.first().ok_or("missing login result")?;
    let message = login.message.as_deref().unwrap_or_default();
    if login.status != StepStatus::Failed || !message.starts_with("login failed: ") {
        return Err(format!("unexpected login result: {message}").into());
    }
    if output.report.counts.skipped != 5 {
        return Err(output.report.summary_text().into());
    }
    Ok(())
}
