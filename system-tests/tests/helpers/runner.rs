// system-tests/tests/helpers/runner.rs
// ============================================================================
// Module: Procedure Runner
// Description: Runs procedures and probes over HTTP against the mesh mock.
// Purpose: Share transport, credential, and clock wiring across suites.
// Dependencies: mesh-procedures-api, mesh-procedures-core, helpers
// ============================================================================

//! ## Overview
//! Builds the real [`HttpTransport`] for a mock instance and runs procedures
//! with an [`InstantClock`] so compute polling waits are recorded rather than
//! slept.

use std::sync::Mutex;
use std::time::Duration;

use mesh_procedures_api::HttpTransport;
use mesh_procedures_api::HttpTransportConfig;
use mesh_procedures_core::ApiCallRecord;
use mesh_procedures_core::Clock;
use mesh_procedures_core::Credentials;
use mesh_procedures_core::ExecutorSettings;
use mesh_procedures_core::MemoryCallSink;
use mesh_procedures_core::MeshTransport;
use mesh_procedures_core::NoopRunObserver;
use mesh_procedures_core::ProbeCase;
use mesh_procedures_core::ProbeReport;
use mesh_procedures_core::Procedure;
use mesh_procedures_core::ProcedureExecutor;
use mesh_procedures_core::RunEnvironment;
use mesh_procedures_core::RunReport;
use mesh_procedures_core::run_probes;

use super::mesh_mock::MOCK_ACCOUNT;
use super::mesh_mock::MOCK_PASSWORD;
use super::mesh_mock::MeshMockHandle;
use super::timeouts::resolve_timeout;

/// Username sent by the runner.
pub const MOCK_USERNAME: &str = "qa@example.com";

/// Clock that records sleeps and advances instantly.
#[derive(Debug)]
pub struct InstantClock {
    now_ms: Mutex<i64>,
    sleeps: Mutex<Vec<Duration>>,
}

impl Default for InstantClock {
    fn default() -> Self {
        Self {
            now_ms: Mutex::new(1_700_000_000_000),
            sleeps: Mutex::new(Vec::new()),
        }
    }
}

impl InstantClock {
    /// Returns every requested sleep.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().map_or_else(|_| Vec::new(), |sleeps| sleeps.clone())
    }
}

impl Clock for InstantClock {
    fn now_unix_millis(&self) -> i64 {
        self.now_ms.lock().map_or(0, |now| *now)
    }

    fn sleep(&self, duration: Duration) {
        if let Ok(mut sleeps) = self.sleeps.lock() {
            sleeps.push(duration);
        }
        if let Ok(mut now) = self.now_ms.lock() {
            *now += i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
        }
    }
}

/// Everything one run produced.
pub struct RunOutput {
    /// Executor report.
    pub report: RunReport,
    /// Calls seen by the sink.
    pub calls: Vec<ApiCallRecord>,
    /// Waits requested by the poller.
    pub sleeps: Vec<Duration>,
}

/// Credentials the mock accepts.
pub fn mock_credentials() -> Credentials {
    Credentials::new(MOCK_USERNAME, MOCK_PASSWORD)
}

/// Builds an HTTP transport pointed at the mock.
pub fn transport_for(mock: &MeshMockHandle) -> Result<HttpTransport, String> {
    transport_at(mock.base_url())
}

/// Builds an HTTP transport for any base URL.
pub fn transport_at(base_url: &str) -> Result<HttpTransport, String> {
    let base_url = base_url.parse().map_err(|err| format!("base url {base_url}: {err}"))?;
    let mut config = HttpTransportConfig::new(base_url).with_account(MOCK_ACCOUNT);
    config.timeout = resolve_timeout(Duration::from_secs(10));
    config.user_agent = "mesh-procedures-system-tests".to_string();
    HttpTransport::new(config).map_err(|err| err.to_string())
}

/// Runs a procedure with default executor settings.
pub fn run_procedure(mock: &MeshMockHandle, procedure: &Procedure) -> Result<RunOutput, String> {
    run_procedure_with(mock, procedure, ExecutorSettings::default())
}

/// Runs a procedure with explicit executor settings.
pub fn run_procedure_with(
    mock: &MeshMockHandle,
    procedure: &Procedure,
    settings: ExecutorSettings,
) -> Result<RunOutput, String> {
    run_procedure_at(mock.base_url(), procedure, settings)
}

/// Runs a procedure against any base URL.
pub fn run_procedure_at(
    base_url: &str,
    procedure: &Procedure,
    settings: ExecutorSettings,
) -> Result<RunOutput, String> {
    let transport = transport_at(base_url)?;
    Ok(run_procedure_over(&transport, &mock_credentials(), procedure, settings))
}

/// Runs a procedure over a caller-built transport.
pub fn run_procedure_over(
    transport: &dyn MeshTransport,
    credentials: &Credentials,
    procedure: &Procedure,
    settings: ExecutorSettings,
) -> RunOutput {
    let clock = InstantClock::default();
    let sink = MemoryCallSink::new();
    let executor = ProcedureExecutor::with_builtin_steps(settings);
    let report = executor.run(procedure, RunEnvironment {
        transport,
        credentials,
        clock: &clock,
        sink: &sink,
        observer: &NoopRunObserver,
    });
    RunOutput {
        report,
        calls: sink.calls(),
        sleeps: clock.sleeps(),
    }
}

/// Runs probe cases against the mock.
pub fn run_probe_cases(mock: &MeshMockHandle, cases: &[ProbeCase]) -> Result<ProbeReport, String> {
    let transport = transport_for(mock)?;
    let sink = MemoryCallSink::new();
    Ok(run_probes(cases, &transport, &mock_credentials(), &sink))
}
