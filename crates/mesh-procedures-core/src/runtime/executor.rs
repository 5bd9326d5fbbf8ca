// crates/mesh-procedures-core/src/runtime/executor.rs
// ============================================================================
// Module: Procedure Executor
// Description: Sequential execution of procedures against one API session.
// Purpose: Log in, run each step through the registry, and build the report.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! A run logs in first and records the login as its own result. Steps then
//! run strictly in order against a shared [`IdMap`]. A missing token skips
//! every step. `fail_fast` skips the rest of the run after any failure and
//! `abort_on_compute_failure` does the same after a failed compute poll.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Instant;

use crate::core::id_map::IdMap;
use crate::core::procedure::Procedure;
use crate::core::procedure::StepDefinition;
use crate::core::report::RunReport;
use crate::core::report::StepResult;
use crate::core::report::StepStatus;
use crate::interfaces::ApiCallSink;
use crate::interfaces::Clock;
use crate::interfaces::MeshTransport;
use crate::interfaces::RunObserver;
use crate::runtime::poller::ComputeDefaults;
use crate::runtime::registry::StepRegistry;
use crate::runtime::session::ApiSession;
use crate::runtime::session::Credentials;
use crate::runtime::step::StepContext;
use crate::runtime::step::StepError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Label of the login result.
pub const LOGIN_LABEL: &str = "login";
/// Skip reason when login produced no token.
pub const NO_ACCESS_TOKEN: &str = "no access token";
/// Skip reason after the run stopped early.
pub const RUN_ABORTED: &str = "run aborted";

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Run-wide executor behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorSettings {
    /// Skip remaining steps after any failure.
    pub fail_fast: bool,
    /// Skip remaining steps after a compute poll fails.
    pub abort_on_compute_failure: bool,
    /// Compute polling defaults.
    pub compute: ComputeDefaults,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            fail_fast: false,
            abort_on_compute_failure: true,
            compute: ComputeDefaults::default(),
        }
    }
}

/// External collaborators for one run.
#[derive(Clone, Copy)]
pub struct RunEnvironment<'a> {
    /// Transport to the data mesh API.
    pub transport: &'a dyn MeshTransport,
    /// Login credentials.
    pub credentials: &'a Credentials,
    /// Clock for timestamps and polling waits.
    pub clock: &'a dyn Clock,
    /// Receives every API call.
    pub sink: &'a dyn ApiCallSink,
    /// Receives every result as it is recorded.
    pub observer: &'a dyn RunObserver,
}

// ============================================================================
// SECTION: Executor
// ============================================================================

/// Runs procedures through a step registry.
pub struct ProcedureExecutor {
    /// Step handlers.
    registry: StepRegistry,
    /// Run behavior.
    settings: ExecutorSettings,
}

impl ProcedureExecutor {
    /// Creates an executor.
    #[must_use]
    pub const fn new(registry: StepRegistry, settings: ExecutorSettings) -> Self {
        Self {
            registry,
            settings,
        }
    }

    /// Creates an executor with the built-in step types.
    #[must_use]
    pub fn with_builtin_steps(settings: ExecutorSettings) -> Self {
        Self::new(StepRegistry::builtin(), settings)
    }

    /// Returns the step registry.
    #[must_use]
    pub const fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    /// Returns the run settings.
    #[must_use]
    pub const fn settings(&self) -> &ExecutorSettings {
        &self.settings
    }

    /// Runs a procedure and returns its report.
    ///
    /// Step failures are recorded in the report rather than returned.
    #[must_use]
    pub fn run(&self, procedure: &Procedure, env: RunEnvironment<'_>) -> RunReport {
        let started_at_ms = env.clock.now_unix_millis();
        let mut session = ApiSession::new(env.transport, env.sink);
        let mut id_map = IdMap::new();
        let mut results = Vec::with_capacity(procedure.steps.len() + 1);

        let login = Self::login(&mut session, env.credentials);
        let mut halted = (login.status != StepStatus::Passed).then_some(NO_ACCESS_TOKEN);
        record(&mut results, env.observer, login);

        for (index, step) in procedure.steps.iter().enumerate() {
            if let Some(reason) = halted {
                record(&mut results, env.observer, skipped(index, step, reason));
                continue;
            }
            let (result, error) = self.run_step(index, step, &mut session, &mut id_map, env.clock);
            if let Some(error) = error {
                if self.settings.fail_fast
                    || (self.settings.abort_on_compute_failure && error.is_compute_failure())
                {
                    halted = Some(RUN_ABORTED);
                }
            }
            record(&mut results, env.observer, result);
        }

        RunReport::new(
            procedure.display_name(),
            started_at_ms,
            env.clock.now_unix_millis(),
            results,
            id_map,
        )
    }

    /// Logs in and describes the outcome.
    fn login(session: &mut ApiSession<'_>, credentials: &Credentials) -> StepResult {
        let started = Instant::now();
        let (status, message) = match session.login(credentials) {
            Ok(Some(_)) => (StepStatus::Passed, None),
            Ok(None) => {
                (StepStatus::Failed, Some("login failed: no access token returned".to_string()))
            }
            Err(err) => (StepStatus::Failed, Some(format!("login failed: {err}"))),
        };
        let api_call = match status {
            StepStatus::Failed => session.last_call().cloned(),
            StepStatus::Passed | StepStatus::Skipped => None,
        };
        StepResult {
            index: None,
            label: LOGIN_LABEL.to_string(),
            step_type: LOGIN_LABEL.to_string(),
            status,
            message,
            duration_ms: elapsed_ms(started),
            api_call,
        }
    }

    /// Runs one step, returning its result and the error when it failed.
    fn run_step(
        &self,
        index: usize,
        step: &StepDefinition,
        session: &mut ApiSession<'_>,
        id_map: &mut IdMap,
        clock: &dyn Clock,
    ) -> (StepResult, Option<StepError>) {
        let started = Instant::now();
        let calls_before = session.call_count();
        let outcome = match self.registry.resolve(&step.step_type) {
            Ok(handler) => {
                let mut ctx = StepContext {
                    session: &mut *session,
                    id_map,
                    clock,
                    compute: &self.settings.compute,
                };
                handler.execute(step, &mut ctx)
            }
            Err(err) => Err(err),
        };
        let duration_ms = elapsed_ms(started);
        let mut result = StepResult {
            index: Some(index),
            label: step.label(index),
            step_type: step.step_type.clone(),
            status: StepStatus::Passed,
            message: None,
            duration_ms,
            api_call: None,
        };
        match outcome {
            Ok(outcome) => {
                result.message = outcome.message;
                (result, None)
            }
            Err(err) => {
                result.status = StepStatus::Failed;
                result.message = Some(err.to_string());
                if session.call_count() > calls_before {
                    result.api_call = session.last_call().cloned();
                }
                (result, Some(err))
            }
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds a skipped result.
fn skipped(index: usize, step: &StepDefinition, reason: &str) -> StepResult {
    StepResult {
        index: Some(index),
        label: step.label(index),
        step_type: step.step_type.clone(),
        status: StepStatus::Skipped,
        message: Some(reason.to_string()),
        duration_ms: 0,
        api_call: None,
    }
}

/// Appends a result and notifies the observer.
fn record(results: &mut Vec<StepResult>, observer: &dyn RunObserver, result: StepResult) {
    observer.step_finished(&result);
    results.push(result);
}

/// Milliseconds since `started`, saturating.
fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
