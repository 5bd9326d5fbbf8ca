// crates/mesh-procedures-core/src/runtime/poller.rs
// ============================================================================
// Module: Compute Poller
// Description: Bounded-retry polling of asynchronous compute jobs.
// Purpose: Wait for a compute job to reach COMPLETED within a fixed budget.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Polling sleeps an initial delay, then issues up to `max_retries` status
//! reads, sleeping `retry_interval` between them. `COMPLETED` ends the loop
//! successfully and `FAILED` ends it immediately with an error. Any other
//! state keeps polling until the budget is spent. No sleep follows the final
//! attempt.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use crate::core::compute::ComputeStatus;
use crate::core::identifiers::ComputeIdentifier;
use crate::core::procedure::StepDefinition;
use crate::interfaces::Clock;
use crate::runtime::session::ApiSession;
use crate::runtime::step::StepError;
use crate::runtime::step::ensure_success;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Attempts used when neither the step nor the configuration sets them.
pub const DEFAULT_MAX_RETRIES: u32 = 5;
/// Interval used when neither the step nor the configuration sets it.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(60);

// ============================================================================
// SECTION: Types
// ============================================================================

/// Run-wide compute polling defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComputeDefaults {
    /// Attempts per poll.
    pub max_retries: u32,
    /// Wait between attempts.
    pub retry_interval: Duration,
    /// Wait before the first attempt; `None` waits one retry interval.
    pub initial_delay: Option<Duration>,
}

impl Default for ComputeDefaults {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            initial_delay: None,
        }
    }
}

/// Resolved polling budget for one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Wait before the first attempt.
    pub initial_delay: Duration,
    /// Attempts, at least one.
    pub max_retries: u32,
    /// Wait between attempts.
    pub retry_interval: Duration,
}

impl PollPolicy {
    /// Resolves the policy for a step, with step fields taking precedence.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::InvalidInput`] when `max_retries` resolves to zero.
    pub fn for_step(step: &StepDefinition, defaults: &ComputeDefaults) -> Result<Self, StepError> {
        let max_retries = step.max_retries.unwrap_or(defaults.max_retries);
        if max_retries == 0 {
            return Err(StepError::InvalidInput("max_retries must be at least 1".to_string()));
        }
        let retry_interval =
            step.retry_interval.map_or(defaults.retry_interval, Duration::from_secs);
        let initial_delay = step
            .initial_delay
            .map(Duration::from_secs)
            .or(defaults.initial_delay)
            .unwrap_or(retry_interval);
        Ok(Self {
            initial_delay,
            max_retries,
            retry_interval,
        })
    }
}

/// Successful poll result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOutcome {
    /// Attempt that observed `COMPLETED`.
    pub attempts: u32,
}

// ============================================================================
// SECTION: Polling
// ============================================================================

/// Polls a compute job until it completes, fails, or the budget is spent.
///
/// # Errors
///
/// Returns [`StepError::ComputeFailed`] on `FAILED`,
/// [`StepError::ComputeNotCompleted`] when attempts run out, and request or
/// response errors from individual status reads.
pub fn poll_compute(
    session: &mut ApiSession<'_>,
    compute: &ComputeIdentifier,
    policy: &PollPolicy,
    clock: &dyn Clock,
) -> Result<PollOutcome, StepError> {
    clock.sleep(policy.initial_delay);
    let mut last_status = None;
    for attempt in 1..=policy.max_retries {
        let response = session.compute_status(compute)?;
        ensure_success(&response)?;
        let status =
            ComputeStatus::from_response(&response.body).map_err(StepError::InvalidResponse)?;
        match status {
            ComputeStatus::Completed => {
                return Ok(PollOutcome {
                    attempts: attempt,
                });
            }
            ComputeStatus::Failed => {
                return Err(StepError::ComputeFailed {
                    identifier: compute.clone(),
                    attempt,
                });
            }
            ComputeStatus::Scheduled
            | ComputeStatus::StartingUp
            | ComputeStatus::Running
            | ComputeStatus::Unscheduled => {}
        }
        last_status = Some(status);
        if attempt < policy.max_retries {
            clock.sleep(policy.retry_interval);
        }
    }
    Err(StepError::ComputeNotCompleted {
        identifier: compute.clone(),
        attempts: policy.max_retries,
        last_status,
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
