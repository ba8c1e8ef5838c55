// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health classification from queue failure counts.
//!
//! Computed on demand, never stored. The health surface must not error:
//! missing data renders as an unhealthy report, not an exception.

use fc_queue::QueueCounts;
use serde::Serialize;

/// Coarse health of the scheduling subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Failure rate over terminal executions: `failed / (completed + failed)`,
/// defined as 0 when nothing has finished yet.
pub fn failure_rate(completed: u64, failed: u64) -> f64 {
    let total = completed + failed;
    if total == 0 {
        0.0
    } else {
        failed as f64 / total as f64
    }
}

/// Classify a failure rate. Exactly 10% is still healthy; exactly 50% is
/// still degraded.
pub fn classify(failure_rate: f64) -> HealthState {
    if failure_rate <= 0.10 {
        HealthState::Healthy
    } else if failure_rate <= 0.50 {
        HealthState::Degraded
    } else {
        HealthState::Unhealthy
    }
}

/// Point-in-time health report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub state: HealthState,
    pub initialized: bool,
    pub failure_rate: f64,
    /// Flows flagged enabled in storage.
    pub scheduled_flows: usize,
    /// Queue statistics, absent when the queue could not be reached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue: Option<QueueCounts>,
}

impl HealthReport {
    /// Report for a manager that has not been initialized.
    pub fn uninitialized() -> Self {
        Self {
            state: HealthState::Unhealthy,
            initialized: false,
            failure_rate: 0.0,
            scheduled_flows: 0,
            queue: None,
        }
    }
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
