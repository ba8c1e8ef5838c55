// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory execution metrics.
//!
//! One [`ExecutionMetrics`] slot per flow, created lazily on the first
//! observed execution, plus a global slot updated in lockstep with every
//! per-flow update. Each execution is bracketed by `record_start` and exactly
//! one of `record_success` / `record_failure` / `record_skip`; an unmatched
//! start is a caller defect, not a state this collector defends against.

use crate::health::{classify, HealthState};
use fc_core::{Clock, FlowId};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Capacity of the rolling window of successful-execution durations.
const DURATION_WINDOW: usize = 100;

/// Counters and gauges for one scope (a flow, or the global aggregate).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionMetrics {
    pub total_executions: u64,
    pub successful_executions: u64,
    pub failed_executions: u64,
    pub active_jobs: u64,
    pub queued_jobs: u64,
    /// Arithmetic mean over the duration window; 0 until the first success.
    pub average_execution_time_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_execution_ms: Option<u64>,
}

impl ExecutionMetrics {
    /// `successful / total * 100`, defined as 0 when nothing has run.
    pub fn success_rate(&self) -> f64 {
        if self.total_executions == 0 {
            0.0
        } else {
            self.successful_executions as f64 / self.total_executions as f64 * 100.0
        }
    }
}

/// Proof that `record_start` ran, carrying the start timestamp. Must be
/// passed back to the matching completion call.
#[must_use]
#[derive(Debug)]
pub struct StartToken {
    flow_id: FlowId,
    started_ms: u64,
}

impl StartToken {
    pub fn flow_id(&self) -> &FlowId {
        &self.flow_id
    }

    pub fn started_ms(&self) -> u64 {
        self.started_ms
    }
}

#[derive(Default)]
struct Slot {
    metrics: ExecutionMetrics,
    window: VecDeque<u64>,
}

impl Slot {
    fn start(&mut self) {
        self.metrics.total_executions += 1;
        self.metrics.active_jobs += 1;
    }

    fn success(&mut self, duration_ms: u64, now_ms: u64) {
        self.metrics.active_jobs = self.metrics.active_jobs.saturating_sub(1);
        self.metrics.successful_executions += 1;
        self.metrics.last_execution_ms = Some(now_ms);
        if self.window.len() == DURATION_WINDOW {
            self.window.pop_front();
        }
        self.window.push_back(duration_ms);
        self.metrics.average_execution_time_ms =
            self.window.iter().sum::<u64>() as f64 / self.window.len() as f64;
    }

    fn failure(&mut self, now_ms: u64) {
        self.metrics.active_jobs = self.metrics.active_jobs.saturating_sub(1);
        self.metrics.failed_executions += 1;
        self.metrics.last_execution_ms = Some(now_ms);
    }

    // A skip releases the active gauge but is neither success nor failure;
    // the duration window and outcome counters stay untouched.
    fn skip(&mut self) {
        self.metrics.active_jobs = self.metrics.active_jobs.saturating_sub(1);
    }
}

#[derive(Default)]
struct State {
    flows: HashMap<FlowId, Slot>,
    global: Slot,
}

/// Concurrent metrics collector shared between workers and the manager.
///
/// Cloning shares the underlying state.
#[derive(Clone)]
pub struct MetricsCollector<C: Clock> {
    state: Arc<Mutex<State>>,
    clock: C,
}

impl<C: Clock> MetricsCollector<C> {
    pub fn new(clock: C) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            clock,
        }
    }

    /// Open an execution bracket for `flow_id`.
    pub fn record_start(&self, flow_id: &FlowId) -> StartToken {
        let mut state = self.state.lock();
        state.flows.entry(flow_id.clone()).or_default().start();
        state.global.start();
        StartToken {
            flow_id: flow_id.clone(),
            started_ms: self.clock.epoch_ms(),
        }
    }

    /// Close a bracket as a success, feeding the duration window.
    pub fn record_success(&self, token: StartToken) {
        let now_ms = self.clock.epoch_ms();
        let duration_ms = now_ms.saturating_sub(token.started_ms);
        let mut state = self.state.lock();
        state
            .flows
            .entry(token.flow_id.clone())
            .or_default()
            .success(duration_ms, now_ms);
        state.global.success(duration_ms, now_ms);
    }

    /// Close a bracket as a failure. The duration window is not touched.
    pub fn record_failure(&self, token: StartToken, error: &str) {
        let now_ms = self.clock.epoch_ms();
        tracing::warn!(flow = %token.flow_id, error, "flow execution failed");
        let mut state = self.state.lock();
        state
            .flows
            .entry(token.flow_id.clone())
            .or_default()
            .failure(now_ms);
        state.global.failure(now_ms);
    }

    /// Close a bracket for a trigger that was skipped without dispatching.
    pub fn record_skip(&self, token: StartToken) {
        let mut state = self.state.lock();
        state
            .flows
            .entry(token.flow_id.clone())
            .or_default()
            .skip();
        state.global.skip();
    }

    /// Snapshot the queued-jobs gauge from a queue counts reading.
    pub fn set_queued_jobs(&self, queued: u64) {
        self.state.lock().global.metrics.queued_jobs = queued;
    }

    pub fn success_rate(&self, flow_id: &FlowId) -> f64 {
        self.state
            .lock()
            .flows
            .get(flow_id)
            .map(|s| s.metrics.success_rate())
            .unwrap_or(0.0)
    }

    pub fn global_success_rate(&self) -> f64 {
        self.state.lock().global.metrics.success_rate()
    }

    /// Health of the global execution history, by failure share of finished
    /// executions.
    pub fn execution_health(&self) -> HealthState {
        let state = self.state.lock();
        let m = &state.global.metrics;
        let finished = m.successful_executions + m.failed_executions;
        if finished == 0 {
            HealthState::Healthy
        } else {
            classify(m.failed_executions as f64 / finished as f64)
        }
    }

    pub fn flow_metrics(&self, flow_id: &FlowId) -> Option<ExecutionMetrics> {
        self.state
            .lock()
            .flows
            .get(flow_id)
            .map(|s| s.metrics.clone())
    }

    pub fn global_metrics(&self) -> ExecutionMetrics {
        self.state.lock().global.metrics.clone()
    }

    /// Snapshot of every flow's metrics, sorted by flow id.
    pub fn all_metrics(&self) -> Vec<(FlowId, ExecutionMetrics)> {
        let state = self.state.lock();
        let mut all: Vec<(FlowId, ExecutionMetrics)> = state
            .flows
            .iter()
            .map(|(id, slot)| (id.clone(), slot.metrics.clone()))
            .collect();
        all.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
        all
    }

    /// Drop one flow's metrics. The global aggregate is not rewound.
    pub fn reset_flow(&self, flow_id: &FlowId) {
        self.state.lock().flows.remove(flow_id);
    }

    /// Drop all metrics, including the global aggregate.
    pub fn reset_all(&self) {
        let mut state = self.state.lock();
        state.flows.clear();
        state.global = Slot::default();
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
