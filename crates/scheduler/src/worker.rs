// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded pool of schedule trigger processors.
//!
//! Each processor claims one trigger at a time, re-validates it against
//! current storage state, dispatches the downstream execution and reports
//! the outcome into [`MetricsCollector`] and the queue. Alongside the
//! processors run a stalled-trigger sweep and a periodic metrics summary.

use crate::dispatch::{DispatchError, Dispatcher, ExecutionHandle, ExecutionInput, ExecutionResult};
use crate::error::WorkerError;
use crate::metrics::MetricsCollector;
use fc_core::{Clock, FlowId, TriggerId};
use fc_queue::{LeasedTrigger, ScheduleQueue, TriggerOutcome};
use fc_storage::FlowStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Worker pool settings.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Triggers processed in parallel.
    pub concurrency: usize,
    /// Queue processing lock per claimed trigger.
    pub lock_duration: Duration,
    /// How often the stalled-trigger sweep runs.
    pub stalled_interval: Duration,
    /// Idle wait between claim attempts on an empty queue.
    pub poll_interval: Duration,
    /// How often the aggregate metrics summary is logged.
    pub summary_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            lock_duration: Duration::from_secs(30),
            stalled_interval: Duration::from_secs(30),
            poll_interval: Duration::from_millis(250),
            summary_interval: Duration::from_secs(60),
        }
    }
}

impl WorkerConfig {
    /// Defaults, overridden by `FC_WORKER_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(n) = env_u64("FC_WORKER_CONCURRENCY") {
            config.concurrency = (n as usize).max(1);
        }
        if let Some(ms) = env_u64("FC_WORKER_LOCK_MS") {
            config.lock_duration = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("FC_WORKER_STALLED_MS") {
            config.stalled_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("FC_WORKER_POLL_MS") {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("FC_WORKER_SUMMARY_MS") {
            config.summary_interval = Duration::from_millis(ms);
        }
        config
    }
}

fn env_u64(name: &str) -> Option<u64> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(name, value = %raw, "ignoring unparseable worker setting");
            None
        }
    }
}

/// Schedule trigger worker.
///
/// Cloning shares queue handles, metrics and the shutdown signal, so a clone
/// spawned into a task cooperates with `shutdown()` on the original.
pub struct ScheduleWorker<S, Q, D, C: Clock> {
    store: Arc<S>,
    queue: Arc<Q>,
    dispatcher: Arc<D>,
    metrics: MetricsCollector<C>,
    config: WorkerConfig,
    stopping: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
}

impl<S, Q, D, C: Clock> Clone for ScheduleWorker<S, Q, D, C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            queue: Arc::clone(&self.queue),
            dispatcher: Arc::clone(&self.dispatcher),
            metrics: self.metrics.clone(),
            config: self.config.clone(),
            stopping: Arc::clone(&self.stopping),
            shutdown: Arc::clone(&self.shutdown),
        }
    }
}

impl<S, Q, D, C> ScheduleWorker<S, Q, D, C>
where
    S: FlowStore,
    Q: ScheduleQueue,
    D: Dispatcher,
    C: Clock,
{
    pub fn new(
        store: Arc<S>,
        queue: Arc<Q>,
        dispatcher: Arc<D>,
        metrics: MetricsCollector<C>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            store,
            queue,
            dispatcher,
            metrics,
            config,
            stopping: Arc::new(AtomicBool::new(false)),
            shutdown: Arc::new(Notify::new()),
        }
    }

    pub fn metrics(&self) -> &MetricsCollector<C> {
        &self.metrics
    }

    /// Start the processor pool, the stalled-trigger sweep and the metrics
    /// summary loop.
    pub fn spawn(&self) -> Vec<JoinHandle<()>> {
        let mut tasks = Vec::with_capacity(self.config.concurrency + 2);
        for slot in 0..self.config.concurrency {
            tasks.push(tokio::spawn(self.clone().processor_loop(slot)));
        }
        tasks.push(tokio::spawn(self.clone().stalled_loop()));
        tasks.push(tokio::spawn(self.clone().summary_loop()));
        tracing::info!(
            concurrency = self.config.concurrency,
            "schedule worker started"
        );
        tasks
    }

    /// Signal every loop to stop after its current trigger.
    pub fn shutdown(&self) {
        self.stopping.store(true, Ordering::SeqCst);
        self.shutdown.notify_waiters();
    }

    fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }

    async fn idle(&self, duration: Duration) {
        tokio::select! {
            _ = self.shutdown.notified() => {}
            _ = tokio::time::sleep(duration) => {}
        }
    }

    async fn processor_loop(self, slot: usize) {
        tracing::debug!(slot, "schedule processor started");
        while !self.is_stopping() {
            match self.queue.claim(self.config.lock_duration).await {
                Ok(Some(leased)) => self.process(leased).await,
                Ok(None) => self.idle(self.config.poll_interval).await,
                Err(e) => {
                    tracing::warn!(slot, error = %e, "failed to claim a trigger");
                    self.idle(self.config.poll_interval).await;
                }
            }
        }
        tracing::debug!(slot, "schedule processor stopped");
    }

    /// Process one claimed trigger and settle it with the queue.
    pub async fn process(&self, leased: LeasedTrigger) {
        let trigger_id = leased.job.id.clone();
        let flow_id = leased.job.payload.flow_id.clone();
        tracing::debug!(
            flow = %flow_id,
            trigger = %trigger_id,
            attempts = leased.job.attempts,
            "processing schedule trigger"
        );
        match self.run_trigger(&flow_id, &trigger_id).await {
            Ok(outcome) => {
                if let Err(e) = self.queue.complete(&trigger_id, outcome).await {
                    tracing::warn!(trigger = %trigger_id, error = %e, "failed to complete trigger");
                }
            }
            Err(e) => {
                tracing::warn!(flow = %flow_id, trigger = %trigger_id, error = %e, "schedule trigger failed");
                if let Err(e) = self.queue.fail(&trigger_id, &e.to_string()).await {
                    tracing::warn!(trigger = %trigger_id, error = %e, "failed to fail trigger");
                }
            }
        }
    }

    /// Execute the trigger body: re-validate against storage, dispatch, wait.
    ///
    /// Storage is the source of truth, never the queue payload: the trigger
    /// may have been enqueued before a disable or delete took effect.
    async fn run_trigger(
        &self,
        flow_id: &FlowId,
        trigger_id: &TriggerId,
    ) -> Result<TriggerOutcome, WorkerError> {
        let token = self.metrics.record_start(flow_id);

        let flow = match self.store.get(flow_id).await {
            Ok(Some(flow)) => flow,
            Ok(None) => {
                self.metrics.record_failure(token, "flow not found");
                return Err(WorkerError::FlowNotFound(flow_id.clone()));
            }
            Err(e) => {
                self.metrics.record_failure(token, &e.to_string());
                return Err(e.into());
            }
        };

        if !flow.schedule_enabled {
            tracing::info!(flow = %flow_id, "schedule disabled since enqueue, skipping trigger");
            self.metrics.record_skip(token);
            return Ok(TriggerOutcome::Skipped);
        }
        let config = match flow.parsed_schedule() {
            Ok(config) => config,
            Err(e) => {
                self.metrics.record_failure(token, &e.to_string());
                return Err(e.into());
            }
        };
        if !config.enabled {
            tracing::info!(flow = %flow_id, "schedule config disabled, skipping trigger");
            self.metrics.record_skip(token);
            return Ok(TriggerOutcome::Skipped);
        }

        let input = ExecutionInput::synthetic(flow_id, trigger_id);
        let handle = match self.dispatcher.submit(&flow, input).await {
            Ok(handle) => handle,
            Err(e) => {
                self.metrics.record_failure(token, &e.to_string());
                return Err(e.into());
            }
        };
        match self.await_with_renewal(trigger_id, handle).await {
            Ok(_result) => {
                self.metrics.record_success(token);
                Ok(TriggerOutcome::Completed)
            }
            Err(e) => {
                self.metrics.record_failure(token, &e.to_string());
                Err(e.into())
            }
        }
    }

    /// Wait for the downstream execution, renewing the queue lock halfway
    /// through its duration so a healthy long run is not reclaimed as
    /// stalled.
    async fn await_with_renewal(
        &self,
        trigger_id: &TriggerId,
        handle: ExecutionHandle,
    ) -> Result<ExecutionResult, DispatchError> {
        let renew_after = self.config.lock_duration / 2;
        let mut wait = self.dispatcher.await_completion(handle);
        loop {
            tokio::select! {
                result = &mut wait => return result,
                _ = tokio::time::sleep(renew_after) => {
                    if let Err(e) = self.queue.renew(trigger_id, self.config.lock_duration).await {
                        tracing::warn!(trigger = %trigger_id, error = %e, "lock renewal failed");
                    }
                }
            }
        }
    }

    async fn stalled_loop(self) {
        while !self.is_stopping() {
            self.idle(self.config.stalled_interval).await;
            if self.is_stopping() {
                break;
            }
            match self.queue.reclaim_stalled().await {
                Ok(0) => {}
                Ok(count) => {
                    tracing::warn!(count, "requeued stalled schedule triggers");
                }
                Err(e) => tracing::warn!(error = %e, "stalled-trigger sweep failed"),
            }
        }
    }

    async fn summary_loop(self) {
        while !self.is_stopping() {
            self.idle(self.config.summary_interval).await;
            if self.is_stopping() {
                break;
            }
            match self.queue.counts().await {
                Ok(counts) => {
                    self.metrics.set_queued_jobs(counts.waiting as u64);
                    let global = self.metrics.global_metrics();
                    tracing::info!(
                        total = global.total_executions,
                        succeeded = global.successful_executions,
                        failed = global.failed_executions,
                        active = global.active_jobs,
                        queued = counts.waiting,
                        avg_ms = global.average_execution_time_ms,
                        "schedule execution summary"
                    );
                }
                Err(e) => tracing::warn!(error = %e, "queue counts unavailable for summary"),
            }
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
