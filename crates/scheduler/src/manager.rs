// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schedule lifecycle coordination.
//!
//! One [`ScheduleManager`] per queue: an explicitly constructed, long-lived
//! service with an `initialize` / `shutdown` lifecycle. It translates
//! persisted flow configuration into repeatable queue entries, keeps the two
//! in step across enable/disable/update transitions, and answers the
//! operational queries (scheduled flows, queue stats, health).

use crate::error::ScheduleError;
use crate::health::{classify, failure_rate, HealthReport, HealthState};
use crate::metrics::MetricsCollector;
use fc_core::{schedule_key, Clock, ConfigError, FlowId, FlowRecord, ScheduleConfig, TriggerId};
use fc_queue::{QueueCounts, RepeatOptions, ScheduleQueue, TriggerPayload};
use fc_storage::FlowStore;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// One flow flagged enabled in storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledFlow {
    pub flow_id: FlowId,
    pub cron_expression: String,
    pub timezone: Option<String>,
    /// Epoch ms of the next trigger; absent while the flow has no live
    /// repeatable entry on the queue.
    pub next_run_ms: Option<u64>,
}

struct Handles<S, Q> {
    store: Arc<S>,
    queue: Arc<Q>,
}

impl<S, Q> Clone for Handles<S, Q> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            queue: Arc::clone(&self.queue),
        }
    }
}

/// Coordinator between persisted schedule configuration and the queue.
pub struct ScheduleManager<S, Q, C: Clock> {
    handles: Mutex<Option<Handles<S, Q>>>,
    metrics: MetricsCollector<C>,
}

impl<S, Q, C> ScheduleManager<S, Q, C>
where
    S: FlowStore,
    Q: ScheduleQueue,
    C: Clock,
{
    pub fn new(metrics: MetricsCollector<C>) -> Self {
        Self {
            handles: Mutex::new(None),
            metrics,
        }
    }

    /// Arm the manager and reconcile queue state from storage.
    ///
    /// Returns the number of schedules registered.
    pub async fn initialize(&self, store: Arc<S>, queue: Arc<Q>) -> Result<usize, ScheduleError> {
        *self.handles.lock() = Some(Handles { store, queue });
        let registered = self.load_scheduled_flows().await?;
        tracing::info!(registered, "schedule manager initialized");
        Ok(registered)
    }

    /// Disarm the manager. Further calls fail with
    /// [`ScheduleError::Uninitialized`] until the next `initialize`.
    pub fn shutdown(&self) {
        if self.handles.lock().take().is_some() {
            tracing::info!("schedule manager shut down");
        }
    }

    /// Shared metrics collector, for the management read surface.
    pub fn metrics(&self) -> &MetricsCollector<C> {
        &self.metrics
    }

    fn handles(&self) -> Result<Handles<S, Q>, ScheduleError> {
        self.handles.lock().clone().ok_or(ScheduleError::Uninitialized)
    }

    /// Register every flow with an enabled schedule in storage.
    ///
    /// A flow whose persisted config no longer parses is logged and skipped;
    /// one bad record must not take down the batch.
    pub async fn load_scheduled_flows(&self) -> Result<usize, ScheduleError> {
        let handles = self.handles()?;
        let flows = handles.store.list_scheduled().await?;
        let mut registered = 0;
        for flow in flows {
            match self.register_scheduled_flow(&flow).await {
                Ok(()) => registered += 1,
                Err(e) => {
                    tracing::warn!(flow = %flow.id, error = %e, "skipping flow with unusable schedule");
                }
            }
        }
        Ok(registered)
    }

    /// Put `flow`'s schedule on the queue, replacing any previous entry.
    ///
    /// Registration is idempotent: the old entry at the flow's key is removed
    /// first, so repeated calls leave exactly one repeatable entry.
    pub async fn register_scheduled_flow(&self, flow: &FlowRecord) -> Result<(), ScheduleError> {
        let handles = self.handles()?;
        let config = flow.parsed_schedule()?;
        if !config.enabled {
            tracing::debug!(flow = %flow.id, "schedule config disabled, converging to unregistered");
            return self.unregister_scheduled_flow(&flow.id).await;
        }

        let key = schedule_key(&flow.id);
        let mut opts = RepeatOptions::new(&config.cron_expression);
        if let Some(tz) = &config.timezone {
            opts = opts.with_timezone(tz);
        }
        handles.queue.remove_repeatable(&key).await?;
        handles
            .queue
            .add_repeatable(
                flow.id.as_str(),
                TriggerPayload::new(flow.id.clone()),
                &opts,
                &key,
            )
            .await?;
        tracing::info!(
            flow = %flow.id,
            cron = %config.cron_expression,
            timezone = config.timezone.as_deref().unwrap_or("UTC"),
            "registered schedule"
        );
        Ok(())
    }

    /// Take a flow's schedule off the queue. Absence is not an error.
    pub async fn unregister_scheduled_flow(&self, flow_id: &FlowId) -> Result<(), ScheduleError> {
        let handles = self.handles()?;
        let removed = handles.queue.remove_repeatable(&schedule_key(flow_id)).await?;
        if removed {
            tracing::info!(flow = %flow_id, "unregistered schedule");
        } else {
            tracing::debug!(flow = %flow_id, "no schedule entry to remove");
        }
        Ok(())
    }

    /// The single authoritative schedule transition: validate, persist the
    /// enabled/config pair, then converge the queue.
    pub async fn update_schedule(
        &self,
        flow_id: &FlowId,
        config: &ScheduleConfig,
    ) -> Result<(), ScheduleError> {
        config.validate()?;
        let handles = self.handles()?;
        let json = config.to_json()?;
        handles
            .store
            .update_schedule(flow_id, config.enabled, Some(json))
            .await?;
        if config.enabled {
            let flow = handles
                .store
                .get(flow_id)
                .await?
                .ok_or_else(|| ScheduleError::FlowNotFound(flow_id.clone()))?;
            self.register_scheduled_flow(&flow).await?;
        } else {
            self.unregister_scheduled_flow(flow_id).await?;
        }
        Ok(())
    }

    /// Enable a previously configured schedule.
    pub async fn enable_schedule(&self, flow_id: &FlowId) -> Result<(), ScheduleError> {
        let config = self.stored_config(flow_id).await?;
        self.update_schedule(
            flow_id,
            &ScheduleConfig {
                enabled: true,
                ..config
            },
        )
        .await
    }

    /// Disable a schedule, keeping its configuration for later re-enable.
    pub async fn disable_schedule(&self, flow_id: &FlowId) -> Result<(), ScheduleError> {
        let config = self.stored_config(flow_id).await?;
        self.update_schedule(
            flow_id,
            &ScheduleConfig {
                enabled: false,
                ..config
            },
        )
        .await
    }

    async fn stored_config(&self, flow_id: &FlowId) -> Result<ScheduleConfig, ScheduleError> {
        let handles = self.handles()?;
        let flow = handles
            .store
            .get(flow_id)
            .await?
            .ok_or_else(|| ScheduleError::FlowNotFound(flow_id.clone()))?;
        match &flow.schedule_config {
            Some(raw) => Ok(ScheduleConfig::parse_json(raw)?),
            None => Err(ScheduleError::Configuration(ConfigError::Missing(
                flow_id.clone(),
            ))),
        }
    }

    /// Enqueue a one-shot trigger for `flow_id` right now, independent of its
    /// repeatable entry.
    pub async fn run_now(&self, flow_id: &FlowId) -> Result<TriggerId, ScheduleError> {
        let handles = self.handles()?;
        let flow = handles
            .store
            .get(flow_id)
            .await?
            .ok_or_else(|| ScheduleError::FlowNotFound(flow_id.clone()))?;
        let trigger = handles
            .queue
            .enqueue(flow.id.as_str(), TriggerPayload::new(flow.id.clone()))
            .await?;
        tracing::info!(flow = %flow_id, trigger = %trigger, "queued manual run");
        Ok(trigger)
    }

    /// Flows flagged enabled in storage, sorted by id.
    ///
    /// Storage is the source of truth here, not the queue: a flow whose
    /// repeatable entry went missing (crash between the storage and queue
    /// writes) still shows up, with no next-run time until
    /// [`Self::load_scheduled_flows`] restores the entry. An enabled flow
    /// whose config no longer parses is logged and omitted.
    pub async fn get_scheduled_flows(&self) -> Result<Vec<ScheduledFlow>, ScheduleError> {
        let handles = self.handles()?;
        let flows = handles.store.list_scheduled().await?;
        let next_runs: HashMap<String, u64> = handles
            .queue
            .list_repeatables()
            .await?
            .into_iter()
            .map(|entry| (entry.key, entry.next_run_ms))
            .collect();
        let mut scheduled = Vec::with_capacity(flows.len());
        for flow in flows {
            let config = match flow.parsed_schedule() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(flow = %flow.id, error = %e, "omitting flow with unusable schedule");
                    continue;
                }
            };
            let next_run_ms = next_runs.get(&schedule_key(&flow.id)).copied();
            scheduled.push(ScheduledFlow {
                flow_id: flow.id,
                cron_expression: config.cron_expression,
                timezone: config.timezone,
                next_run_ms,
            });
        }
        Ok(scheduled)
    }

    /// Point-in-time queue statistics.
    pub async fn queue_stats(&self) -> Result<QueueCounts, ScheduleError> {
        let handles = self.handles()?;
        Ok(handles.queue.counts().await?)
    }

    /// Health of the scheduling subsystem. Never errors: an uninitialized
    /// manager or an unreachable queue or store renders as an unhealthy
    /// report. The scheduled-flow count comes from storage, matching
    /// [`Self::get_scheduled_flows`].
    pub async fn health_status(&self) -> HealthReport {
        let handles = match self.handles() {
            Ok(handles) => handles,
            Err(_) => return HealthReport::uninitialized(),
        };
        let scheduled_flows = match handles.store.list_scheduled().await {
            Ok(flows) => flows.len(),
            Err(e) => {
                tracing::warn!(error = %e, "store unavailable for health check");
                return HealthReport {
                    state: HealthState::Unhealthy,
                    initialized: true,
                    failure_rate: 0.0,
                    scheduled_flows: 0,
                    queue: None,
                };
            }
        };
        match handles.queue.counts().await {
            Ok(counts) => {
                let rate = failure_rate(counts.completed, counts.failed);
                HealthReport {
                    state: classify(rate),
                    initialized: true,
                    failure_rate: rate,
                    scheduled_flows,
                    queue: Some(counts),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "queue unavailable for health check");
                HealthReport {
                    state: HealthState::Unhealthy,
                    initialized: true,
                    failure_rate: 0.0,
                    scheduled_flows,
                    queue: None,
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
