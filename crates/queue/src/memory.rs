// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory schedule queue.
//!
//! Clock-driven so tests can advance time instead of sleeping. Due
//! repeatables are promoted into the waiting list on every claim; a
//! repeatable never has two live trigger instances at once.

use crate::entry::{
    LeasedTrigger, QueueCounts, RepeatOptions, RepeatableEntry, TriggerJob, TriggerOutcome,
    TriggerPayload,
};
use crate::queue::{QueueError, ScheduleQueue};
use async_trait::async_trait;
use chrono_tz::Tz;
use fc_core::{Clock, CronExpression, IdGen, TriggerId, UuidIdGen};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

struct Repeatable {
    name: String,
    payload: TriggerPayload,
    cron: CronExpression,
    cron_expression: String,
    timezone: Option<String>,
    tz: Tz,
    next_run_ms: u64,
}

struct ActiveTrigger {
    job: TriggerJob,
    lease_deadline_ms: u64,
}

#[derive(Default)]
struct QueueState {
    repeatables: HashMap<String, Repeatable>,
    waiting: VecDeque<TriggerJob>,
    active: HashMap<TriggerId, ActiveTrigger>,
    completed: u64,
    failed: u64,
}

impl QueueState {
    /// Whether a trigger produced by `name` is currently waiting or active.
    fn has_live_instance(&self, name: &str) -> bool {
        self.waiting.iter().any(|j| j.name == name)
            || self.active.values().any(|a| a.job.name == name)
    }

    /// Move due repeatables into the waiting list and re-arm their next run.
    fn promote_due<G: IdGen>(
        &mut self,
        now_ms: u64,
        now_utc: chrono::DateTime<chrono::Utc>,
        ids: &G,
    ) {
        let due: Vec<String> = self
            .repeatables
            .iter()
            .filter(|(_, r)| r.next_run_ms <= now_ms)
            .map(|(key, _)| key.clone())
            .collect();

        for key in due {
            let (name, payload, next) = {
                let Some(rep) = self.repeatables.get(&key) else {
                    continue;
                };
                (
                    rep.name.clone(),
                    rep.payload.clone(),
                    rep.cron.next_after(now_utc, rep.tz),
                )
            };

            if !self.has_live_instance(&name) {
                let job = TriggerJob {
                    id: TriggerId::new(ids.next()),
                    name,
                    payload,
                    attempts: 0,
                };
                tracing::debug!(name = %job.name, trigger = %job.id, "repeatable due, trigger queued");
                self.waiting.push_back(job);
            }

            // Re-arm even when the previous instance is still live, so a slow
            // run does not pile up triggers.
            match next {
                Some(at) => {
                    if let Some(rep) = self.repeatables.get_mut(&key) {
                        rep.next_run_ms = at.timestamp_millis().max(0) as u64;
                    }
                }
                None => {
                    tracing::warn!(key = %key, "repeatable has no future run, removing");
                    self.repeatables.remove(&key);
                }
            }
        }
    }
}

/// In-memory [`ScheduleQueue`] implementation.
///
/// Cloning shares the underlying state.
#[derive(Clone)]
pub struct MemoryScheduleQueue<C: Clock, G: IdGen = UuidIdGen> {
    state: Arc<Mutex<QueueState>>,
    clock: C,
    ids: G,
}

impl<C: Clock> MemoryScheduleQueue<C> {
    pub fn new(clock: C) -> Self {
        Self::with_id_gen(clock, UuidIdGen)
    }
}

impl<C: Clock, G: IdGen + 'static> MemoryScheduleQueue<C, G> {
    /// Build with an explicit trigger-id generator.
    pub fn with_id_gen(clock: C, ids: G) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState::default())),
            clock,
            ids,
        }
    }
}

#[async_trait]
impl<C: Clock, G: IdGen + 'static> ScheduleQueue for MemoryScheduleQueue<C, G> {
    async fn add_repeatable(
        &self,
        name: &str,
        payload: TriggerPayload,
        opts: &RepeatOptions,
        key: &str,
    ) -> Result<(), QueueError> {
        let cron = CronExpression::parse(&opts.cron_expression)?;
        let tz: Tz = match &opts.timezone {
            None => Tz::UTC,
            Some(tz_name) => tz_name
                .parse()
                .map_err(|_| QueueError::UnknownTimezone(tz_name.clone()))?,
        };

        let now = self.clock.now_utc();
        let next_run_ms = cron
            .next_after(now, tz)
            .map(|t| t.timestamp_millis().max(0) as u64)
            .ok_or_else(|| QueueError::Backend(format!("no future run for '{name}'")))?;

        let mut state = self.state.lock();
        // Replacing an existing entry at the same key keeps at most one
        // repeatable per key.
        state.repeatables.insert(
            key.to_string(),
            Repeatable {
                name: name.to_string(),
                payload,
                cron,
                cron_expression: opts.cron_expression.clone(),
                timezone: opts.timezone.clone(),
                tz,
                next_run_ms,
            },
        );
        Ok(())
    }

    async fn list_repeatables(&self) -> Result<Vec<RepeatableEntry>, QueueError> {
        let state = self.state.lock();
        let mut entries: Vec<RepeatableEntry> = state
            .repeatables
            .iter()
            .map(|(key, r)| RepeatableEntry {
                name: r.name.clone(),
                key: key.clone(),
                cron_expression: r.cron_expression.clone(),
                timezone: r.timezone.clone(),
                next_run_ms: r.next_run_ms,
            })
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }

    async fn remove_repeatable(&self, key: &str) -> Result<bool, QueueError> {
        Ok(self.state.lock().repeatables.remove(key).is_some())
    }

    async fn enqueue(&self, name: &str, payload: TriggerPayload) -> Result<TriggerId, QueueError> {
        let id = TriggerId::new(self.ids.next());
        let mut state = self.state.lock();
        state.waiting.push_back(TriggerJob {
            id: id.clone(),
            name: name.to_string(),
            payload,
            attempts: 0,
        });
        Ok(id)
    }

    async fn claim(&self, lock: Duration) -> Result<Option<LeasedTrigger>, QueueError> {
        let now_ms = self.clock.epoch_ms();
        let now_utc = self.clock.now_utc();

        let mut state = self.state.lock();
        state.promote_due(now_ms, now_utc, &self.ids);

        let Some(mut job) = state.waiting.pop_front() else {
            return Ok(None);
        };
        job.attempts += 1;

        let lease_deadline_ms = now_ms + lock.as_millis() as u64;
        state.active.insert(
            job.id.clone(),
            ActiveTrigger {
                job: job.clone(),
                lease_deadline_ms,
            },
        );

        Ok(Some(LeasedTrigger {
            job,
            lease_deadline_ms,
        }))
    }

    async fn renew(&self, id: &TriggerId, lock: Duration) -> Result<(), QueueError> {
        let now_ms = self.clock.epoch_ms();
        let mut state = self.state.lock();
        let active = state
            .active
            .get_mut(id)
            .ok_or_else(|| QueueError::UnknownTrigger(id.clone()))?;
        active.lease_deadline_ms = now_ms + lock.as_millis() as u64;
        Ok(())
    }

    async fn complete(&self, id: &TriggerId, outcome: TriggerOutcome) -> Result<(), QueueError> {
        let mut state = self.state.lock();
        if state.active.remove(id).is_none() {
            return Err(QueueError::UnknownTrigger(id.clone()));
        }
        state.completed += 1;
        tracing::debug!(trigger = %id, ?outcome, "trigger completed");
        Ok(())
    }

    async fn fail(&self, id: &TriggerId, reason: &str) -> Result<(), QueueError> {
        let mut state = self.state.lock();
        if state.active.remove(id).is_none() {
            return Err(QueueError::UnknownTrigger(id.clone()));
        }
        state.failed += 1;
        tracing::debug!(trigger = %id, reason, "trigger failed");
        Ok(())
    }

    async fn reclaim_stalled(&self) -> Result<usize, QueueError> {
        let now_ms = self.clock.epoch_ms();
        let mut state = self.state.lock();

        let stalled: Vec<TriggerId> = state
            .active
            .iter()
            .filter(|(_, a)| a.lease_deadline_ms < now_ms)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &stalled {
            if let Some(active) = state.active.remove(id) {
                tracing::warn!(trigger = %id, name = %active.job.name, "lock expired, requeueing stalled trigger");
                state.waiting.push_back(active.job);
            }
        }
        Ok(stalled.len())
    }

    async fn counts(&self) -> Result<QueueCounts, QueueError> {
        let now_ms = self.clock.epoch_ms();
        let state = self.state.lock();
        Ok(QueueCounts {
            waiting: state.waiting.len(),
            active: state.active.len(),
            completed: state.completed,
            failed: state.failed,
            delayed: state
                .repeatables
                .values()
                .filter(|r| r.next_run_ms > now_ms)
                .count(),
            repeatable: state.repeatables.len(),
        })
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
