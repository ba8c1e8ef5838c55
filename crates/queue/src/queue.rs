// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue contract the scheduler core depends on.

use crate::entry::{
    LeasedTrigger, QueueCounts, RepeatOptions, RepeatableEntry, TriggerOutcome, TriggerPayload,
};
use async_trait::async_trait;
use fc_core::{CronParseError, TriggerId};
use std::time::Duration;
use thiserror::Error;

/// Errors from the schedule queue.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("invalid cron expression: {0}")]
    InvalidCron(#[from] CronParseError),
    #[error("unknown timezone: '{0}'")]
    UnknownTimezone(String),
    #[error("unknown trigger: {0}")]
    UnknownTrigger(TriggerId),
    #[error("queue backend error: {0}")]
    Backend(String),
}

/// Durable repeatable-job queue.
///
/// Registration methods are used by the manager; claim/renew/complete/fail
/// and the stalled-job sweep are used by workers. Implementations own their
/// retry policy for failed triggers — the scheduler core only reports
/// outcomes.
#[async_trait]
pub trait ScheduleQueue: Send + Sync + 'static {
    /// Store (or replace) a repeatable entry under a deterministic key.
    async fn add_repeatable(
        &self,
        name: &str,
        payload: TriggerPayload,
        opts: &RepeatOptions,
        key: &str,
    ) -> Result<(), QueueError>;

    /// Enumerate live repeatable entries.
    async fn list_repeatables(&self) -> Result<Vec<RepeatableEntry>, QueueError>;

    /// Remove the repeatable entry at `key`. Returns whether one existed.
    async fn remove_repeatable(&self, key: &str) -> Result<bool, QueueError>;

    /// Enqueue a one-shot trigger immediately, bypassing any repeatable entry.
    async fn enqueue(&self, name: &str, payload: TriggerPayload) -> Result<TriggerId, QueueError>;

    /// Claim the next due trigger under a processing lock, if any.
    async fn claim(&self, lock: Duration) -> Result<Option<LeasedTrigger>, QueueError>;

    /// Extend the processing lock on an active trigger.
    async fn renew(&self, id: &TriggerId, lock: Duration) -> Result<(), QueueError>;

    /// Complete an active trigger with a terminal non-error outcome.
    async fn complete(&self, id: &TriggerId, outcome: TriggerOutcome) -> Result<(), QueueError>;

    /// Fail an active trigger; feeds the failure counters health reads.
    async fn fail(&self, id: &TriggerId, reason: &str) -> Result<(), QueueError>;

    /// Requeue active triggers whose lock expired without renewal.
    /// Returns how many were reclaimed.
    async fn reclaim_stalled(&self) -> Result<usize, QueueError>;

    /// Point-in-time queue statistics.
    async fn counts(&self) -> Result<QueueCounts, QueueError>;
}
