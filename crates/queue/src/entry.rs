// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue data model: repeatable entries, trigger jobs, leases, counts.

use fc_core::{FlowId, TriggerId};
use serde::{Deserialize, Serialize};

/// Recurrence options for a repeatable entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeatOptions {
    pub cron_expression: String,
    /// IANA timezone name; UTC when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl RepeatOptions {
    pub fn new(cron_expression: impl Into<String>) -> Self {
        Self {
            cron_expression: cron_expression.into(),
            timezone: None,
        }
    }

    pub fn with_timezone(mut self, tz: impl Into<String>) -> Self {
        self.timezone = Some(tz.into());
        self
    }
}

/// Payload carried by every trigger a repeatable entry emits.
///
/// Deliberately minimal: workers re-fetch the flow from storage rather than
/// trusting any state embedded at enqueue time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerPayload {
    pub flow_id: FlowId,
}

impl TriggerPayload {
    pub fn new(flow_id: impl Into<FlowId>) -> Self {
        Self {
            flow_id: flow_id.into(),
        }
    }
}

/// A live repeatable entry, as returned by `list_repeatables`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepeatableEntry {
    pub name: String,
    /// Deterministic key the entry was registered under.
    pub key: String,
    pub cron_expression: String,
    pub timezone: Option<String>,
    /// Epoch ms of the next scheduled trigger.
    pub next_run_ms: u64,
}

/// One emitted trigger job instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerJob {
    pub id: TriggerId,
    /// Name of the repeatable entry (or one-shot enqueue) that produced it.
    pub name: String,
    pub payload: TriggerPayload,
    /// Delivery attempts so far; > 1 after a stalled-job redelivery.
    pub attempts: u32,
}

/// A claimed trigger with its processing-lock deadline.
#[derive(Debug, Clone)]
pub struct LeasedTrigger {
    pub job: TriggerJob,
    /// Epoch ms at which the lock expires unless renewed.
    pub lease_deadline_ms: u64,
}

/// Terminal non-error outcomes of a trigger.
///
/// `Skipped` is first-class: the schedule was disabled between enqueue and
/// dequeue, so the trigger completes without dispatching and without touching
/// failure accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerOutcome {
    Completed,
    Skipped,
}

/// Point-in-time queue statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub waiting: usize,
    pub active: usize,
    pub completed: u64,
    pub failed: u64,
    /// Repeatable entries whose next trigger lies in the future.
    pub delayed: usize,
    pub repeatable: usize,
}

#[cfg(test)]
#[path = "entry_tests.rs"]
mod tests;
