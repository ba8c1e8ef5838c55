// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Repeatable-job queue for Flowcron
//!
//! The scheduler core talks to a durable queue through the [`ScheduleQueue`]
//! contract: repeatable entries keyed by a deterministic id emit trigger jobs
//! on their cron cadence; workers claim triggers under a lease and either
//! complete or fail them; expired leases are reclaimed for redelivery
//! (at-least-once semantics). [`MemoryScheduleQueue`] is the in-process
//! implementation; a Redis- or SQL-backed queue can satisfy the same
//! contract.

mod entry;
mod memory;
mod queue;

pub use entry::{
    LeasedTrigger, QueueCounts, RepeatOptions, RepeatableEntry, TriggerJob, TriggerOutcome,
    TriggerPayload,
};
pub use memory::MemoryScheduleQueue;
pub use queue::{QueueError, ScheduleQueue};
