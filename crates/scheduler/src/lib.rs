// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Recurring-execution scheduler core for Flowcron
//!
//! Three cooperating pieces:
//!
//! - [`ScheduleManager`] translates persisted flow configuration into
//!   repeatable queue entries and answers operational queries (scheduled
//!   flows, queue stats, health).
//! - [`ScheduleWorker`] runs a bounded pool of processors that claim
//!   triggers, re-validate them against storage, dispatch the downstream
//!   execution and report outcomes.
//! - [`MetricsCollector`] keeps per-flow and global execution counters with a
//!   bounded rolling window of successful-execution durations.
//!
//! The downstream workload is behind the [`Dispatcher`] seam; the scheduler
//! owns none of its retry or idempotency semantics.

pub mod dispatch;
pub mod error;
pub mod health;
pub mod manager;
pub mod metrics;
pub mod worker;

pub use dispatch::{
    DispatchError, Dispatcher, ExecutionCompletion, ExecutionHandle, ExecutionInput,
    ExecutionResult,
};
pub use error::{ScheduleError, WorkerError};
pub use health::{HealthReport, HealthState};
pub use manager::{ScheduleManager, ScheduledFlow};
pub use metrics::{ExecutionMetrics, MetricsCollector, StartToken};
pub use worker::{ScheduleWorker, WorkerConfig};

#[cfg(any(test, feature = "test-support"))]
pub use dispatch::FakeDispatcher;
