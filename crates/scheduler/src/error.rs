// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler error taxonomy.

use crate::dispatch::DispatchError;
use fc_core::{ConfigError, CronParseError, FlowId};
use fc_queue::QueueError;
use fc_storage::StoreError;
use thiserror::Error;

/// Errors from the schedule manager surface.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// A manager method was called before `initialize()`.
    #[error("schedule manager is not initialized")]
    Uninitialized,
    #[error("flow not found: {0}")]
    FlowNotFound(FlowId),
    #[error("invalid schedule configuration: {0}")]
    Configuration(#[from] ConfigError),
    #[error("invalid cron expression: {0}")]
    InvalidCron(#[from] CronParseError),
    #[error(transparent)]
    Store(StoreError),
    #[error(transparent)]
    Queue(#[from] QueueError),
}

// A missing flow is its own case on this surface, not a generic store error.
impl From<StoreError> for ScheduleError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::FlowNotFound(id) => ScheduleError::FlowNotFound(id),
            other => ScheduleError::Store(other),
        }
    }
}

/// Errors from processing one claimed trigger.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The flow was deleted between enqueue and dequeue.
    #[error("flow not found: {0}")]
    FlowNotFound(FlowId),
    #[error("invalid schedule configuration: {0}")]
    Configuration(#[from] ConfigError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Queue(#[from] QueueError),
}
