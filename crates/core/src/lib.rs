// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fc-core: Core library for the Flowcron recurring-execution scheduler

pub mod clock;
pub mod cron;
pub mod flow;
pub mod id;
pub mod schedule;

pub use clock::{Clock, SystemClock};
pub use cron::{CronExpression, CronParseError};
pub use flow::FlowRecord;
pub use id::{FlowId, IdGen, ShortId, TriggerId, UuidIdGen};
pub use schedule::{schedule_key, ConfigError, ScheduleConfig};

#[cfg(any(test, feature = "test-support"))]
pub use clock::FakeClock;
#[cfg(any(test, feature = "test-support"))]
pub use id::SequentialIdGen;
