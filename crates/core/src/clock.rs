// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstractions for testable time.
//!
//! Everything in the scheduler that reads time does so through [`Clock`], so
//! tests can drive cron matching, lease expiry, and execution durations with
//! a [`FakeClock`] instead of sleeping.

use chrono::{DateTime, Utc};

/// Source of wall-clock time.
pub trait Clock: Clone + Send + Sync + 'static {
    /// Current instant in UTC.
    fn now_utc(&self) -> DateTime<Utc>;

    /// Current instant as milliseconds since the Unix epoch.
    fn epoch_ms(&self) -> u64 {
        self.now_utc().timestamp_millis().max(0) as u64
    }
}

/// System clock for production use.
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for tests.
#[cfg(any(test, feature = "test-support"))]
#[derive(Clone)]
pub struct FakeClock {
    now_ms: std::sync::Arc<std::sync::atomic::AtomicI64>,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeClock {
    /// Create a fake clock at a fixed, arbitrary starting instant.
    pub fn new() -> Self {
        // 2026-01-01T00:00:00Z
        Self::at_epoch_ms(1_767_225_600_000)
    }

    /// Create a fake clock at the given epoch-millisecond instant.
    pub fn at_epoch_ms(ms: i64) -> Self {
        Self {
            now_ms: std::sync::Arc::new(std::sync::atomic::AtomicI64::new(ms)),
        }
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, d: std::time::Duration) {
        self.now_ms
            .fetch_add(d.as_millis() as i64, std::sync::atomic::Ordering::SeqCst);
    }

    /// Jump the clock to an absolute instant.
    pub fn set(&self, at: DateTime<Utc>) {
        self.now_ms
            .store(at.timestamp_millis(), std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Clock for FakeClock {
    fn now_utc(&self) -> DateTime<Utc> {
        let ms = self.now_ms.load(std::sync::atomic::Ordering::SeqCst);
        DateTime::from_timestamp_millis(ms).unwrap_or_else(Utc::now)
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
