// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cron expression grammar and next-run computation.
//!
//! The accepted grammar is a deliberately closed subset of cron: five fields
//! (minute, hour, day-of-month, month, day-of-week) plus an optional sixth
//! year field. Each field is `*`, `*/N`, or a comma list of in-range
//! literals. Anything else is rejected at the management boundary so an
//! invalid expression can never be persisted with an enabled schedule.

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Field positions, used in error messages and range checks.
const FIELDS: [(&str, u32, u32); 6] = [
    ("minute", 0, 59),
    ("hour", 0, 23),
    ("day-of-month", 1, 31),
    ("month", 1, 12),
    ("day-of-week", 0, 6),
    ("year", 1970, 2099),
];

/// Errors from parsing a cron expression.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CronParseError {
    #[error("expected 5 or 6 fields, got {0}")]
    WrongFieldCount(usize),
    #[error("invalid {field} field: '{value}'")]
    InvalidField { field: &'static str, value: String },
    #[error("step must be greater than zero in {field} field")]
    ZeroStep { field: &'static str },
    #[error("{field} value {value} out of range {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },
}

/// One parsed cron field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CronField {
    /// `*` — matches every value.
    Any,
    /// `*/N` — matches values divisible by the step, counted from the range
    /// minimum.
    Step(u32),
    /// Explicit comma list of literal values.
    Values(Vec<u32>),
}

impl CronField {
    fn parse(raw: &str, field: &'static str, min: u32, max: u32) -> Result<Self, CronParseError> {
        if raw == "*" {
            return Ok(CronField::Any);
        }

        if let Some(step) = raw.strip_prefix("*/") {
            let n: u32 = step.parse().map_err(|_| CronParseError::InvalidField {
                field,
                value: raw.to_string(),
            })?;
            if n == 0 {
                return Err(CronParseError::ZeroStep { field });
            }
            return Ok(CronField::Step(n));
        }

        let mut values = Vec::new();
        for part in raw.split(',') {
            let n: u32 = part
                .trim()
                .parse()
                .map_err(|_| CronParseError::InvalidField {
                    field,
                    value: raw.to_string(),
                })?;
            if n < min || n > max {
                return Err(CronParseError::OutOfRange {
                    field,
                    value: n,
                    min,
                    max,
                });
            }
            values.push(n);
        }
        if values.is_empty() {
            return Err(CronParseError::InvalidField {
                field,
                value: raw.to_string(),
            });
        }
        Ok(CronField::Values(values))
    }

    fn matches(&self, value: u32, min: u32) -> bool {
        match self {
            CronField::Any => true,
            // A value below the range minimum (a pre-1970 year) matches
            // nothing rather than underflowing.
            CronField::Step(n) => match value.checked_sub(min) {
                Some(offset) => offset % n == 0,
                None => false,
            },
            CronField::Values(vals) => vals.contains(&value),
        }
    }
}

/// A parsed, validated cron expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CronExpression {
    minute: CronField,
    hour: CronField,
    day_of_month: CronField,
    month: CronField,
    day_of_week: CronField,
    /// Optional sixth field.
    year: Option<CronField>,
}

/// Lookahead bound for [`CronExpression::next_after`]: one year plus leap
/// slack, in minutes.
const MAX_SCAN_MINUTES: i64 = 367 * 24 * 60;

impl CronExpression {
    /// Parse a 5-or-6-field cron expression.
    pub fn parse(expression: &str) -> Result<Self, CronParseError> {
        let parts: Vec<&str> = expression.split_whitespace().collect();
        if parts.len() != 5 && parts.len() != 6 {
            return Err(CronParseError::WrongFieldCount(parts.len()));
        }

        let mut fields = Vec::with_capacity(parts.len());
        for (raw, (name, min, max)) in parts.iter().zip(FIELDS.iter()) {
            fields.push(CronField::parse(raw, name, *min, *max)?);
        }

        let mut it = fields.into_iter();
        // Field count was validated above; the iterator yields 5 or 6 items.
        let (minute, hour, day_of_month, month, day_of_week) = match (
            it.next(),
            it.next(),
            it.next(),
            it.next(),
            it.next(),
        ) {
            (Some(a), Some(b), Some(c), Some(d), Some(e)) => (a, b, c, d, e),
            _ => return Err(CronParseError::WrongFieldCount(parts.len())),
        };

        Ok(Self {
            minute,
            hour,
            day_of_month,
            month,
            day_of_week,
            year: it.next(),
        })
    }

    /// Whether the given local instant matches this expression.
    ///
    /// Day-of-week is counted from Sunday = 0.
    pub fn matches<T: TimeZone>(&self, at: &DateTime<T>) -> bool {
        if !self.minute.matches(at.minute(), 0) {
            return false;
        }
        if !self.hour.matches(at.hour(), 0) {
            return false;
        }
        if !self.day_of_month.matches(at.day(), 1) {
            return false;
        }
        if !self.month.matches(at.month(), 1) {
            return false;
        }
        if !self
            .day_of_week
            .matches(at.weekday().num_days_from_sunday(), 0)
        {
            return false;
        }
        if let Some(year) = &self.year {
            let y = at.year();
            if y < 0 || !year.matches(y as u32, 1970) {
                return false;
            }
        }
        true
    }

    /// Compute the next matching instant strictly after `after`, evaluated in
    /// the given timezone.
    ///
    /// Returns `None` when no instant within the lookahead window matches
    /// (possible with a year field entirely in the past).
    pub fn next_after(&self, after: DateTime<Utc>, tz: Tz) -> Option<DateTime<Utc>> {
        // Truncate to whole minutes, then step forward one minute at a time.
        let base = after
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(after);
        let mut candidate = base + Duration::minutes(1);

        for _ in 0..MAX_SCAN_MINUTES {
            let local = candidate.with_timezone(&tz);
            if self.matches(&local) {
                return Some(candidate);
            }
            candidate += Duration::minutes(1);
        }
        None
    }
}

impl std::str::FromStr for CronExpression {
    type Err = CronParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[path = "cron_tests.rs"]
mod tests;
