// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted schedule configuration.
//!
//! Storage keeps the configuration as a JSON blob next to the flow record;
//! this module models that blob as an explicit versioned type so a malformed
//! blob becomes a recoverable [`ConfigError`] instead of an exception leaking
//! through unrelated code paths.

use crate::cron::{CronExpression, CronParseError};
use crate::id::FlowId;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current on-disk schema version.
pub const CONFIG_VERSION: u32 = 1;

/// Errors from parsing or validating a schedule configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed schedule config: {0}")]
    Malformed(String),
    #[error("unsupported schedule config version {0}")]
    UnsupportedVersion(u32),
    #[error("schedule is enabled but has no cron expression")]
    MissingCronExpression,
    #[error("invalid cron expression: {0}")]
    InvalidCron(#[from] CronParseError),
    #[error("unknown timezone: '{0}'")]
    UnknownTimezone(String),
    #[error("no schedule config stored for flow {0}")]
    Missing(FlowId),
}

/// Schedule configuration for one flow.
///
/// Wire format (camelCase JSON):
/// `{"version": 1, "cronExpression": "*/5 * * * *", "timezone": "UTC", "enabled": true}`.
/// The `version` and `timezone` keys are optional on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    pub cron_expression: String,
    /// IANA timezone name. Defaults to UTC when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    pub enabled: bool,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

impl ScheduleConfig {
    /// Build an enabled config with the given cron expression.
    pub fn enabled(cron_expression: impl Into<String>) -> Self {
        Self {
            version: CONFIG_VERSION,
            cron_expression: cron_expression.into(),
            timezone: None,
            enabled: true,
        }
    }

    /// Build a disabled config, keeping the cron expression for later re-enable.
    pub fn disabled(cron_expression: impl Into<String>) -> Self {
        Self {
            enabled: false,
            ..Self::enabled(cron_expression)
        }
    }

    /// Set the schedule's timezone.
    pub fn with_timezone(mut self, tz: impl Into<String>) -> Self {
        self.timezone = Some(tz.into());
        self
    }

    /// Parse a persisted JSON blob. Validates after parsing.
    pub fn parse_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize for persistence.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string(self).map_err(|e| ConfigError::Malformed(e.to_string()))
    }

    /// Validate the invariants the management boundary enforces: a supported
    /// version, and — when enabled — a parseable cron expression and a known
    /// timezone.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version > CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion(self.version));
        }
        if self.enabled {
            if self.cron_expression.trim().is_empty() {
                return Err(ConfigError::MissingCronExpression);
            }
            CronExpression::parse(&self.cron_expression)?;
            self.tz()?;
        }
        Ok(())
    }

    /// Parse the cron expression.
    pub fn cron(&self) -> Result<CronExpression, CronParseError> {
        CronExpression::parse(&self.cron_expression)
    }

    /// Resolve the configured timezone, defaulting to UTC.
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        match &self.timezone {
            None => Ok(Tz::UTC),
            Some(name) => name
                .parse()
                .map_err(|_| ConfigError::UnknownTimezone(name.clone())),
        }
    }
}

/// Deterministic repeatable-job key for a flow.
///
/// Derived from the flow id so the schedule entry can be found, replaced, or
/// removed without a lookup table.
pub fn schedule_key(flow_id: &FlowId) -> String {
    format!("schedule-{}", flow_id)
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
