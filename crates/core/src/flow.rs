// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Flow record — the schedulable entity as storage sees it.

use crate::id::FlowId;
use crate::schedule::{ConfigError, ScheduleConfig};
use serde::{Deserialize, Serialize};

/// A stored flow with its schedule state.
///
/// `schedule_enabled` and `schedule_config` are a pair: the manager only ever
/// writes them together, so `schedule_enabled = true` with an absent or
/// unparseable config is a detectable error state, never a valid combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowRecord {
    pub id: FlowId,
    pub name: String,
    #[serde(default)]
    pub schedule_enabled: bool,
    /// JSON-serialized [`ScheduleConfig`], if one has ever been set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_config: Option<String>,
}

impl FlowRecord {
    /// Create a flow with no schedule.
    pub fn new(id: impl Into<FlowId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            schedule_enabled: false,
            schedule_config: None,
        }
    }

    /// Parse the stored schedule config.
    ///
    /// Surfaces the enabled-without-config error state as
    /// [`ConfigError::Missing`] rather than treating it as "no schedule".
    pub fn parsed_schedule(&self) -> Result<ScheduleConfig, ConfigError> {
        match &self.schedule_config {
            Some(raw) => ScheduleConfig::parse_json(raw),
            None => Err(ConfigError::Missing(self.id.clone())),
        }
    }
}

#[cfg(test)]
#[path = "flow_tests.rs"]
mod tests;
