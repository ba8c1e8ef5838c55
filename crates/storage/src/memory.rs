// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory flow store.

use crate::store::{FlowStore, StoreError};
use async_trait::async_trait;
use fc_core::{FlowId, FlowRecord};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// In-memory [`FlowStore`] backed by a mutex-guarded map.
///
/// Cloning shares the underlying map, so a clone handed to the worker sees
/// the same records the manager writes.
#[derive(Clone, Default)]
pub struct MemoryFlowStore {
    flows: Arc<Mutex<HashMap<FlowId, FlowRecord>>>,
}

impl MemoryFlowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored flows.
    pub fn len(&self) -> usize {
        self.flows.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.lock().is_empty()
    }
}

#[async_trait]
impl FlowStore for MemoryFlowStore {
    async fn get(&self, id: &FlowId) -> Result<Option<FlowRecord>, StoreError> {
        Ok(self.flows.lock().get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<FlowRecord>, StoreError> {
        let mut flows: Vec<FlowRecord> = self.flows.lock().values().cloned().collect();
        flows.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        Ok(flows)
    }

    async fn list_scheduled(&self) -> Result<Vec<FlowRecord>, StoreError> {
        let mut flows: Vec<FlowRecord> = self
            .flows
            .lock()
            .values()
            .filter(|f| f.schedule_enabled)
            .cloned()
            .collect();
        flows.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        Ok(flows)
    }

    async fn update_schedule(
        &self,
        id: &FlowId,
        enabled: bool,
        config_json: Option<String>,
    ) -> Result<(), StoreError> {
        let mut flows = self.flows.lock();
        let flow = flows
            .get_mut(id)
            .ok_or_else(|| StoreError::FlowNotFound(id.clone()))?;
        flow.schedule_enabled = enabled;
        flow.schedule_config = config_json;
        Ok(())
    }

    async fn insert(&self, flow: FlowRecord) -> Result<(), StoreError> {
        self.flows.lock().insert(flow.id.clone(), flow);
        Ok(())
    }

    async fn remove(&self, id: &FlowId) -> Result<(), StoreError> {
        self.flows.lock().remove(id);
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
