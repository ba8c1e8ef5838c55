// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Flow persistence contract.

use async_trait::async_trait;
use fc_core::{FlowId, FlowRecord};
use thiserror::Error;

/// Errors from the flow store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("flow not found: {0}")]
    FlowNotFound(FlowId),
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Read/write contract for flow records.
///
/// The two schedule fields (`schedule_enabled`, `schedule_config`) are only
/// ever written together through [`FlowStore::update_schedule`]; no method
/// exposes a partial write.
#[async_trait]
pub trait FlowStore: Send + Sync + 'static {
    /// Fetch one flow by id.
    async fn get(&self, id: &FlowId) -> Result<Option<FlowRecord>, StoreError>;

    /// List every stored flow.
    async fn list(&self) -> Result<Vec<FlowRecord>, StoreError>;

    /// List flows with `schedule_enabled = true`.
    async fn list_scheduled(&self) -> Result<Vec<FlowRecord>, StoreError>;

    /// Atomically write the schedule pair on an existing flow.
    async fn update_schedule(
        &self,
        id: &FlowId,
        enabled: bool,
        config_json: Option<String>,
    ) -> Result<(), StoreError>;

    /// Insert or replace a flow record.
    async fn insert(&self, flow: FlowRecord) -> Result<(), StoreError>;

    /// Delete a flow record. Missing flows are not an error.
    async fn remove(&self, id: &FlowId) -> Result<(), StoreError>;
}
