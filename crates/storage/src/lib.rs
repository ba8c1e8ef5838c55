// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Storage layer for Flowcron
//!
//! The persistence technology behind flow records is out of scope; only the
//! [`FlowStore`] read/write contract matters to the scheduler core. The
//! in-memory implementation here is the reference backend and the test
//! double.

mod memory;
mod store;

pub use memory::MemoryFlowStore;
pub use store::{FlowStore, StoreError};
