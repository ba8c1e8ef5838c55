// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Downstream execution seam.
//!
//! The scheduler submits work through [`Dispatcher`] and suspends until the
//! execution completes. No timeout is imposed: downstream duration is
//! workload-dependent and unbounded, and the worker keeps its queue lock
//! alive while it waits.

use async_trait::async_trait;
use fc_core::{FlowId, FlowRecord, TriggerId};
use thiserror::Error;
use tokio::sync::oneshot;

/// Errors from the execution service.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    /// The downstream workload ran and reported an error.
    #[error("execution failed: {0}")]
    Failed(String),
    /// The execution service itself could not be reached or misbehaved.
    #[error("dispatch backend error: {0}")]
    Backend(String),
}

/// Input for one scheduled execution.
///
/// Triggers are time-based, not user-initiated, so the payload is an empty
/// JSON object and the session id is synthesized from the flow and trigger.
#[derive(Debug, Clone)]
pub struct ExecutionInput {
    pub session_id: String,
    pub payload: serde_json::Value,
}

impl ExecutionInput {
    pub fn synthetic(flow_id: &FlowId, trigger_id: &TriggerId) -> Self {
        Self {
            session_id: format!("sched-{flow_id}-{trigger_id}"),
            payload: serde_json::Value::Object(serde_json::Map::new()),
        }
    }
}

/// Output of one completed execution.
#[derive(Debug, Clone, Default)]
pub struct ExecutionResult {
    pub output: serde_json::Value,
}

/// A submitted execution awaiting completion.
pub struct ExecutionHandle {
    session_id: String,
    rx: oneshot::Receiver<Result<ExecutionResult, DispatchError>>,
}

impl ExecutionHandle {
    /// Create a handle and the completion side that resolves it.
    pub fn pending(session_id: impl Into<String>) -> (Self, ExecutionCompletion) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                session_id: session_id.into(),
                rx,
            },
            ExecutionCompletion { tx },
        )
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Suspend until the execution completes.
    pub async fn wait(self) -> Result<ExecutionResult, DispatchError> {
        match self.rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(DispatchError::Backend(
                "execution dropped without reporting completion".to_string(),
            )),
        }
    }
}

/// Completion side of an [`ExecutionHandle`].
pub struct ExecutionCompletion {
    tx: oneshot::Sender<Result<ExecutionResult, DispatchError>>,
}

impl ExecutionCompletion {
    pub fn succeed(self, result: ExecutionResult) {
        // The waiter may have gone away during shutdown.
        let _ = self.tx.send(Ok(result));
    }

    pub fn fail(self, error: DispatchError) {
        let _ = self.tx.send(Err(error));
    }
}

/// The execution service contract the scheduler consumes.
///
/// Retry, partial-failure and idempotency semantics of the downstream
/// workload belong to the implementation, not to the scheduler.
#[async_trait]
pub trait Dispatcher: Send + Sync + 'static {
    /// Submit an execution request for `flow`.
    async fn submit(
        &self,
        flow: &FlowRecord,
        input: ExecutionInput,
    ) -> Result<ExecutionHandle, DispatchError>;

    /// Suspend until the submitted execution completes.
    async fn await_completion(
        &self,
        handle: ExecutionHandle,
    ) -> Result<ExecutionResult, DispatchError> {
        handle.wait().await
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeDispatcher;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::{HashMap, HashSet, VecDeque};
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeState {
        scripted: HashMap<FlowId, VecDeque<Result<ExecutionResult, DispatchError>>>,
        held: HashSet<FlowId>,
        pending: HashMap<FlowId, VecDeque<ExecutionCompletion>>,
        submissions: Vec<String>,
    }

    /// Scripted [`Dispatcher`] for tests.
    ///
    /// By default every submission succeeds immediately with an empty
    /// result. Per-flow results can be scripted, and a flow can be held so
    /// tests control exactly when its executions complete.
    #[derive(Clone, Default)]
    pub struct FakeDispatcher {
        state: Arc<Mutex<FakeState>>,
    }

    impl FakeDispatcher {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a success result for the next submission of `flow_id`.
        pub fn script_success(&self, flow_id: &FlowId, result: ExecutionResult) {
            self.state
                .lock()
                .scripted
                .entry(flow_id.clone())
                .or_default()
                .push_back(Ok(result));
        }

        /// Queue a failure for the next submission of `flow_id`.
        pub fn script_failure(&self, flow_id: &FlowId, message: &str) {
            self.state
                .lock()
                .scripted
                .entry(flow_id.clone())
                .or_default()
                .push_back(Err(DispatchError::Failed(message.to_string())));
        }

        /// Hold submissions for `flow_id` open until released.
        pub fn hold(&self, flow_id: &FlowId) {
            self.state.lock().held.insert(flow_id.clone());
        }

        /// Complete the oldest held execution of `flow_id` successfully.
        /// Returns false when none is pending.
        pub fn release_success(&self, flow_id: &FlowId, result: ExecutionResult) -> bool {
            match self.take_pending(flow_id) {
                Some(completion) => {
                    completion.succeed(result);
                    true
                }
                None => false,
            }
        }

        /// Complete the oldest held execution of `flow_id` with a failure.
        pub fn release_failure(&self, flow_id: &FlowId, message: &str) -> bool {
            match self.take_pending(flow_id) {
                Some(completion) => {
                    completion.fail(DispatchError::Failed(message.to_string()));
                    true
                }
                None => false,
            }
        }

        /// Session ids of every submission seen, in order.
        pub fn submissions(&self) -> Vec<String> {
            self.state.lock().submissions.clone()
        }

        fn take_pending(&self, flow_id: &FlowId) -> Option<ExecutionCompletion> {
            self.state
                .lock()
                .pending
                .get_mut(flow_id)
                .and_then(|q| q.pop_front())
        }
    }

    #[async_trait]
    impl Dispatcher for FakeDispatcher {
        async fn submit(
            &self,
            flow: &FlowRecord,
            input: ExecutionInput,
        ) -> Result<ExecutionHandle, DispatchError> {
            let (handle, completion) = ExecutionHandle::pending(input.session_id.clone());
            let mut state = self.state.lock();
            state.submissions.push(input.session_id);
            if state.held.contains(&flow.id) {
                state
                    .pending
                    .entry(flow.id.clone())
                    .or_default()
                    .push_back(completion);
            } else {
                let scripted = state
                    .scripted
                    .get_mut(&flow.id)
                    .and_then(|q| q.pop_front());
                match scripted {
                    Some(Ok(result)) => completion.succeed(result),
                    Some(Err(error)) => completion.fail(error),
                    None => completion.succeed(ExecutionResult::default()),
                }
            }
            Ok(handle)
        }
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
