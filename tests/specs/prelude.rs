//! Test harness for scheduler behavioral specifications.
//!
//! Wires a store, queue, manager and worker around a shared fake clock.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::sync::Arc;
use std::time::Duration;

use fc_core::{FakeClock, FlowId, FlowRecord, ScheduleConfig};
use fc_queue::MemoryScheduleQueue;
use fc_scheduler::{
    FakeDispatcher, MetricsCollector, ScheduleManager, ScheduleWorker, WorkerConfig,
};
use fc_storage::MemoryFlowStore;

// Re-exported so spec modules get the trait methods with the glob import.
pub use fc_queue::ScheduleQueue;
pub use fc_storage::FlowStore;

pub type Manager = ScheduleManager<MemoryFlowStore, MemoryScheduleQueue<FakeClock>, FakeClock>;
pub type Worker =
    ScheduleWorker<MemoryFlowStore, MemoryScheduleQueue<FakeClock>, FakeDispatcher, FakeClock>;

pub struct Scheduler {
    pub clock: FakeClock,
    pub store: Arc<MemoryFlowStore>,
    pub queue: Arc<MemoryScheduleQueue<FakeClock>>,
    pub dispatcher: Arc<FakeDispatcher>,
    pub manager: Manager,
    pub worker: Worker,
    pub config: WorkerConfig,
}

impl Scheduler {
    /// Build and initialize a full scheduler stack.
    pub async fn start() -> Self {
        Self::start_with(WorkerConfig::default()).await
    }

    pub async fn start_with(config: WorkerConfig) -> Self {
        let clock = FakeClock::new();
        let store = Arc::new(MemoryFlowStore::new());
        let queue = Arc::new(MemoryScheduleQueue::new(clock.clone()));
        let dispatcher = Arc::new(FakeDispatcher::new());
        let metrics = MetricsCollector::new(clock.clone());
        let manager = ScheduleManager::new(metrics.clone());
        let worker = ScheduleWorker::new(
            Arc::clone(&store),
            Arc::clone(&queue),
            Arc::clone(&dispatcher),
            metrics,
            config.clone(),
        );
        manager
            .initialize(Arc::clone(&store), Arc::clone(&queue))
            .await
            .unwrap();
        Self {
            clock,
            store,
            queue,
            dispatcher,
            manager,
            worker,
            config,
        }
    }

    pub fn metrics(&self) -> &MetricsCollector<FakeClock> {
        self.manager.metrics()
    }

    /// Insert a flow and register its enabled schedule.
    pub async fn add_scheduled_flow(&self, id: &str, cron: &str) -> FlowRecord {
        self.add_scheduled_flow_tz(id, cron, None).await
    }

    pub async fn add_scheduled_flow_tz(
        &self,
        id: &str,
        cron: &str,
        timezone: Option<&str>,
    ) -> FlowRecord {
        let mut config = ScheduleConfig::enabled(cron);
        if let Some(tz) = timezone {
            config = config.with_timezone(tz);
        }
        let mut flow = FlowRecord::new(id, id);
        flow.schedule_enabled = true;
        flow.schedule_config = Some(config.to_json().unwrap());
        self.store.insert(flow.clone()).await.unwrap();
        self.manager.register_scheduled_flow(&flow).await.unwrap();
        flow
    }

    /// Claim and process triggers until the queue is drained.
    pub async fn drain(&self) {
        while let Some(leased) = self.queue.claim(self.config.lock_duration).await.unwrap() {
            self.worker.process(leased).await;
        }
    }

    pub fn advance(&self, duration: Duration) {
        self.clock.advance(duration);
    }
}

pub fn flow(id: &str) -> FlowId {
    FlowId::new(id)
}
