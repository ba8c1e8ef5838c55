//! Health classification specs.

use crate::prelude::*;
use fc_core::TriggerId;
use fc_queue::{TriggerOutcome, TriggerPayload};
use fc_scheduler::HealthState;
use std::time::Duration;

/// Drive the queue to `completed` completed and `failed` failed triggers.
async fn settle_triggers(s: &Scheduler, completed: u64, failed: u64) {
    for n in 0..completed + failed {
        let id: TriggerId = s
            .queue
            .enqueue("flow-1", TriggerPayload::new("flow-1"))
            .await
            .unwrap();
        s.queue
            .claim(Duration::from_secs(30))
            .await
            .unwrap()
            .unwrap();
        if n < completed {
            s.queue.complete(&id, TriggerOutcome::Completed).await.unwrap();
        } else {
            s.queue.fail(&id, "boom").await.unwrap();
        }
    }
}

#[tokio::test]
async fn uninitialized_manager_reports_unhealthy_without_erroring() {
    let s = Scheduler::start().await;
    s.manager.shutdown();

    let report = s.manager.health_status().await;
    assert_eq!(report.state, HealthState::Unhealthy);
    assert!(!report.initialized);
    assert!(report.queue.is_none());
}

#[tokio::test]
async fn empty_history_is_healthy() {
    let s = Scheduler::start().await;
    s.add_scheduled_flow("flow-1", "*/5 * * * *").await;

    let report = s.manager.health_status().await;
    assert_eq!(report.state, HealthState::Healthy);
    assert!(report.initialized);
    assert_eq!(report.failure_rate, 0.0);
    assert_eq!(report.scheduled_flows, 1);
}

#[tokio::test]
async fn exactly_ten_percent_failures_is_still_healthy() {
    let s = Scheduler::start().await;
    settle_triggers(&s, 90, 10).await;

    let report = s.manager.health_status().await;
    assert_eq!(report.state, HealthState::Healthy);
    assert_eq!(report.failure_rate, 0.10);
}

#[tokio::test]
async fn between_ten_and_fifty_percent_is_degraded() {
    let s = Scheduler::start().await;
    settle_triggers(&s, 75, 25).await;

    let report = s.manager.health_status().await;
    assert_eq!(report.state, HealthState::Degraded);
    assert_eq!(report.failure_rate, 0.25);
}

#[tokio::test]
async fn sixty_percent_failures_is_unhealthy() {
    let s = Scheduler::start().await;
    settle_triggers(&s, 40, 60).await;

    let report = s.manager.health_status().await;
    assert_eq!(report.state, HealthState::Unhealthy);
    assert_eq!(report.failure_rate, 0.60);
}

#[tokio::test]
async fn skipped_triggers_do_not_count_as_failures() {
    let s = Scheduler::start().await;
    s.add_scheduled_flow("flow-1", "*/5 * * * *").await;

    s.advance(Duration::from_secs(5 * 60));
    let leased = s
        .queue
        .claim(s.config.lock_duration)
        .await
        .unwrap()
        .unwrap();
    s.manager.disable_schedule(&flow("flow-1")).await.unwrap();
    s.worker.process(leased).await;

    let report = s.manager.health_status().await;
    assert_eq!(report.state, HealthState::Healthy);
    assert_eq!(report.failure_rate, 0.0);
}
