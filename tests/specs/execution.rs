//! Trigger execution specs: skip semantics, redelivery, cadence.

use crate::prelude::*;
use std::time::Duration;

#[tokio::test]
async fn trigger_fires_on_the_cron_cadence() {
    let s = Scheduler::start().await;
    s.add_scheduled_flow("flow-1", "*/5 * * * *").await;

    // Nothing due yet.
    s.drain().await;
    assert!(s.metrics().flow_metrics(&flow("flow-1")).is_none());

    // Two five-minute boundaries, two executions.
    for _ in 0..2 {
        s.advance(Duration::from_secs(5 * 60));
        s.drain().await;
    }
    let m = s.metrics().flow_metrics(&flow("flow-1")).unwrap();
    assert_eq!(m.successful_executions, 2);
    assert_eq!(s.queue.counts().await.unwrap().completed, 2);
}

#[tokio::test]
async fn disable_between_enqueue_and_dequeue_yields_skipped() {
    let s = Scheduler::start().await;
    s.add_scheduled_flow("flow-1", "*/5 * * * *").await;

    // The trigger is promoted while the schedule is still enabled.
    s.advance(Duration::from_secs(5 * 60));
    let leased = s
        .queue
        .claim(s.config.lock_duration)
        .await
        .unwrap()
        .unwrap();

    // Disable lands after enqueue but before the worker runs the trigger.
    s.manager.disable_schedule(&flow("flow-1")).await.unwrap();
    s.worker.process(leased).await;

    let m = s.metrics().flow_metrics(&flow("flow-1")).unwrap();
    assert_eq!(m.failed_executions, 0);
    assert_eq!(m.successful_executions, 0);
    assert_eq!(m.active_jobs, 0);
    // The trigger settles as completed, and nothing was dispatched.
    let counts = s.queue.counts().await.unwrap();
    assert_eq!(counts.completed, 1);
    assert_eq!(counts.failed, 0);
    assert!(s.dispatcher.submissions().is_empty());
}

#[tokio::test]
async fn deleted_flow_fails_the_trigger() {
    let s = Scheduler::start().await;
    s.add_scheduled_flow("flow-1", "*/5 * * * *").await;

    s.advance(Duration::from_secs(5 * 60));
    let leased = s
        .queue
        .claim(s.config.lock_duration)
        .await
        .unwrap()
        .unwrap();
    s.store.remove(&flow("flow-1")).await.unwrap();
    s.worker.process(leased).await;

    assert_eq!(s.queue.counts().await.unwrap().failed, 1);
    assert_eq!(
        s.metrics().flow_metrics(&flow("flow-1")).unwrap().failed_executions,
        1
    );
}

#[tokio::test]
async fn stalled_trigger_is_redelivered_at_least_once() {
    let s = Scheduler::start().await;
    s.add_scheduled_flow("flow-1", "*/5 * * * *").await;

    s.advance(Duration::from_secs(5 * 60));
    let first = s
        .queue
        .claim(s.config.lock_duration)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.job.attempts, 1);

    // The claiming worker dies: its lock expires without renewal.
    s.advance(s.config.lock_duration + Duration::from_secs(1));
    assert_eq!(s.queue.reclaim_stalled().await.unwrap(), 1);

    // A second delivery of the same trigger completes normally.
    let second = s
        .queue
        .claim(s.config.lock_duration)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.job.id, first.job.id);
    assert_eq!(second.job.attempts, 2);
    s.worker.process(second).await;
    assert_eq!(s.queue.counts().await.unwrap().completed, 1);
}

#[tokio::test]
async fn run_now_executes_outside_the_cadence() {
    let s = Scheduler::start().await;
    s.add_scheduled_flow("flow-1", "0 0 1 1 *").await;

    s.manager.run_now(&flow("flow-1")).await.unwrap();
    s.drain().await;

    let m = s.metrics().flow_metrics(&flow("flow-1")).unwrap();
    assert_eq!(m.successful_executions, 1);
    // The yearly repeatable entry is untouched.
    assert_eq!(s.queue.list_repeatables().await.unwrap().len(), 1);
}

#[tokio::test]
async fn timezone_schedules_fire_at_the_local_time() {
    let s = Scheduler::start().await;
    // 08:00 in New York is 13:00 UTC in January (EST).
    s.add_scheduled_flow_tz("flow-1", "0 8 * * *", Some("America/New_York"))
        .await;

    s.advance(Duration::from_secs(12 * 3600));
    s.drain().await;
    assert!(s.metrics().flow_metrics(&flow("flow-1")).is_none());

    s.advance(Duration::from_secs(3600));
    s.drain().await;
    assert_eq!(
        s.metrics().flow_metrics(&flow("flow-1")).unwrap().successful_executions,
        1
    );
}
