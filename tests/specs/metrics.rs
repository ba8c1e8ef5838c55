//! Metrics collection specs.

use crate::prelude::*;
use std::time::Duration;

#[tokio::test]
async fn success_rate_is_zero_for_a_flow_with_no_executions() {
    let s = Scheduler::start().await;
    s.add_scheduled_flow("flow-1", "*/5 * * * *").await;

    assert_eq!(s.metrics().success_rate(&flow("flow-1")), 0.0);
    assert_eq!(s.metrics().global_success_rate(), 0.0);
    assert!(s.metrics().flow_metrics(&flow("flow-1")).is_none());
}

#[tokio::test]
async fn average_execution_time_is_the_mean_of_observed_durations() {
    let s = Scheduler::start().await;
    s.add_scheduled_flow("flow-1", "*/5 * * * *").await;
    let id = flow("flow-1");

    // Three runs taking 100, 200 and 300 ms of (fake) wall time.
    for duration_ms in [100u64, 200, 300] {
        s.dispatcher.hold(&id);
        s.manager.run_now(&id).await.unwrap();
        let leased = s
            .queue
            .claim(s.config.lock_duration)
            .await
            .unwrap()
            .unwrap();
        let worker = s.worker.clone();
        let run = tokio::spawn(async move { worker.process(leased).await });
        // Give the worker a moment to reach the dispatcher.
        tokio::time::sleep(Duration::from_millis(20)).await;
        s.advance(Duration::from_millis(duration_ms));
        assert!(s.dispatcher.release_success(&id, Default::default()));
        run.await.unwrap();
    }

    let m = s.metrics().flow_metrics(&id).unwrap();
    assert_eq!(m.successful_executions, 3);
    assert_eq!(m.average_execution_time_ms, 200.0);
    assert_eq!(s.metrics().success_rate(&id), 100.0);
}

#[tokio::test]
async fn duration_window_keeps_only_the_most_recent_hundred() {
    let s = Scheduler::start().await;
    let metrics = s.metrics();
    let id = flow("flow-1");

    // Durations 1..=150 ms through the collector's start/success bracket.
    for duration_ms in 1..=150u64 {
        let token = metrics.record_start(&id);
        s.advance(Duration::from_millis(duration_ms));
        metrics.record_success(token);
    }

    let m = metrics.flow_metrics(&id).unwrap();
    assert_eq!(m.total_executions, 150);
    // mean(51..=150)
    assert_eq!(m.average_execution_time_ms, 100.5);
}

#[tokio::test]
async fn failures_count_without_touching_the_duration_window() {
    let s = Scheduler::start().await;
    s.add_scheduled_flow("flow-1", "*/5 * * * *").await;
    let id = flow("flow-1");

    s.dispatcher.script_failure(&id, "downstream error");
    s.manager.run_now(&id).await.unwrap();
    s.drain().await;

    let m = s.metrics().flow_metrics(&id).unwrap();
    assert_eq!(m.failed_executions, 1);
    assert_eq!(m.average_execution_time_ms, 0.0);
    assert_eq!(s.metrics().success_rate(&id), 0.0);
    assert!(m.last_execution_ms.is_some());
}

#[tokio::test]
async fn reset_clears_one_flow_without_touching_others() {
    let s = Scheduler::start().await;
    s.add_scheduled_flow("flow-1", "*/5 * * * *").await;
    s.add_scheduled_flow("flow-2", "*/5 * * * *").await;
    s.manager.run_now(&flow("flow-1")).await.unwrap();
    s.manager.run_now(&flow("flow-2")).await.unwrap();
    s.drain().await;

    s.metrics().reset_flow(&flow("flow-1"));

    assert!(s.metrics().flow_metrics(&flow("flow-1")).is_none());
    assert_eq!(
        s.metrics().flow_metrics(&flow("flow-2")).unwrap().successful_executions,
        1
    );
}
