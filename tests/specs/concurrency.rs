//! Worker-pool concurrency specs.

use crate::prelude::*;
use fc_scheduler::WorkerConfig;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn twenty_jobs_across_twenty_flows_drain_with_concurrency_five() {
    let s = Scheduler::start_with(WorkerConfig {
        concurrency: 5,
        ..WorkerConfig::default()
    })
    .await;

    for n in 0..20 {
        let id = format!("flow-{n:02}");
        s.add_scheduled_flow(&id, "*/5 * * * *").await;
        s.manager.run_now(&flow(&id)).await.unwrap();
    }

    let tasks = s.worker.spawn();
    tokio::time::sleep(Duration::from_secs(5)).await;

    let global = s.metrics().global_metrics();
    assert_eq!(global.total_executions, 20);
    assert_eq!(global.successful_executions, 20);
    assert_eq!(global.active_jobs, 0);

    let counts = s.queue.counts().await.unwrap();
    assert_eq!(counts.completed, 20);
    assert_eq!(counts.waiting, 0);
    assert_eq!(counts.active, 0);

    // Every flow got exactly one execution.
    let all = s.metrics().all_metrics();
    assert_eq!(all.len(), 20);
    assert!(all.iter().all(|(_, m)| m.total_executions == 1));

    s.worker.shutdown();
    for task in tasks {
        task.await.unwrap();
    }
}

#[tokio::test(start_paused = true)]
async fn in_flight_executions_bounded_by_concurrency() {
    let s = Scheduler::start_with(WorkerConfig {
        concurrency: 2,
        ..WorkerConfig::default()
    })
    .await;

    for n in 0..4 {
        let id = format!("flow-{n}");
        s.add_scheduled_flow(&id, "*/5 * * * *").await;
        s.dispatcher.hold(&flow(&id));
        s.manager.run_now(&flow(&id)).await.unwrap();
    }

    let tasks = s.worker.spawn();
    tokio::time::sleep(Duration::from_millis(500)).await;

    // Two processors, two held executions in flight; the rest stay queued.
    assert_eq!(s.metrics().global_metrics().active_jobs, 2);
    assert_eq!(s.queue.counts().await.unwrap().waiting, 2);

    for n in 0..4 {
        let id = format!("flow-{n}");
        while !s.dispatcher.release_success(&flow(&id), Default::default()) {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(s.metrics().global_metrics().active_jobs, 0);
    assert_eq!(s.queue.counts().await.unwrap().completed, 4);

    s.worker.shutdown();
    for task in tasks {
        task.await.unwrap();
    }
}
