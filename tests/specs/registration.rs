//! Schedule registration lifecycle specs.

use crate::prelude::*;
use fc_core::ScheduleConfig;

#[tokio::test]
async fn registering_twice_leaves_exactly_one_repeatable_entry() {
    let s = Scheduler::start().await;
    let record = s.add_scheduled_flow("flow-1", "*/5 * * * *").await;

    s.manager.register_scheduled_flow(&record).await.unwrap();
    s.manager.register_scheduled_flow(&record).await.unwrap();

    let repeatables = s.queue.list_repeatables().await.unwrap();
    assert_eq!(repeatables.len(), 1);
    assert_eq!(repeatables[0].key, "schedule-flow-1");

    let scheduled = s.manager.get_scheduled_flows().await.unwrap();
    assert_eq!(scheduled.len(), 1);
}

#[tokio::test]
async fn disabling_removes_the_repeatable_entry() {
    let s = Scheduler::start().await;
    s.add_scheduled_flow("flow-1", "*/5 * * * *").await;
    assert_eq!(s.queue.list_repeatables().await.unwrap().len(), 1);

    s.manager.disable_schedule(&flow("flow-1")).await.unwrap();

    assert!(s.queue.list_repeatables().await.unwrap().is_empty());
    assert!(s.manager.get_scheduled_flows().await.unwrap().is_empty());
}

#[tokio::test]
async fn enabled_flows_stay_listed_while_the_queue_entry_is_missing() {
    let s = Scheduler::start().await;
    // Written to storage without the queue registration step, as left behind
    // by a crash mid-transition.
    let mut record = fc_core::FlowRecord::new("flow-1", "flow-1");
    record.schedule_enabled = true;
    record.schedule_config = Some(ScheduleConfig::enabled("*/5 * * * *").to_json().unwrap());
    s.store.insert(record).await.unwrap();
    assert!(s.queue.list_repeatables().await.unwrap().is_empty());

    let scheduled = s.manager.get_scheduled_flows().await.unwrap();
    assert_eq!(scheduled.len(), 1);
    assert_eq!(scheduled[0].flow_id, flow("flow-1"));
    assert_eq!(scheduled[0].next_run_ms, None);
    assert_eq!(s.manager.health_status().await.scheduled_flows, 1);
}

#[tokio::test]
async fn restart_reconciles_queue_from_persisted_configuration() {
    let s = Scheduler::start().await;
    s.add_scheduled_flow("flow-1", "*/5 * * * *").await;
    s.add_scheduled_flow("flow-2", "0 12 * * *").await;

    // A new manager over the same store but a fresh queue: survives restart.
    let fresh_queue = std::sync::Arc::new(fc_queue::MemoryScheduleQueue::new(s.clock.clone()));
    let manager: Manager =
        fc_scheduler::ScheduleManager::new(fc_scheduler::MetricsCollector::new(s.clock.clone()));
    let registered = manager
        .initialize(std::sync::Arc::clone(&s.store), std::sync::Arc::clone(&fresh_queue))
        .await
        .unwrap();
    assert_eq!(registered, 2);
    assert_eq!(fresh_queue.list_repeatables().await.unwrap().len(), 2);
}

#[tokio::test]
async fn flow_scenario_disable_keeps_metrics_history() {
    let s = Scheduler::start().await;
    s.add_scheduled_flow_tz("flow-1", "*/5 * * * *", Some("UTC")).await;

    let scheduled = s.manager.get_scheduled_flows().await.unwrap();
    assert_eq!(scheduled.len(), 1);
    assert_eq!(scheduled[0].flow_id, flow("flow-1"));
    assert_eq!(scheduled[0].cron_expression, "*/5 * * * *");
    assert_eq!(scheduled[0].timezone.as_deref(), Some("UTC"));

    // Run one trigger so flow-1 has execution history.
    s.advance(std::time::Duration::from_secs(5 * 60));
    s.drain().await;
    assert_eq!(
        s.metrics().flow_metrics(&flow("flow-1")).unwrap().successful_executions,
        1
    );

    s.manager.disable_schedule(&flow("flow-1")).await.unwrap();

    assert!(s.manager.get_scheduled_flows().await.unwrap().is_empty());
    assert!(s.queue.list_repeatables().await.unwrap().is_empty());
    // Metrics history survives the disable.
    let m = s.metrics().flow_metrics(&flow("flow-1")).unwrap();
    assert_eq!(m.successful_executions, 1);
    assert_eq!(m.total_executions, 1);
}

#[tokio::test]
async fn invalid_cron_never_reaches_storage_or_queue() {
    let s = Scheduler::start().await;
    s.store
        .insert(fc_core::FlowRecord::new("flow-1", "flow-1"))
        .await
        .unwrap();

    let err = s
        .manager
        .update_schedule(&flow("flow-1"), &ScheduleConfig::enabled("61 * * * *"))
        .await
        .unwrap_err();
    assert!(matches!(err, fc_scheduler::ScheduleError::Configuration(_)));

    let stored = s.store.get(&flow("flow-1")).await.unwrap().unwrap();
    assert!(!stored.schedule_enabled);
    assert!(stored.schedule_config.is_none());
    assert!(s.queue.list_repeatables().await.unwrap().is_empty());
}
