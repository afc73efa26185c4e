//! SQLite persistence behavior
//!
//! Alarm definitions survive a process restart while scheduler state does
//! not; these tests drive the reopen-then-sweep path the lifecycle relies
//! on after a state load.

use std::sync::Arc;

use alarmhub::config::SchedulerSettings;
use alarmhub::lifecycle::{LifecycleCoordinator, ReadinessSignal};
use alarmhub::scheduler::AlarmScheduler;
use alarmhub::store::{AlarmStore, SqliteAlarmStore};
use alarmhub::AlarmStateValue;

use crate::helpers::*;

#[tokio::test]
async fn test_definitions_survive_reopen_and_sweep_rearms_them() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("alarms.db");

    // first process lifetime: persist two alarms
    {
        let store = SqliteAlarmStore::new(&db_path).await.unwrap();
        let a = create_test_definition("acct-1", "eu-west-1", "alarm-a");
        let b = create_test_definition("acct-2", "us-east-1", "alarm-b");
        store.put(&a.scope(), a).await.unwrap();
        store.put(&b.scope(), b).await.unwrap();
        store.close().await.unwrap();
    }

    // second process lifetime: fresh scheduler, sweep re-arms from disk
    let store: Arc<SqliteAlarmStore> = Arc::new(SqliteAlarmStore::new(&db_path).await.unwrap());
    let scheduler = Arc::new(AlarmScheduler::new(
        store.clone(),
        Arc::new(IdleEvaluator),
        Arc::new(SilentDispatcher),
    ));
    let (readiness, probe) = ReadinessSignal::new();
    let settings = SchedulerSettings::default();
    let coordinator = LifecycleCoordinator::new(scheduler.clone(), store.clone(), probe, &settings);

    coordinator.on_after_init();
    readiness.set_running(true);

    let sweep = coordinator.on_after_state_load();
    sweep.await.unwrap();

    assert_eq!(scheduler.task_count(), 2);
}

#[tokio::test]
async fn test_state_transitions_are_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("alarms.db");

    let store = Arc::new(SqliteAlarmStore::new(&db_path).await.unwrap());
    let (evaluator, _calls) = FixedEvaluator::new(AlarmStateValue::Alarm);
    let scheduler = AlarmScheduler::new(store.clone(), Arc::new(evaluator), Arc::new(SilentDispatcher));
    scheduler.start();

    let def = create_test_definition("acct-1", "eu-west-1", "high-cpu");
    store.put(&def.scope(), def.clone()).await.unwrap();
    scheduler.schedule(&def).unwrap();

    // wait (real time) for the first tick to land the transition
    let mut transitioned = false;
    for _ in 0..100 {
        let stored = store
            .get(&def.scope(), &def.alarm_ref())
            .await
            .unwrap()
            .unwrap();
        if stored.state == AlarmStateValue::Alarm {
            transitioned = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
    assert!(transitioned, "transition never persisted");

    scheduler.shutdown();

    // the new state survives a reopen
    store.close().await.unwrap();
    let reopened = SqliteAlarmStore::new(&db_path).await.unwrap();
    let stored = reopened
        .get(&def.scope(), &def.alarm_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.state, AlarmStateValue::Alarm);
}
