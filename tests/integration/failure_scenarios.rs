//! Failure behavior of the evaluation path
//!
//! Tick-level failures are transient by contract: a broken metric source,
//! a missing definition or a failing action endpoint must never kill the
//! evaluation task or the scheduler.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use alarmhub::actions::WebhookNotifier;
use alarmhub::scheduler::AlarmScheduler;
use alarmhub::store::{AlarmStore, MemoryAlarmStore};
use alarmhub::{ActionRef, AlarmStateValue};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::*;

#[tokio::test(start_paused = true)]
async fn test_broken_evaluator_keeps_task_alive() {
    let store = Arc::new(MemoryAlarmStore::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let scheduler = AlarmScheduler::new(
        store.clone(),
        Arc::new(BrokenEvaluator {
            calls: calls.clone(),
        }),
        Arc::new(SilentDispatcher),
    );
    scheduler.start();

    let def = create_test_definition("acct-1", "eu-west-1", "high-cpu");
    store.put(&def.scope(), def.clone()).await.unwrap();
    scheduler.schedule(&def).unwrap();

    tokio::time::sleep(Duration::from_secs(5)).await;

    // every tick failed, yet the task is still scheduled and still ticking
    assert!(calls.load(Ordering::SeqCst) >= 2);
    assert_eq!(scheduler.task_count(), 1);

    // and the stored state never moved
    let stored = store
        .get(&def.scope(), &def.alarm_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.state, AlarmStateValue::InsufficientData);
}

#[tokio::test(start_paused = true)]
async fn test_definition_appearing_late_is_picked_up() {
    let store = Arc::new(MemoryAlarmStore::new());
    let (evaluator, _calls) = FixedEvaluator::new(AlarmStateValue::Alarm);
    let scheduler = AlarmScheduler::new(store.clone(), Arc::new(evaluator), Arc::new(SilentDispatcher));
    scheduler.start();

    // scheduled before the definition exists in the store
    let def = create_test_definition("acct-1", "eu-west-1", "high-cpu");
    scheduler.schedule(&def).unwrap();

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(scheduler.task_count(), 1);

    // once the store catches up, evaluation proceeds and transitions
    store.put(&def.scope(), def.clone()).await.unwrap();
    tokio::time::sleep(Duration::from_secs(3)).await;

    let stored = store
        .get(&def.scope(), &def.alarm_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.state, AlarmStateValue::Alarm);
}

#[tokio::test]
async fn test_alarm_transition_fires_webhook_end_to_end() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(body_partial_json(serde_json::json!({
            "alarm_name": "high-cpu",
            "new_state": "ALARM",
        })))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let store = Arc::new(MemoryAlarmStore::new());
    let (evaluator, _calls) = FixedEvaluator::new(AlarmStateValue::Alarm);
    let scheduler = AlarmScheduler::new(
        store.clone(),
        Arc::new(evaluator),
        Arc::new(WebhookNotifier::new()),
    );
    scheduler.start();

    let mut def = create_test_definition("acct-1", "eu-west-1", "high-cpu");
    def.alarm_actions = vec![ActionRef(format!("{}/hook", mock_server.uri()))];
    store.put(&def.scope(), def.clone()).await.unwrap();
    scheduler.schedule(&def).unwrap();

    // wait (real time) for the tick -> transition -> webhook chain
    let mut delivered = false;
    for _ in 0..100 {
        if !mock_server.received_requests().await.unwrap_or_default().is_empty() {
            delivered = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(delivered, "webhook was never delivered");

    scheduler.shutdown();
}

#[tokio::test]
async fn test_failing_webhook_does_not_stop_evaluation() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let store = Arc::new(MemoryAlarmStore::new());
    let (evaluator, calls) = FixedEvaluator::new(AlarmStateValue::Alarm);
    let scheduler = AlarmScheduler::new(
        store.clone(),
        Arc::new(evaluator),
        Arc::new(WebhookNotifier::new()),
    );
    scheduler.start();

    let mut def = create_test_definition("acct-1", "eu-west-1", "high-cpu");
    def.alarm_actions = vec![ActionRef(format!("{}/hook", mock_server.uri()))];
    store.put(&def.scope(), def.clone()).await.unwrap();
    scheduler.schedule(&def).unwrap();

    // wait for the transition (and its failed delivery) plus further ticks
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
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(transitioned, "alarm never transitioned");

    let calls_at_transition = calls.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(2500)).await;

    // evaluation keeps running after the failed delivery
    assert!(calls.load(Ordering::SeqCst) > calls_at_transition);
    assert_eq!(scheduler.task_count(), 1);

    scheduler.shutdown();
}
