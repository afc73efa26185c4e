//! Test helpers shared across the integration suite

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use alarmhub::actions::{ActionDispatcher, StateTransition};
use alarmhub::evaluator::{AlarmPoll, EvaluateError, EvaluateResult, MetricEvaluator};
use alarmhub::scheduler::AlarmScheduler;
use alarmhub::service::AlarmSpec;
use alarmhub::store::MemoryAlarmStore;
use alarmhub::{
    AlarmDefinition, AlarmStateValue, ComparisonOperator, MetricReference, Scope,
};
use async_trait::async_trait;
use chrono::Utc;

/// Create a test AlarmSpec with sensible defaults
pub fn create_test_spec(name: &str) -> AlarmSpec {
    AlarmSpec {
        name: name.to_string(),
        comparison_operator: ComparisonOperator::GreaterThanThreshold,
        metric: MetricReference {
            namespace: "system".to_string(),
            metric_name: "cpu_usage".to_string(),
            dimensions: Default::default(),
        },
        threshold: 80.0,
        period_seconds: 1,
        evaluation_periods: 1,
        alarm_actions: vec![],
        ok_actions: vec![],
        insufficient_data_actions: vec![],
    }
}

/// Create a test AlarmDefinition in the unchecked initial state
pub fn create_test_definition(tenant: &str, region: &str, name: &str) -> AlarmDefinition {
    AlarmDefinition {
        tenant: tenant.to_string(),
        region: region.to_string(),
        name: name.to_string(),
        comparison_operator: ComparisonOperator::GreaterThanThreshold,
        metric: MetricReference {
            namespace: "system".to_string(),
            metric_name: "cpu_usage".to_string(),
            dimensions: Default::default(),
        },
        threshold: 80.0,
        period_seconds: 1,
        evaluation_periods: 1,
        alarm_actions: vec![],
        ok_actions: vec![],
        insufficient_data_actions: vec![],
        state: AlarmStateValue::InsufficientData,
        state_reason: "Unchecked: Initial alarm creation".to_string(),
        state_updated_at: Utc::now(),
    }
}

pub fn test_scope() -> Scope {
    Scope::new("acct-1", "eu-west-1")
}

/// Evaluator that always reports the same state and counts its calls
pub struct FixedEvaluator {
    pub state: AlarmStateValue,
    pub calls: Arc<AtomicUsize>,
}

impl FixedEvaluator {
    pub fn new(state: AlarmStateValue) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                state,
                calls: calls.clone(),
            },
            calls,
        )
    }
}

#[async_trait]
impl MetricEvaluator for FixedEvaluator {
    async fn evaluate(&self, _definition: &AlarmDefinition) -> EvaluateResult<AlarmPoll> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(AlarmPoll::new(self.state, "fixed test evaluation"))
    }
}

/// Evaluator that reports whatever state the stored definition already has,
/// so no transitions ever fire
pub struct IdleEvaluator;

#[async_trait]
impl MetricEvaluator for IdleEvaluator {
    async fn evaluate(&self, definition: &AlarmDefinition) -> EvaluateResult<AlarmPoll> {
        Ok(AlarmPoll::new(definition.state, "unchanged"))
    }
}

/// Evaluator that fails every call
pub struct BrokenEvaluator {
    pub calls: Arc<AtomicUsize>,
}

#[async_trait]
impl MetricEvaluator for BrokenEvaluator {
    async fn evaluate(&self, _definition: &AlarmDefinition) -> EvaluateResult<AlarmPoll> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(EvaluateError::MetricUnavailable(
            "metric source offline".to_string(),
        ))
    }
}

/// Dispatcher that does nothing
pub struct SilentDispatcher;

#[async_trait]
impl ActionDispatcher for SilentDispatcher {
    async fn dispatch(&self, _definition: &AlarmDefinition, _transition: &StateTransition) {}
}

/// Build a started scheduler over a fresh in-memory store with an evaluator
/// that never transitions anything
pub fn idle_scheduler() -> (Arc<MemoryAlarmStore>, Arc<AlarmScheduler>) {
    let store = Arc::new(MemoryAlarmStore::new());
    let scheduler = Arc::new(AlarmScheduler::new(
        store.clone(),
        Arc::new(IdleEvaluator),
        Arc::new(SilentDispatcher),
    ));
    scheduler.start();
    (store, scheduler)
}
