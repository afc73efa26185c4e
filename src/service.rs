//! The typed alarm API surface
//!
//! Translates create/delete/describe calls into store mutations and
//! scheduler calls. This layer owns no state of its own; the store is
//! authoritative for definitions and the scheduler for tasks.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use crate::scheduler::{AlarmScheduler, SchedulerError};
use crate::store::{AlarmStore, StoreError};
use crate::{
    ActionRef, AlarmDefinition, AlarmRef, AlarmStateValue, ComparisonOperator, MetricReference,
    Scope,
};

/// State reason stamped on every freshly created or overwritten alarm.
pub const INITIAL_UNCHECKED_REASON: &str = "Unchecked: Initial alarm creation";

/// Result type alias for API surface operations
pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    /// The alarm store failed
    Store(StoreError),

    /// The scheduler rejected the operation
    Scheduler(SchedulerError),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Store(err) => write!(f, "{}", err),
            ServiceError::Scheduler(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServiceError::Store(err) => Some(err),
            ServiceError::Scheduler(err) => Some(err),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        ServiceError::Store(err)
    }
}

impl From<SchedulerError> for ServiceError {
    fn from(err: SchedulerError) -> Self {
        ServiceError::Scheduler(err)
    }
}

/// Payload of a create-or-update call. Identity is the name plus the scope
/// the call is made against; everything else is the alarm's configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmSpec {
    pub name: String,
    pub comparison_operator: ComparisonOperator,
    pub metric: MetricReference,
    pub threshold: f64,
    pub period_seconds: u64,
    #[serde(default = "default_evaluation_periods")]
    pub evaluation_periods: u32,
    #[serde(default)]
    pub alarm_actions: Vec<ActionRef>,
    #[serde(default)]
    pub ok_actions: Vec<ActionRef>,
    #[serde(default)]
    pub insufficient_data_actions: Vec<ActionRef>,
}

fn default_evaluation_periods() -> u32 {
    1
}

/// Filters for describe calls. Empty filters match everything in the scope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DescribeAlarmsFilter {
    #[serde(default)]
    pub alarm_names: Vec<String>,
    pub alarm_name_prefix: Option<String>,
    pub state_value: Option<AlarmStateValue>,
}

/// The alarm service: upsert, delete and describe, wired to one store and
/// one scheduler at construction time.
pub struct AlarmService {
    store: Arc<dyn AlarmStore>,
    scheduler: Arc<AlarmScheduler>,
    schedule_on_create: bool,
}

impl AlarmService {
    pub fn new(
        store: Arc<dyn AlarmStore>,
        scheduler: Arc<AlarmScheduler>,
        schedule_on_create: bool,
    ) -> Self {
        Self {
            store,
            scheduler,
            schedule_on_create,
        }
    }

    /// Create or overwrite an alarm.
    ///
    /// The stored definition always starts over in INSUFFICIENT_DATA with
    /// the unchecked reason. Scheduling depends on the configured policy:
    /// with `schedule_on_create` the new definition is armed immediately;
    /// without it, only an alarm that already had a task gets its task
    /// rebuilt (the old evaluator must never keep running against a
    /// replaced definition), and a brand-new alarm waits for the next
    /// restart sweep.
    #[instrument(skip(self, spec), fields(scope = %scope, alarm = %spec.name))]
    pub async fn put_metric_alarm(
        &self,
        scope: &Scope,
        spec: AlarmSpec,
    ) -> ServiceResult<AlarmDefinition> {
        let definition = AlarmDefinition {
            tenant: scope.tenant.clone(),
            region: scope.region.clone(),
            name: spec.name,
            comparison_operator: spec.comparison_operator,
            metric: spec.metric,
            threshold: spec.threshold,
            period_seconds: spec.period_seconds,
            evaluation_periods: spec.evaluation_periods,
            alarm_actions: spec.alarm_actions,
            ok_actions: spec.ok_actions,
            insufficient_data_actions: spec.insufficient_data_actions,
            state: AlarmStateValue::InsufficientData,
            state_reason: INITIAL_UNCHECKED_REASON.to_string(),
            state_updated_at: Utc::now(),
        };

        self.store.put(scope, definition.clone()).await?;

        if self.schedule_on_create {
            self.scheduler.schedule(&definition)?;
            debug!("scheduled evaluation task on create");
        } else if self.scheduler.reschedule(&definition)? {
            debug!("replaced evaluation task for updated alarm");
        }

        Ok(definition)
    }

    /// Delete alarms by name. Names without a stored alarm or a scheduled
    /// task are skipped silently.
    #[instrument(skip(self, alarm_names), fields(scope = %scope, count = alarm_names.len()))]
    pub async fn delete_alarms(&self, scope: &Scope, alarm_names: &[String]) -> ServiceResult<()> {
        for name in alarm_names {
            let alarm_ref = AlarmRef::from_identity(&scope.tenant, &scope.region, name);

            let removed = self.store.delete(scope, &alarm_ref).await?;
            if !removed {
                trace!("alarm {name} not present in store");
            }

            self.scheduler.delete(&alarm_ref);
        }
        Ok(())
    }

    /// List alarms in a scope, optionally filtered. Pure store read; the
    /// scheduler is not consulted.
    #[instrument(skip(self, filter), fields(scope = %scope))]
    pub async fn describe_alarms(
        &self,
        scope: &Scope,
        filter: &DescribeAlarmsFilter,
    ) -> ServiceResult<Vec<AlarmDefinition>> {
        let mut alarms = self.store.list_all(scope).await?;

        if !filter.alarm_names.is_empty() {
            alarms.retain(|alarm| filter.alarm_names.contains(&alarm.name));
        }
        if let Some(prefix) = &filter.alarm_name_prefix {
            alarms.retain(|alarm| alarm.name.starts_with(prefix.as_str()));
        }
        if let Some(state) = filter.state_value {
            alarms.retain(|alarm| alarm.state == state);
        }

        alarms.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(alarms)
    }
}
