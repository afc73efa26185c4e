pub mod actions;
pub mod api;
pub mod config;
pub mod evaluator;
pub mod lifecycle;
pub mod scheduler;
pub mod service;
pub mod store;

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The (tenant, region) pair every store and API call is scoped by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub tenant: String,
    pub region: String,
}

impl Scope {
    pub fn new(tenant: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            tenant: tenant.into(),
            region: region.into(),
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.tenant, self.region)
    }
}

/// Stable opaque reference to an alarm, derived from its identity alone.
///
/// The same `(tenant, region, name)` always yields the same ref, so it can be
/// recomputed anywhere without a lookup. Tenant and region must not contain
/// `:`; the name is unrestricted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlarmRef(String);

impl AlarmRef {
    pub fn from_identity(tenant: &str, region: &str, name: &str) -> Self {
        AlarmRef(format!("arn:alarmhub:{region}:{tenant}:alarm/{name}"))
    }

    /// Recover `(tenant, region, name)` from a ref. `None` for refs this
    /// service did not mint.
    pub fn parse(&self) -> Option<(String, String, String)> {
        let mut parts = self.0.splitn(5, ':');
        if parts.next()? != "arn" || parts.next()? != "alarmhub" {
            return None;
        }
        let region = parts.next()?;
        let tenant = parts.next()?;
        let name = parts.next()?.strip_prefix("alarm/")?;
        Some((tenant.to_string(), region.to_string(), name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AlarmRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque reference to an action callback, e.g. a webhook URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionRef(pub String);

impl ActionRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOperator {
    GreaterThanThreshold,
    GreaterThanOrEqualToThreshold,
    LessThanThreshold,
    LessThanOrEqualToThreshold,
}

impl ComparisonOperator {
    /// Whether `value` crosses `threshold` under this operator.
    pub fn compares(&self, value: f64, threshold: f64) -> bool {
        match self {
            ComparisonOperator::GreaterThanThreshold => value > threshold,
            ComparisonOperator::GreaterThanOrEqualToThreshold => value >= threshold,
            ComparisonOperator::LessThanThreshold => value < threshold,
            ComparisonOperator::LessThanOrEqualToThreshold => value <= threshold,
        }
    }
}

/// Current state of an alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmStateValue {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "ALARM")]
    Alarm,
    #[serde(rename = "INSUFFICIENT_DATA")]
    InsufficientData,
}

impl AlarmStateValue {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlarmStateValue::Ok => "OK",
            AlarmStateValue::Alarm => "ALARM",
            AlarmStateValue::InsufficientData => "INSUFFICIENT_DATA",
        }
    }
}

impl std::fmt::Display for AlarmStateValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The metric an alarm watches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricReference {
    pub namespace: String,
    pub metric_name: String,
    #[serde(default)]
    pub dimensions: BTreeMap<String, String>,
}

/// A persisted alarm definition.
///
/// Identity is `(tenant, region, name)`; everything else is payload. The
/// store owns these; the scheduler only keeps the ref and re-fetches the
/// definition on every evaluation tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmDefinition {
    pub tenant: String,
    pub region: String,
    pub name: String,
    pub comparison_operator: ComparisonOperator,
    pub metric: MetricReference,
    pub threshold: f64,
    /// Evaluation period in seconds (tick interval).
    pub period_seconds: u64,
    /// Number of periods a breach must persist before transitioning.
    pub evaluation_periods: u32,
    #[serde(default)]
    pub alarm_actions: Vec<ActionRef>,
    #[serde(default)]
    pub ok_actions: Vec<ActionRef>,
    #[serde(default)]
    pub insufficient_data_actions: Vec<ActionRef>,
    pub state: AlarmStateValue,
    pub state_reason: String,
    pub state_updated_at: DateTime<Utc>,
}

impl AlarmDefinition {
    pub fn alarm_ref(&self) -> AlarmRef {
        AlarmRef::from_identity(&self.tenant, &self.region, &self.name)
    }

    pub fn scope(&self) -> Scope {
        Scope::new(self.tenant.clone(), self.region.clone())
    }

    /// Tick interval for the evaluation task. Floored at one second so a
    /// zero period can never produce a busy loop.
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_seconds.max(1))
    }

    /// The action callbacks configured for transitions into `state`.
    pub fn actions_for(&self, state: AlarmStateValue) -> &[ActionRef] {
        match state {
            AlarmStateValue::Ok => &self.ok_actions,
            AlarmStateValue::Alarm => &self.alarm_actions,
            AlarmStateValue::InsufficientData => &self.insufficient_data_actions,
        }
    }
}
