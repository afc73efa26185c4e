//! Metric evaluation collaborator
//!
//! The hub does not read metric data itself; deciding whether an alarm is
//! OK, ALARM or INSUFFICIENT_DATA is delegated to an implementation of
//! [`MetricEvaluator`]. The scheduler calls it once per tick with the
//! freshly re-read definition and treats every failure as transient.

use std::fmt;

use async_trait::async_trait;

use crate::{AlarmDefinition, AlarmStateValue};

/// Result type alias for evaluation calls
pub type EvaluateResult<T> = Result<T, EvaluateError>;

/// Outcome of evaluating one alarm once.
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmPoll {
    pub state: AlarmStateValue,
    pub reason: String,
}

impl AlarmPoll {
    pub fn new(state: AlarmStateValue, reason: impl Into<String>) -> Self {
        Self {
            state,
            reason: reason.into(),
        }
    }
}

/// Transient, tick-level evaluation failures. The scheduler logs these and
/// retries on the next tick; they never cancel the task.
#[derive(Debug)]
pub enum EvaluateError {
    /// The metric data source could not be reached
    MetricUnavailable(String),

    /// Anything else that went wrong inside the evaluator
    Internal(String),
}

impl fmt::Display for EvaluateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluateError::MetricUnavailable(msg) => {
                write!(f, "metric data unavailable: {}", msg)
            }
            EvaluateError::Internal(msg) => write!(f, "evaluation failed: {}", msg),
        }
    }
}

impl std::error::Error for EvaluateError {}

/// Decides the state of one alarm from its current definition.
///
/// Implementations must be `Send + Sync`; one shared instance serves every
/// evaluation task concurrently.
#[async_trait]
pub trait MetricEvaluator: Send + Sync {
    async fn evaluate(&self, definition: &AlarmDefinition) -> EvaluateResult<AlarmPoll>;
}

/// The shipped default: never evaluates anything.
///
/// Threshold math against real metric data is not implemented in this
/// service; every poll reports INSUFFICIENT_DATA, which keeps alarms in
/// their created state until a real evaluator is plugged in.
pub struct UncheckedEvaluator;

#[async_trait]
impl MetricEvaluator for UncheckedEvaluator {
    async fn evaluate(&self, _definition: &AlarmDefinition) -> EvaluateResult<AlarmPoll> {
        Ok(AlarmPoll::new(
            AlarmStateValue::InsufficientData,
            "Insufficient Data: no metric evaluation configured",
        ))
    }
}
