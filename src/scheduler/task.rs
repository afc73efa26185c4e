//! Per-alarm evaluation task
//!
//! Each scheduled alarm gets one of these, spawned as its own tokio task.
//! The loop re-reads the stored definition on every tick so API-driven
//! updates are picked up without rescheduling, evaluates it, and on a state
//! change writes the new state back and dispatches the matching actions.
//!
//! ## Message Flow
//!
//! ```text
//! Timer tick → re-read definition → evaluate → state changed?
//!                                               ├─ no: wait for next tick
//!                                               └─ yes: persist + dispatch actions
//! ```
//!
//! Tick-level failures (store read, evaluation, persist) are logged and
//! retried on the next tick; they never terminate the task.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, instrument, trace, warn};

use crate::actions::{ActionDispatcher, StateTransition};
use crate::evaluator::MetricEvaluator;
use crate::store::AlarmStore;
use crate::{AlarmRef, Scope};

/// The evaluation loop for a single alarm.
pub(crate) struct EvaluationTask {
    scope: Scope,
    alarm_ref: AlarmRef,
    period: Duration,
    store: Arc<dyn AlarmStore>,
    evaluator: Arc<dyn MetricEvaluator>,
    actions: Arc<dyn ActionDispatcher>,

    /// Set by the scheduler on cancel; once observed, no further side effect
    /// may happen.
    cancelled: Arc<AtomicBool>,
}

impl EvaluationTask {
    pub(crate) fn new(
        scope: Scope,
        alarm_ref: AlarmRef,
        period: Duration,
        store: Arc<dyn AlarmStore>,
        evaluator: Arc<dyn MetricEvaluator>,
        actions: Arc<dyn ActionDispatcher>,
        cancelled: Arc<AtomicBool>,
    ) -> Self {
        Self {
            scope,
            alarm_ref,
            period,
            store,
            evaluator,
            actions,
            cancelled,
        }
    }

    /// Run the evaluation loop until cancelled.
    #[instrument(skip(self), fields(alarm = %self.alarm_ref))]
    pub(crate) async fn run(self) {
        debug!("starting evaluation task");

        let mut ticker = interval(self.period);
        // a stalled tick is skipped, not replayed in a burst
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            if self.cancelled.load(Ordering::SeqCst) {
                break;
            }

            self.tick().await;
        }

        debug!("evaluation task stopped");
    }

    /// One evaluation pass. Logs and swallows every failure.
    async fn tick(&self) {
        let definition = match self.store.get(&self.scope, &self.alarm_ref).await {
            Ok(Some(definition)) => definition,
            Ok(None) => {
                // only delete/shutdown cancel the task; a hole in the store
                // is treated as transient
                warn!("definition missing from store, skipping tick");
                return;
            }
            Err(e) => {
                warn!("failed to re-read definition, retrying next tick: {e}");
                return;
            }
        };

        let poll = match self.evaluator.evaluate(&definition).await {
            Ok(poll) => poll,
            Err(e) => {
                warn!("evaluation failed, retrying next tick: {e}");
                return;
            }
        };

        if poll.state == definition.state {
            trace!("state unchanged ({})", poll.state);
            return;
        }

        if self.cancelled.load(Ordering::SeqCst) {
            return;
        }

        let transition = StateTransition {
            alarm_ref: self.alarm_ref.clone(),
            previous: definition.state,
            current: poll.state,
            reason: poll.reason.clone(),
            at: Utc::now(),
        };

        let mut updated = definition;
        updated.state = poll.state;
        updated.state_reason = poll.reason;
        updated.state_updated_at = transition.at;

        // persist first; if this fails the transition is retried next tick
        // and no action fires for a state the store never saw
        if let Err(e) = self.store.put(&self.scope, updated.clone()).await {
            warn!("failed to persist state transition, retrying next tick: {e}");
            return;
        }

        debug!("state transition {} -> {}", transition.previous, transition.current);

        self.actions.dispatch(&updated, &transition).await;
    }
}
