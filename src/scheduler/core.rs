//! The alarm scheduler
//!
//! Owns one periodic evaluation task per scheduled alarm and a run state
//! with exactly two phases, stopped and running. Task creation is only
//! meaningful while running; the lifecycle coordinator drives the
//! transitions.
//!
//! ## Invariants
//!
//! - At most one live task per alarm ref. Scheduling a ref that already has
//!   a task cancels the old one first.
//! - All mutations of the task collection and the run state happen under a
//!   single lock, so schedule/delete/shutdown calls against the same ref
//!   serialize and always land in one of the two end states.
//! - A cancelled task takes no further effect once the cancelling call
//!   returns: its cancelled flag is set and its tokio task aborted while
//!   the lock is held.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use super::error::{SchedulerError, SchedulerResult};
use super::task::EvaluationTask;
use crate::actions::ActionDispatcher;
use crate::evaluator::MetricEvaluator;
use crate::store::AlarmStore;
use crate::{AlarmDefinition, AlarmRef};

/// One live evaluation task, owned exclusively by the scheduler.
struct ScheduledTask {
    join: JoinHandle<()>,
    cancelled: Arc<AtomicBool>,
}

impl ScheduledTask {
    /// Flag the task as cancelled and abort it. After this returns the task
    /// performs no further side effects.
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.join.abort();
    }
}

struct SchedulerInner {
    running: bool,
    tasks: HashMap<AlarmRef, ScheduledTask>,
}

/// Scheduler for periodic alarm evaluation.
///
/// Shared as an `Arc` between the lifecycle coordinator (which starts and
/// stops it) and the API surface (which schedules and deletes individual
/// alarms). Constructed once; there is no global handle to swap out.
pub struct AlarmScheduler {
    store: Arc<dyn AlarmStore>,
    evaluator: Arc<dyn MetricEvaluator>,
    actions: Arc<dyn ActionDispatcher>,
    inner: Mutex<SchedulerInner>,
}

impl AlarmScheduler {
    /// Create a scheduler in the stopped state.
    pub fn new(
        store: Arc<dyn AlarmStore>,
        evaluator: Arc<dyn MetricEvaluator>,
        actions: Arc<dyn ActionDispatcher>,
    ) -> Self {
        Self {
            store,
            evaluator,
            actions,
            inner: Mutex::new(SchedulerInner {
                running: false,
                tasks: HashMap::new(),
            }),
        }
    }

    /// Transition to running. Idempotent: starting a running scheduler is a
    /// no-op, not an error.
    pub fn start(&self) {
        let mut inner = self.inner.lock();
        if inner.running {
            debug!("alarm scheduler already running");
            return;
        }
        inner.running = true;
        debug!("alarm scheduler started");
    }

    /// Register or replace the evaluation task for this definition.
    ///
    /// Any existing task for the same ref is cancelled before the new one is
    /// installed. Fails with [`SchedulerError::NotRunning`] while stopped;
    /// requests are not buffered (callers must start the scheduler first).
    pub fn schedule(&self, definition: &AlarmDefinition) -> SchedulerResult<()> {
        let alarm_ref = definition.alarm_ref();

        let mut inner = self.inner.lock();
        if !inner.running {
            return Err(SchedulerError::NotRunning);
        }

        if let Some(old) = inner.tasks.remove(&alarm_ref) {
            debug!("replacing evaluation task for {alarm_ref}");
            old.cancel();
        }

        let task = self.spawn_task(definition, alarm_ref.clone());
        inner.tasks.insert(alarm_ref, task);
        Ok(())
    }

    /// Replace the evaluation task for this definition only if one exists.
    ///
    /// Returns whether a task was replaced. Used on upsert of an existing
    /// alarm: an armed alarm must have its in-flight task cancelled and
    /// rebuilt from the new definition, while a fresh alarm stays
    /// unscheduled until the configured policy arms it. On a stopped
    /// scheduler there is nothing to replace, so this is a `false` no-op
    /// rather than an error.
    pub fn reschedule(&self, definition: &AlarmDefinition) -> SchedulerResult<bool> {
        let alarm_ref = definition.alarm_ref();

        let mut inner = self.inner.lock();
        if !inner.running {
            return Ok(false);
        }

        let Some(old) = inner.tasks.remove(&alarm_ref) else {
            return Ok(false);
        };
        old.cancel();

        let task = self.spawn_task(definition, alarm_ref.clone());
        inner.tasks.insert(alarm_ref, task);
        Ok(true)
    }

    /// Cancel the evaluation task for this ref. Silent no-op when no task
    /// exists, in either run state.
    pub fn delete(&self, alarm_ref: &AlarmRef) {
        let mut inner = self.inner.lock();
        match inner.tasks.remove(alarm_ref) {
            Some(task) => {
                task.cancel();
                debug!("cancelled evaluation task for {alarm_ref}");
            }
            None => {
                trace!("no evaluation task for {alarm_ref}, nothing to cancel");
            }
        }
    }

    /// Re-arm evaluation tasks for every supplied definition.
    ///
    /// Used by the post-load restart sweep. Safe to call on a scheduler that
    /// already has tasks (each ref is replaced, never duplicated); ends with
    /// exactly one task per supplied ref.
    pub fn restart_existing(&self, definitions: &[AlarmDefinition]) -> SchedulerResult<()> {
        debug!("re-arming {} alarms", definitions.len());
        for definition in definitions {
            self.schedule(definition)?;
        }
        Ok(())
    }

    /// Cancel every outstanding task and transition to stopped. Idempotent:
    /// shutting down a stopped scheduler is a no-op.
    pub fn shutdown(&self) {
        let mut inner = self.inner.lock();
        if !inner.running {
            debug!("alarm scheduler already stopped");
            return;
        }

        let count = inner.tasks.len();
        for (_, task) in inner.tasks.drain() {
            task.cancel();
        }
        inner.running = false;

        if count > 0 {
            debug!("alarm scheduler stopped, cancelled {count} tasks");
        } else {
            debug!("alarm scheduler stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.lock().running
    }

    /// Number of live evaluation tasks.
    pub fn task_count(&self) -> usize {
        self.inner.lock().tasks.len()
    }

    /// Refs of all live evaluation tasks, sorted for stable output.
    pub fn scheduled_refs(&self) -> Vec<AlarmRef> {
        let inner = self.inner.lock();
        let mut refs: Vec<AlarmRef> = inner.tasks.keys().cloned().collect();
        refs.sort();
        refs
    }

    fn spawn_task(&self, definition: &AlarmDefinition, alarm_ref: AlarmRef) -> ScheduledTask {
        let cancelled = Arc::new(AtomicBool::new(false));
        let task = EvaluationTask::new(
            definition.scope(),
            alarm_ref,
            definition.period(),
            Arc::clone(&self.store),
            Arc::clone(&self.evaluator),
            Arc::clone(&self.actions),
            Arc::clone(&cancelled),
        );

        ScheduledTask {
            join: tokio::spawn(task.run()),
            cancelled,
        }
    }
}

impl Drop for AlarmScheduler {
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        if !inner.tasks.is_empty() {
            warn!("alarm scheduler dropped with {} live tasks", inner.tasks.len());
            for (_, task) in inner.tasks.drain() {
                task.cancel();
            }
        }
    }
}
