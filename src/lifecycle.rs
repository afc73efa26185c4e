//! Lifecycle coordination between the host service and the scheduler
//!
//! The host drives six events: after init, before/after state reset,
//! before/after state load, and before stop. The coordinator maps them onto
//! the one owned [`AlarmScheduler`] so the scheduler is never running during
//! a state mutation and always running otherwise.
//!
//! After a state load the scheduler comes back empty while the store is
//! full, so a restart sweep runs in the background: it waits until the host
//! reports itself running, then re-arms every persisted alarm across all
//! tenants and regions. The wait has no timeout unless one is configured -
//! a host that never becomes ready leaves alarms unscheduled, which is
//! logged loudly but never escalated (the host's own transition cannot be
//! aborted from here).

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, trace, warn};

use crate::config::SchedulerSettings;
use crate::scheduler::AlarmScheduler;
use crate::store::AlarmStore;
use crate::AlarmDefinition;

/// Publisher half of the host readiness signal.
///
/// The host flips this once it considers itself serving; the restart sweep
/// blocks on the subscriber half.
pub struct ReadinessSignal {
    tx: watch::Sender<bool>,
}

impl ReadinessSignal {
    pub fn new() -> (Self, ReadinessProbe) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, ReadinessProbe { rx })
    }

    pub fn set_running(&self, running: bool) {
        // send only fails with no receivers, which is fine here
        let _ = self.tx.send(running);
    }
}

/// Subscriber half of the host readiness signal.
#[derive(Clone)]
pub struct ReadinessProbe {
    rx: watch::Receiver<bool>,
}

impl ReadinessProbe {
    pub fn is_running(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until the host reports running. Reacts to the watch notification
    /// but also polls at `poll_interval` as a fallback, warning periodically
    /// so a stuck host is visible in the logs.
    async fn wait_running(&mut self, poll_interval: Duration) {
        let mut polls: u32 = 0;

        loop {
            if *self.rx.borrow() {
                return;
            }

            tokio::select! {
                changed = self.rx.changed() => {
                    if changed.is_err() {
                        // publisher gone; nothing left but the poll fallback
                        tokio::time::sleep(poll_interval).await;
                    }
                }
                _ = tokio::time::sleep(poll_interval) => {
                    trace!("host not running yet");
                }
            }

            polls += 1;
            if polls % 30 == 0 {
                warn!("still waiting for host to report running ({polls} polls)");
            }
        }
    }
}

/// Binds the scheduler's run state to the host's lifecycle events.
///
/// Handlers never fail: a scheduler that cannot be stopped cleanly must not
/// abort the host's own transition, so everything here is best-effort and
/// logged.
pub struct LifecycleCoordinator {
    scheduler: Arc<AlarmScheduler>,
    store: Arc<dyn AlarmStore>,
    readiness: ReadinessProbe,
    poll_interval: Duration,
    sweep_timeout: Option<Duration>,
}

impl LifecycleCoordinator {
    pub fn new(
        scheduler: Arc<AlarmScheduler>,
        store: Arc<dyn AlarmStore>,
        readiness: ReadinessProbe,
        settings: &SchedulerSettings,
    ) -> Self {
        Self {
            scheduler,
            store,
            readiness,
            poll_interval: Duration::from_secs(settings.readiness_poll_interval_secs.max(1)),
            sweep_timeout: settings.restart_sweep_timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn on_after_init(&self) {
        debug!("lifecycle: after init");
        self.scheduler.start();
    }

    pub fn on_before_state_reset(&self) {
        debug!("lifecycle: before state reset");
        self.scheduler.shutdown();
    }

    pub fn on_after_state_reset(&self) {
        debug!("lifecycle: after state reset");
        self.scheduler.start();
    }

    pub fn on_before_state_load(&self) {
        debug!("lifecycle: before state load");
        self.scheduler.shutdown();
    }

    /// Start the scheduler, then re-arm all persisted alarms in the
    /// background once the host reports itself running.
    ///
    /// Returns the sweep's join handle; the event itself is never blocked on
    /// the wait.
    pub fn on_after_state_load(&self) -> JoinHandle<()> {
        debug!("lifecycle: after state load");
        self.scheduler.start();

        let sweep = RestartSweep {
            scheduler: Arc::clone(&self.scheduler),
            store: Arc::clone(&self.store),
            readiness: self.readiness.clone(),
            poll_interval: self.poll_interval,
            timeout: self.sweep_timeout,
        };
        tokio::spawn(sweep.run())
    }

    pub fn on_before_stop(&self) {
        debug!("lifecycle: before stop");
        self.scheduler.shutdown();
    }
}

/// The post-load re-arm pass.
struct RestartSweep {
    scheduler: Arc<AlarmScheduler>,
    store: Arc<dyn AlarmStore>,
    readiness: ReadinessProbe,
    poll_interval: Duration,
    timeout: Option<Duration>,
}

impl RestartSweep {
    #[instrument(skip(self))]
    async fn run(mut self) {
        debug!("restart sweep waiting for host readiness");

        let wait = self.readiness.wait_running(self.poll_interval);
        match self.timeout {
            Some(timeout) => {
                if tokio::time::timeout(timeout, wait).await.is_err() {
                    warn!(
                        "host never reported running within {timeout:?}; \
                         alarms remain unscheduled until the next state load"
                    );
                    return;
                }
            }
            None => wait.await,
        }

        let definitions = match self.collect_definitions().await {
            Ok(definitions) => definitions,
            Err(e) => {
                warn!("restart sweep could not list alarms: {e}");
                return;
            }
        };

        let count = definitions.len();
        match self.scheduler.restart_existing(&definitions) {
            Ok(()) => debug!("restart sweep re-armed {count} alarms"),
            Err(e) => warn!("restart sweep aborted: {e}"),
        }
    }

    /// Every definition in every scope the store currently holds.
    async fn collect_definitions(&self) -> crate::store::StoreResult<Vec<AlarmDefinition>> {
        let mut definitions = Vec::new();
        for scope in self.store.scopes().await? {
            definitions.extend(self.store.list_all(&scope).await?);
        }
        Ok(definitions)
    }
}
