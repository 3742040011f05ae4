//! Watch scheduler background tasks.
//!
//! Each registered watch gets one long-lived loop. On every tick the loop
//! spawns a check and goes straight back to waiting; it never awaits the
//! check. Checks for the same watch may therefore overlap when a check takes
//! longer than the interval, and each of them may write to the store.
//!
//! Failed checks report back through the loop's own inbox and are logged by
//! the loop. They are never retried and never stop the schedule.
//!
//! # Graceful Shutdown
//!
//! Every loop owns a child of the scheduler's cancellation token. When the
//! token is cancelled the loop exits and in-flight checks are dropped.

use crate::errors::CheckError;
use crate::models::{CheckOutcome, WatchTask};
use crate::observability::set_tasks_active;
use crate::services::checker::Checker;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

/// Run the schedule for one watch until `cancel_token` is cancelled.
///
/// The first check starts one interval after the loop starts. Ticks that are
/// missed while the runtime is busy are skipped rather than replayed.
///
/// A zero interval, or one too large to schedule, is logged and the loop
/// returns without running any check.
///
/// # Arguments
///
/// * `task` - The watch to poll
/// * `checker` - Runs a single fetch-and-check
/// * `cancel_token` - Token for graceful shutdown
#[instrument(skip_all, name = "watch.task.scheduler", fields(task_id = %task.id))]
pub async fn start_watch_scheduler(
    task: WatchTask,
    checker: Arc<dyn Checker>,
    cancel_token: CancellationToken,
) {
    info!(
        target: "watch.task.scheduler",
        url = %task.url,
        pattern_kind = task.pattern.kind().as_str(),
        interval = ?task.interval,
        "Starting watch scheduler"
    );

    let period = task.interval;
    let Some(first_tick) = first_tick(period) else {
        error!(
            target: "watch.task.scheduler",
            interval = ?period,
            "Watch interval cannot be scheduled, not polling"
        );
        return;
    };
    let mut interval = tokio::time::interval_at(first_tick, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // Unbounded so a spawned check never waits on the loop to report
    let (failure_tx, mut failure_rx) = mpsc::unbounded_channel::<CheckError>();
    let task = Arc::new(task);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                spawn_check(
                    task.clone(),
                    checker.clone(),
                    failure_tx.clone(),
                    cancel_token.clone(),
                );
            }
            Some(err) = failure_rx.recv() => {
                warn!(
                    target: "watch.task.scheduler",
                    url = %task.url,
                    error_kind = err.kind(),
                    error = %err,
                    "Error encountered"
                );
            }
            _ = cancel_token.cancelled() => {
                info!(
                    target: "watch.task.scheduler",
                    "Watch scheduler received shutdown signal, exiting"
                );
                break;
            }
        }
    }

    info!(
        target: "watch.task.scheduler",
        "Watch scheduler stopped"
    );
}

/// Deadline of the first tick, one period from now.
fn first_tick(period: Duration) -> Option<Instant> {
    if period.is_zero() {
        return None;
    }
    Instant::now().checked_add(period)
}

/// Launch one check without waiting for it.
fn spawn_check(
    task: Arc<WatchTask>,
    checker: Arc<dyn Checker>,
    failures: mpsc::UnboundedSender<CheckError>,
    cancel_token: CancellationToken,
) {
    tokio::spawn(async move {
        tokio::select! {
            outcome = checker.check(&task) => {
                if let CheckOutcome::Failed(err) = outcome {
                    // Loop already gone means shutdown; nothing left to report to
                    let _ = failures.send(err);
                }
            }
            _ = cancel_token.cancelled() => {}
        }
    });
}

/// Starts and owns the watch loops.
///
/// Cloning is cheap; clones share the checker, the root cancellation token,
/// and the active-watch counter.
#[derive(Clone)]
pub struct WatchScheduler {
    checker: Arc<dyn Checker>,
    cancel_token: CancellationToken,
    active: Arc<AtomicUsize>,
}

impl WatchScheduler {
    pub fn new(checker: Arc<dyn Checker>, cancel_token: CancellationToken) -> Self {
        Self {
            checker,
            cancel_token,
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Start polling `task`. Runs until the scheduler is shut down.
    pub fn schedule(&self, task: WatchTask) -> JoinHandle<()> {
        let checker = self.checker.clone();
        let cancel_token = self.cancel_token.child_token();
        let guard = ActiveWatch::register(self.active.clone());

        tokio::spawn(async move {
            let _guard = guard;
            start_watch_scheduler(task, checker, cancel_token).await;
        })
    }

    /// Number of watch loops currently running.
    pub fn active_count(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Stop every watch loop and in-flight check.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

/// Counts one running loop; released when the loop's task ends, even by panic.
struct ActiveWatch {
    active: Arc<AtomicUsize>,
}

impl ActiveWatch {
    fn register(active: Arc<AtomicUsize>) -> Self {
        set_tasks_active(active.fetch_add(1, Ordering::SeqCst) + 1);
        Self { active }
    }
}

impl Drop for ActiveWatch {
    fn drop(&mut self) {
        set_tasks_active(self.active.fetch_sub(1, Ordering::SeqCst).saturating_sub(1));
    }
}
