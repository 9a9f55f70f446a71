//! Lifecycle scheduler
//! Periodically applies due status transitions (start time reached, closing
//! time reached). Admission re-checks closing time on its own, so the period
//! only bounds how stale the stored status may look to readers.
// region:    --- Imports
use crate::auction::lifecycle::AuctionLifecycle;
use crate::store::Store;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info};

// endregion: --- Imports

// region:    --- Lifecycle Scheduler
pub struct LifecycleScheduler<S: Store> {
    lifecycle: Arc<AuctionLifecycle<S>>,
    period: Duration,
}

/// Running scheduler. Dropping it without `stop` leaves the task running
/// until the runtime shuts down.
pub struct SchedulerHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl<S: Store> LifecycleScheduler<S> {
    pub fn new(lifecycle: Arc<AuctionLifecycle<S>>, period: Duration) -> Self {
        Self { lifecycle, period }
    }

    pub fn start(self) -> SchedulerHandle {
        let (stop, mut stopped) = watch::channel(false);
        let lifecycle = self.lifecycle;
        let period = self.period;

        let task = tokio::spawn(async move {
            info!("{:<12} --> started, period={:?}", "Scheduler", period);
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match lifecycle.sweep().await {
                            Ok(events) => {
                                for event in &events {
                                    info!(
                                        "{:<12} --> auction {} is now {:?}",
                                        "Scheduler",
                                        event.auction_id(),
                                        event.status()
                                    );
                                }
                                debug!("{:<12} --> sweep done", "Scheduler");
                            }
                            // a failed sweep is retried on the next tick
                            Err(e) => error!(
                                "{:<12} --> sweep failed: {:?}",
                                "Scheduler", e
                            ),
                        }
                    }
                    changed = stopped.changed() => {
                        if changed.is_err() || *stopped.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("{:<12} --> stopped", "Scheduler");
        });

        SchedulerHandle { stop, task }
    }
}

impl SchedulerHandle {
    /// Signals the loop to exit and waits for it. An in-flight sweep runs
    /// to completion first.
    pub async fn stop(self) -> Result<(), tokio::task::JoinError> {
        let _ = self.stop.send(true);
        self.task.await
    }
}
// endregion: --- Lifecycle Scheduler
