//! Expiry Sweeper Task
//!
//! Background task that periodically reconciles links whose time limit
//! has passed, until it is told to stop.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::coordinator::Coordinator;
use crate::store::LinkStore;

// == Sweeper Handle ==
/// Owner of a running sweeper. Dropping it without calling
/// [`shutdown`](SweeperHandle::shutdown) closes the stop channel, which
/// wakes the task and stops it right away without waiting for a tick.
#[derive(Debug)]
pub struct SweeperHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signals the sweeper to stop and waits for it to finish.
    pub async fn shutdown(self) {
        let _ = self.stop.send(true);
        if let Err(err) = self.task.await {
            warn!("Sweeper task ended abnormally: {}", err);
        }
    }
}

/// Spawns the sweeper.
///
/// Every `interval` the task calls [`Coordinator::sweep_expired`], which
/// takes the coordinator's lock just like a request does. The first sweep
/// runs one interval after spawning.
///
/// # Example
/// ```ignore
/// let coordinator = Arc::new(Coordinator::new(MemoryStore::new(), &config));
/// let sweeper = spawn_sweeper(coordinator.clone(), config.sweep_interval());
/// // Later, during shutdown:
/// sweeper.shutdown().await;
/// ```
pub fn spawn_sweeper<S: LinkStore>(
    coordinator: Arc<Coordinator<S>>,
    interval: Duration,
) -> SweeperHandle {
    let (stop, mut stopped) = watch::channel(false);

    let task = tokio::spawn(async move {
        info!("Starting expiry sweeper with interval of {:?}", interval);

        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = stopped.changed() => {
                    // A closed channel means the handle was dropped.
                    if changed.is_err() || *stopped.borrow() {
                        break;
                    }
                    continue;
                }
            }

            let removed = coordinator.sweep_expired(Utc::now()).await;
            if removed > 0 {
                info!("Expiry sweep: reconciled {} expired links", removed);
            } else {
                debug!("Expiry sweep: nothing due");
            }
        }

        info!("Expiry sweeper stopped");
    });

    SweeperHandle { stop, task }
}
