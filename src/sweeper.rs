//! Background eviction of idle sessions.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, trace};

use crate::config::StoreConfig;
use crate::observer::SessionObserver;
use crate::session::Session;

/// The shared session table, guarded as a whole by one reader/writer lock.
pub(crate) type Table = Arc<RwLock<HashMap<String, Session>>>;

/// Handle to a running sweeper task.
///
/// Owned by the store. Dropping it without calling [`SweeperHandle::stop`]
/// leaves the task running until the process exits.
pub(crate) struct SweeperHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Spawn the sweep loop for `table`.
    ///
    /// The loop wakes once per `sweep_interval`, runs a full eviction pass,
    /// and exits as soon as the stop signal is observed. The first pass
    /// lands one full interval after start.
    pub(crate) fn spawn<O>(table: Table, observer: Arc<O>, config: StoreConfig) -> Self
    where
        O: SessionObserver + 'static,
    {
        let (stop, mut stopped) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker =
                time::interval_at(Instant::now() + config.sweep_interval, config.sweep_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            debug!(
                idle_timeout = ?config.idle_timeout,
                sweep_interval = ?config.sweep_interval,
                "Session sweeper started"
            );

            loop {
                tokio::select! {
                    _ = stopped.changed() => break,
                    _ = ticker.tick() => {
                        sweep(&table, observer.as_ref(), &config).await;
                    }
                }
            }

            debug!("Session sweeper stopped");
        });

        Self { stop, task }
    }

    /// Signal the sweep loop to exit and wait for it to finish.
    ///
    /// A pass already underway completes before the signal is observed, so
    /// no half-applied sweep is ever visible to clients. A panic inside the
    /// sweeper is a programming defect and is propagated, not swallowed.
    pub(crate) async fn stop(self) {
        let _ = self.stop.send(true);
        if let Err(err) = self.task.await {
            if err.is_panic() {
                std::panic::resume_unwind(err.into_panic());
            }
        }
    }
}

/// Run one eviction pass: a single scan of the table under the write lock.
///
/// Eviction events and logging fire after the lock is released, so
/// observers can never block client operations.
async fn sweep<O: SessionObserver>(table: &Table, observer: &O, config: &StoreConfig) -> usize {
    let mut evicted = Vec::new();

    {
        let mut table = table.write().await;
        let now = Instant::now();
        table.retain(|session_id, session| {
            if session.is_idle(config.idle_timeout, now) {
                evicted.push((session_id.clone(), session.created_at));
                false
            } else {
                true
            }
        });
    }

    for (session_id, created_at) in &evicted {
        debug!(session_id = %session_id, created_at = %created_at, "Evicted idle session");
        observer.on_evicted(session_id);
    }

    if !evicted.is_empty() {
        trace!(count = evicted.len(), "Sweep pass complete");
    }

    evicted.len()
}
