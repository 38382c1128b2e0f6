//! Background sweep task.
//!
//! Periodically purges expired entries until told to stop through a watch
//! channel. Stopping is idempotent and can be triggered from any thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::cache::{purge_expired, Entries, FAR_FUTURE};

/// Floor for the sweep period; a zero interval is not a valid tick rate.
const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// Ceiling for the sweep period; `Instant` arithmetic overflows past it.
const MAX_SWEEP_INTERVAL: Duration = FAR_FUTURE;

/// Handle to the background sweep of one cache.
pub(crate) struct Sweeper {
    shutdown_tx: watch::Sender<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
    stopped: AtomicBool,
}

impl Sweeper {
    /// Spawns the sweep on the current runtime, if there is one.
    pub(crate) fn spawn<T>(entries: Arc<Entries<T>>, interval: Duration) -> Self
    where
        T: Send + Sync + 'static,
    {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let interval = interval.clamp(MIN_SWEEP_INTERVAL, MAX_SWEEP_INTERVAL);

        let handle = match Handle::try_current() {
            Ok(runtime) => Some(runtime.spawn(sweep_loop(entries, interval, shutdown_rx))),
            Err(_) => {
                warn!("No tokio runtime; cache sweep disabled, expired entries reclaimed on read");
                None
            }
        };

        Self {
            shutdown_tx,
            handle: Mutex::new(handle),
            stopped: AtomicBool::new(false),
        }
    }

    /// Signals the sweep to exit. Only the first call has an effect.
    pub(crate) fn stop(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        self.shutdown_tx.send_replace(true);
        // The task exits on its next poll; nobody awaits it.
        self.handle.lock().take();
    }

    pub(crate) fn is_running(&self) -> bool {
        if self.stopped.load(Ordering::Acquire) {
            return false;
        }
        self.handle
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn sweep_loop<T>(
    entries: Arc<Entries<T>>,
    period: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) where
    T: Send + Sync + 'static,
{
    info!(interval_ms = period.as_millis() as u64, "Cache sweep started");

    let now = Instant::now();
    let start = now.checked_add(period).unwrap_or(now);
    let mut ticker = interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;

            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                let removed = purge_expired(&entries);
                if removed > 0 {
                    debug!(removed, remaining = entries.len(), "Cache sweep evicted expired entries");
                }
            }
        }
    }

    info!("Cache sweep stopped");
}
