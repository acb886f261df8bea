//! Expiry Sweep Task
//!
//! Background task that periodically removes expired entries from a store.
//! Reads never depend on it having run; it only reclaims memory.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::cache::CacheStore;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Handle to a running sweep task.
///
/// `shutdown` stops the timer and waits for an in-flight pass to finish.
/// Dropping the handle without calling it aborts the task, so the timer
/// never outlives its owner.
#[derive(Debug)]
pub struct Sweeper {
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Sweeper {
    /// Spawns the sweep loop on the runtime behind `runtime`.
    ///
    /// Each pass takes the store lock exclusively and removes every entry
    /// whose expiry has passed.
    ///
    /// # Example
    /// ```ignore
    /// let store = Arc::new(Mutex::new(CacheStore::<String>::new()));
    /// let sweeper = Sweeper::spawn(&Handle::current(), store.clone(), Duration::from_secs(1));
    /// // Later, during shutdown:
    /// sweeper.shutdown().await;
    /// ```
    pub fn spawn<T>(runtime: &Handle, store: Arc<Mutex<CacheStore<T>>>, interval: Duration) -> Self
    where
        T: Send + 'static,
    {
        let interval = interval.max(MIN_INTERVAL);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let handle = runtime.spawn(async move {
            info!("Starting expiry sweep with interval of {:?}", interval);

            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        let removed = {
                            let mut guard = store.lock().await;
                            guard.cleanup_expired()
                        };

                        if removed > 0 {
                            info!("Expiry sweep: removed {} expired entries", removed);
                        } else {
                            debug!("Expiry sweep: no expired entries found");
                        }
                    }
                }
            }

            info!("Expiry sweep stopped");
        });

        Self {
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    /// Stops the timer and waits for the task to exit.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                warn!("Expiry sweep ended abnormally: {}", err);
            }
        }
    }

    /// True once the task has exited.
    pub fn is_finished(&self) -> bool {
        self.handle
            .as_ref()
            .map_or(true, |handle| handle.is_finished())
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
