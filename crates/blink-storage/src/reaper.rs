use blink_core::Repository;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace, warn};

/// Handle to a background reclamation task.
///
/// Dropping the handle aborts the task; [`ReaperHandle::shutdown`] stops it
/// after the current pass.
#[derive(Debug)]
pub struct ReaperHandle {
    shutdown: Arc<Notify>,
    task: Option<JoinHandle<()>>,
}

impl ReaperHandle {
    /// Stops the reaper and waits for it to exit.
    pub async fn shutdown(mut self) {
        self.shutdown.notify_one();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "reaper task ended abnormally");
            }
        }
    }
}

impl Drop for ReaperHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Spawns a task that purges expired mappings every `interval`.
///
/// The first pass runs immediately. Purge failures are logged and retried on
/// the next tick; reads never depend on the reaper having run.
///
/// Must be called from within a tokio runtime.
pub fn spawn_reaper<R: Repository>(repository: Arc<R>, interval: Duration) -> ReaperHandle {
    let shutdown = Arc::new(Notify::new());
    let signal = Arc::clone(&shutdown);

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match repository.purge_expired().await {
                        Ok(0) => trace!("no expired mappings to purge"),
                        Ok(removed) => debug!(removed, "purged expired mappings"),
                        Err(e) => warn!(error = %e, "failed to purge expired mappings"),
                    }
                }
                _ = signal.notified() => {
                    debug!("reaper shutting down");
                    break;
                }
            }
        }
    });

    ReaperHandle {
        shutdown,
        task: Some(task),
    }
}
