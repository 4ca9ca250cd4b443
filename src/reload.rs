use log::{debug, error, info};
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::{sync::broadcast, task::AbortHandle, time::sleep};

/// Delay between a successful submit and the reload of the wizard service
pub const RELOAD_DELAY: Duration = Duration::from_millis(2000);

/// Posts deferred reload signals to the main loop of one server session
///
/// A scheduled reload runs on a detached task and cannot be cancelled by the
/// wizard. It fires even if the controller that scheduled it is dropped in
/// the meantime. Ending the session with [`ReloadScheduler::cancel_pending`]
/// aborts every reload still waiting, so none of them reaches the next
/// session.
#[derive(Clone, Debug)]
pub struct ReloadScheduler {
    tx: broadcast::Sender<()>,
    pending: Arc<Mutex<Vec<AbortHandle>>>,
}

/// Receipt of a scheduled reload
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ScheduledReload {
    pub delay: Duration,
}

impl ReloadScheduler {
    pub fn new() -> (Self, broadcast::Receiver<()>) {
        let (tx, rx) = broadcast::channel(1);
        let scheduler = Self {
            tx,
            pending: Arc::new(Mutex::new(Vec::new())),
        };
        (scheduler, rx)
    }

    pub fn schedule(&self, delay: Duration) -> ScheduledReload {
        let tx = self.tx.clone();

        info!("reload scheduled in {}ms", delay.as_millis());

        let task = tokio::spawn(async move {
            sleep(delay).await;

            if let Err(e) = tx.send(()) {
                error!("failed to trigger reload: {e:#}");
            }
        });

        match self.pending.lock() {
            Ok(mut pending) => {
                pending.retain(|handle| !handle.is_finished());
                pending.push(task.abort_handle());
            }
            Err(e) => error!("failed to track scheduled reload: {e}"),
        }

        ScheduledReload { delay }
    }

    /// Abort all reloads that have not fired yet
    pub fn cancel_pending(&self) {
        match self.pending.lock() {
            Ok(mut pending) => {
                pending.retain(|handle| !handle.is_finished());
                debug!("cancelling {} pending reload(s)", pending.len());

                for handle in pending.drain(..) {
                    handle.abort();
                }
            }
            Err(e) => error!("failed to cancel pending reloads: {e}"),
        }
    }
}
