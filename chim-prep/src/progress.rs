//! Progress event listener
//!
//! Owns one subscription to the [`EventBus`] for the lifetime of a page.
//! Every `ProgressUpdated` event overwrites the shared progress rate
//! (last write wins, so duplicates are harmless). The subscription ends when
//! [`ProgressEventListener::stop`] is called, when the listener is dropped, or
//! when its cancellation token fires; no event is applied after that.

use crate::state::SharedState;
use chim_common::events::{EventBus, ImporterEvent};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

pub struct ProgressEventListener {
    subscription_id: Uuid,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ProgressEventListener {
    /// Subscribe to `bus` and start applying progress events to `state`
    ///
    /// The receiver is registered before this returns, so events emitted
    /// right after the call are not missed.
    pub fn subscribe(bus: &EventBus, state: SharedState, cancel: CancellationToken) -> Self {
        let subscription_id = Uuid::new_v4();
        let rx = bus.subscribe();
        debug!(%subscription_id, "Progress listener subscribed");

        let handle = tokio::spawn(run_listener(subscription_id, rx, state, cancel.clone()));

        Self {
            subscription_id,
            cancel,
            handle: Some(handle),
        }
    }

    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled()
            && self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Unsubscribe. Safe to call more than once.
    pub fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!(subscription_id = %self.subscription_id, "Progress listener unsubscribed");
        }
    }
}

impl Drop for ProgressEventListener {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_listener(
    subscription_id: Uuid,
    mut rx: broadcast::Receiver<ImporterEvent>,
    state: SharedState,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            event = rx.recv() => event,
        };

        match event {
            Ok(ImporterEvent::ProgressUpdated { progress, .. }) => {
                let mut guard = state.write().await;
                // Teardown may have happened while waiting for the lock
                if cancel.is_cancelled() {
                    break;
                }
                guard.progress_rate = Some(progress.rate);
                debug!(%subscription_id, rate = progress.rate, "Progress rate updated");
            }
            Ok(ImporterEvent::FeedStatus { connected, .. }) => {
                if connected {
                    debug!(%subscription_id, "Progress feed connected");
                } else {
                    warn!(%subscription_id, "Progress feed disconnected");
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                // Only the latest rate matters
                debug!(%subscription_id, skipped, "Progress listener lagged");
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!(%subscription_id, "Event bus closed");
                break;
            }
        }
    }
}
