//! Event types for the CHIM event system
//!
//! Provides the importer event definitions and the EventBus that carries
//! pushed progress from the transport feed to in-process listeners.

mod progress_types;

pub use progress_types::{ProgressCount, ProgressEvent};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Importer event types
///
/// Events are broadcast via EventBus and serialize with a `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ImporterEvent {
    /// Backend pushed a new progress rate for the active job
    ProgressUpdated {
        progress: ProgressEvent,
        /// When the client received the push
        received_at: chrono::DateTime<chrono::Utc>,
    },

    /// Push transport connected or dropped
    FeedStatus {
        connected: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl ImporterEvent {
    pub fn progress(progress: ProgressEvent) -> Self {
        ImporterEvent::ProgressUpdated {
            progress,
            received_at: chrono::Utc::now(),
        }
    }

    pub fn feed_status(connected: bool) -> Self {
        ImporterEvent::FeedStatus {
            connected,
            timestamp: chrono::Utc::now(),
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central distribution bus for importer events
///
/// Wraps `tokio::sync::broadcast`:
/// - Non-blocking publish (slow subscribers lag instead of blocking the feed)
/// - Multiple concurrent subscribers
/// - Dropping a receiver unsubscribes it
///
/// # Examples
///
/// ```
/// use chim_common::events::{EventBus, ImporterEvent, ProgressEvent};
///
/// let bus = EventBus::new(16);
/// let mut rx = bus.subscribe();
/// bus.emit_lossy(ImporterEvent::progress(ProgressEvent::with_rate(12.5)));
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ImporterEvent>,
}

impl EventBus {
    /// Creates a new EventBus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<ImporterEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: ImporterEvent,
    ) -> Result<usize, broadcast::error::SendError<ImporterEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: ImporterEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
