//! In-process progress bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`ProgressBus`] is the hub long-running batch operations report
//! through. It is designed to be shared via `Arc<ProgressBus>`; the
//! transport that pushes events to clients subscribes on the other side.
//! Delivery is best-effort and at-most-once: losing an event never rolls
//! back or retries the underlying data change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// ProgressEvent
// ---------------------------------------------------------------------------

/// Phase of a long-running job, as reported to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    Started,
    Finished,
}

impl JobPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Finished => "finished",
        }
    }
}

/// One progress notification from a batch operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Identifier of the batch job run.
    pub job_id: Uuid,

    pub phase: JobPhase,

    /// Localization key describing the outcome, resolved by the client.
    pub message_key: String,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    pub fn new(job_id: Uuid, phase: JobPhase, message_key: impl Into<String>) -> Self {
        Self {
            job_id,
            phase,
            message_key: message_key.into(),
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// ProgressBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out bus for [`ProgressEvent`]s.
pub struct ProgressBus {
    sender: broadcast::Sender<ProgressEvent>,
}

impl ProgressBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest un-consumed messages are
    /// dropped and slow receivers observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped;
    /// progress reporting is observational only.
    pub fn publish(&self, event: ProgressEvent) {
        tracing::debug!(job_id = %event.job_id, phase = event.phase.as_str(), "progress event");
        // Ignore the SendError — it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.sender.subscribe()
    }

    /// Number of currently attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ProgressBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let bus = ProgressBus::default();
        let mut rx = bus.subscribe();

        let job_id = Uuid::new_v4();
        bus.publish(ProgressEvent::new(job_id, JobPhase::Started, "mass.publish.started"));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.job_id, job_id);
        assert_eq!(event.phase, JobPhase::Started);
        assert_eq!(event.message_key, "mass.publish.started");
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_dropped_silently() {
        let bus = ProgressBus::default();
        // Must not panic or error.
        bus.publish(ProgressEvent::new(
            Uuid::new_v4(),
            JobPhase::Finished,
            "mass.publish.finished",
        ));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn each_subscriber_sees_every_event() {
        let bus = ProgressBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(ProgressEvent::new(Uuid::new_v4(), JobPhase::Started, "k"));

        assert_eq!(rx1.recv().await.unwrap().message_key, "k");
        assert_eq!(rx2.recv().await.unwrap().message_key, "k");
    }
}
