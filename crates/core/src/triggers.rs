//! Downstream trigger notifications — trait for announcing membership deltas
//! after a successful sync.
//!
//! The synchronizer accepts an `Arc<dyn TriggerSink>` and dispatches exactly
//! one event per committed run. Dispatch is fire-and-forget: a sink that
//! drops or fails must never affect the sync result, so the trait is
//! infallible from the caller's side.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

/// Membership delta announced to dependent automations after a sync commits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentEvent {
    pub event_id: Uuid,
    pub segment_id: Uuid,
    pub org_id: Uuid,
    pub member_count: u64,
    pub members_added: u64,
    pub members_removed: u64,
    pub timestamp: DateTime<Utc>,
}

impl SegmentEvent {
    pub fn new(
        segment_id: Uuid,
        org_id: Uuid,
        member_count: u64,
        members_added: u64,
        members_removed: u64,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            segment_id,
            org_id,
            member_count,
            members_added,
            members_removed,
            timestamp: Utc::now(),
        }
    }
}

/// Trait for delivering segment events to downstream trigger systems.
pub trait TriggerSink: Send + Sync {
    fn dispatch(&self, event: SegmentEvent);
}

/// No-op sink for callers that don't wire a trigger system.
pub struct NoOpSink;

impl TriggerSink for NoOpSink {
    fn dispatch(&self, _event: SegmentEvent) {}
}

/// In-memory sink that captures events for testing.
#[derive(Default)]
pub struct CaptureSink {
    events: Mutex<Vec<SegmentEvent>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<SegmentEvent> {
        self.events.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().len()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl TriggerSink for CaptureSink {
    fn dispatch(&self, event: SegmentEvent) {
        self.events.lock().push(event);
    }
}

/// Channel-backed sink with a background drain task.
///
/// Events are handed to an unbounded channel so dispatch never blocks the
/// synchronizer; the drain task is where real delivery (webhooks, message
/// bus) would happen.
pub struct ChannelSink {
    sender: tokio::sync::mpsc::UnboundedSender<SegmentEvent>,
}

impl ChannelSink {
    /// Create the sink and spawn its drain task on the current runtime.
    pub fn spawn() -> Self {
        let (sender, mut receiver) = tokio::sync::mpsc::unbounded_channel::<SegmentEvent>();

        tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                info!(
                    event_id = %event.event_id,
                    segment_id = %event.segment_id,
                    members_added = event.members_added,
                    members_removed = event.members_removed,
                    member_count = event.member_count,
                    "segment trigger delivered"
                );
            }
        });

        Self { sender }
    }
}

impl TriggerSink for ChannelSink {
    fn dispatch(&self, event: SegmentEvent) {
        if let Err(e) = self.sender.send(event) {
            warn!("Segment trigger dropped: {}", e);
        }
    }
}

/// Convenience: create a no-op sink for callers that don't need triggers.
pub fn noop_sink() -> std::sync::Arc<dyn TriggerSink> {
    std::sync::Arc::new(NoOpSink)
}

/// Convenience: create a capture sink for tests.
pub fn capture_sink() -> std::sync::Arc<CaptureSink> {
    std::sync::Arc::new(CaptureSink::new())
}
