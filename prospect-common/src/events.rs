//! Door event types and EventBus
//!
//! The door update use case publishes [`DoorEvent`]s after its write
//! commits. The statistics sync queue is the main subscriber; reporting
//! layers may subscribe as well.

use crate::status::DoorStatus;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Events emitted by door writes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DoorEvent {
    /// A door's status was written (including same-status re-saves)
    ///
    /// Triggers:
    /// - Statistics sync for the owning salesperson
    DoorStatusChanged {
        door_id: Uuid,
        building_id: Uuid,
        old_status: DoorStatus,
        new_status: DoorStatus,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Doors were created for a newly provisioned building
    BuildingProvisioned {
        building_id: Uuid,
        door_count: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl DoorEvent {
    /// Building whose statistics may be affected
    pub fn building_id(&self) -> Uuid {
        match self {
            DoorEvent::DoorStatusChanged { building_id, .. } => *building_id,
            DoorEvent::BuildingProvisioned { building_id, .. } => *building_id,
        }
    }
}

/// Broadcast bus for [`DoorEvent`]s
///
/// Cloning shares the underlying channel.
#[derive(Clone)]
pub struct DoorEventBus {
    tx: broadcast::Sender<DoorEvent>,
    capacity: usize,
}

impl DoorEventBus {
    /// Creates a new bus buffering up to `capacity` events per receiver
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<DoorEvent> {
        self.tx.subscribe()
    }

    /// Emit an event
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: DoorEvent) -> Result<usize, broadcast::error::SendError<DoorEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: DoorEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
