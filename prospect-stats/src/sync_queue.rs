//! Best-effort sync side-channel
//!
//! Door writes hand the affected building id to a [`SyncHandle`]; a single
//! worker task drains the bounded queue and runs [`StatsEngine::sync`] for
//! each id. Nothing here can block or fail the door write: when the queue
//! is full or the worker is gone the notification is dropped with a
//! warning, and the next recalculation repairs the aggregate.

use crate::engine::StatsEngine;
use prospect_common::config::TomlConfig;
use prospect_common::events::{DoorEvent, DoorEventBus};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Sending side of the sync queue
///
/// Cloning shares the queue. The worker stops once every handle is dropped
/// and the queue has drained.
#[derive(Clone, Debug)]
pub struct SyncHandle {
    tx: mpsc::Sender<Uuid>,
}

impl SyncHandle {
    /// Queue a sync for `building_id` (fire-and-forget)
    ///
    /// Returns `false` when the notification was dropped.
    pub fn notify(&self, building_id: Uuid) -> bool {
        match self.tx.try_send(building_id) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(building_id = %building_id, "Sync queue full, notification dropped");
                false
            }
            Err(TrySendError::Closed(_)) => {
                warn!(building_id = %building_id, "Sync worker stopped, notification dropped");
                false
            }
        }
    }
}

/// Receiving side of the sync queue
pub struct SyncQueue {
    rx: mpsc::Receiver<Uuid>,
}

impl SyncQueue {
    /// Create a queue holding at most `capacity` pending notifications
    pub fn new(capacity: usize) -> (SyncHandle, SyncQueue) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (SyncHandle { tx }, SyncQueue { rx })
    }

    /// Create a queue sized by `sync_queue_capacity`
    pub fn from_config(config: &TomlConfig) -> (SyncHandle, SyncQueue) {
        SyncQueue::new(config.sync_queue_capacity)
    }

    /// Drain the queue until every handle is dropped
    ///
    /// Returns the number of syncs run.
    pub async fn run(mut self, engine: StatsEngine) -> usize {
        let mut processed = 0;

        while let Some(building_id) = self.rx.recv().await {
            engine.sync(building_id).await;
            processed += 1;
        }

        debug!(processed, "Sync worker stopped");
        processed
    }

    /// Create a queue and spawn its worker
    pub fn spawn(engine: StatsEngine, capacity: usize) -> (SyncHandle, JoinHandle<usize>) {
        let (handle, queue) = SyncQueue::new(capacity);
        let worker = tokio::spawn(queue.run(engine));
        (handle, worker)
    }

    /// [`spawn`](Self::spawn) with the configured capacity
    pub fn spawn_configured(engine: StatsEngine, config: &TomlConfig) -> (SyncHandle, JoinHandle<usize>) {
        SyncQueue::spawn(engine, config.sync_queue_capacity)
    }

    /// [`spawn_from_bus`](Self::spawn_from_bus) with the configured capacity
    pub fn spawn_from_bus_configured(
        engine: StatsEngine,
        bus: &DoorEventBus,
        config: &TomlConfig,
    ) -> JoinHandle<usize> {
        SyncQueue::spawn_from_bus(engine, bus, config.sync_queue_capacity)
    }

    /// Spawn a worker fed by door events published on `bus`
    ///
    /// Only status changes trigger a sync; freshly provisioned buildings
    /// hold no prospected doors.
    ///
    /// The returned task finishes once every clone of the bus is dropped.
    pub fn spawn_from_bus(engine: StatsEngine, bus: &DoorEventBus, capacity: usize) -> JoinHandle<usize> {
        let mut events = bus.subscribe();
        let (handle, queue) = SyncQueue::new(capacity);
        let worker = tokio::spawn(queue.run(engine));

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event @ DoorEvent::DoorStatusChanged { .. }) => {
                        handle.notify(event.building_id());
                    }
                    Ok(DoorEvent::BuildingProvisioned { .. }) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Sync bridge lagged, door events skipped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            info!("Door event bus closed, sync bridge stopping");
            drop(handle);

            worker.await.unwrap_or_else(|e| {
                warn!(error = %e, "Sync worker panicked");
                0
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prospect_common::db::init_in_memory;

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let (handle, _queue) = SyncQueue::new(1);

        assert!(handle.notify(Uuid::new_v4()));
        assert!(!handle.notify(Uuid::new_v4()), "second notification exceeds capacity");
    }

    #[tokio::test]
    async fn test_configured_capacity_bounds_queue() {
        let config = TomlConfig::from_toml_str("sync_queue_capacity = 3").unwrap();
        let (handle, _queue) = SyncQueue::from_config(&config);

        for _ in 0..3 {
            assert!(handle.notify(Uuid::new_v4()));
        }
        assert!(!handle.notify(Uuid::new_v4()), "fourth notification exceeds configured capacity");
    }

    #[tokio::test]
    async fn test_spawn_configured_processes_notifications() {
        let engine = StatsEngine::new(init_in_memory().await.unwrap());
        let (handle, worker) = SyncQueue::spawn_configured(engine, &TomlConfig::with_defaults());

        assert!(handle.notify(Uuid::new_v4()));
        assert!(handle.notify(Uuid::new_v4()));
        drop(handle);

        assert_eq!(worker.await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_notify_after_worker_gone() {
        let (handle, queue) = SyncQueue::new(4);
        drop(queue);

        assert!(!handle.notify(Uuid::new_v4()));
    }

    #[tokio::test]
    async fn test_worker_drains_then_stops() {
        let engine = StatsEngine::new(init_in_memory().await.unwrap());
        let (handle, worker) = SyncQueue::spawn(engine, 8);

        // Unknown buildings are no-ops but still count as processed
        for _ in 0..3 {
            assert!(handle.notify(Uuid::new_v4()));
        }
        drop(handle);

        assert_eq!(worker.await.unwrap(), 3);
    }
}
