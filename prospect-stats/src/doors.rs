//! Door use cases: building provisioning and field status updates
//!
//! These are the writes that feed the statistics engine. A status update
//! is validated before anything is persisted, committed in one
//! transaction, and only then announced to the sync side-channel. The
//! caller's result never depends on the sync outcome.

use crate::db::{buildings, doors};
use crate::db::buildings::NewBuilding;
use crate::sync_queue::SyncHandle;
use chrono::{DateTime, Utc};
use prospect_common::db::{Building, Door};
use prospect_common::events::{DoorEvent, DoorEventBus};
use prospect_common::{time, DoorStatus, Error, Result};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

/// Field action recorded against a door
#[derive(Debug, Clone, Deserialize)]
pub struct DoorStatusUpdate {
    pub status: DoorStatus,
    #[serde(default)]
    pub appointment_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub custom_label: Option<String>,
}

impl DoorStatusUpdate {
    pub fn new(status: DoorStatus) -> Self {
        Self {
            status,
            appointment_at: None,
            comment: None,
            custom_label: None,
        }
    }

    pub fn with_appointment(mut self, at: DateTime<Utc>) -> Self {
        self.appointment_at = Some(at);
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Where committed status changes are announced
#[derive(Clone)]
pub enum SyncNotifier {
    /// Push building ids straight onto the sync queue
    Queue(SyncHandle),
    /// Publish door events; a bus-fed sync worker picks them up
    Bus(DoorEventBus),
}

/// Reject an update that cannot be persisted
pub fn validate_update(update: &DoorStatusUpdate) -> Result<()> {
    if update.status.metadata().requires_appointment_datetime && update.appointment_at.is_none() {
        return Err(Error::Validation(format!(
            "status {} requires an appointment date and time",
            update.status
        )));
    }

    Ok(())
}

/// Most doors a single floor may hold; keeps `floor * 100 + position` unique
pub const MAX_DOORS_PER_FLOOR: i64 = 99;

/// Most doors provisioned for one building
pub const MAX_DOORS_PER_BUILDING: usize = 10_000;

/// Check a building layout and return its door count
pub fn validate_layout(new: &NewBuilding) -> Result<usize> {
    if new.floor_count < 1 || new.doors_per_floor < 1 {
        return Err(Error::Validation(format!(
            "building needs at least one floor and one door per floor (got {} x {})",
            new.floor_count, new.doors_per_floor
        )));
    }

    if new.doors_per_floor > MAX_DOORS_PER_FLOOR {
        return Err(Error::Validation(format!(
            "at most {} doors per floor (got {})",
            MAX_DOORS_PER_FLOOR, new.doors_per_floor
        )));
    }

    new.floor_count
        .checked_mul(new.doors_per_floor)
        .and_then(|total| usize::try_from(total).ok())
        .filter(|total| *total <= MAX_DOORS_PER_BUILDING)
        .ok_or_else(|| {
            Error::Validation(format!(
                "building layout {} x {} exceeds {} doors",
                new.floor_count, new.doors_per_floor, MAX_DOORS_PER_BUILDING
            ))
        })
}

/// Door as it will be stored after `update`
///
/// `repassage_count` grows by one only on a transition into NEEDS_REVISIT;
/// re-saving NEEDS_REVISIT leaves it unchanged.
pub fn apply_update(door: &Door, update: &DoorStatusUpdate, now: DateTime<Utc>) -> Door {
    let mut next = door.clone();

    if update.status == DoorStatus::NeedsRevisit && door.status != DoorStatus::NeedsRevisit {
        next.repassage_count += 1;
    }

    next.status = update.status;

    if let Some(at) = update.appointment_at {
        next.appointment_at = Some(at);
    }
    if let Some(comment) = &update.comment {
        next.comment = Some(comment.clone());
    }
    if let Some(label) = &update.custom_label {
        next.custom_label = Some(label.clone());
    }
    if update.status.metadata().counts_as_prospected {
        next.last_visited_at = Some(now);
    }
    next.updated_at = now;

    next
}

/// Door writes for one database
#[derive(Clone)]
pub struct DoorService {
    db: SqlitePool,
    notifier: SyncNotifier,
}

impl DoorService {
    pub fn new(db: SqlitePool, notifier: SyncNotifier) -> Self {
        Self { db, notifier }
    }

    /// Create a building and all of its doors in one transaction
    ///
    /// Doors start NOT_VISITED with no repassage and are numbered
    /// `floor * 100 + position` (both 1-based). Layouts rejected by
    /// [`validate_layout`] fail with `Validation` before any write.
    pub async fn provision_building(&self, new: &NewBuilding) -> Result<(Building, Vec<Door>)> {
        let door_count = validate_layout(new)?;

        let now = time::now();
        let mut tx = self.db.begin().await?;

        let building = buildings::insert_building(&mut *tx, new, now).await?;
        let mut created = Vec::with_capacity(door_count);

        for floor in 1..=new.floor_count {
            for position in 1..=new.doors_per_floor {
                let door = doors::insert_door(&mut *tx, building.id, floor, floor * 100 + position, now).await?;
                created.push(door);
            }
        }

        tx.commit().await?;

        info!(
            building_id = %building.id,
            doors = created.len(),
            "Building provisioned"
        );

        if let SyncNotifier::Bus(bus) = &self.notifier {
            bus.emit_lossy(DoorEvent::BuildingProvisioned {
                building_id: building.id,
                door_count: created.len(),
                timestamp: now,
            });
        }

        Ok((building, created))
    }

    /// Record a field status change on a door
    ///
    /// Fails with `Validation` before any write when the update is
    /// incomplete, and with `NotFound` when the door does not exist.
    /// After commit the owning building is handed to the sync side-channel.
    pub async fn update_door_status(&self, door_id: Uuid, update: DoorStatusUpdate) -> Result<Door> {
        validate_update(&update)?;

        let now = time::now();
        let mut tx = self.db.begin().await?;

        let door = doors::load_door(&mut *tx, door_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("door {}", door_id)))?;

        let next = apply_update(&door, &update, now);
        doors::write_door_visit(&mut *tx, &next).await?;
        buildings::touch_building(&mut *tx, next.building_id, now).await?;

        tx.commit().await?;

        debug!(
            door_id = %door_id,
            building_id = %next.building_id,
            old_status = %door.status,
            new_status = %next.status,
            repassage_count = next.repassage_count,
            "Door status updated"
        );

        self.announce(&door, &next, now);

        Ok(next)
    }

    fn announce(&self, before: &Door, after: &Door, now: DateTime<Utc>) {
        match &self.notifier {
            SyncNotifier::Queue(handle) => {
                handle.notify(after.building_id);
            }
            SyncNotifier::Bus(bus) => bus.emit_lossy(DoorEvent::DoorStatusChanged {
                door_id: after.id,
                building_id: after.building_id,
                old_status: before.status,
                new_status: after.status,
                timestamp: now,
            }),
        }
    }
}
