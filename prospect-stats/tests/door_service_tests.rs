//! Integration tests for door provisioning and status updates
//!
//! Tests cover:
//! - Bulk door creation at provisioning
//! - Validation before persistence
//! - Repassage counting through the service
//! - End-to-end sync through the queue and through the event bus

mod helpers;

use chrono::Utc;
use helpers::{add_salesperson, aggregate_count, setup_test_db};
use prospect_common::config::TomlConfig;
use prospect_common::events::{DoorEvent, DoorEventBus};
use prospect_common::{DoorStatus, Error};
use prospect_stats::db::buildings::{load_building, NewBuilding};
use prospect_stats::db::doors::{list_doors, load_door};
use prospect_stats::db::statistics::load_aggregate;
use prospect_stats::ground_truth::compute_for;
use prospect_stats::doors::MAX_DOORS_PER_FLOOR;
use prospect_stats::{DoorService, DoorStatusUpdate, StatsEngine, SyncNotifier, SyncQueue};
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::broadcast::error::TryRecvError;
use uuid::Uuid;

fn new_building(owner: Option<Uuid>, floors: i64, per_floor: i64) -> NewBuilding {
    NewBuilding {
        address: "3 avenue Foch".to_string(),
        floor_count: floors,
        doors_per_floor: per_floor,
        salesperson_id: owner,
        zone_id: None,
    }
}

/// Service announcing on a bus nobody forwards to the sync engine
fn bus_service(pool: &SqlitePool) -> (DoorService, DoorEventBus) {
    let bus = DoorEventBus::new(64);
    (DoorService::new(pool.clone(), SyncNotifier::Bus(bus.clone())), bus)
}

#[tokio::test]
async fn test_provision_creates_unvisited_doors() {
    let pool = setup_test_db().await;
    let sp = add_salesperson(&pool, "Provision").await;
    let (service, _bus) = bus_service(&pool);

    let (building, doors) = service.provision_building(&new_building(Some(sp), 3, 4)).await.unwrap();

    assert_eq!(doors.len(), 12);
    let stored = list_doors(&pool, building.id).await.unwrap();
    assert_eq!(stored.len(), 12);
    assert!(stored.iter().all(|d| d.status == DoorStatus::NotVisited && d.repassage_count == 0));

    let numbers: Vec<i64> = stored.iter().map(|d| d.number).collect();
    assert_eq!(&numbers[..4], &[101, 102, 103, 104]);
    assert_eq!(numbers[11], 304);
}

#[tokio::test]
async fn test_provision_rejects_empty_layout() {
    let pool = setup_test_db().await;
    let (service, _bus) = bus_service(&pool);

    let err = service.provision_building(&new_building(None, 0, 4)).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let buildings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM buildings")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(buildings, 0);
}

#[tokio::test]
async fn test_provision_rejects_oversized_layout() {
    let pool = setup_test_db().await;
    let (service, _bus) = bus_service(&pool);

    let err = service
        .provision_building(&new_building(None, i64::MAX / 2, 3))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let err = service.provision_building(&new_building(None, 2, 120)).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let buildings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM buildings")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(buildings, 0);
}

#[tokio::test]
async fn test_provision_door_numbers_unique_on_full_floors() {
    let pool = setup_test_db().await;
    let (service, _bus) = bus_service(&pool);

    let (building, doors) = service
        .provision_building(&new_building(None, 3, MAX_DOORS_PER_FLOOR))
        .await
        .unwrap();

    let numbers: HashSet<i64> = list_doors(&pool, building.id)
        .await
        .unwrap()
        .iter()
        .map(|d| d.number)
        .collect();
    assert_eq!(doors.len(), 297);
    assert_eq!(numbers.len(), doors.len());
    assert!(numbers.contains(&199) && numbers.contains(&201));
}

#[tokio::test]
async fn test_appointment_without_datetime_rejected_before_write() {
    let pool = setup_test_db().await;
    let sp = add_salesperson(&pool, "Rdv").await;
    let (service, bus) = bus_service(&pool);
    let (_, doors) = service.provision_building(&new_building(Some(sp), 1, 2)).await.unwrap();
    let mut events = bus.subscribe();

    let err = service
        .update_door_status(doors[0].id, DoorStatusUpdate::new(DoorStatus::AppointmentBooked))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let door = load_door(&pool, doors[0].id).await.unwrap().unwrap();
    assert_eq!(door.status, DoorStatus::NotVisited);
    assert_eq!(door.updated_at, doors[0].updated_at);
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)), "no sync announced");
    assert_eq!(aggregate_count(&pool).await, 0);
}

#[tokio::test]
async fn test_update_missing_door() {
    let pool = setup_test_db().await;
    let (service, _bus) = bus_service(&pool);

    let err = service
        .update_door_status(Uuid::new_v4(), DoorStatusUpdate::new(DoorStatus::Absent))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_repassage_counted_through_service() {
    let pool = setup_test_db().await;
    let (service, _bus) = bus_service(&pool);
    let (_, doors) = service.provision_building(&new_building(None, 1, 1)).await.unwrap();
    let door_id = doors[0].id;

    let steps = [
        (DoorStatus::NeedsRevisit, 1),
        (DoorStatus::NeedsRevisit, 1),
        (DoorStatus::Absent, 1),
        (DoorStatus::NeedsRevisit, 2),
    ];
    for (status, expected) in steps {
        let door = service
            .update_door_status(door_id, DoorStatusUpdate::new(status))
            .await
            .unwrap();
        assert_eq!(door.repassage_count, expected, "after {}", status);
    }

    let stored = load_door(&pool, door_id).await.unwrap().unwrap();
    assert_eq!(stored.repassage_count, 2);
}

#[tokio::test]
async fn test_update_bumps_building_and_announces() {
    let pool = setup_test_db().await;
    let (service, bus) = bus_service(&pool);
    let (building, doors) = service.provision_building(&new_building(None, 1, 1)).await.unwrap();
    let mut events = bus.subscribe();
    tokio::time::sleep(Duration::from_millis(5)).await;

    let at = Utc::now();
    let door = service
        .update_door_status(
            doors[0].id,
            DoorStatusUpdate::new(DoorStatus::AppointmentBooked)
                .with_appointment(at)
                .with_comment("digicode 4521"),
        )
        .await
        .unwrap();

    assert_eq!(door.appointment_at, Some(at));
    assert!(door.last_visited_at.is_some());

    let reloaded = load_building(&pool, building.id).await.unwrap().unwrap();
    assert!(reloaded.updated_at > building.updated_at);

    match events.recv().await.unwrap() {
        DoorEvent::DoorStatusChanged { building_id, old_status, new_status, .. } => {
            assert_eq!(building_id, building.id);
            assert_eq!(old_status, DoorStatus::NotVisited);
            assert_eq!(new_status, DoorStatus::AppointmentBooked);
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_updates_flow_through_sync_queue() {
    let pool = setup_test_db().await;
    let sp = add_salesperson(&pool, "Queue").await;
    let engine = StatsEngine::new(pool.clone());
    let (handle, worker) = SyncQueue::spawn(engine, 32);
    let service = DoorService::new(pool.clone(), SyncNotifier::Queue(handle.clone()));

    let (_, doors) = service.provision_building(&new_building(Some(sp), 2, 3)).await.unwrap();
    service.update_door_status(doors[0].id, DoorStatusUpdate::new(DoorStatus::ContractSigned)).await.unwrap();
    service.update_door_status(doors[1].id, DoorStatusUpdate::new(DoorStatus::Refusal)).await.unwrap();
    service.update_door_status(doors[4].id, DoorStatusUpdate::new(DoorStatus::ArguedRefusal)).await.unwrap();

    drop(service);
    drop(handle);
    assert_eq!(worker.await.unwrap(), 3);

    let aggregate = load_aggregate(&pool, sp).await.unwrap().unwrap();
    assert_eq!(aggregate.counters, compute_for(&pool, sp).await.unwrap());
    assert_eq!(aggregate.counters.contracts_signed, 1);
    assert_eq!(aggregate.counters.refusals, 2);
    assert_eq!(aggregate.counters.prospected_doors_count, 3);
}

#[tokio::test]
async fn test_updates_flow_through_event_bus() {
    let pool = setup_test_db().await;
    let sp = add_salesperson(&pool, "Bus").await;
    let bus = DoorEventBus::new(64);
    let config = TomlConfig::from_toml_str("sync_queue_capacity = 8").unwrap();
    let bridge = SyncQueue::spawn_from_bus_configured(StatsEngine::new(pool.clone()), &bus, &config);
    let service = DoorService::new(pool.clone(), SyncNotifier::Bus(bus.clone()));

    let (_, doors) = service.provision_building(&new_building(Some(sp), 1, 4)).await.unwrap();
    service.update_door_status(doors[0].id, DoorStatusUpdate::new(DoorStatus::Absent)).await.unwrap();
    service
        .update_door_status(
            doors[1].id,
            DoorStatusUpdate::new(DoorStatus::AppointmentBooked).with_appointment(Utc::now()),
        )
        .await
        .unwrap();

    drop(service);
    drop(bus);
    // Provisioning is published but does not trigger a sync
    assert_eq!(bridge.await.unwrap(), 2);

    let aggregate = load_aggregate(&pool, sp).await.unwrap().unwrap();
    assert_eq!(aggregate.counters.appointments_booked, 1);
    assert_eq!(aggregate.counters.prospected_doors_count, 2);
    assert_eq!(aggregate.counters.buildings_visited, 1);
}

#[tokio::test]
async fn test_write_succeeds_when_sync_cannot_run() {
    let pool = setup_test_db().await;
    let sp = add_salesperson(&pool, "Orphan").await;
    let (handle, queue) = SyncQueue::new(1);
    drop(queue);
    let service = DoorService::new(pool.clone(), SyncNotifier::Queue(handle));

    let (_, doors) = service.provision_building(&new_building(Some(sp), 1, 1)).await.unwrap();
    let door = service
        .update_door_status(doors[0].id, DoorStatusUpdate::new(DoorStatus::ContractSigned))
        .await
        .expect("door write must not depend on sync");

    assert_eq!(door.status, DoorStatus::ContractSigned);
    assert_eq!(aggregate_count(&pool).await, 0, "aggregate left for the next recalculation");
}
