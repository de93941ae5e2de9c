//! Database models

use crate::status::DoorStatus;
use crate::uuid_utils;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Salesperson {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
}

impl Salesperson {
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            id: uuid_utils::parse(row.try_get("id")?)?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            email: row.try_get("email")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    pub id: Uuid,
    pub name: String,
}

impl Zone {
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            id: uuid_utils::parse(row.try_get("id")?)?,
            name: row.try_get("name")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Building {
    pub id: Uuid,
    pub address: String,
    pub floor_count: i64,
    pub doors_per_floor: i64,
    pub salesperson_id: Option<Uuid>,
    pub zone_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    /// Bumped whenever a contained door changes
    pub updated_at: DateTime<Utc>,
}

impl Building {
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            id: uuid_utils::parse(row.try_get("id")?)?,
            address: row.try_get("address")?,
            floor_count: row.try_get("floor_count")?,
            doors_per_floor: row.try_get("doors_per_floor")?,
            salesperson_id: uuid_utils::parse_opt(row.try_get("salesperson_id")?)?,
            zone_id: uuid_utils::parse_opt(row.try_get("zone_id")?)?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Door {
    pub id: Uuid,
    pub building_id: Uuid,
    pub number: i64,
    pub custom_label: Option<String>,
    pub floor: i64,
    pub status: DoorStatus,
    pub repassage_count: i64,
    pub appointment_at: Option<DateTime<Utc>>,
    pub comment: Option<String>,
    pub last_visited_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Door {
    /// Map a `doors` row; an out-of-taxonomy status fails with `UnknownStatus`
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        let status: String = row.try_get("status")?;

        Ok(Self {
            id: uuid_utils::parse(row.try_get("id")?)?,
            building_id: uuid_utils::parse(row.try_get("building_id")?)?,
            number: row.try_get("number")?,
            custom_label: row.try_get("custom_label")?,
            floor: row.try_get("floor")?,
            status: status.parse()?,
            repassage_count: row.try_get("repassage_count")?,
            appointment_at: row.try_get("appointment_at")?,
            comment: row.try_get("comment")?,
            last_visited_at: row.try_get("last_visited_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Aggregate counters tracked per salesperson
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatCounters {
    pub contracts_signed: i64,
    pub appointments_booked: i64,
    pub refusals: i64,
    pub buildings_visited: i64,
    pub prospected_buildings_count: i64,
    pub prospected_doors_count: i64,
}

impl StatCounters {
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            contracts_signed: row.try_get("contracts_signed")?,
            appointments_booked: row.try_get("appointments_booked")?,
            refusals: row.try_get("refusals")?,
            buildings_visited: row.try_get("buildings_visited")?,
            prospected_buildings_count: row.try_get("prospected_buildings_count")?,
            prospected_doors_count: row.try_get("prospected_doors_count")?,
        })
    }
}

/// Stored per-salesperson rollup (one row per salesperson)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticAggregate {
    pub id: Uuid,
    pub salesperson_id: Uuid,
    pub zone_id: Option<Uuid>,
    #[serde(flatten)]
    pub counters: StatCounters,
    pub updated_at: DateTime<Utc>,
}

impl StatisticAggregate {
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            id: uuid_utils::parse(row.try_get("id")?)?,
            salesperson_id: uuid_utils::parse(row.try_get("salesperson_id")?)?,
            zone_id: uuid_utils::parse_opt(row.try_get("zone_id")?)?,
            counters: StatCounters::from_row(row)?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}
