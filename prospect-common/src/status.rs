//! Door status taxonomy
//!
//! Closed set of visit outcomes a door can hold, plus the static metadata
//! table describing how each outcome feeds the per-salesperson counters.
//! Ground truth computation and coherence validation both go through
//! [`contribution_of`], so there is exactly one place where a status is
//! turned into counter deltas.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

/// Outcome of the last visit to a door
///
/// Persisted as the SCREAMING_SNAKE_CASE name (`NOT_VISITED`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DoorStatus {
    NotVisited,
    ContractSigned,
    Refusal,
    AppointmentBooked,
    Absent,
    ArguedRefusal,
    NeedsRevisit,
}

impl DoorStatus {
    /// Every member of the taxonomy, in declaration order
    pub const ALL: [DoorStatus; 7] = [
        DoorStatus::NotVisited,
        DoorStatus::ContractSigned,
        DoorStatus::Refusal,
        DoorStatus::AppointmentBooked,
        DoorStatus::Absent,
        DoorStatus::ArguedRefusal,
        DoorStatus::NeedsRevisit,
    ];

    /// Name stored in the `doors.status` column
    pub fn as_str(self) -> &'static str {
        match self {
            DoorStatus::NotVisited => "NOT_VISITED",
            DoorStatus::ContractSigned => "CONTRACT_SIGNED",
            DoorStatus::Refusal => "REFUSAL",
            DoorStatus::AppointmentBooked => "APPOINTMENT_BOOKED",
            DoorStatus::Absent => "ABSENT",
            DoorStatus::ArguedRefusal => "ARGUED_REFUSAL",
            DoorStatus::NeedsRevisit => "NEEDS_REVISIT",
        }
    }

    /// Shorthand for `metadata_for(self)`
    pub fn metadata(self) -> &'static StatusMetadata {
        metadata_for(self)
    }
}

impl fmt::Display for DoorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DoorStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DoorStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| Error::UnknownStatus(s.to_string()))
    }
}

/// Effect of one status on the aggregate counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusMetadata {
    pub status: DoorStatus,
    pub counts_as_prospected: bool,
    pub increments_contracts: bool,
    pub increments_appointments: bool,
    pub increments_refusals: bool,
    pub requires_appointment_datetime: bool,
}

static NOT_VISITED: StatusMetadata = StatusMetadata {
    status: DoorStatus::NotVisited,
    counts_as_prospected: false,
    increments_contracts: false,
    increments_appointments: false,
    increments_refusals: false,
    requires_appointment_datetime: false,
};

static CONTRACT_SIGNED: StatusMetadata = StatusMetadata {
    status: DoorStatus::ContractSigned,
    counts_as_prospected: true,
    increments_contracts: true,
    increments_appointments: false,
    increments_refusals: false,
    requires_appointment_datetime: false,
};

static REFUSAL: StatusMetadata = StatusMetadata {
    status: DoorStatus::Refusal,
    counts_as_prospected: true,
    increments_contracts: false,
    increments_appointments: false,
    increments_refusals: true,
    requires_appointment_datetime: false,
};

static APPOINTMENT_BOOKED: StatusMetadata = StatusMetadata {
    status: DoorStatus::AppointmentBooked,
    counts_as_prospected: true,
    increments_contracts: false,
    increments_appointments: true,
    increments_refusals: false,
    requires_appointment_datetime: true,
};

static ABSENT: StatusMetadata = StatusMetadata {
    status: DoorStatus::Absent,
    counts_as_prospected: true,
    increments_contracts: false,
    increments_appointments: false,
    increments_refusals: false,
    requires_appointment_datetime: false,
};

static ARGUED_REFUSAL: StatusMetadata = StatusMetadata {
    status: DoorStatus::ArguedRefusal,
    counts_as_prospected: true,
    increments_contracts: false,
    increments_appointments: false,
    increments_refusals: true,
    requires_appointment_datetime: false,
};

static NEEDS_REVISIT: StatusMetadata = StatusMetadata {
    status: DoorStatus::NeedsRevisit,
    counts_as_prospected: true,
    increments_contracts: false,
    increments_appointments: false,
    increments_refusals: false,
    requires_appointment_datetime: false,
};

/// Metadata record for a status
pub fn metadata_for(status: DoorStatus) -> &'static StatusMetadata {
    match status {
        DoorStatus::NotVisited => &NOT_VISITED,
        DoorStatus::ContractSigned => &CONTRACT_SIGNED,
        DoorStatus::Refusal => &REFUSAL,
        DoorStatus::AppointmentBooked => &APPOINTMENT_BOOKED,
        DoorStatus::Absent => &ABSENT,
        DoorStatus::ArguedRefusal => &ARGUED_REFUSAL,
        DoorStatus::NeedsRevisit => &NEEDS_REVISIT,
    }
}

/// Metadata record for a raw persisted status name
///
/// Fails with [`Error::UnknownStatus`] for values outside the taxonomy.
pub fn metadata_for_raw(raw: &str) -> Result<&'static StatusMetadata> {
    raw.parse::<DoorStatus>().map(metadata_for)
}

/// The complete read-only metadata table, in taxonomy order
pub fn metadata_table() -> Vec<&'static StatusMetadata> {
    DoorStatus::ALL.iter().map(|s| metadata_for(*s)).collect()
}

/// Counter deltas contributed by a group of doors sharing one status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CounterContribution {
    pub contracts: i64,
    pub appointments: i64,
    pub refusals: i64,
    pub prospected: i64,
}

impl Add for CounterContribution {
    type Output = CounterContribution;

    fn add(self, rhs: CounterContribution) -> CounterContribution {
        CounterContribution {
            contracts: self.contracts + rhs.contracts,
            appointments: self.appointments + rhs.appointments,
            refusals: self.refusals + rhs.refusals,
            prospected: self.prospected + rhs.prospected,
        }
    }
}

impl Sum for CounterContribution {
    fn sum<I: Iterator<Item = CounterContribution>>(iter: I) -> Self {
        iter.fold(CounterContribution::default(), Add::add)
    }
}

/// Deltas that `count` doors in `status` contribute to the counters
pub fn contribution_of(status: DoorStatus, count: i64) -> CounterContribution {
    let meta = metadata_for(status);
    let flag = |set: bool| if set { count } else { 0 };

    CounterContribution {
        contracts: flag(meta.increments_contracts),
        appointments: flag(meta.increments_appointments),
        refusals: flag(meta.increments_refusals),
        prospected: flag(meta.counts_as_prospected),
    }
}
