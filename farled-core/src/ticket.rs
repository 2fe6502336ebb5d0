use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::UnknownEnumValue;

/// What kind of slot a ticket occupies on the vessel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketKind {
    Passenger,
    Vehicle,
}

impl TicketKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passenger => "PASSENGER",
            Self::Vehicle => "VEHICLE",
        }
    }
}

impl fmt::Display for TicketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketKind {
    type Err = UnknownEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PASSENGER" => Ok(Self::Passenger),
            "VEHICLE" => Ok(Self::Vehicle),
            other => Err(UnknownEnumValue {
                kind: "ticket kind",
                value: other.to_string(),
            }),
        }
    }
}

/// Ticket lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Held,
    DataEntered,
    Confirmed,
    Cancelled,
}

impl TicketStatus {
    /// Statuses that count against the capacity ledger quota.
    pub const OCCUPYING: [TicketStatus; 3] = [Self::Held, Self::DataEntered, Self::Confirmed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Held => "HELD",
            Self::DataEntered => "DATA_ENTERED",
            Self::Confirmed => "CONFIRMED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = UnknownEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HELD" => Ok(Self::Held),
            "DATA_ENTERED" => Ok(Self::DataEntered),
            "CONFIRMED" => Ok(Self::Confirmed),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(UnknownEnumValue {
                kind: "ticket status",
                value: other.to_string(),
            }),
        }
    }
}

/// Who holds the ticket right now. Exactly one owner at a time: a fresh
/// placeholder belongs to the claim session that reserved it, and data
/// entry re-points it at a booking. The originating session stays recorded
/// inside `Booked` because expiry reclaim is keyed by session until the
/// session reaches a terminal success state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketOwner {
    Held(Uuid),
    Booked { session_id: Uuid, booking_id: Uuid },
}

impl TicketOwner {
    pub fn session_id(&self) -> Uuid {
        match self {
            Self::Held(session_id) => *session_id,
            Self::Booked { session_id, .. } => *session_id,
        }
    }

    pub fn booking_id(&self) -> Option<Uuid> {
        match self {
            Self::Held(_) => None,
            Self::Booked { booking_id, .. } => Some(*booking_id),
        }
    }
}

/// One reservable unit: a passenger seat or a vehicle slot on a sailing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub sailing_id: Uuid,
    pub class_id: Uuid,
    pub kind: TicketKind,
    pub status: TicketStatus,
    pub owner: TicketOwner,
    pub price_cents: i64,
    pub passenger_name: Option<String>,
    pub passenger_age: Option<i32>,
    pub passenger_gender: Option<String>,
    pub address: Option<String>,
    pub id_type: Option<String>,
    pub id_number: Option<String>,
    pub seat_number: Option<String>,
    pub license_plate: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Placeholder created at hold time. Passenger or vehicle data arrives
    /// later through data entry; until then the ticket only pins a slot.
    pub fn placeholder(
        sailing_id: Uuid,
        class_id: Uuid,
        kind: TicketKind,
        price_cents: i64,
        session_id: Uuid,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            sailing_id,
            class_id,
            kind,
            status: TicketStatus::Held,
            owner: TicketOwner::Held(session_id),
            price_cents,
            passenger_name: None,
            passenger_age: None,
            passenger_gender: None,
            address: None,
            id_type: None,
            id_number: None,
            seat_number: None,
            license_plate: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Re-point ownership at a booking once data entry completes.
    pub fn attach_booking(&mut self, booking_id: Uuid) {
        self.owner = TicketOwner::Booked {
            session_id: self.owner.session_id(),
            booking_id,
        };
        self.status = TicketStatus::DataEntered;
        self.updated_at = Utc::now();
    }

    /// Payment settled: the slot is permanently taken.
    pub fn confirm(&mut self) {
        self.status = TicketStatus::Confirmed;
        self.updated_at = Utc::now();
    }
}
