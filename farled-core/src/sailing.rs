use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ticket::TicketKind;

/// A scheduled voyage: one ship running one route at a fixed departure.
/// Owned by the scheduling side of the platform; the reservation engine
/// only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sailing {
    pub id: Uuid,
    pub ship_id: Uuid,
    pub route_id: Uuid,
    pub route_alias: String,
    pub ship_alias: String,
    pub departs_at: DateTime<Utc>,
    pub arrives_at: DateTime<Utc>,
}

/// Per-(sailing, class) quota record, the unit of pessimistic locking.
/// The quota is a ceiling: occupancy is always derived by counting live
/// tickets against it, never by decrementing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacityEntry {
    pub id: Uuid,
    pub sailing_id: Uuid,
    pub class_id: Uuid,
    pub quota: i32,
}

/// Ship-class template: resolves a class on a ship to its accommodation
/// kind and the prefix used for seat labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub id: Uuid,
    pub ship_id: Uuid,
    pub class_id: Uuid,
    pub class_alias: String,
    pub kind: TicketKind,
}

/// Price fact for a manifest on a route, captured onto tickets at hold
/// time so later fare changes never reprice an open hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fare {
    pub id: Uuid,
    pub manifest_id: Uuid,
    pub route_id: Uuid,
    pub price_cents: i64,
}
