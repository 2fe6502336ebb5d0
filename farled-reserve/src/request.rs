use chrono::{DateTime, Utc};
use farled_core::booking::CustomerContact;
use farled_core::session::ClaimSession;
use farled_core::ticket::Ticket;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One class line in a hold request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldLine {
    pub class_id: Uuid,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHoldRequest {
    pub sailing_id: Uuid,
    pub items: Vec<HoldLine>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HoldCreated {
    pub session_token: Uuid,
    pub expires_at: DateTime<Utc>,
    pub ticket_ids: Vec<Uuid>,
}

/// Per-ticket payload for data entry. Which fields are required depends on
/// the ticket kind; the service validates before writing anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketData {
    pub ticket_id: Uuid,
    pub passenger_name: Option<String>,
    pub passenger_age: Option<i32>,
    pub passenger_gender: Option<String>,
    pub address: Option<String>,
    pub id_type: Option<String>,
    pub id_number: Option<String>,
    pub license_plate: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataEntryRequest {
    pub contact: CustomerContact,
    pub tickets: Vec<TicketData>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataEntryAccepted {
    pub booking_id: Uuid,
    pub order_id: String,
    pub updated_ticket_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassAvailability {
    pub class_id: Uuid,
    pub quota: i32,
    pub occupied: i64,
    pub available: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session: ClaimSession,
    pub tickets: Vec<Ticket>,
}

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SweepReport {
    pub scanned: usize,
    pub reclaimed: usize,
    pub failed: usize,
}
