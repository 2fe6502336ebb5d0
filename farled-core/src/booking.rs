use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::UnknownEnumValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    PendingPayment,
    Paid,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingPayment => "PENDING_PAYMENT",
            Self::Paid => "PAID",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = UnknownEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING_PAYMENT" => Ok(Self::PendingPayment),
            "PAID" => Ok(Self::Paid),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(UnknownEnumValue {
                kind: "booking status",
                value: other.to_string(),
            }),
        }
    }
}

/// Contact details of the person placing the order; one set per booking,
/// independent of the per-ticket passenger data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerContact {
    pub customer_name: String,
    pub id_type: String,
    pub id_number: String,
    pub phone_number: String,
    pub email: String,
}

/// The durable customer order record. Created at data-entry time and kept
/// after the claim session is gone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub order_id: String,
    pub sailing_id: Uuid,
    pub customer_name: String,
    pub id_type: String,
    pub id_number: String,
    pub phone_number: String,
    pub email: String,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn pending(order_id: String, sailing_id: Uuid, contact: CustomerContact) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            order_id,
            sailing_id,
            customer_name: contact.customer_name,
            id_type: contact.id_type,
            id_number: contact.id_number,
            phone_number: contact.phone_number,
            email: contact.email,
            status: BookingStatus::PendingPayment,
            created_at: now,
            updated_at: now,
        }
    }
}
