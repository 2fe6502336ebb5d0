use async_trait::async_trait;
use chrono::{DateTime, Utc};
use farled_core::store::{BoxError, TicketOps};
use farled_core::ticket::{Ticket, TicketKind, TicketOwner, TicketStatus};
use uuid::Uuid;

use super::PgTx;

#[derive(sqlx::FromRow)]
struct TicketRow {
    id: Uuid,
    sailing_id: Uuid,
    class_id: Uuid,
    kind: String,
    status: String,
    claim_session_id: Uuid,
    booking_id: Option<Uuid>,
    price_cents: i64,
    passenger_name: Option<String>,
    passenger_age: Option<i32>,
    passenger_gender: Option<String>,
    address: Option<String>,
    id_type: Option<String>,
    id_number: Option<String>,
    seat_number: Option<String>,
    license_plate: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = BoxError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        let owner = match row.booking_id {
            None => TicketOwner::Held(row.claim_session_id),
            Some(booking_id) => TicketOwner::Booked {
                session_id: row.claim_session_id,
                booking_id,
            },
        };

        Ok(Ticket {
            id: row.id,
            sailing_id: row.sailing_id,
            class_id: row.class_id,
            kind: row.kind.parse::<TicketKind>()?,
            status: row.status.parse::<TicketStatus>()?,
            owner,
            price_cents: row.price_cents,
            passenger_name: row.passenger_name,
            passenger_age: row.passenger_age,
            passenger_gender: row.passenger_gender,
            address: row.address,
            id_type: row.id_type,
            id_number: row.id_number,
            seat_number: row.seat_number,
            license_plate: row.license_plate,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const TICKET_COLUMNS: &str = "id, sailing_id, class_id, kind, status, claim_session_id, \
     booking_id, price_cents, passenger_name, passenger_age, passenger_gender, address, \
     id_type, id_number, seat_number, license_plate, created_at, updated_at";

#[async_trait]
impl TicketOps for PgTx {
    async fn insert_tickets(&mut self, tickets: &[Ticket]) -> Result<(), BoxError> {
        for ticket in tickets {
            sqlx::query(
                "INSERT INTO ticket (id, sailing_id, class_id, kind, status, claim_session_id, \
                 booking_id, price_cents, passenger_name, passenger_age, passenger_gender, \
                 address, id_type, id_number, seat_number, license_plate, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)",
            )
            .bind(ticket.id)
            .bind(ticket.sailing_id)
            .bind(ticket.class_id)
            .bind(ticket.kind.as_str())
            .bind(ticket.status.as_str())
            .bind(ticket.owner.session_id())
            .bind(ticket.owner.booking_id())
            .bind(ticket.price_cents)
            .bind(&ticket.passenger_name)
            .bind(ticket.passenger_age)
            .bind(&ticket.passenger_gender)
            .bind(&ticket.address)
            .bind(&ticket.id_type)
            .bind(&ticket.id_number)
            .bind(&ticket.seat_number)
            .bind(&ticket.license_plate)
            .bind(ticket.created_at)
            .bind(ticket.updated_at)
            .execute(&mut *self.tx)
            .await?;
        }
        Ok(())
    }

    async fn update_tickets(&mut self, tickets: &[Ticket]) -> Result<(), BoxError> {
        for ticket in tickets {
            sqlx::query(
                "UPDATE ticket SET status = $2, booking_id = $3, passenger_name = $4, \
                 passenger_age = $5, passenger_gender = $6, address = $7, id_type = $8, \
                 id_number = $9, seat_number = $10, license_plate = $11, updated_at = $12 \
                 WHERE id = $1",
            )
            .bind(ticket.id)
            .bind(ticket.status.as_str())
            .bind(ticket.owner.booking_id())
            .bind(&ticket.passenger_name)
            .bind(ticket.passenger_age)
            .bind(&ticket.passenger_gender)
            .bind(&ticket.address)
            .bind(&ticket.id_type)
            .bind(&ticket.id_number)
            .bind(&ticket.seat_number)
            .bind(&ticket.license_plate)
            .bind(ticket.updated_at)
            .execute(&mut *self.tx)
            .await?;
        }
        Ok(())
    }

    async fn tickets_by_session(&mut self, session_id: Uuid) -> Result<Vec<Ticket>, BoxError> {
        let rows = sqlx::query_as::<_, TicketRow>(&format!(
            "SELECT {TICKET_COLUMNS} FROM ticket WHERE claim_session_id = $1 ORDER BY created_at, id",
        ))
        .bind(session_id)
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter().map(Ticket::try_from).collect()
    }

    async fn delete_tickets_by_session(&mut self, session_id: Uuid) -> Result<u64, BoxError> {
        let result = sqlx::query("DELETE FROM ticket WHERE claim_session_id = $1")
            .bind(session_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }
}
