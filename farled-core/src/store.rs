use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::booking::{Booking, BookingStatus};
use crate::sailing::{CapacityEntry, Fare, Manifest, Sailing};
use crate::session::ClaimSession;
use crate::ticket::{Ticket, TicketStatus};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Hands out storage transactions. Every public engine operation runs
/// inside exactly one transaction, from `begin` to `commit`.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    type Tx: StoreTx;

    async fn begin(&self) -> Result<Self::Tx, BoxError>;
}

/// Read access to sailings and the fare/manifest configuration. All of it
/// belongs to master data the engine never mutates.
#[async_trait]
pub trait CatalogOps {
    async fn sailing_by_id(&mut self, id: Uuid) -> Result<Option<Sailing>, BoxError>;

    async fn manifest_by_ship_and_class(
        &mut self,
        ship_id: Uuid,
        class_id: Uuid,
    ) -> Result<Option<Manifest>, BoxError>;

    async fn fare_by_manifest_and_route(
        &mut self,
        manifest_id: Uuid,
        route_id: Uuid,
    ) -> Result<Option<Fare>, BoxError>;
}

/// Capacity ledger access plus the occupancy counters that must be read
/// under its lock.
#[async_trait]
pub trait LedgerOps {
    /// Exclusive row lock on the (sailing, class) quota record, held until
    /// the transaction ends. `None` means no ledger entry exists, which
    /// callers treat as a hard failure.
    async fn lock_quota(
        &mut self,
        sailing_id: Uuid,
        class_id: Uuid,
    ) -> Result<Option<i32>, BoxError>;

    async fn quotas_by_sailing(
        &mut self,
        sailing_id: Uuid,
    ) -> Result<Vec<CapacityEntry>, BoxError>;

    /// Tickets in the given statuses for a (sailing, class) pair. Only
    /// meaningful as a reservation input when evaluated after `lock_quota`
    /// in the same transaction.
    async fn count_occupied(
        &mut self,
        sailing_id: Uuid,
        class_id: Uuid,
        statuses: &[TicketStatus],
    ) -> Result<i64, BoxError>;

    /// Tickets that already carry a seat label for a (sailing, class)
    /// pair. Drives seat-number sequencing, also under the ledger lock.
    async fn count_assigned_seats(
        &mut self,
        sailing_id: Uuid,
        class_id: Uuid,
    ) -> Result<i64, BoxError>;
}

#[async_trait]
pub trait TicketOps {
    async fn insert_tickets(&mut self, tickets: &[Ticket]) -> Result<(), BoxError>;

    async fn update_tickets(&mut self, tickets: &[Ticket]) -> Result<(), BoxError>;

    async fn tickets_by_session(&mut self, session_id: Uuid) -> Result<Vec<Ticket>, BoxError>;

    /// Bulk release of a session's tickets; returns how many rows went.
    async fn delete_tickets_by_session(&mut self, session_id: Uuid) -> Result<u64, BoxError>;
}

#[async_trait]
pub trait BookingOps {
    async fn insert_booking(&mut self, booking: &Booking) -> Result<(), BoxError>;

    async fn update_booking_status(
        &mut self,
        id: Uuid,
        status: BookingStatus,
    ) -> Result<(), BoxError>;
}

#[async_trait]
pub trait SessionOps {
    async fn insert_session(&mut self, session: &ClaimSession) -> Result<(), BoxError>;

    async fn session_by_token(&mut self, token: Uuid) -> Result<Option<ClaimSession>, BoxError>;

    /// Same lookup but with an exclusive row lock, so a concurrent sweep or
    /// duplicate submission serializes behind the caller.
    async fn session_by_token_for_update(
        &mut self,
        token: Uuid,
    ) -> Result<Option<ClaimSession>, BoxError>;

    async fn session_by_id(&mut self, id: Uuid) -> Result<Option<ClaimSession>, BoxError>;

    async fn update_session(&mut self, session: &ClaimSession) -> Result<(), BoxError>;

    async fn delete_session(&mut self, id: Uuid) -> Result<(), BoxError>;

    /// Sessions eligible for reclaim: past their deadline while still
    /// non-terminal, or already parked in the expired status.
    async fn expired_sessions(
        &mut self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<ClaimSession>, BoxError>;
}

/// One storage transaction. Dropping it uncommitted rolls everything back;
/// that is the only rollback mechanism the engine relies on, so it also
/// covers panics unwinding through a transaction body.
#[async_trait]
pub trait StoreTx:
    CatalogOps + LedgerOps + TicketOps + BookingOps + SessionOps + Send
{
    async fn commit(self) -> Result<(), BoxError>;
}
