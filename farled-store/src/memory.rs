use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use farled_core::booking::{Booking, BookingStatus};
use farled_core::sailing::{CapacityEntry, Fare, Manifest, Sailing};
use farled_core::session::ClaimSession;
use farled_core::session::ClaimSessionStatus;
use farled_core::store::{
    BookingOps, BoxError, CatalogOps, LedgerOps, ReservationStore, SessionOps, StoreTx, TicketOps,
};
use farled_core::ticket::{Ticket, TicketStatus};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Debug, Default, Clone)]
struct MemState {
    sailings: HashMap<Uuid, Sailing>,
    capacity: Vec<CapacityEntry>,
    manifests: Vec<Manifest>,
    fares: Vec<Fare>,
    tickets: HashMap<Uuid, Ticket>,
    sessions: HashMap<Uuid, ClaimSession>,
    bookings: HashMap<Uuid, Booking>,
}

/// In-memory store with the same transactional contract as Postgres: a
/// transaction owns the whole state for its lifetime (a coarse stand-in
/// for the ledger row lock) and mutates a working copy that only `commit`
/// publishes. Dropping an uncommitted transaction discards its writes.
///
/// This is what the engine's tests run against, including the concurrency
/// properties: two racing holds serialize on the state mutex exactly the
/// way they would serialize on a `FOR UPDATE` ledger row.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_sailing(&self, sailing: Sailing) {
        self.state.lock().await.sailings.insert(sailing.id, sailing);
    }

    pub async fn seed_capacity(&self, entry: CapacityEntry) {
        self.state.lock().await.capacity.push(entry);
    }

    pub async fn seed_manifest(&self, manifest: Manifest) {
        self.state.lock().await.manifests.push(manifest);
    }

    pub async fn seed_fare(&self, fare: Fare) {
        self.state.lock().await.fares.push(fare);
    }

    pub async fn session_count(&self) -> usize {
        self.state.lock().await.sessions.len()
    }

    pub async fn ticket_count(&self) -> usize {
        self.state.lock().await.tickets.len()
    }

    pub async fn booking_status(&self, id: Uuid) -> Option<BookingStatus> {
        self.state.lock().await.bookings.get(&id).map(|b| b.status)
    }
}

#[async_trait]
impl ReservationStore for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, BoxError> {
        let guard = self.state.clone().lock_owned().await;
        let work = guard.clone();
        Ok(MemoryTx { guard, work })
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemState>,
    work: MemState,
}

#[async_trait]
impl CatalogOps for MemoryTx {
    async fn sailing_by_id(&mut self, id: Uuid) -> Result<Option<Sailing>, BoxError> {
        Ok(self.work.sailings.get(&id).cloned())
    }

    async fn manifest_by_ship_and_class(
        &mut self,
        ship_id: Uuid,
        class_id: Uuid,
    ) -> Result<Option<Manifest>, BoxError> {
        Ok(self
            .work
            .manifests
            .iter()
            .find(|m| m.ship_id == ship_id && m.class_id == class_id)
            .cloned())
    }

    async fn fare_by_manifest_and_route(
        &mut self,
        manifest_id: Uuid,
        route_id: Uuid,
    ) -> Result<Option<Fare>, BoxError> {
        Ok(self
            .work
            .fares
            .iter()
            .find(|f| f.manifest_id == manifest_id && f.route_id == route_id)
            .cloned())
    }
}

#[async_trait]
impl LedgerOps for MemoryTx {
    async fn lock_quota(
        &mut self,
        sailing_id: Uuid,
        class_id: Uuid,
    ) -> Result<Option<i32>, BoxError> {
        // The transaction already owns the whole state, so the "lock" is
        // just the lookup.
        Ok(self
            .work
            .capacity
            .iter()
            .find(|c| c.sailing_id == sailing_id && c.class_id == class_id)
            .map(|c| c.quota))
    }

    async fn quotas_by_sailing(
        &mut self,
        sailing_id: Uuid,
    ) -> Result<Vec<CapacityEntry>, BoxError> {
        let mut entries: Vec<CapacityEntry> = self
            .work
            .capacity
            .iter()
            .filter(|c| c.sailing_id == sailing_id)
            .cloned()
            .collect();
        entries.sort_by_key(|c| c.class_id);
        Ok(entries)
    }

    async fn count_occupied(
        &mut self,
        sailing_id: Uuid,
        class_id: Uuid,
        statuses: &[TicketStatus],
    ) -> Result<i64, BoxError> {
        Ok(self
            .work
            .tickets
            .values()
            .filter(|t| {
                t.sailing_id == sailing_id
                    && t.class_id == class_id
                    && statuses.contains(&t.status)
            })
            .count() as i64)
    }

    async fn count_assigned_seats(
        &mut self,
        sailing_id: Uuid,
        class_id: Uuid,
    ) -> Result<i64, BoxError> {
        Ok(self
            .work
            .tickets
            .values()
            .filter(|t| {
                t.sailing_id == sailing_id
                    && t.class_id == class_id
                    && t.seat_number.is_some()
            })
            .count() as i64)
    }
}

#[async_trait]
impl TicketOps for MemoryTx {
    async fn insert_tickets(&mut self, tickets: &[Ticket]) -> Result<(), BoxError> {
        for ticket in tickets {
            self.work.tickets.insert(ticket.id, ticket.clone());
        }
        Ok(())
    }

    async fn update_tickets(&mut self, tickets: &[Ticket]) -> Result<(), BoxError> {
        for ticket in tickets {
            self.work.tickets.insert(ticket.id, ticket.clone());
        }
        Ok(())
    }

    async fn tickets_by_session(&mut self, session_id: Uuid) -> Result<Vec<Ticket>, BoxError> {
        let mut tickets: Vec<Ticket> = self
            .work
            .tickets
            .values()
            .filter(|t| t.owner.session_id() == session_id)
            .cloned()
            .collect();
        tickets.sort_by_key(|t| (t.created_at, t.id));
        Ok(tickets)
    }

    async fn delete_tickets_by_session(&mut self, session_id: Uuid) -> Result<u64, BoxError> {
        let before = self.work.tickets.len();
        self.work
            .tickets
            .retain(|_, t| t.owner.session_id() != session_id);
        Ok((before - self.work.tickets.len()) as u64)
    }
}

#[async_trait]
impl BookingOps for MemoryTx {
    async fn insert_booking(&mut self, booking: &Booking) -> Result<(), BoxError> {
        self.work.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn update_booking_status(
        &mut self,
        id: Uuid,
        status: BookingStatus,
    ) -> Result<(), BoxError> {
        if let Some(booking) = self.work.bookings.get_mut(&id) {
            booking.status = status;
            booking.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[async_trait]
impl SessionOps for MemoryTx {
    async fn insert_session(&mut self, session: &ClaimSession) -> Result<(), BoxError> {
        self.work.sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn session_by_token(&mut self, token: Uuid) -> Result<Option<ClaimSession>, BoxError> {
        Ok(self
            .work
            .sessions
            .values()
            .find(|s| s.token == token)
            .cloned())
    }

    async fn session_by_token_for_update(
        &mut self,
        token: Uuid,
    ) -> Result<Option<ClaimSession>, BoxError> {
        // Transactions are fully serialized here, so the plain lookup
        // already has the exclusivity the row lock provides in Postgres.
        self.session_by_token(token).await
    }

    async fn session_by_id(&mut self, id: Uuid) -> Result<Option<ClaimSession>, BoxError> {
        Ok(self.work.sessions.get(&id).cloned())
    }

    async fn update_session(&mut self, session: &ClaimSession) -> Result<(), BoxError> {
        self.work.sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn delete_session(&mut self, id: Uuid) -> Result<(), BoxError> {
        self.work.sessions.remove(&id);
        Ok(())
    }

    async fn expired_sessions(
        &mut self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<ClaimSession>, BoxError> {
        let mut expired: Vec<ClaimSession> = self
            .work
            .sessions
            .values()
            .filter(|s| {
                (s.is_expired(now) && !s.status.is_terminal())
                    || s.status == ClaimSessionStatus::Expired
            })
            .cloned()
            .collect();
        expired.sort_by_key(|s| s.expires_at);
        expired.truncate(limit as usize);
        Ok(expired)
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn commit(self) -> Result<(), BoxError> {
        let MemoryTx { mut guard, work } = self;
        *guard = work;
        Ok(())
    }
}
