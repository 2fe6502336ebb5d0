use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};
use farled_core::booking::{Booking, BookingStatus};
use farled_core::session::{ClaimSession, ClaimSessionStatus};
use farled_core::store::{
    BookingOps, CatalogOps, LedgerOps, ReservationStore, SessionOps, StoreTx, TicketOps,
};
use farled_core::ticket::{Ticket, TicketKind, TicketStatus};
use farled_core::{ReservationError, ReservationResult};
use tracing::{info, warn};
use uuid::Uuid;

use crate::order_id;
use crate::policy::HoldPolicy;
use crate::request::{
    ClassAvailability, CreateHoldRequest, DataEntryAccepted, DataEntryRequest, HoldCreated,
    SessionView, SweepReport, TicketData,
};

/// Orchestrates the reservation flow. Every public operation is one
/// storage transaction from begin to commit; an error anywhere inside
/// drops the transaction and with it every pending write.
pub struct ReservationService<S> {
    store: S,
    policy: HoldPolicy,
}

impl<S: ReservationStore> ReservationService<S> {
    pub fn new(store: S, policy: HoldPolicy) -> Self {
        Self { store, policy }
    }

    /// Claim slots for a sailing and hand back a time-limited session.
    ///
    /// All capacity checks run before any ticket is written: ledger rows
    /// are locked in ascending class order (so two multi-class requests
    /// cannot deadlock on each other), occupancy is counted under each
    /// lock, and the first class without room fails the whole request.
    pub async fn create_hold(&self, request: CreateHoldRequest) -> ReservationResult<HoldCreated> {
        // Input validation, before any storage work
        if request.items.is_empty() {
            return Err(ReservationError::Validation(
                "a hold needs at least one line item".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for (idx, item) in request.items.iter().enumerate() {
            if item.quantity == 0 {
                return Err(ReservationError::Validation(format!(
                    "quantity must be positive for item {idx}"
                )));
            }
            if item.class_id.is_nil() {
                return Err(ReservationError::Validation(format!(
                    "missing class for item {idx}"
                )));
            }
            if !seen.insert(item.class_id) {
                return Err(ReservationError::Validation(format!(
                    "class {} appears more than once",
                    item.class_id
                )));
            }
        }

        let mut items = request.items;
        items.sort_by_key(|item| item.class_id);

        let mut tx = self.store.begin().await?;

        let sailing = tx
            .sailing_by_id(request.sailing_id)
            .await?
            .ok_or(ReservationError::NotFound("sailing"))?;

        // Lock and check every class before writing anything
        for item in &items {
            let quota = tx
                .lock_quota(sailing.id, item.class_id)
                .await?
                .ok_or(ReservationError::NotFound("capacity ledger entry"))?;
            let occupied = tx
                .count_occupied(sailing.id, item.class_id, &TicketStatus::OCCUPYING)
                .await?;

            let available = i64::from(quota) - occupied;
            if available < i64::from(item.quantity) {
                return Err(ReservationError::InsufficientCapacity {
                    class_id: item.class_id,
                    available,
                    requested: i64::from(item.quantity),
                });
            }
        }

        let now = Utc::now();
        let session = ClaimSession::new(sailing.id, now + self.policy.data_entry_ttl);
        tx.insert_session(&session).await?;

        // A missing manifest or fare here is a configuration gap, never
        // skipped silently.
        let mut tickets = Vec::new();
        for item in &items {
            let manifest = tx
                .manifest_by_ship_and_class(sailing.ship_id, item.class_id)
                .await?
                .ok_or(ReservationError::NotFound("manifest"))?;
            let fare = tx
                .fare_by_manifest_and_route(manifest.id, sailing.route_id)
                .await?
                .ok_or(ReservationError::NotFound("fare"))?;

            for _ in 0..item.quantity {
                tickets.push(Ticket::placeholder(
                    sailing.id,
                    item.class_id,
                    manifest.kind,
                    fare.price_cents,
                    session.id,
                ));
            }
        }
        tx.insert_tickets(&tickets).await?;

        tx.commit().await?;

        info!(
            session = %session.token,
            sailing = %sailing.id,
            tickets = tickets.len(),
            "hold created"
        );

        Ok(HoldCreated {
            session_token: session.token,
            expires_at: session.expires_at,
            ticket_ids: tickets.iter().map(|t| t.id).collect(),
        })
    }

    /// Attach passenger/vehicle data to every ticket of a session, create
    /// the booking shell and advance the session toward payment.
    ///
    /// The session row is locked first, so a concurrent sweep cannot
    /// reclaim a session mid-entry. The payload must cover the session's
    /// tickets exactly; a partial submission writes nothing.
    pub async fn fill_data(
        &self,
        token: Uuid,
        request: DataEntryRequest,
    ) -> ReservationResult<DataEntryAccepted> {
        if request.tickets.is_empty() {
            return Err(ReservationError::Validation(
                "no ticket data supplied".to_string(),
            ));
        }
        non_empty(&request.contact.customer_name, "customer name")?;
        non_empty(&request.contact.id_type, "customer ID type")?;
        non_empty(&request.contact.id_number, "customer ID number")?;
        non_empty(&request.contact.phone_number, "phone number")?;
        non_empty(&request.contact.email, "email")?;

        let mut remaining: HashMap<Uuid, TicketData> = HashMap::new();
        for data in request.tickets {
            let id = data.ticket_id;
            if remaining.insert(id, data).is_some() {
                return Err(ReservationError::Validation(format!(
                    "duplicate data for ticket {id}"
                )));
            }
        }

        let mut tx = self.store.begin().await?;
        let now = Utc::now();

        let mut session = tx
            .session_by_token_for_update(token)
            .await?
            .ok_or(ReservationError::NotFound("claim session"))?;

        // The sweeper runs on an interval; the deadline is enforced here
        // as well so a stale session cannot be completed in the gap.
        if session.is_expired(now) {
            return Err(ReservationError::SessionExpired);
        }
        if session.status != ClaimSessionStatus::PendingData {
            return Err(ReservationError::InvalidState {
                status: session.status,
            });
        }

        let mut tickets = tx.tickets_by_session(session.id).await?;
        if remaining.len() != tickets.len() {
            return Err(ReservationError::Validation(format!(
                "data entry must cover all {} tickets of the session, got {}",
                tickets.len(),
                remaining.len()
            )));
        }

        let sailing = tx
            .sailing_by_id(session.sailing_id)
            .await?
            .ok_or(ReservationError::NotFound("sailing"))?;

        let order_id = order_id::generate(&sailing.route_alias, &sailing.ship_alias, now);
        let booking = Booking::pending(order_id.clone(), sailing.id, request.contact);
        tx.insert_booking(&booking).await?;

        // Seat sequencing happens under the same ledger lock that guards
        // quota, ascending by class: concurrent data entries serialize
        // here instead of racing the counter.
        let passenger_classes: BTreeSet<Uuid> = tickets
            .iter()
            .filter(|t| t.kind == TicketKind::Passenger)
            .map(|t| t.class_id)
            .collect();

        let mut seat_counters: HashMap<Uuid, i64> = HashMap::new();
        let mut seat_prefixes: HashMap<Uuid, String> = HashMap::new();
        for class_id in passenger_classes {
            if tx.lock_quota(sailing.id, class_id).await?.is_none() {
                return Err(ReservationError::NotFound("capacity ledger entry"));
            }
            let assigned = tx.count_assigned_seats(sailing.id, class_id).await?;
            seat_counters.insert(class_id, assigned);

            let manifest = tx
                .manifest_by_ship_and_class(sailing.ship_id, class_id)
                .await?
                .ok_or(ReservationError::NotFound("manifest"))?;
            seat_prefixes.insert(class_id, manifest.class_alias);
        }

        let mut updated_ticket_ids = Vec::with_capacity(tickets.len());
        for ticket in &mut tickets {
            let Some(data) = remaining.remove(&ticket.id) else {
                return Err(ReservationError::Validation(format!(
                    "ticket {} received no data",
                    ticket.id
                )));
            };

            ticket.passenger_name = data.passenger_name;
            ticket.passenger_age = data.passenger_age;
            ticket.passenger_gender = data.passenger_gender;
            ticket.address = data.address;
            ticket.id_type = data.id_type;
            ticket.id_number = data.id_number;

            match ticket.kind {
                TicketKind::Passenger => {
                    required(&ticket.passenger_name, "passenger name", ticket.id)?;
                    required(&ticket.address, "address", ticket.id)?;
                    required(&ticket.id_type, "ID type", ticket.id)?;
                    required(&ticket.id_number, "ID number", ticket.id)?;
                    if !ticket.passenger_age.is_some_and(|age| age > 0) {
                        return Err(ReservationError::Validation(format!(
                            "missing passenger age for ticket {}",
                            ticket.id
                        )));
                    }

                    let count = seat_counters.entry(ticket.class_id).or_insert(0);
                    *count += 1;
                    let prefix = seat_prefixes
                        .get(&ticket.class_id)
                        .ok_or(ReservationError::NotFound("manifest"))?;
                    ticket.seat_number = Some(format!("{prefix}{count}"));
                    ticket.license_plate = None;
                }
                TicketKind::Vehicle => {
                    let plate = data
                        .license_plate
                        .as_deref()
                        .filter(|p| !p.is_empty())
                        .ok_or_else(|| {
                            ReservationError::Validation(format!(
                                "missing license plate for vehicle ticket {}",
                                ticket.id
                            ))
                        })?;
                    ticket.license_plate = Some(plate.to_string());
                    ticket.seat_number = None;
                }
            }

            ticket.attach_booking(booking.id);
            updated_ticket_ids.push(ticket.id);
        }

        // Anything left over referenced a ticket this session never owned
        if !remaining.is_empty() {
            return Err(ReservationError::NotFound("ticket"));
        }

        tx.update_tickets(&tickets).await?;

        session.advance(ClaimSessionStatus::PendingPayment)?;
        session.extend_deadline(self.policy.payment_ttl);
        tx.update_session(&session).await?;

        tx.commit().await?;

        info!(
            session = %session.token,
            booking = %booking.id,
            order = %order_id,
            "data entry complete, awaiting payment"
        );

        Ok(DataEntryAccepted {
            booking_id: booking.id,
            order_id,
            updated_ticket_ids,
        })
    }

    /// Payment settled (reported by the gateway integration, which lives
    /// outside this crate): tickets confirm, the booking is paid and the
    /// session reaches its terminal success state.
    pub async fn confirm_payment(&self, token: Uuid) -> ReservationResult<()> {
        let mut tx = self.store.begin().await?;
        let now = Utc::now();

        let mut session = tx
            .session_by_token_for_update(token)
            .await?
            .ok_or(ReservationError::NotFound("claim session"))?;

        if session.is_expired(now) && !session.status.is_terminal() {
            return Err(ReservationError::SessionExpired);
        }
        if session.status != ClaimSessionStatus::PendingPayment {
            return Err(ReservationError::InvalidState {
                status: session.status,
            });
        }

        let mut tickets = tx.tickets_by_session(session.id).await?;
        let booking_id = tickets
            .iter()
            .find_map(|t| t.owner.booking_id())
            .ok_or(ReservationError::NotFound("booking"))?;
        for ticket in &mut tickets {
            ticket.confirm();
        }
        tx.update_tickets(&tickets).await?;
        tx.update_booking_status(booking_id, BookingStatus::Paid).await?;

        session.advance(ClaimSessionStatus::Success)?;
        tx.update_session(&session).await?;

        tx.commit().await?;

        info!(session = %session.token, booking = %booking_id, "payment confirmed");
        Ok(())
    }

    /// Explicit cancellation: the session row and its tickets go away and
    /// the held slots return to the pool immediately.
    pub async fn cancel_session(&self, session_id: Uuid) -> ReservationResult<()> {
        let mut tx = self.store.begin().await?;

        let session = tx
            .session_by_id(session_id)
            .await?
            .ok_or(ReservationError::NotFound("claim session"))?;

        let released = tx.delete_tickets_by_session(session.id).await?;
        tx.delete_session(session.id).await?;

        tx.commit().await?;

        info!(session = %session.token, tickets = released, "claim session cancelled");
        Ok(())
    }

    /// Current occupancy per class for a sailing. Plain reads, no locks:
    /// the numbers are advisory and only a hold decides anything.
    pub async fn availability(&self, sailing_id: Uuid) -> ReservationResult<Vec<ClassAvailability>> {
        let mut tx = self.store.begin().await?;

        if tx.sailing_by_id(sailing_id).await?.is_none() {
            return Err(ReservationError::NotFound("sailing"));
        }

        let entries = tx.quotas_by_sailing(sailing_id).await?;
        let mut report = Vec::with_capacity(entries.len());
        for entry in entries {
            let occupied = tx
                .count_occupied(sailing_id, entry.class_id, &TicketStatus::OCCUPYING)
                .await?;
            report.push(ClassAvailability {
                class_id: entry.class_id,
                quota: entry.quota,
                occupied,
                available: i64::from(entry.quota) - occupied,
            });
        }

        tx.commit().await?;
        Ok(report)
    }

    /// Session plus its tickets, by token. A session past its deadline
    /// that the sweeper has not reclaimed yet reads as expired, not live.
    pub async fn get_session(&self, token: Uuid) -> ReservationResult<SessionView> {
        let mut tx = self.store.begin().await?;

        let session = tx
            .session_by_token(token)
            .await?
            .ok_or(ReservationError::NotFound("claim session"))?;

        if !session.status.is_terminal() && session.is_expired(Utc::now()) {
            return Err(ReservationError::SessionExpired);
        }

        let tickets = tx.tickets_by_session(session.id).await?;
        tx.commit().await?;

        Ok(SessionView { session, tickets })
    }

    /// One sweep pass: collect reclaimable sessions, then release each in
    /// its own transaction so one bad session cannot stall the batch.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> ReservationResult<SweepReport> {
        let expired = {
            let mut tx = self.store.begin().await?;
            let list = tx.expired_sessions(now, self.policy.sweep_batch).await?;
            tx.commit().await?;
            list
        };

        if expired.is_empty() {
            return Ok(SweepReport {
                scanned: 0,
                reclaimed: 0,
                failed: 0,
            });
        }

        info!(count = expired.len(), "reclaiming expired claim sessions");

        let mut reclaimed = 0;
        let mut failed = 0;
        for session in &expired {
            match self.reclaim_session(session.token).await {
                Ok(()) => reclaimed += 1,
                Err(err) => {
                    failed += 1;
                    tracing::error!(
                        session = %session.token,
                        error = %err,
                        "failed to reclaim expired session"
                    );
                }
            }
        }

        Ok(SweepReport {
            scanned: expired.len(),
            reclaimed,
            failed,
        })
    }

    async fn reclaim_session(&self, token: Uuid) -> ReservationResult<()> {
        let mut tx = self.store.begin().await?;

        // Lock the session row first: an in-flight data entry on the same
        // session holds this lock until it commits its deadline extension.
        let Some(session) = tx.session_by_token_for_update(token).await? else {
            // Already reclaimed, nothing to do
            return Ok(());
        };

        // Re-check under the lock; a data entry that committed after the
        // sweep scan may have pushed the deadline out or finished payment.
        let still_reclaimable = session.status == ClaimSessionStatus::Expired
            || (!session.status.is_terminal() && session.is_expired(Utc::now()));
        if !still_reclaimable {
            return Ok(());
        }

        let tickets = tx.tickets_by_session(session.id).await?;
        if tickets.is_empty() {
            // Drift: a session without tickets should not exist, but it
            // must not stop the sweep either.
            warn!(session = %session.token, "expired session has no linked tickets");
        } else {
            tx.delete_tickets_by_session(session.id).await?;
        }
        tx.delete_session(session.id).await?;

        tx.commit().await?;
        Ok(())
    }
}

fn non_empty(value: &str, field: &str) -> ReservationResult<()> {
    if value.trim().is_empty() {
        return Err(ReservationError::Validation(format!("missing {field}")));
    }
    Ok(())
}

fn required(value: &Option<String>, field: &str, ticket_id: Uuid) -> ReservationResult<()> {
    match value.as_deref().filter(|v| !v.trim().is_empty()) {
        Some(_) => Ok(()),
        None => Err(ReservationError::Validation(format!(
            "missing {field} for ticket {ticket_id}"
        ))),
    }
}
