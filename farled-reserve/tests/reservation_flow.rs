use chrono::{Duration, Utc};
use farled_core::booking::{BookingStatus, CustomerContact};
use farled_core::sailing::{CapacityEntry, Fare, Manifest, Sailing};
use farled_core::session::ClaimSessionStatus;
use farled_core::ticket::{TicketKind, TicketStatus};
use farled_core::ReservationError;
use farled_reserve::request::{CreateHoldRequest, DataEntryRequest, HoldLine, TicketData};
use farled_reserve::{HoldPolicy, ReservationService};
use farled_store::MemoryStore;
use uuid::Uuid;

struct Fixture {
    store: MemoryStore,
    sailing_id: Uuid,
    economy: Uuid,
    business: Uuid,
    vehicle: Uuid,
}

/// One sailing with three classes: economy (quota 2), business (quota 4)
/// and a single vehicle slot. Class IDs are fixed so multi-class requests
/// lock in a known order.
async fn fixture() -> Fixture {
    let store = MemoryStore::new();
    let sailing_id = Uuid::new_v4();
    let ship_id = Uuid::new_v4();
    let route_id = Uuid::new_v4();
    let economy = Uuid::from_u128(1);
    let business = Uuid::from_u128(2);
    let vehicle = Uuid::from_u128(3);

    store
        .seed_sailing(Sailing {
            id: sailing_id,
            ship_id,
            route_id,
            route_alias: "MRK".to_string(),
            ship_alias: "ARW".to_string(),
            departs_at: Utc::now() + Duration::days(3),
            arrives_at: Utc::now() + Duration::days(3) + Duration::hours(7),
        })
        .await;

    for (class_id, alias, kind, quota, price_cents) in [
        (economy, "E", TicketKind::Passenger, 2, 150_000),
        (business, "B", TicketKind::Passenger, 4, 320_000),
        (vehicle, "V", TicketKind::Vehicle, 1, 540_000),
    ] {
        store
            .seed_capacity(CapacityEntry {
                id: Uuid::new_v4(),
                sailing_id,
                class_id,
                quota,
            })
            .await;
        let manifest_id = Uuid::new_v4();
        store
            .seed_manifest(Manifest {
                id: manifest_id,
                ship_id,
                class_id,
                class_alias: alias.to_string(),
                kind,
            })
            .await;
        store
            .seed_fare(Fare {
                id: Uuid::new_v4(),
                manifest_id,
                route_id,
                price_cents,
            })
            .await;
    }

    Fixture {
        store,
        sailing_id,
        economy,
        business,
        vehicle,
    }
}

fn service(store: &MemoryStore) -> ReservationService<MemoryStore> {
    ReservationService::new(store.clone(), HoldPolicy::default())
}

fn service_with_ttl(store: &MemoryStore, data_entry_ttl: Duration) -> ReservationService<MemoryStore> {
    ReservationService::new(
        store.clone(),
        HoldPolicy {
            data_entry_ttl,
            ..HoldPolicy::default()
        },
    )
}

fn hold(sailing_id: Uuid, items: &[(Uuid, u32)]) -> CreateHoldRequest {
    CreateHoldRequest {
        sailing_id,
        items: items
            .iter()
            .map(|&(class_id, quantity)| HoldLine { class_id, quantity })
            .collect(),
    }
}

fn contact() -> CustomerContact {
    CustomerContact {
        customer_name: "Asep Sutrisna".to_string(),
        id_type: "KTP".to_string(),
        id_number: "3174091202990002".to_string(),
        phone_number: "+62811223344".to_string(),
        email: "asep@example.com".to_string(),
    }
}

fn passenger_data(ticket_id: Uuid, name: &str) -> TicketData {
    TicketData {
        ticket_id,
        passenger_name: Some(name.to_string()),
        passenger_age: Some(34),
        passenger_gender: Some("male".to_string()),
        address: Some("Jl. Pelabuhan 12, Cilegon".to_string()),
        id_type: Some("KTP".to_string()),
        id_number: Some("3174091202990002".to_string()),
        license_plate: None,
    }
}

fn vehicle_data(ticket_id: Uuid, plate: &str) -> TicketData {
    TicketData {
        ticket_id,
        passenger_name: None,
        passenger_age: None,
        passenger_gender: None,
        address: None,
        id_type: None,
        id_number: None,
        license_plate: Some(plate.to_string()),
    }
}

#[tokio::test]
async fn hold_data_entry_and_payment_flow() {
    let fx = fixture().await;
    let svc = service(&fx.store);

    let held = svc
        .create_hold(hold(fx.sailing_id, &[(fx.economy, 2), (fx.vehicle, 1)]))
        .await
        .unwrap();
    assert_eq!(held.ticket_ids.len(), 3);
    assert!(held.expires_at > Utc::now());

    let view = svc.get_session(held.session_token).await.unwrap();
    assert_eq!(view.session.status, ClaimSessionStatus::PendingData);
    let passenger_ids: Vec<Uuid> = view
        .tickets
        .iter()
        .filter(|t| t.kind == TicketKind::Passenger)
        .map(|t| t.id)
        .collect();
    let vehicle_id = view
        .tickets
        .iter()
        .find(|t| t.kind == TicketKind::Vehicle)
        .map(|t| t.id)
        .unwrap();

    let accepted = svc
        .fill_data(
            held.session_token,
            DataEntryRequest {
                contact: contact(),
                tickets: vec![
                    passenger_data(passenger_ids[0], "Asep Sutrisna"),
                    passenger_data(passenger_ids[1], "Rina Marlina"),
                    vehicle_data(vehicle_id, "B 1234 XYZ"),
                ],
            },
        )
        .await
        .unwrap();
    assert!(accepted.order_id.starts_with("ID-MRK-ARW"));
    assert_eq!(accepted.updated_ticket_ids.len(), 3);
    assert_eq!(
        fx.store.booking_status(accepted.booking_id).await,
        Some(BookingStatus::PendingPayment)
    );

    let view = svc.get_session(held.session_token).await.unwrap();
    assert_eq!(view.session.status, ClaimSessionStatus::PendingPayment);
    let mut seats: Vec<String> = view
        .tickets
        .iter()
        .filter_map(|t| t.seat_number.clone())
        .collect();
    seats.sort();
    assert_eq!(seats, ["E1", "E2"]);
    let vehicle_ticket = view
        .tickets
        .iter()
        .find(|t| t.kind == TicketKind::Vehicle)
        .unwrap();
    assert_eq!(vehicle_ticket.license_plate.as_deref(), Some("B 1234 XYZ"));
    assert!(vehicle_ticket.seat_number.is_none());
    assert!(view
        .tickets
        .iter()
        .all(|t| t.status == TicketStatus::DataEntered));

    svc.confirm_payment(held.session_token).await.unwrap();
    assert_eq!(
        fx.store.booking_status(accepted.booking_id).await,
        Some(BookingStatus::Paid)
    );
    let view = svc.get_session(held.session_token).await.unwrap();
    assert_eq!(view.session.status, ClaimSessionStatus::Success);
    assert!(view
        .tickets
        .iter()
        .all(|t| t.status == TicketStatus::Confirmed));
}

#[tokio::test]
async fn concurrent_holds_never_oversell() {
    let fx = fixture().await;
    let svc = service(&fx.store);

    let (a, b) = tokio::join!(
        svc.create_hold(hold(fx.sailing_id, &[(fx.economy, 2)])),
        svc.create_hold(hold(fx.sailing_id, &[(fx.economy, 2)])),
    );

    // Exactly one wins; the loser sees the winner's occupancy.
    let (winner, loser) = match (a, b) {
        (Ok(w), Err(l)) => (w, l),
        (Err(l), Ok(w)) => (w, l),
        other => panic!("expected exactly one hold to succeed, got {other:?}"),
    };
    assert_eq!(winner.ticket_ids.len(), 2);
    match loser {
        ReservationError::InsufficientCapacity {
            class_id,
            available,
            requested,
        } => {
            assert_eq!(class_id, fx.economy);
            assert_eq!(available, 0);
            assert_eq!(requested, 2);
        }
        other => panic!("expected a capacity conflict, got {other:?}"),
    }
    assert_eq!(fx.store.ticket_count().await, 2);
    assert_eq!(fx.store.session_count().await, 1);
}

#[tokio::test]
async fn hold_failing_on_last_item_writes_nothing() {
    let fx = fixture().await;
    let svc = service(&fx.store);

    // economy fits, business (locked second) does not
    let err = svc
        .create_hold(hold(fx.sailing_id, &[(fx.economy, 1), (fx.business, 5)]))
        .await
        .unwrap_err();

    match err {
        ReservationError::InsufficientCapacity {
            class_id,
            available,
            requested,
        } => {
            assert_eq!(class_id, fx.business);
            assert_eq!(available, 4);
            assert_eq!(requested, 5);
        }
        other => panic!("expected a capacity conflict, got {other:?}"),
    }
    assert_eq!(fx.store.ticket_count().await, 0);
    assert_eq!(fx.store.session_count().await, 0);
}

#[tokio::test]
async fn invalid_hold_requests_fail_before_any_write() {
    let fx = fixture().await;
    let svc = service(&fx.store);

    for request in [
        hold(fx.sailing_id, &[(fx.economy, 0)]),
        hold(fx.sailing_id, &[(Uuid::nil(), 1)]),
        hold(fx.sailing_id, &[(fx.economy, 1), (fx.economy, 1)]),
        hold(fx.sailing_id, &[]),
    ] {
        let err = svc.create_hold(request).await.unwrap_err();
        assert!(
            matches!(err, ReservationError::Validation(_)),
            "expected validation error, got {err:?}"
        );
    }
    assert_eq!(fx.store.ticket_count().await, 0);
    assert_eq!(fx.store.session_count().await, 0);
}

#[tokio::test]
async fn hold_for_unknown_sailing_is_not_found() {
    let fx = fixture().await;
    let svc = service(&fx.store);

    let err = svc
        .create_hold(hold(Uuid::new_v4(), &[(fx.economy, 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, ReservationError::NotFound("sailing")));
}

#[tokio::test]
async fn partial_data_entry_updates_nothing() {
    let fx = fixture().await;
    let svc = service(&fx.store);

    let held = svc
        .create_hold(hold(fx.sailing_id, &[(fx.economy, 2)]))
        .await
        .unwrap();

    let err = svc
        .fill_data(
            held.session_token,
            DataEntryRequest {
                contact: contact(),
                tickets: vec![passenger_data(held.ticket_ids[0], "Asep Sutrisna")],
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ReservationError::Validation(_)));

    let view = svc.get_session(held.session_token).await.unwrap();
    assert_eq!(view.session.status, ClaimSessionStatus::PendingData);
    assert!(view.tickets.iter().all(|t| t.status == TicketStatus::Held));
    assert!(view.tickets.iter().all(|t| t.seat_number.is_none()));
}

#[tokio::test]
async fn unknown_ticket_in_payload_fails_the_whole_request() {
    let fx = fixture().await;
    let svc = service(&fx.store);

    let held = svc
        .create_hold(hold(fx.sailing_id, &[(fx.economy, 2)]))
        .await
        .unwrap();

    let result = svc
        .fill_data(
            held.session_token,
            DataEntryRequest {
                contact: contact(),
                tickets: vec![
                    passenger_data(held.ticket_ids[0], "Asep Sutrisna"),
                    passenger_data(Uuid::new_v4(), "Nobody"),
                ],
            },
        )
        .await;
    assert!(result.is_err());

    let view = svc.get_session(held.session_token).await.unwrap();
    assert!(view.tickets.iter().all(|t| t.status == TicketStatus::Held));
}

#[tokio::test]
async fn data_entry_is_guarded_against_reentry() {
    let fx = fixture().await;
    let svc = service(&fx.store);

    let held = svc
        .create_hold(hold(fx.sailing_id, &[(fx.economy, 1)]))
        .await
        .unwrap();
    let entry = DataEntryRequest {
        contact: contact(),
        tickets: vec![passenger_data(held.ticket_ids[0], "Asep Sutrisna")],
    };

    svc.fill_data(held.session_token, entry.clone()).await.unwrap();

    let err = svc.fill_data(held.session_token, entry).await.unwrap_err();
    match err {
        ReservationError::InvalidState { status } => {
            assert_eq!(status, ClaimSessionStatus::PendingPayment)
        }
        other => panic!("expected an invalid-state error, got {other:?}"),
    }
}

#[tokio::test]
async fn expired_session_is_distinguished_from_missing() {
    let fx = fixture().await;
    let svc = service_with_ttl(&fx.store, Duration::seconds(-1));

    let held = svc
        .create_hold(hold(fx.sailing_id, &[(fx.economy, 1)]))
        .await
        .unwrap();

    let entry = DataEntryRequest {
        contact: contact(),
        tickets: vec![passenger_data(held.ticket_ids[0], "Asep Sutrisna")],
    };
    let err = svc.fill_data(held.session_token, entry.clone()).await.unwrap_err();
    assert!(matches!(err, ReservationError::SessionExpired));

    let err = svc.fill_data(Uuid::new_v4(), entry).await.unwrap_err();
    assert!(matches!(err, ReservationError::NotFound("claim session")));

    // Reads treat an expired-but-unswept session as gone too
    let err = svc.get_session(held.session_token).await.unwrap_err();
    assert!(matches!(err, ReservationError::SessionExpired));
}

#[tokio::test]
async fn sweep_reclaims_expired_holds() {
    let fx = fixture().await;
    let expired_svc = service_with_ttl(&fx.store, Duration::seconds(-1));
    let svc = service(&fx.store);

    let live = svc
        .create_hold(hold(fx.sailing_id, &[(fx.business, 1)]))
        .await
        .unwrap();
    expired_svc
        .create_hold(hold(fx.sailing_id, &[(fx.economy, 2)]))
        .await
        .unwrap();

    let report = svc.sweep_expired(Utc::now()).await.unwrap();
    assert_eq!(report.scanned, 1);
    assert_eq!(report.reclaimed, 1);
    assert_eq!(report.failed, 0);

    // The expired hold's slots are free again, the live one is untouched
    assert_eq!(fx.store.session_count().await, 1);
    assert_eq!(fx.store.ticket_count().await, 1);
    assert!(svc.get_session(live.session_token).await.is_ok());

    let availability = svc.availability(fx.sailing_id).await.unwrap();
    let economy = availability
        .iter()
        .find(|a| a.class_id == fx.economy)
        .unwrap();
    assert_eq!(economy.available, 2);

    // Sweeping again is a no-op
    let report = svc.sweep_expired(Utc::now()).await.unwrap();
    assert_eq!(report.scanned, 0);
    assert_eq!(report.reclaimed, 0);
}

#[tokio::test]
async fn cancel_releases_held_capacity() {
    let fx = fixture().await;
    let svc = service(&fx.store);

    let held = svc
        .create_hold(hold(fx.sailing_id, &[(fx.economy, 2)]))
        .await
        .unwrap();
    let session_id = svc.get_session(held.session_token).await.unwrap().session.id;

    svc.cancel_session(session_id).await.unwrap();

    assert_eq!(fx.store.session_count().await, 0);
    assert_eq!(fx.store.ticket_count().await, 0);

    let err = svc.cancel_session(session_id).await.unwrap_err();
    assert!(matches!(err, ReservationError::NotFound("claim session")));

    // Capacity is back
    svc.create_hold(hold(fx.sailing_id, &[(fx.economy, 2)]))
        .await
        .unwrap();
}

#[tokio::test]
async fn availability_reflects_open_holds() {
    let fx = fixture().await;
    let svc = service(&fx.store);

    svc.create_hold(hold(fx.sailing_id, &[(fx.economy, 1)]))
        .await
        .unwrap();

    let availability = svc.availability(fx.sailing_id).await.unwrap();
    let economy = availability
        .iter()
        .find(|a| a.class_id == fx.economy)
        .unwrap();
    assert_eq!(economy.quota, 2);
    assert_eq!(economy.occupied, 1);
    assert_eq!(economy.available, 1);

    let err = svc.availability(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, ReservationError::NotFound("sailing")));
}

#[tokio::test]
async fn seat_numbers_continue_across_sessions() {
    let fx = fixture().await;
    let svc = service(&fx.store);

    for expected in [["B1", "B2"], ["B3", "B4"]] {
        let held = svc
            .create_hold(hold(fx.sailing_id, &[(fx.business, 2)]))
            .await
            .unwrap();
        svc.fill_data(
            held.session_token,
            DataEntryRequest {
                contact: contact(),
                tickets: held
                    .ticket_ids
                    .iter()
                    .map(|&id| passenger_data(id, "Rina Marlina"))
                    .collect(),
            },
        )
        .await
        .unwrap();

        let view = svc.get_session(held.session_token).await.unwrap();
        let mut seats: Vec<String> = view
            .tickets
            .iter()
            .filter_map(|t| t.seat_number.clone())
            .collect();
        seats.sort();
        assert_eq!(seats, expected);
    }
}

#[tokio::test]
async fn vehicle_tickets_require_a_license_plate() {
    let fx = fixture().await;
    let svc = service(&fx.store);

    let held = svc
        .create_hold(hold(fx.sailing_id, &[(fx.vehicle, 1)]))
        .await
        .unwrap();

    let err = svc
        .fill_data(
            held.session_token,
            DataEntryRequest {
                contact: contact(),
                // passenger payload against a vehicle ticket
                tickets: vec![passenger_data(held.ticket_ids[0], "Asep Sutrisna")],
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ReservationError::Validation(_)));
}

#[tokio::test]
async fn payment_confirmation_requires_pending_payment() {
    let fx = fixture().await;
    let svc = service(&fx.store);

    let held = svc
        .create_hold(hold(fx.sailing_id, &[(fx.economy, 1)]))
        .await
        .unwrap();

    let err = svc.confirm_payment(held.session_token).await.unwrap_err();
    match err {
        ReservationError::InvalidState { status } => {
            assert_eq!(status, ClaimSessionStatus::PendingData)
        }
        other => panic!("expected an invalid-state error, got {other:?}"),
    }
}
