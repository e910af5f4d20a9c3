use std::sync::Arc;

use coach_catalog::{fare_total, Bus, Route, SeatInventory};
use coach_core::calendar::{journey_instant, DayWindow};
use coach_core::clock::Clock;
use coach_core::identity::Principal;
use coach_core::payment::{PaymentMethod, PaymentStatus};
use coach_core::{EngineError, EngineResult};
use coach_shared::{booking_code, fallback_transaction_id, Masked};
use uuid::Uuid;

use crate::locks::{ReservationLocks, TripKey};
use crate::models::{Booking, BookingDetails, BookingStatus, CancellationReceipt};
use crate::refund::{refund_amount, RefundPolicy};
use crate::repository::Stores;
use crate::request::ReserveRequest;

pub const DEFAULT_CANCELLATION_REASON: &str = "User cancelled";

#[derive(Debug, Clone, Default)]
pub struct EngineSettings {
    /// Refuse reservations on buses that have no seat layout instead of
    /// skipping the seat-number check.
    pub require_seat_layout: bool,
    pub refund_policy: RefundPolicy,
}

/// Reservation, cancellation and payment recording for bookings.
pub struct BookingEngine {
    stores: Stores,
    clock: Arc<dyn Clock>,
    locks: ReservationLocks,
    settings: EngineSettings,
}

impl BookingEngine {
    pub fn new(stores: Stores, clock: Arc<dyn Clock>, settings: EngineSettings) -> Self {
        Self {
            stores,
            clock,
            locks: ReservationLocks::new(),
            settings,
        }
    }

    /// Claims seats on one trip for the caller.
    ///
    /// The inventory read, conflict check and insert run under the trip's
    /// reservation lock, and the store rejects overlapping seats on its own,
    /// so two callers can never both confirm the same seat.
    pub async fn reserve(
        &self,
        principal: &Principal,
        request: ReserveRequest,
    ) -> EngineResult<BookingDetails> {
        request.validate()?;

        let (bus, route) = self.resolve_trip(request.bus_id, request.route_id).await?;
        if !bus.is_active || !route.is_active {
            return Err(EngineError::Validation("Bus is not available for booking".to_string()));
        }
        if route.bus_id != bus.id {
            return Err(EngineError::Validation("Route does not belong to this bus".to_string()));
        }
        let departure = route.departure().ok_or_else(|| {
            EngineError::Validation(format!("Route has an invalid departure time '{}'", route.departure_time))
        })?;

        let _trip = self
            .locks
            .acquire(TripKey {
                bus_id: bus.id,
                route_id: route.id,
                journey_date: request.journey_date,
            })
            .await;

        let confirmed = self
            .stores
            .bookings
            .confirmed_for_trip(bus.id, route.id, DayWindow::for_date(request.journey_date))
            .await?;
        let inventory = SeatInventory::from_bookings(
            confirmed
                .iter()
                .map(|b| b.seats.iter().map(|s| s.seat_number.clone())),
        );

        let conflicts = inventory.conflicts(request.seat_numbers());
        if !conflicts.is_empty() {
            tracing::info!(bus_id = %bus.id, route_id = %route.id, seats = ?conflicts, "Seat conflict on reserve");
            return Err(EngineError::SeatConflict(conflicts));
        }

        match self.stores.layouts.layout(bus.id).await? {
            Some(layout) => {
                let invalid = layout.unknown_seats(request.seat_numbers());
                if !invalid.is_empty() {
                    return Err(EngineError::InvalidSeat(invalid));
                }
            }
            None if self.settings.require_seat_layout => {
                return Err(EngineError::Validation(
                    "Seat layout is not configured for this bus".to_string(),
                ));
            }
            None => {}
        }

        let total_amount = fare_total(route.price, request.seats.len())?;
        let now = self.clock.now();
        let booking = Booking {
            id: Uuid::new_v4(),
            user_id: principal.id,
            bus_id: bus.id,
            route_id: route.id,
            journey_date: request.journey_date,
            departs_at: journey_instant(request.journey_date, departure),
            seats: request.seats,
            boarding_point: request.boarding_point,
            dropping_point: request.dropping_point,
            total_amount,
            payment_status: PaymentStatus::Pending,
            payment_method: None,
            transaction_id: None,
            booking_status: BookingStatus::Confirmed,
            cancellation_reason: None,
            cancelled_at: None,
            refund_amount: 0,
            booking_id: booking_code(now),
            created_at: now,
        };

        self.stores.bookings.create(&booking).await?;

        let passengers: Vec<_> = booking
            .seats
            .iter()
            .map(|s| Masked::new(s.passenger_name.as_str()))
            .collect();
        tracing::info!(
            booking_id = %booking.booking_id,
            user_id = %booking.user_id,
            seats = booking.seats.len(),
            total_amount = booking.total_amount,
            passengers = ?passengers,
            "Booking confirmed"
        );

        Ok(BookingDetails {
            booking,
            bus: Some(bus),
            route: Some(route),
        })
    }

    /// Cancels a booking and settles its refund from the notice given.
    pub async fn cancel(
        &self,
        principal: &Principal,
        booking_id: Uuid,
        reason: Option<String>,
    ) -> EngineResult<CancellationReceipt> {
        let mut booking = self.load(booking_id).await?;
        if !principal.can_act_for(booking.user_id) {
            return Err(EngineError::Forbidden("Not authorized to cancel this booking".to_string()));
        }
        if booking.is_cancelled() {
            return Err(EngineError::AlreadyCancelled);
        }

        let now = self.clock.now();
        let journey_start = booking.journey_starts_at();
        if journey_start < now {
            return Err(EngineError::JourneyElapsed);
        }

        let percentage = self.settings.refund_policy.percentage_at(journey_start, now);
        let refund = refund_amount(booking.total_amount, percentage);

        booking.booking_status = BookingStatus::Cancelled;
        booking.cancellation_reason = Some(
            reason
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| DEFAULT_CANCELLATION_REASON.to_string()),
        );
        booking.cancelled_at = Some(now);
        booking.refund_amount = refund;
        if refund > 0 {
            booking.payment_status = PaymentStatus::Refunded;
        }

        self.stores.bookings.update(&booking).await?;
        tracing::info!(
            booking_id = %booking.booking_id,
            refund_amount = refund,
            refund_percentage = percentage,
            by_admin = principal.is_admin() && principal.id != booking.user_id,
            "Booking cancelled"
        );

        Ok(CancellationReceipt {
            booking,
            refund_amount: refund,
            refund_percentage: percentage,
        })
    }

    /// Marks a booking paid. Only the booking's owner may pay for it.
    pub async fn record_payment(
        &self,
        principal: &Principal,
        booking_id: Uuid,
        method: PaymentMethod,
        transaction_id: Option<String>,
    ) -> EngineResult<Booking> {
        let mut booking = self.load(booking_id).await?;
        if booking.user_id != principal.id {
            return Err(EngineError::Forbidden("Not authorized".to_string()));
        }
        if booking.is_paid() {
            return Err(EngineError::AlreadyPaid);
        }

        let now = self.clock.now();
        booking.payment_status = PaymentStatus::Completed;
        booking.payment_method = Some(method);
        booking.transaction_id = Some(
            transaction_id
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| fallback_transaction_id(now)),
        );

        self.stores.bookings.update(&booking).await?;
        tracing::info!(
            booking_id = %booking.booking_id,
            method = method.as_str(),
            "Payment recorded"
        );
        Ok(booking)
    }

    pub async fn booking(&self, principal: &Principal, booking_id: Uuid) -> EngineResult<BookingDetails> {
        let booking = self.load(booking_id).await?;
        if !principal.can_act_for(booking.user_id) {
            return Err(EngineError::Forbidden("Not authorized".to_string()));
        }
        self.with_trip(booking).await
    }

    /// A user's bookings, newest first, each with its bus and route.
    pub async fn bookings_for_user(
        &self,
        principal: &Principal,
        user_id: Uuid,
    ) -> EngineResult<Vec<BookingDetails>> {
        if !principal.can_act_for(user_id) {
            return Err(EngineError::Forbidden("Not authorized".to_string()));
        }
        let bookings = self.stores.bookings.bookings_for_user(user_id).await?;
        let mut details = Vec::with_capacity(bookings.len());
        for booking in bookings {
            details.push(self.with_trip(booking).await?);
        }
        Ok(details)
    }

    async fn load(&self, booking_id: Uuid) -> EngineResult<Booking> {
        self.stores
            .bookings
            .booking(booking_id)
            .await?
            .ok_or_else(|| EngineError::NotFound("Booking".to_string()))
    }

    async fn with_trip(&self, booking: Booking) -> EngineResult<BookingDetails> {
        let bus = self.stores.buses.bus(booking.bus_id).await?;
        let route = self.stores.routes.route(booking.route_id).await?;
        Ok(BookingDetails { booking, bus, route })
    }

    async fn resolve_trip(&self, bus_id: Uuid, route_id: Uuid) -> EngineResult<(Bus, Route)> {
        let bus = self
            .stores
            .buses
            .bus(bus_id)
            .await?
            .ok_or_else(|| EngineError::NotFound("Bus".to_string()))?;
        let route = self
            .stores
            .routes
            .route(route_id)
            .await?
            .ok_or_else(|| EngineError::NotFound("Route".to_string()))?;
        Ok((bus, route))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{at, date, World};
    use crate::repository::BookingFilter;
    use chrono::Duration;

    #[tokio::test]
    async fn test_reserve_prices_and_confirms() {
        let world = World::new().await;
        let engine = world.engine();
        let user = Principal::user(Uuid::new_v4());

        let details = engine
            .reserve(&user, world.reserve_request(date(2025, 6, 1), &["A1", "A2"]))
            .await
            .unwrap();

        let booking = &details.booking;
        assert_eq!(booking.total_amount, 1000);
        assert_eq!(booking.booking_status, BookingStatus::Confirmed);
        assert_eq!(booking.payment_status, PaymentStatus::Pending);
        assert_eq!(booking.refund_amount, 0);
        assert_eq!(booking.user_id, user.id);
        assert!(booking.booking_id.starts_with("BKG"));
        assert_eq!(booking.departs_at, at(2025, 6, 1, 21, 0));
        assert_eq!(details.bus.as_ref().map(|b| b.id), Some(world.bus.id));
    }

    #[tokio::test]
    async fn test_conflict_lists_overlap_and_creates_nothing() {
        let world = World::new().await;
        let engine = world.engine();
        let user = Principal::user(Uuid::new_v4());
        engine
            .reserve(&user, world.reserve_request(date(2025, 6, 1), &["A1"]))
            .await
            .unwrap();

        let err = engine
            .reserve(&user, world.reserve_request(date(2025, 6, 1), &["A1", "A3"]))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::SeatConflict(ref seats) if seats == &vec!["A1".to_string()]));

        let all = world.stores.bookings.list_bookings(&BookingFilter::default()).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_disjoint_seats_and_other_days_do_not_conflict() {
        let world = World::new().await;
        let engine = world.engine();
        let user = Principal::user(Uuid::new_v4());

        engine.reserve(&user, world.reserve_request(date(2025, 6, 1), &["A1", "A2"])).await.unwrap();
        engine.reserve(&user, world.reserve_request(date(2025, 6, 1), &["B1"])).await.unwrap();
        engine.reserve(&user, world.reserve_request(date(2025, 6, 2), &["A1"])).await.unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_seats_can_be_booked_again() {
        let world = World::new().await;
        let engine = world.engine();
        let user = Principal::user(Uuid::new_v4());

        let first = engine.reserve(&user, world.reserve_request(date(2025, 6, 1), &["A1"])).await.unwrap();
        engine.cancel(&user, first.booking.id, None).await.unwrap();
        assert!(engine.reserve(&user, world.reserve_request(date(2025, 6, 1), &["A1"])).await.is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_reserves_of_one_seat() {
        let world = World::new().await;
        let engine = Arc::new(world.engine());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let engine = engine.clone();
            let request = world.reserve_request(date(2025, 6, 1), &["C4"]);
            handles.push(tokio::spawn(async move {
                engine.reserve(&Principal::user(Uuid::new_v4()), request).await
            }));
        }

        let mut confirmed = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => confirmed += 1,
                Err(err) => assert!(matches!(err, EngineError::SeatConflict(_))),
            }
        }
        assert_eq!(confirmed, 1);
    }

    #[tokio::test]
    async fn test_layout_rejects_unknown_seats() {
        let world = World::new().await;
        world.with_layout(&["A1", "A2", "B1", "B2"]).await;
        let engine = world.engine();
        let user = Principal::user(Uuid::new_v4());

        let err = engine
            .reserve(&user, world.reserve_request(date(2025, 6, 1), &["A1", "Z9", "Z10"]))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidSeat(ref seats) if seats == &vec!["Z9".to_string(), "Z10".to_string()]));
    }

    #[tokio::test]
    async fn test_missing_layout_is_allowed_unless_required() {
        let world = World::new().await;
        let user = Principal::user(Uuid::new_v4());

        assert!(world.engine().reserve(&user, world.reserve_request(date(2025, 6, 1), &["Q1"])).await.is_ok());

        let strict = world.engine_with(EngineSettings {
            require_seat_layout: true,
            ..Default::default()
        });
        let err = strict
            .reserve(&user, world.reserve_request(date(2025, 6, 1), &["Q2"]))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn test_reserve_resolves_bus_and_route() {
        let world = World::new().await;
        let engine = world.engine();
        let user = Principal::user(Uuid::new_v4());

        let mut request = world.reserve_request(date(2025, 6, 1), &["A1"]);
        request.bus_id = Uuid::new_v4();
        assert!(matches!(engine.reserve(&user, request).await, Err(EngineError::NotFound(_))));

        let mut inactive = world.bus.clone();
        inactive.is_active = false;
        world.stores.buses.update_bus(&inactive).await.unwrap();
        let err = engine
            .reserve(&user, world.reserve_request(date(2025, 6, 1), &["A1"]))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn test_cancel_refund_bands() {
        let world = World::new().await;
        let engine = world.engine();
        let user = Principal::user(Uuid::new_v4());
        let booked = engine
            .reserve(&user, world.reserve_request(date(2025, 6, 1), &["A1", "A2"]))
            .await
            .unwrap();

        // 12 hours before the journey day begins; the 21:00 departure does not count.
        world.clock.set(at(2025, 5, 31, 12, 0));
        let receipt = engine.cancel(&user, booked.booking.id, Some("Plans changed".into())).await.unwrap();
        assert_eq!(receipt.refund_percentage, 50);
        assert_eq!(receipt.refund_amount, 500);
        assert_eq!(receipt.booking.payment_status, PaymentStatus::Refunded);
        assert_eq!(receipt.booking.booking_status, BookingStatus::Cancelled);
        assert_eq!(receipt.booking.cancellation_reason.as_deref(), Some("Plans changed"));
        assert_eq!(receipt.booking.cancelled_at, Some(at(2025, 5, 31, 12, 0)));

        let stored = world.stores.bookings.booking(booked.booking.id).await.unwrap().unwrap();
        assert_eq!(stored.refund_amount, 500);
    }

    #[tokio::test]
    async fn test_refund_notice_counts_to_journey_midnight() {
        let world = World::new().await;
        let engine = world.engine();
        let user = Principal::user(Uuid::new_v4());

        let mut cases = Vec::new();
        for (seat, now, expected) in [
            ("A1", at(2025, 5, 31, 0, 0), 90),
            ("A2", at(2025, 5, 31, 0, 0) + Duration::milliseconds(1), 50),
            ("A3", at(2025, 5, 31, 18, 0), 25),
            ("A4", at(2025, 5, 31, 18, 1), 0),
        ] {
            let booked = engine.reserve(&user, world.reserve_request(date(2025, 6, 1), &[seat])).await.unwrap();
            cases.push((booked.booking.id, now, expected));
        }

        for (id, now, expected) in cases {
            world.clock.set(now);
            let receipt = engine.cancel(&user, id, None).await.unwrap();
            assert_eq!(receipt.refund_percentage, expected, "cancelled at {}", now);
        }
    }

    #[tokio::test]
    async fn test_late_cancel_refunds_nothing() {
        let world = World::new().await;
        let engine = world.engine();
        let user = Principal::user(Uuid::new_v4());
        let booked = engine
            .reserve(&user, world.reserve_request(date(2025, 6, 1), &["A1", "A2"]))
            .await
            .unwrap();

        world.clock.set(at(2025, 5, 31, 20, 0));
        let receipt = engine.cancel(&user, booked.booking.id, None).await.unwrap();
        assert_eq!(receipt.refund_percentage, 0);
        assert_eq!(receipt.refund_amount, 0);
        assert_eq!(receipt.booking.payment_status, PaymentStatus::Pending);
        assert_eq!(
            receipt.booking.cancellation_reason.as_deref(),
            Some(DEFAULT_CANCELLATION_REASON)
        );
    }

    #[tokio::test]
    async fn test_paid_booking_keeps_payment_status_without_refund() {
        let world = World::new().await;
        let engine = world.engine();
        let user = Principal::user(Uuid::new_v4());
        let booked = engine
            .reserve(&user, world.reserve_request(date(2025, 6, 1), &["A1"]))
            .await
            .unwrap();
        engine.record_payment(&user, booked.booking.id, PaymentMethod::Card, None).await.unwrap();

        world.clock.set(at(2025, 5, 31, 22, 0));
        let receipt = engine.cancel(&user, booked.booking.id, None).await.unwrap();
        assert_eq!(receipt.refund_amount, 0);
        assert_eq!(receipt.booking.payment_status, PaymentStatus::Completed);
        assert_eq!(receipt.booking.booking_status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_paid_booking_is_refunded_on_early_cancel() {
        let world = World::new().await;
        let engine = world.engine();
        let user = Principal::user(Uuid::new_v4());
        let booked = engine
            .reserve(&user, world.reserve_request(date(2025, 6, 1), &["A1"]))
            .await
            .unwrap();
        engine.record_payment(&user, booked.booking.id, PaymentMethod::Card, None).await.unwrap();

        let receipt = engine.cancel(&user, booked.booking.id, None).await.unwrap();
        assert_eq!(receipt.refund_percentage, 90);
        assert_eq!(receipt.refund_amount, 450);
        assert_eq!(receipt.booking.payment_status, PaymentStatus::Refunded);

        let stored = world.stores.bookings.booking(booked.booking.id).await.unwrap().unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Refunded);
    }

    #[tokio::test]
    async fn test_cancel_guards() {
        let world = World::new().await;
        let engine = world.engine();
        let owner = Principal::user(Uuid::new_v4());
        let admin = Principal::admin(Uuid::new_v4());
        let booked = engine
            .reserve(&owner, world.reserve_request(date(2025, 6, 1), &["A1"]))
            .await
            .unwrap();
        let id = booked.booking.id;

        let stranger = Principal::user(Uuid::new_v4());
        assert!(matches!(engine.cancel(&stranger, id, None).await, Err(EngineError::Forbidden(_))));
        assert!(matches!(engine.cancel(&owner, Uuid::new_v4(), None).await, Err(EngineError::NotFound(_))));

        let receipt = engine.cancel(&admin, id, None).await.unwrap();
        assert_eq!(receipt.refund_percentage, 90);
        assert_eq!(receipt.refund_amount, 450);

        assert!(matches!(engine.cancel(&owner, id, None).await, Err(EngineError::AlreadyCancelled)));
        assert!(matches!(engine.cancel(&admin, id, None).await, Err(EngineError::AlreadyCancelled)));
    }

    #[tokio::test]
    async fn test_cancel_once_journey_day_begins() {
        let world = World::new().await;
        let engine = world.engine();
        let user = Principal::user(Uuid::new_v4());
        let at_midnight = engine
            .reserve(&user, world.reserve_request(date(2025, 6, 1), &["A1"]))
            .await
            .unwrap();
        let same_day = engine
            .reserve(&user, world.reserve_request(date(2025, 6, 1), &["A2"]))
            .await
            .unwrap();

        world.clock.set(at(2025, 6, 1, 0, 0));
        let receipt = engine.cancel(&user, at_midnight.booking.id, None).await.unwrap();
        assert_eq!(receipt.refund_percentage, 0);

        // Still hours before the 21:00 departure, but the journey day has started.
        world.clock.set(at(2025, 6, 1, 10, 0));
        assert!(matches!(
            engine.cancel(&user, same_day.booking.id, None).await,
            Err(EngineError::JourneyElapsed)
        ));
        let stored = world.stores.bookings.booking(same_day.booking.id).await.unwrap().unwrap();
        assert_eq!(stored.booking_status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_record_payment() {
        let world = World::new().await;
        let engine = world.engine();
        let owner = Principal::user(Uuid::new_v4());
        let booked = engine
            .reserve(&owner, world.reserve_request(date(2025, 6, 1), &["A1"]))
            .await
            .unwrap();
        let id = booked.booking.id;

        let admin = Principal::admin(Uuid::new_v4());
        assert!(matches!(
            engine.record_payment(&admin, id, PaymentMethod::Card, None).await,
            Err(EngineError::Forbidden(_))
        ));

        let paid = engine.record_payment(&owner, id, PaymentMethod::Upi, None).await.unwrap();
        assert_eq!(paid.payment_status, PaymentStatus::Completed);
        assert_eq!(paid.payment_method, Some(PaymentMethod::Upi));
        let expected = format!("TXN{}", world.clock.now().timestamp_millis());
        assert_eq!(paid.transaction_id.as_deref(), Some(expected.as_str()));

        assert!(matches!(
            engine.record_payment(&owner, id, PaymentMethod::Upi, Some("T-1".into())).await,
            Err(EngineError::AlreadyPaid)
        ));
    }

    #[tokio::test]
    async fn test_reads_are_owner_or_admin() {
        let world = World::new().await;
        let engine = world.engine();
        let owner = Principal::user(Uuid::new_v4());
        let first = engine.reserve(&owner, world.reserve_request(date(2025, 6, 1), &["A1"])).await.unwrap();
        world.clock.advance(Duration::minutes(5));
        let second = engine.reserve(&owner, world.reserve_request(date(2025, 6, 1), &["A2"])).await.unwrap();

        let mine = engine.bookings_for_user(&owner, owner.id).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].booking.id, second.booking.id);

        let stranger = Principal::user(Uuid::new_v4());
        assert!(matches!(engine.booking(&stranger, first.booking.id).await, Err(EngineError::Forbidden(_))));
        assert!(matches!(engine.bookings_for_user(&stranger, owner.id).await, Err(EngineError::Forbidden(_))));
        assert!(engine.booking(&Principal::admin(Uuid::new_v4()), first.booking.id).await.is_ok());
    }
}
