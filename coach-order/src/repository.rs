use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use coach_catalog::{BusCatalog, RouteCatalog, SeatLayoutStore};
use coach_core::calendar::DayWindow;
use coach_core::StoreResult;
use serde::Deserialize;
use uuid::Uuid;

use crate::models::{Booking, BookingStatus};

/// Optional filters for the back-office booking list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub date: Option<NaiveDate>,
    pub bus_id: Option<Uuid>,
}

impl BookingFilter {
    pub fn matches(&self, booking: &Booking) -> bool {
        self.status.map_or(true, |s| booking.booking_status == s)
            && self.date.map_or(true, |d| booking.journey_date == d)
            && self.bus_id.map_or(true, |b| booking.bus_id == b)
    }
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Confirmed bookings for one bus and route whose journey falls inside
    /// the window.
    async fn confirmed_for_trip(
        &self,
        bus_id: Uuid,
        route_id: Uuid,
        window: DayWindow,
    ) -> StoreResult<Vec<Booking>>;

    /// Persists a new confirmed booking. Must fail with
    /// `StoreError::SeatsTaken` naming the overlap when any of its seats is
    /// already held by a confirmed booking on the same trip.
    async fn create(&self, booking: &Booking) -> StoreResult<()>;

    async fn booking(&self, id: Uuid) -> StoreResult<Option<Booking>>;

    /// Replaces status, payment and cancellation fields of an existing
    /// booking.
    async fn update(&self, booking: &Booking) -> StoreResult<()>;

    /// Newest first.
    async fn bookings_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Booking>>;

    /// Newest first.
    async fn list_bookings(&self, filter: &BookingFilter) -> StoreResult<Vec<Booking>>;

    /// Whether any confirmed booking on or after `from` uses the bus.
    async fn has_upcoming_for_bus(&self, bus_id: Uuid, from: NaiveDate) -> StoreResult<bool>;

    async fn has_upcoming_for_route(&self, route_id: Uuid, from: NaiveDate) -> StoreResult<bool>;

    /// Confirmed bookings on or after `from` for the bus, any route.
    async fn upcoming_for_bus(&self, bus_id: Uuid, from: NaiveDate) -> StoreResult<Vec<Booking>>;
}

/// The collaborators every engine component reads from.
#[derive(Clone)]
pub struct Stores {
    pub buses: Arc<dyn BusCatalog>,
    pub routes: Arc<dyn RouteCatalog>,
    pub layouts: Arc<dyn SeatLayoutStore>,
    pub bookings: Arc<dyn BookingStore>,
}

impl Stores {
    /// All four roles served by one backend.
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: BusCatalog + RouteCatalog + SeatLayoutStore + BookingStore + 'static,
    {
        Self {
            buses: store.clone(),
            routes: store.clone(),
            layouts: store.clone(),
            bookings: store,
        }
    }
}
