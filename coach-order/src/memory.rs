use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::NaiveDate;
use coach_catalog::{Bus, BusCatalog, Route, RouteCatalog, SeatLayout, SeatLayoutStore};
use coach_core::calendar::DayWindow;
use coach_core::{StoreError, StoreResult};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::Booking;
use crate::repository::{BookingFilter, BookingStore};

#[derive(Default)]
struct Tables {
    buses: HashMap<Uuid, Bus>,
    routes: HashMap<Uuid, Route>,
    layouts: HashMap<Uuid, SeatLayout>,
    bookings: HashMap<Uuid, Booking>,
}

/// Process-local store backing every catalogue and booking trait. Used by
/// tests and for running the API without a database.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T, F>(mut items: Vec<T>, created: F) -> Vec<T>
where
    F: Fn(&T) -> chrono::DateTime<chrono::Utc>,
{
    items.sort_by(|a, b| created(b).cmp(&created(a)));
    items
}

#[async_trait]
impl BusCatalog for InMemoryStore {
    async fn bus(&self, id: Uuid) -> StoreResult<Option<Bus>> {
        Ok(self.tables.read().await.buses.get(&id).cloned())
    }

    async fn list_buses(&self) -> StoreResult<Vec<Bus>> {
        let tables = self.tables.read().await;
        Ok(newest_first(tables.buses.values().cloned().collect(), |b| b.created_at))
    }

    async fn insert_bus(&self, bus: &Bus) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.buses.values().any(|b| b.bus_number == bus.bus_number) {
            return Err(StoreError::Duplicate("Bus number already exists".to_string()));
        }
        tables.buses.insert(bus.id, bus.clone());
        Ok(())
    }

    async fn update_bus(&self, bus: &Bus) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables
            .buses
            .values()
            .any(|b| b.id != bus.id && b.bus_number == bus.bus_number)
        {
            return Err(StoreError::Duplicate("Bus number already exists".to_string()));
        }
        tables.buses.insert(bus.id, bus.clone());
        Ok(())
    }

    async fn delete_bus(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables.buses.remove(&id);
        tables.layouts.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl RouteCatalog for InMemoryStore {
    async fn route(&self, id: Uuid) -> StoreResult<Option<Route>> {
        Ok(self.tables.read().await.routes.get(&id).cloned())
    }

    async fn list_routes(&self) -> StoreResult<Vec<Route>> {
        let tables = self.tables.read().await;
        Ok(newest_first(tables.routes.values().cloned().collect(), |r| r.created_at))
    }

    async fn routes_for_bus(&self, bus_id: Uuid, active_only: bool) -> StoreResult<Vec<Route>> {
        let tables = self.tables.read().await;
        let routes = tables
            .routes
            .values()
            .filter(|r| r.bus_id == bus_id && (!active_only || r.is_active))
            .cloned()
            .collect();
        Ok(newest_first(routes, |r| r.created_at))
    }

    async fn search_routes(&self, source: &str, destination: &str) -> StoreResult<Vec<Route>> {
        let tables = self.tables.read().await;
        let routes = tables
            .routes
            .values()
            .filter(|r| r.is_active && r.matches(source, destination))
            .cloned()
            .collect();
        Ok(newest_first(routes, |r| r.created_at))
    }

    async fn insert_route(&self, route: &Route) -> StoreResult<()> {
        self.tables.write().await.routes.insert(route.id, route.clone());
        Ok(())
    }

    async fn update_route(&self, route: &Route) -> StoreResult<()> {
        self.tables.write().await.routes.insert(route.id, route.clone());
        Ok(())
    }

    async fn delete_route(&self, id: Uuid) -> StoreResult<()> {
        self.tables.write().await.routes.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl SeatLayoutStore for InMemoryStore {
    async fn layout(&self, bus_id: Uuid) -> StoreResult<Option<SeatLayout>> {
        Ok(self.tables.read().await.layouts.get(&bus_id).cloned())
    }

    async fn insert_layout(&self, layout: &SeatLayout) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.layouts.contains_key(&layout.bus_id) {
            return Err(StoreError::Duplicate(
                "Seat layout already exists for this bus".to_string(),
            ));
        }
        tables.layouts.insert(layout.bus_id, layout.clone());
        Ok(())
    }

    async fn update_layout(&self, layout: &SeatLayout) -> StoreResult<()> {
        self.tables.write().await.layouts.insert(layout.bus_id, layout.clone());
        Ok(())
    }
}

#[async_trait]
impl BookingStore for InMemoryStore {
    async fn confirmed_for_trip(
        &self,
        bus_id: Uuid,
        route_id: Uuid,
        window: DayWindow,
    ) -> StoreResult<Vec<Booking>> {
        let tables = self.tables.read().await;
        Ok(tables
            .bookings
            .values()
            .filter(|b| {
                b.is_confirmed()
                    && b.bus_id == bus_id
                    && b.route_id == route_id
                    && window.contains(b.journey_date.and_time(chrono::NaiveTime::MIN))
            })
            .cloned()
            .collect())
    }

    async fn create(&self, booking: &Booking) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let held: HashSet<&str> = tables
            .bookings
            .values()
            .filter(|b| {
                b.is_confirmed()
                    && b.bus_id == booking.bus_id
                    && b.route_id == booking.route_id
                    && b.journey_date == booking.journey_date
            })
            .flat_map(|b| b.seat_numbers())
            .collect();
        let taken: Vec<String> = booking
            .seat_numbers()
            .filter(|s| held.contains(s))
            .map(str::to_string)
            .collect();
        if !taken.is_empty() {
            return Err(StoreError::SeatsTaken(taken));
        }
        if tables.bookings.values().any(|b| b.booking_id == booking.booking_id) {
            return Err(StoreError::Duplicate("Booking code already exists".to_string()));
        }
        tables.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        Ok(self.tables.read().await.bookings.get(&id).cloned())
    }

    async fn update(&self, booking: &Booking) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        match tables.bookings.get_mut(&booking.id) {
            Some(existing) => {
                *existing = booking.clone();
                Ok(())
            }
            None => Err(StoreError::Backend(format!("booking {} does not exist", booking.id))),
        }
    }

    async fn bookings_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Booking>> {
        let tables = self.tables.read().await;
        let bookings = tables
            .bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(bookings, |b| b.created_at))
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> StoreResult<Vec<Booking>> {
        let tables = self.tables.read().await;
        let bookings = tables
            .bookings
            .values()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();
        Ok(newest_first(bookings, |b| b.created_at))
    }

    async fn has_upcoming_for_bus(&self, bus_id: Uuid, from: NaiveDate) -> StoreResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables
            .bookings
            .values()
            .any(|b| b.is_confirmed() && b.bus_id == bus_id && b.journey_date >= from))
    }

    async fn has_upcoming_for_route(&self, route_id: Uuid, from: NaiveDate) -> StoreResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables
            .bookings
            .values()
            .any(|b| b.is_confirmed() && b.route_id == route_id && b.journey_date >= from))
    }

    async fn upcoming_for_bus(&self, bus_id: Uuid, from: NaiveDate) -> StoreResult<Vec<Booking>> {
        let tables = self.tables.read().await;
        Ok(tables
            .bookings
            .values()
            .filter(|b| b.is_confirmed() && b.bus_id == bus_id && b.journey_date >= from)
            .cloned()
            .collect())
    }
}
