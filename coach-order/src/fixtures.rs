use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use coach_catalog::{
    Bus, BusCatalog, BusInput, BusType, Deck, LayoutKind, Route, RouteCatalog, RouteInput, SeatLayout,
    SeatLayoutStore, SeatPosition, SeatSpec, SeatType,
};
use coach_core::clock::{Clock, FixedClock};
use uuid::Uuid;

use crate::engine::{BookingEngine, EngineSettings};
use crate::memory::InMemoryStore;
use crate::models::{Gender, SeatAssignment};
use crate::repository::Stores;
use crate::request::ReserveRequest;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

/// A seeded store with one 40-seat bus on a Pune to Goa route departing
/// 21:00 every day at 500 per seat.
pub struct World {
    pub store: Arc<InMemoryStore>,
    pub stores: Stores,
    pub clock: Arc<FixedClock>,
    pub bus: Bus,
    pub route: Route,
}

impl World {
    pub async fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(FixedClock::new(at(2025, 5, 20, 9, 0)));

        let bus = bus_input("MH12AB1234", 40).into_bus(clock.now()).unwrap();
        store.insert_bus(&bus).await.unwrap();
        let route = route_input(bus.id).into_route(clock.now()).unwrap();
        store.insert_route(&route).await.unwrap();

        Self {
            stores: Stores::shared(store.clone()),
            store,
            clock,
            bus,
            route,
        }
    }

    pub fn engine(&self) -> BookingEngine {
        self.engine_with(EngineSettings::default())
    }

    pub fn engine_with(&self, settings: EngineSettings) -> BookingEngine {
        BookingEngine::new(self.stores.clone(), self.clock.clone(), settings)
    }

    pub async fn with_layout(&self, numbers: &[&str]) -> SeatLayout {
        let layout = SeatLayout::new(
            self.bus.id,
            LayoutKind::TwoByTwo,
            numbers.len() as u32,
            layout_seats(numbers),
            self.clock.now(),
        )
        .unwrap();
        self.store.insert_layout(&layout).await.unwrap();
        layout
    }

    pub fn reserve_request(&self, journey: NaiveDate, numbers: &[&str]) -> ReserveRequest {
        ReserveRequest {
            bus_id: self.bus.id,
            route_id: self.route.id,
            journey_date: journey,
            seats: numbers.iter().map(|n| passenger(n)).collect(),
            boarding_point: None,
            dropping_point: None,
        }
    }
}

pub fn bus_input(number: &str, seats: u32) -> BusInput {
    BusInput {
        name: "Night Rider".into(),
        bus_number: number.into(),
        bus_type: BusType::Sleeper,
        total_seats: seats,
        amenities: vec![],
        operator: "Konkan Travels".into(),
        is_active: true,
    }
}

pub fn route_input(bus_id: Uuid) -> RouteInput {
    RouteInput {
        bus_id,
        source: "Pune".into(),
        destination: "Goa".into(),
        departure_time: "21:00".into(),
        arrival_time: "07:00".into(),
        duration: "10h".into(),
        distance: 450,
        price: 500,
        days: vec![],
        boarding_points: vec![],
        dropping_points: vec![],
        is_active: true,
    }
}

pub fn passenger(seat: &str) -> SeatAssignment {
    SeatAssignment {
        seat_number: seat.to_string(),
        passenger_name: format!("Passenger {}", seat),
        passenger_age: 30,
        passenger_gender: Gender::Female,
    }
}

pub fn layout_seats(numbers: &[&str]) -> Vec<SeatSpec> {
    numbers
        .iter()
        .enumerate()
        .map(|(i, n)| SeatSpec {
            seat_number: n.to_string(),
            row: i as u32 / 4 + 1,
            column: i as u32 % 4 + 1,
            seat_type: SeatType::Seater,
            position: SeatPosition::Aisle,
            deck: Deck::Lower,
        })
        .collect()
}
