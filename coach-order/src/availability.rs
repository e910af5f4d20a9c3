use chrono::NaiveDate;
use coach_catalog::{Bus, LayoutKind, Route, SeatInventory, SeatSpec};
use coach_core::calendar::DayWindow;
use coach_core::search::SearchQuery;
use coach_core::{EngineError, EngineResult};
use serde::Serialize;
use uuid::Uuid;

use crate::repository::Stores;

/// A route running on the searched day with seats left.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteAvailability {
    #[serde(flatten)]
    pub route: Route,
    pub bus: Bus,
    pub available_seats: i64,
    pub total_seats: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatState {
    #[serde(flatten)]
    pub seat: SeatSpec,
    pub is_booked: bool,
}

/// A bus layout with each seat flagged for one trip.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatMap {
    pub bus_id: Uuid,
    pub route_id: Uuid,
    pub date: NaiveDate,
    pub layout: LayoutKind,
    pub total_seats: u32,
    pub seats: Vec<SeatState>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BusDetails {
    pub bus: Bus,
    pub routes: Vec<Route>,
}

/// Read-only projections over the catalogue and confirmed bookings.
pub struct Availability {
    stores: Stores,
}

impl Availability {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    pub async fn search(&self, query: &SearchQuery) -> EngineResult<Vec<RouteAvailability>> {
        query.validate()?;

        let routes = self
            .stores
            .routes
            .search_routes(query.source.trim(), query.destination.trim())
            .await?;

        let mut results = Vec::new();
        for route in routes.into_iter().filter(|r| r.runs_on(query.date)) {
            let bus = match self.stores.buses.bus(route.bus_id).await? {
                Some(bus) if bus.is_active => bus,
                _ => {
                    tracing::debug!(route_id = %route.id, "Skipping route without an active bus");
                    continue;
                }
            };

            let inventory = self.inventory(bus.id, route.id, query.date).await?;
            let available_seats = inventory.available(bus.total_seats);
            if available_seats <= 0 {
                continue;
            }
            results.push(RouteAvailability {
                total_seats: bus.total_seats,
                route,
                bus,
                available_seats,
            });
        }

        tracing::debug!(
            source = %query.source,
            destination = %query.destination,
            date = %query.date,
            results = results.len(),
            "Search complete"
        );
        Ok(results)
    }

    pub async fn seat_map(&self, bus_id: Uuid, route_id: Uuid, date: NaiveDate) -> EngineResult<SeatMap> {
        let layout = self
            .stores
            .layouts
            .layout(bus_id)
            .await?
            .ok_or_else(|| EngineError::NotFound("Seat layout for this bus".to_string()))?;

        let inventory = self.inventory(bus_id, route_id, date).await?;
        let seats = layout
            .seats
            .into_iter()
            .map(|seat| SeatState {
                is_booked: inventory.is_booked(&seat.seat_number),
                seat,
            })
            .collect();

        Ok(SeatMap {
            bus_id,
            route_id,
            date,
            layout: layout.layout,
            total_seats: layout.total_seats,
            seats,
        })
    }

    pub async fn bus_details(&self, bus_id: Uuid) -> EngineResult<BusDetails> {
        let bus = self
            .stores
            .buses
            .bus(bus_id)
            .await?
            .ok_or_else(|| EngineError::NotFound("Bus".to_string()))?;
        let routes = self.stores.routes.routes_for_bus(bus_id, true).await?;
        Ok(BusDetails { bus, routes })
    }

    async fn inventory(&self, bus_id: Uuid, route_id: Uuid, date: NaiveDate) -> EngineResult<SeatInventory> {
        let confirmed = self
            .stores
            .bookings
            .confirmed_for_trip(bus_id, route_id, DayWindow::for_date(date))
            .await?;
        Ok(SeatInventory::from_bookings(
            confirmed
                .into_iter()
                .map(|b| b.seats.into_iter().map(|s| s.seat_number)),
        ))
    }
}
