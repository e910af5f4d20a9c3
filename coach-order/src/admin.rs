use std::collections::BTreeSet;
use std::sync::Arc;

use coach_catalog::{Bus, BusInput, LayoutKind, Route, RouteInput, SeatLayout, SeatSpec};
use coach_core::clock::Clock;
use coach_core::payment::PaymentStatus;
use coach_core::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Booking, BookingDetails, BookingStatus};
use crate::repository::{BookingFilter, Stores};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSeatLayout {
    pub bus_id: Uuid,
    #[serde(default)]
    pub layout: LayoutKind,
    pub seats: Vec<SeatSpec>,
}

/// Replacement seat map for an existing layout. `totalSeats` defaults to the
/// current value.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatLayoutUpdate {
    pub layout: Option<LayoutKind>,
    pub total_seats: Option<u32>,
    pub seats: Vec<SeatSpec>,
}

/// A route as listed in the back office, with its bus attached.
#[derive(Debug, Clone, Serialize)]
pub struct RouteListing {
    #[serde(flatten)]
    pub route: Route,
    pub bus: Option<Bus>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BookingCounts {
    pub total: u64,
    pub confirmed: u64,
    pub cancelled: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub bookings: BookingCounts,
    /// Sum of `totalAmount` over paid bookings.
    pub revenue: i64,
    pub buses: u64,
    pub routes: u64,
}

impl Stats {
    pub fn tally(bookings: &[Booking], buses: u64, routes: u64) -> Self {
        let mut stats = Stats {
            buses,
            routes,
            ..Default::default()
        };
        for booking in bookings {
            stats.bookings.total += 1;
            match booking.booking_status {
                BookingStatus::Confirmed => stats.bookings.confirmed += 1,
                BookingStatus::Cancelled => stats.bookings.cancelled += 1,
                BookingStatus::Completed => {}
            }
            if booking.payment_status == PaymentStatus::Completed {
                stats.revenue = stats.revenue.saturating_add(booking.total_amount);
            }
        }
        stats
    }
}

/// Catalogue maintenance and reporting for operators. Callers are expected
/// to have checked the admin role already.
pub struct BackOffice {
    stores: Stores,
    clock: Arc<dyn Clock>,
}

impl BackOffice {
    pub fn new(stores: Stores, clock: Arc<dyn Clock>) -> Self {
        Self { stores, clock }
    }

    // ---- buses ----

    pub async fn list_buses(&self) -> EngineResult<Vec<Bus>> {
        Ok(self.stores.buses.list_buses().await?)
    }

    pub async fn add_bus(&self, input: BusInput) -> EngineResult<Bus> {
        let bus = input.into_bus(self.clock.now())?;
        self.stores.buses.insert_bus(&bus).await?;
        tracing::info!(bus_id = %bus.id, bus_number = %bus.bus_number, "Bus added");
        Ok(bus)
    }

    pub async fn update_bus(&self, id: Uuid, input: BusInput) -> EngineResult<Bus> {
        let existing = self.bus(id).await?;
        let bus = input.apply_to(&existing, self.clock.now())?;
        self.stores.buses.update_bus(&bus).await?;
        Ok(bus)
    }

    pub async fn delete_bus(&self, id: Uuid) -> EngineResult<()> {
        self.bus(id).await?;
        let today = self.clock.now().date_naive();
        if self.stores.bookings.has_upcoming_for_bus(id, today).await? {
            return Err(EngineError::Validation(
                "Cannot delete bus with active bookings".to_string(),
            ));
        }
        self.stores.buses.delete_bus(id).await?;
        tracing::info!(bus_id = %id, "Bus deleted");
        Ok(())
    }

    // ---- routes ----

    pub async fn list_routes(&self) -> EngineResult<Vec<RouteListing>> {
        let routes = self.stores.routes.list_routes().await?;
        let mut listings = Vec::with_capacity(routes.len());
        for route in routes {
            let bus = self.stores.buses.bus(route.bus_id).await?;
            listings.push(RouteListing { route, bus });
        }
        Ok(listings)
    }

    pub async fn add_route(&self, input: RouteInput) -> EngineResult<RouteListing> {
        let bus = self.bus(input.bus_id).await?;
        let route = input.into_route(self.clock.now())?;
        self.stores.routes.insert_route(&route).await?;
        tracing::info!(route_id = %route.id, bus_id = %bus.id, "Route added");
        Ok(RouteListing { route, bus: Some(bus) })
    }

    pub async fn update_route(&self, id: Uuid, input: RouteInput) -> EngineResult<RouteListing> {
        let existing = self
            .stores
            .routes
            .route(id)
            .await?
            .ok_or_else(|| EngineError::NotFound("Route".to_string()))?;
        let bus = self.bus(input.bus_id).await?;
        let route = input.apply_to(&existing, self.clock.now())?;
        self.stores.routes.update_route(&route).await?;
        Ok(RouteListing { route, bus: Some(bus) })
    }

    pub async fn delete_route(&self, id: Uuid) -> EngineResult<()> {
        if self.stores.routes.route(id).await?.is_none() {
            return Err(EngineError::NotFound("Route".to_string()));
        }
        let today = self.clock.now().date_naive();
        if self.stores.bookings.has_upcoming_for_route(id, today).await? {
            return Err(EngineError::Validation(
                "Cannot delete route with active bookings".to_string(),
            ));
        }
        self.stores.routes.delete_route(id).await?;
        tracing::info!(route_id = %id, "Route deleted");
        Ok(())
    }

    // ---- seat layouts ----

    pub async fn create_layout(&self, input: NewSeatLayout) -> EngineResult<SeatLayout> {
        let bus = self.bus(input.bus_id).await?;
        if self.stores.layouts.layout(bus.id).await?.is_some() {
            return Err(EngineError::Validation(
                "Seat layout already exists for this bus".to_string(),
            ));
        }
        let layout = SeatLayout::new(bus.id, input.layout, bus.total_seats, input.seats, self.clock.now())?;
        self.stores.layouts.insert_layout(&layout).await?;
        tracing::info!(bus_id = %bus.id, seats = layout.total_seats, "Seat layout created");
        Ok(layout)
    }

    /// Replaces the seat map of a bus. Seats still held by upcoming confirmed
    /// bookings cannot be removed.
    pub async fn update_layout(&self, bus_id: Uuid, update: SeatLayoutUpdate) -> EngineResult<SeatLayout> {
        let existing = self
            .stores
            .layouts
            .layout(bus_id)
            .await?
            .ok_or_else(|| EngineError::NotFound("Seat layout".to_string()))?;

        let mut layout = SeatLayout::new(
            bus_id,
            update.layout.unwrap_or(existing.layout),
            update.total_seats.unwrap_or(existing.total_seats),
            update.seats,
            existing.created_at,
        )?;
        layout.id = existing.id;

        let today = self.clock.now().date_naive();
        let upcoming = self.stores.bookings.upcoming_for_bus(bus_id, today).await?;
        let kept = layout.seat_numbers();
        let orphaned: BTreeSet<&str> = upcoming
            .iter()
            .flat_map(|b| b.seat_numbers())
            .filter(|seat| !kept.contains(seat))
            .collect();
        if !orphaned.is_empty() {
            let seats: Vec<&str> = orphaned.into_iter().collect();
            return Err(EngineError::Validation(format!(
                "Seats {} are held by upcoming bookings and cannot be removed",
                seats.join(", ")
            )));
        }

        self.stores.layouts.update_layout(&layout).await?;
        Ok(layout)
    }

    // ---- bookings ----

    pub async fn list_bookings(&self, filter: &BookingFilter) -> EngineResult<Vec<BookingDetails>> {
        let bookings = self.stores.bookings.list_bookings(filter).await?;
        let mut details = Vec::with_capacity(bookings.len());
        for booking in bookings {
            let bus = self.stores.buses.bus(booking.bus_id).await?;
            let route = self.stores.routes.route(booking.route_id).await?;
            details.push(BookingDetails { booking, bus, route });
        }
        Ok(details)
    }

    pub async fn stats(&self) -> EngineResult<Stats> {
        let bookings = self.stores.bookings.list_bookings(&BookingFilter::default()).await?;
        let buses = self.stores.buses.list_buses().await?.len() as u64;
        let routes = self.stores.routes.list_routes().await?.len() as u64;
        Ok(Stats::tally(&bookings, buses, routes))
    }

    async fn bus(&self, id: Uuid) -> EngineResult<Bus> {
        self.stores
            .buses
            .bus(id)
            .await?
            .ok_or_else(|| EngineError::NotFound("Bus".to_string()))
    }
}
