use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coach_catalog::{
    Amenity, Bus, BusCatalog, LayoutKind, Route, RouteCatalog, SeatLayout, SeatLayoutStore, SeatSpec, StopPoint,
};
use coach_core::StoreResult;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{backend, contains_pattern, corrupt, store_err};

/// Postgres-backed buses, routes and seat layouts.
pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BusRow {
    id: Uuid,
    name: String,
    bus_number: String,
    bus_type: String,
    total_seats: i32,
    amenities: Vec<String>,
    operator: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BusRow> for Bus {
    type Error = coach_core::StoreError;

    fn try_from(row: BusRow) -> Result<Self, Self::Error> {
        let amenities = row
            .amenities
            .iter()
            .map(|a| a.parse::<Amenity>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| corrupt("amenity", e))?;
        Ok(Bus {
            id: row.id,
            name: row.name,
            bus_number: row.bus_number,
            bus_type: row.bus_type.parse().map_err(|e| corrupt("bus type", e))?,
            total_seats: u32::try_from(row.total_seats).map_err(|e| corrupt("seat count", e))?,
            amenities,
            operator: row.operator,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RouteRow {
    id: Uuid,
    bus_id: Uuid,
    source: String,
    destination: String,
    departure_time: String,
    arrival_time: String,
    duration: String,
    distance: i32,
    price: i64,
    days: Vec<String>,
    boarding_points: Json<Vec<StopPoint>>,
    dropping_points: Json<Vec<StopPoint>>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RouteRow> for Route {
    type Error = coach_core::StoreError;

    fn try_from(row: RouteRow) -> Result<Self, Self::Error> {
        Ok(Route {
            id: row.id,
            bus_id: row.bus_id,
            source: row.source,
            destination: row.destination,
            departure_time: row.departure_time,
            arrival_time: row.arrival_time,
            duration: row.duration,
            distance: u32::try_from(row.distance).map_err(|e| corrupt("distance", e))?,
            price: row.price,
            days: row.days,
            boarding_points: row.boarding_points.0,
            dropping_points: row.dropping_points.0,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct LayoutRow {
    id: Uuid,
    bus_id: Uuid,
    layout: String,
    total_seats: i32,
    seats: Json<Vec<SeatSpec>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<LayoutRow> for SeatLayout {
    type Error = coach_core::StoreError;

    fn try_from(row: LayoutRow) -> Result<Self, Self::Error> {
        Ok(SeatLayout {
            id: row.id,
            bus_id: row.bus_id,
            layout: row.layout.parse::<LayoutKind>().map_err(|e| corrupt("layout", e))?,
            total_seats: u32::try_from(row.total_seats).map_err(|e| corrupt("seat count", e))?,
            seats: row.seats.0,
            created_at: row.created_at,
        })
    }
}

fn collect<R, T>(rows: Vec<R>) -> StoreResult<Vec<T>>
where
    T: TryFrom<R, Error = coach_core::StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

const BUS_COLUMNS: &str =
    "id, name, bus_number, bus_type, total_seats, amenities, operator, is_active, created_at, updated_at";

const ROUTE_COLUMNS: &str = "id, bus_id, source, destination, departure_time, arrival_time, duration, \
     distance, price, days, boarding_points, dropping_points, is_active, created_at, updated_at";

#[async_trait]
impl BusCatalog for PgCatalogRepository {
    async fn bus(&self, id: Uuid) -> StoreResult<Option<Bus>> {
        let row = sqlx::query_as::<_, BusRow>(&format!("SELECT {} FROM buses WHERE id = $1", BUS_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        row.map(Bus::try_from).transpose()
    }

    async fn list_buses(&self) -> StoreResult<Vec<Bus>> {
        let rows = sqlx::query_as::<_, BusRow>(&format!(
            "SELECT {} FROM buses ORDER BY created_at DESC",
            BUS_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        collect(rows)
    }

    async fn insert_bus(&self, bus: &Bus) -> StoreResult<()> {
        let amenities: Vec<&str> = bus.amenities.iter().map(|a| a.as_str()).collect();
        sqlx::query(
            r#"
            INSERT INTO buses (id, name, bus_number, bus_type, total_seats, amenities, operator, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(bus.id)
        .bind(&bus.name)
        .bind(&bus.bus_number)
        .bind(bus.bus_type.as_str())
        .bind(bus.total_seats as i32)
        .bind(&amenities)
        .bind(&bus.operator)
        .bind(bus.is_active)
        .bind(bus.created_at)
        .bind(bus.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| store_err(e, "Bus number already exists"))?;
        Ok(())
    }

    async fn update_bus(&self, bus: &Bus) -> StoreResult<()> {
        let amenities: Vec<&str> = bus.amenities.iter().map(|a| a.as_str()).collect();
        sqlx::query(
            r#"
            UPDATE buses
            SET name = $2, bus_number = $3, bus_type = $4, total_seats = $5, amenities = $6,
                operator = $7, is_active = $8, updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(bus.id)
        .bind(&bus.name)
        .bind(&bus.bus_number)
        .bind(bus.bus_type.as_str())
        .bind(bus.total_seats as i32)
        .bind(&amenities)
        .bind(&bus.operator)
        .bind(bus.is_active)
        .bind(bus.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| store_err(e, "Bus number already exists"))?;
        Ok(())
    }

    async fn delete_bus(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM buses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }
}

#[async_trait]
impl RouteCatalog for PgCatalogRepository {
    async fn route(&self, id: Uuid) -> StoreResult<Option<Route>> {
        let row = sqlx::query_as::<_, RouteRow>(&format!("SELECT {} FROM routes WHERE id = $1", ROUTE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        row.map(Route::try_from).transpose()
    }

    async fn list_routes(&self) -> StoreResult<Vec<Route>> {
        let rows = sqlx::query_as::<_, RouteRow>(&format!(
            "SELECT {} FROM routes ORDER BY created_at DESC",
            ROUTE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        collect(rows)
    }

    async fn routes_for_bus(&self, bus_id: Uuid, active_only: bool) -> StoreResult<Vec<Route>> {
        let rows = sqlx::query_as::<_, RouteRow>(&format!(
            "SELECT {} FROM routes WHERE bus_id = $1 AND (is_active OR NOT $2) ORDER BY created_at DESC",
            ROUTE_COLUMNS
        ))
        .bind(bus_id)
        .bind(active_only)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        collect(rows)
    }

    async fn search_routes(&self, source: &str, destination: &str) -> StoreResult<Vec<Route>> {
        let rows = sqlx::query_as::<_, RouteRow>(&format!(
            "SELECT {} FROM routes \
             WHERE is_active AND source ILIKE $1 AND destination ILIKE $2 \
             ORDER BY created_at DESC",
            ROUTE_COLUMNS
        ))
        .bind(contains_pattern(source))
        .bind(contains_pattern(destination))
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        collect(rows)
    }

    async fn insert_route(&self, route: &Route) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO routes (id, bus_id, source, destination, departure_time, arrival_time, duration,
                                distance, price, days, boarding_points, dropping_points, is_active,
                                created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(route.id)
        .bind(route.bus_id)
        .bind(&route.source)
        .bind(&route.destination)
        .bind(&route.departure_time)
        .bind(&route.arrival_time)
        .bind(&route.duration)
        .bind(route.distance as i32)
        .bind(route.price)
        .bind(&route.days)
        .bind(Json(&route.boarding_points))
        .bind(Json(&route.dropping_points))
        .bind(route.is_active)
        .bind(route.created_at)
        .bind(route.updated_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }

    async fn update_route(&self, route: &Route) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE routes
            SET bus_id = $2, source = $3, destination = $4, departure_time = $5, arrival_time = $6,
                duration = $7, distance = $8, price = $9, days = $10, boarding_points = $11,
                dropping_points = $12, is_active = $13, updated_at = $14
            WHERE id = $1
            "#,
        )
        .bind(route.id)
        .bind(route.bus_id)
        .bind(&route.source)
        .bind(&route.destination)
        .bind(&route.departure_time)
        .bind(&route.arrival_time)
        .bind(&route.duration)
        .bind(route.distance as i32)
        .bind(route.price)
        .bind(&route.days)
        .bind(Json(&route.boarding_points))
        .bind(Json(&route.dropping_points))
        .bind(route.is_active)
        .bind(route.updated_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }

    async fn delete_route(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM routes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }
}

#[async_trait]
impl SeatLayoutStore for PgCatalogRepository {
    async fn layout(&self, bus_id: Uuid) -> StoreResult<Option<SeatLayout>> {
        let row = sqlx::query_as::<_, LayoutRow>(
            "SELECT id, bus_id, layout, total_seats, seats, created_at FROM seat_layouts WHERE bus_id = $1",
        )
        .bind(bus_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        row.map(SeatLayout::try_from).transpose()
    }

    async fn insert_layout(&self, layout: &SeatLayout) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO seat_layouts (id, bus_id, layout, total_seats, seats, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(layout.id)
        .bind(layout.bus_id)
        .bind(layout.layout.as_str())
        .bind(layout.total_seats as i32)
        .bind(Json(&layout.seats))
        .bind(layout.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| store_err(e, "Seat layout already exists for this bus"))?;
        Ok(())
    }

    async fn update_layout(&self, layout: &SeatLayout) -> StoreResult<()> {
        sqlx::query("UPDATE seat_layouts SET layout = $2, total_seats = $3, seats = $4 WHERE bus_id = $1")
            .bind(layout.bus_id)
            .bind(layout.layout.as_str())
            .bind(layout.total_seats as i32)
            .bind(Json(&layout.seats))
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }
}
