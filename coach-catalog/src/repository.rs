use async_trait::async_trait;
use coach_core::StoreResult;
use uuid::Uuid;

use crate::{Bus, Route, SeatLayout};

/// Bus records.
#[async_trait]
pub trait BusCatalog: Send + Sync {
    async fn bus(&self, id: Uuid) -> StoreResult<Option<Bus>>;

    /// All buses, newest first.
    async fn list_buses(&self) -> StoreResult<Vec<Bus>>;

    /// Fails with `StoreError::Duplicate` when the bus number is taken.
    async fn insert_bus(&self, bus: &Bus) -> StoreResult<()>;

    async fn update_bus(&self, bus: &Bus) -> StoreResult<()>;

    async fn delete_bus(&self, id: Uuid) -> StoreResult<()>;
}

/// Route records.
#[async_trait]
pub trait RouteCatalog: Send + Sync {
    async fn route(&self, id: Uuid) -> StoreResult<Option<Route>>;

    /// All routes, newest first.
    async fn list_routes(&self) -> StoreResult<Vec<Route>>;

    async fn routes_for_bus(&self, bus_id: Uuid, active_only: bool) -> StoreResult<Vec<Route>>;

    /// Active routes whose source and destination contain the given text,
    /// ignoring case.
    async fn search_routes(&self, source: &str, destination: &str) -> StoreResult<Vec<Route>>;

    async fn insert_route(&self, route: &Route) -> StoreResult<()>;

    async fn update_route(&self, route: &Route) -> StoreResult<()>;

    async fn delete_route(&self, id: Uuid) -> StoreResult<()>;
}

/// One seat layout per bus.
#[async_trait]
pub trait SeatLayoutStore: Send + Sync {
    async fn layout(&self, bus_id: Uuid) -> StoreResult<Option<SeatLayout>>;

    /// Fails with `StoreError::Duplicate` when the bus already has a layout.
    async fn insert_layout(&self, layout: &SeatLayout) -> StoreResult<()>;

    async fn update_layout(&self, layout: &SeatLayout) -> StoreResult<()>;
}
