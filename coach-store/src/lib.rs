pub mod app_config;
pub mod booking_repo;
pub mod catalog_repo;
pub mod database;
pub mod redis_repo;

pub use app_config::Config;
pub use booking_repo::PgBookingRepository;
pub use catalog_repo::PgCatalogRepository;
pub use database::DbClient;
pub use redis_repo::RedisClient;

use std::sync::Arc;

use coach_order::Stores;

/// Wires every store trait to Postgres.
pub fn postgres_stores(db: &DbClient) -> Stores {
    let catalog = Arc::new(PgCatalogRepository::new(db.pool.clone()));
    Stores {
        buses: catalog.clone(),
        routes: catalog.clone(),
        layouts: catalog,
        bookings: Arc::new(PgBookingRepository::new(db.pool.clone())),
    }
}
