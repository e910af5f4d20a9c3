use std::sync::Arc;

use coach_core::clock::Clock;
use coach_order::{Availability, BackOffice, BookingEngine, EngineSettings, Stores};
use coach_store::RedisClient;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone, Copy)]
pub struct RateLimit {
    pub requests: i64,
    pub window_seconds: i64,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<BookingEngine>,
    pub availability: Arc<Availability>,
    pub back_office: Arc<BackOffice>,
    /// Absent when no Redis is configured; rate limiting is then skipped.
    pub redis: Option<Arc<RedisClient>>,
    pub rate_limit: RateLimit,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(
        stores: Stores,
        clock: Arc<dyn Clock>,
        settings: EngineSettings,
        auth: AuthConfig,
        redis: Option<Arc<RedisClient>>,
        rate_limit: RateLimit,
    ) -> Self {
        Self {
            engine: Arc::new(BookingEngine::new(stores.clone(), clock.clone(), settings)),
            availability: Arc::new(Availability::new(stores.clone())),
            back_office: Arc::new(BackOffice::new(stores, clock)),
            redis,
            rate_limit,
            auth,
        }
    }
}
