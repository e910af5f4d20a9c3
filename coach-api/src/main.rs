use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use coach_api::{app, state::{AppState, AuthConfig, RateLimit}};
use coach_core::clock::SystemClock;
use coach_order::{EngineSettings, InMemoryStore, Stores};
use coach_store::{postgres_stores, Config, DbClient, RedisClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coach_api=debug,coach_order=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Coach API on port {}", config.server.port);

    let stores = if config.database.url.is_empty() {
        tracing::warn!("No database configured, using in-memory store");
        Stores::shared(Arc::new(InMemoryStore::new()))
    } else {
        let db = DbClient::new(&config.database.url, config.database.max_connections)
            .await
            .context("Failed to connect to Postgres")?;
        db.migrate().await.context("Failed to run migrations")?;
        postgres_stores(&db)
    };

    let redis = match &config.redis {
        Some(redis) => match RedisClient::new(&redis.url).await {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                tracing::warn!("Redis unavailable, rate limiting disabled: {}", e);
                None
            }
        },
        None => None,
    };

    let state = AppState::new(
        stores,
        Arc::new(SystemClock),
        EngineSettings {
            require_seat_layout: config.booking.require_seat_layout,
            ..Default::default()
        },
        AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
        redis,
        RateLimit {
            requests: config.rate_limit.requests,
            window_seconds: config.rate_limit.window_seconds,
        },
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state).into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
