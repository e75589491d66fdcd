use accounts::{
    app::build_router,
    config::{AppConfig, SessionBackend},
    generators::{IdGenerator, UuidIdGenerator},
    session::{start_session_sweeper, CookiePolicy, InMemorySessionStore, RedisSessionStore, SessionStore},
    shared::AppState,
    user::{Argon2Hasher, InMemoryUserRepository, PostgresUserRepository, UserRepository},
};
use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "accounts=debug,tower_http=debug".into());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let config = AppConfig::from_env()?;
    info!(backend = ?config.session_backend, "Starting account service");

    let shutdown = CancellationToken::new();
    let id_generator: Arc<dyn IdGenerator> = Arc::new(UuidIdGenerator::new());

    let repository: Arc<dyn UserRepository> = match &config.database_url {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(database_url)
                .await
                .context("failed to connect to database")?;
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("failed to run migrations")?;
            info!("Using PostgreSQL user repository");
            Arc::new(PostgresUserRepository::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set, users are kept in memory");
            Arc::new(InMemoryUserRepository::new())
        }
    };

    let session_store: Arc<dyn SessionStore> = match config.session_backend {
        SessionBackend::Memory => {
            let store = Arc::new(InMemorySessionStore::new(
                config.session_ttl,
                id_generator.clone(),
            )?);
            if !config.session_sweep_interval.is_zero() {
                tokio::spawn(start_session_sweeper(
                    store.clone(),
                    config.session_sweep_interval,
                    shutdown.clone(),
                ));
            }
            store
        }
        SessionBackend::Redis => Arc::new(
            RedisSessionStore::connect(&config.redis_url, config.session_ttl, id_generator.clone())
                .await?,
        ),
    };

    let app_state = AppState::new(
        repository,
        session_store,
        Arc::new(Argon2Hasher::new()),
        id_generator,
    )
    .with_cookie_policy(CookiePolicy::new(config.cookie_secure))
    .with_request_timeout(config.request_timeout)
    .with_shutdown(shutdown.clone());

    let app = build_router(app_state);

    let addr = config.bind_address()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C and cancels every in-flight request context
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
    shutdown.cancel();
}
