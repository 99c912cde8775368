//! CedarMarket API - Public e-commerce backend.
//!
//! This binary serves the JSON REST API on port 5002.
//!
//! # Architecture
//!
//! - Axum web framework, JSON in/out
//! - `PostgreSQL` via sqlx for all persistent state
//! - In-process TTL cache in front of catalog reads
//! - Bearer-token auth; guest carts ride a 30-day cookie
//!
//! Migrations are NOT run automatically on startup; run them explicitly:
//! `cargo run -p cedarmarket-cli -- migrate`

#![cfg_attr(not(test), forbid(unsafe_code))]

use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::{Router, routing::get};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cedarmarket_api::config::ApiConfig;
use cedarmarket_api::db::{self, CartRepository};
use cedarmarket_api::routes;
use cedarmarket_api::state::AppState;
use cedarmarket_api::cache;

/// Guest carts expire this long after their last write.
const GUEST_CART_MAX_AGE_DAYS: i64 = 30;

/// How often the guest-cart purge runs.
const GUEST_PURGE_PERIOD: std::time::Duration = std::time::Duration::from_secs(3600);

#[tokio::main]
async fn main() {
    // Load .env before reading configuration
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().expect("Failed to load configuration");

    // Initialize tracing with EnvFilter
    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cedarmarket_api=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Initialize database connection pool
    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    let cors = cors_layer(&config);

    // Build application state (owns the catalog cache instance)
    let state = AppState::new(config, pool.clone()).expect("Failed to initialize application state");

    // Background maintenance: cache sweep and guest-cart expiry
    tokio::spawn(
        state
            .catalog_cache()
            .clone()
            .sweep_loop(cache::SWEEP_PERIOD),
    );
    tokio::spawn(purge_expired_guest_carts(pool));
    tracing::info!("Background sweepers started");

    // Build router
    let app = Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state.clone());

    // Start server
    let addr = state.config().socket_addr();
    tracing::info!("api listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Build the CORS layer from the configured origin list.
fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(true)
}

/// Periodically delete guest carts that have passed their 30-day expiry.
async fn purge_expired_guest_carts(pool: sqlx::PgPool) {
    let mut interval = tokio::time::interval(GUEST_PURGE_PERIOD);
    interval.tick().await;

    loop {
        interval.tick().await;
        match CartRepository::new(&pool)
            .purge_expired_guests(chrono::Duration::days(GUEST_CART_MAX_AGE_DAYS))
            .await
        {
            Ok(0) => {}
            Ok(purged) => tracing::info!(purged, "expired guest carts deleted"),
            Err(e) => tracing::warn!(error = %e, "guest cart purge failed"),
        }
    }
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity before returning OK.
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
