mod auth;
mod booking;
mod catalog;
mod db;
mod error;
mod handlers;
mod models;
mod rate_limit;
mod schedule;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};
use sqlx::sqlite::SqlitePoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use auth::AdminSessions;
use catalog::ServiceCatalog;
use rate_limit::{rate_limit_admin, rate_limit_booking, rate_limit_public, RateLimiter};
use schedule::BusinessHours;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub db: sqlx::SqlitePool,
    pub catalog: ServiceCatalog,
    pub hours: BusinessHours,
    pub sessions: AdminSessions,
    pub started_at: Instant,
}

/// Rate limit cleanup interval (seconds).
const RATE_LIMIT_CLEANUP_SECS: u64 = 300;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // ── Tracing ──
    let env_filter = EnvFilter::from_default_env().add_directive("info".parse()?);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    // ── Env ──
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:barbershop.db?mode=rwc".into());
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".into());
    let admin_password = std::env::var("ADMIN_PASSWORD").unwrap_or_default();

    if admin_password.is_empty() {
        tracing::warn!("ADMIN_PASSWORD not set — admin endpoints are disabled");
    }

    let hours = BusinessHours::from_env();
    tracing::info!(
        "business hours {}–{}, {}-minute grid",
        schedule::minutes_to_hhmm(hours.open_min),
        schedule::minutes_to_hhmm(hours.close_min),
        hours.step_min
    );

    // ── Database ──
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    db::run_migrations(&pool).await?;

    let state = Arc::new(AppState {
        db: pool,
        catalog: ServiceCatalog::default(),
        hours,
        sessions: AdminSessions::new(admin_password),
        started_at: Instant::now(),
    });

    // ── Rate limiter + cleanup task ──
    let rate_limiter = RateLimiter::new();
    let cleanup_limiter = rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(tokio::time::Duration::from_secs(RATE_LIMIT_CLEANUP_SECS));
        loop {
            interval.tick().await;
            cleanup_limiter.cleanup();
        }
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // ── Router (4 groups with per-group rate limits) ──

    // 1. No-limit: health checks
    let no_limit_routes = Router::new().route("/api/health", get(handlers::health::health));

    // 2. Public: read-only endpoints (60 req/min)
    let public_routes = Router::new()
        .route("/api/services", get(handlers::client::list_services))
        .route("/api/slots", get(handlers::client::list_slots))
        .layer(from_fn_with_state(rate_limiter.clone(), rate_limit_public));

    // 3. Booking creation: strictest limit (5 req/5min)
    let booking_routes = Router::new()
        .route("/api/bookings", post(handlers::client::create_booking))
        .layer(from_fn_with_state(rate_limiter.clone(), rate_limit_booking));

    // 4. Admin: session-gated endpoints plus login/logout (120 req/min)
    let admin_routes = Router::new()
        .route("/api/admin/bookings", get(handlers::admin::list_bookings))
        .route(
            "/api/admin/bookings/{id}",
            patch(handlers::admin::update_booking_status),
        )
        .route("/api/admin/finance", get(handlers::admin::list_finance))
        .route("/api/admin/finance", post(handlers::admin::add_finance))
        .route(
            "/api/admin/finance/summary",
            get(handlers::admin::finance_summary),
        )
        .layer(from_fn_with_state(state.clone(), auth::require_admin))
        .route("/api/admin/login", post(handlers::admin::login))
        .route("/api/admin/logout", post(handlers::admin::logout))
        .layer(from_fn_with_state(rate_limiter.clone(), rate_limit_admin));

    let app = Router::new()
        .merge(no_limit_routes)
        .merge(public_routes)
        .merge(booking_routes)
        .merge(admin_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    tracing::info!("Barbershop server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
