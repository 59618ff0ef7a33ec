mod config;
mod error;
mod handlers;
mod middleware;
mod migration;
mod models;
mod response;
mod routes;
mod services;
mod utils;

use axum::{extract::Extension, response::IntoResponse, routing::get, Json, Router};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use serde_json::json;
use services::alert::AlertService;
use services::geocode::GeocodeService;
use std::env;
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        // Auth routes
        crate::handlers::register,
        crate::handlers::login,
        crate::handlers::get_current_user,
        // User routes
        crate::handlers::user::get_user_profile,
        crate::handlers::user::top_reporters,
        // Alert routes
        crate::handlers::alert::list_alerts,
        crate::handlers::alert::alerts_geojson,
        crate::handlers::alert::get_alert,
        crate::handlers::alert::create_alert,
        crate::handlers::alert::update_alert,
        crate::handlers::alert::delete_alert,
        crate::handlers::alert::archive_alert,
        // Vote routes
        crate::handlers::vote::vote_alert,
        // Admin routes
        crate::handlers::admin::list_users,
        crate::handlers::admin::suspend_user,
        crate::handlers::admin::unsuspend_user,
        crate::handlers::admin::update_user_role,
        crate::handlers::admin::sweep_alerts,
    ),
    components(
        schemas(
            crate::response::ApiResponse<serde_json::Value>,
            crate::response::PaginatedResponse<serde_json::Value>,
            crate::response::PaginationQuery,
            crate::error::AppError,
            // Auth
            crate::handlers::auth::RegisterRequest,
            crate::handlers::auth::LoginRequest,
            crate::handlers::auth::AuthResponse,
            crate::handlers::auth::UserResponse,
            // User
            crate::handlers::user::UserProfileResponse,
            // Alert
            crate::handlers::alert::AlertResponse,
            crate::handlers::alert::AlertDetailResponse,
            crate::handlers::alert::AlertListResponse,
            crate::handlers::alert::AlertListQuery,
            crate::handlers::alert::CreateAlertRequest,
            crate::handlers::alert::UpdateAlertRequest,
            crate::handlers::alert::AlertFeatureCollection,
            crate::handlers::alert::AlertFeature,
            crate::handlers::alert::AlertFeatureProperties,
            crate::handlers::alert::GeoPoint,
            crate::models::hazard::HazardKind,
            crate::models::hazard::HazardDetails,
            crate::models::hazard::FloodSeverity,
            crate::models::hazard::TornadoCategory,
            crate::models::hazard::FireIntensity,
            // Vote
            crate::handlers::vote::VoteRequest,
            crate::handlers::vote::VoteResponse,
            // Admin
            crate::handlers::admin::ManagedUserResponse,
            crate::handlers::admin::UpdateRoleRequest,
            crate::handlers::admin::SweepResponse,
        )
    ),
    tags(
        (name = "auth", description = "Authentication operations"),
        (name = "users", description = "User profile operations"),
        (name = "alerts", description = "Hazard alert operations"),
        (name = "votes", description = "Alert credibility voting"),
        (name = "admin", description = "Moderation operations"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "enviroalerts=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration before doing anything else
    let jwt_config = validate_config()?;
    utils::jwt::init_jwt_config(jwt_config)?;

    tracing::info!("Starting EnviroAlerts API v{}...", env!("CARGO_PKG_VERSION"));

    let db = config::database::get_database().await?;
    tracing::info!("Database connected successfully");

    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let geocoder = GeocodeService::from_env();
    if geocoder.is_enabled() {
        tracing::info!("Reverse geocoding enabled");
    } else {
        tracing::warn!("Reverse geocoding disabled, alerts will carry no derived place names");
    }

    spawn_expiry_sweep(db.clone());

    let app = create_app()
        .layer(Extension(db))
        .layer(Extension(geocoder));

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Validate all required configuration at startup (fail-fast).
fn validate_config() -> anyhow::Result<crate::config::jwt::JwtConfig> {
    // JWT config — validated and cached
    let jwt_config = config::jwt::JwtConfig::from_env()?;

    // DATABASE_URL — checked here for early error; actual connection happens later
    if env::var("DATABASE_URL").is_err() {
        return Err(anyhow::anyhow!(
            "DATABASE_URL environment variable must be set"
        ));
    }

    Ok(jwt_config)
}

/// Periodically archive alerts past their expiry. The sweep is one
/// conditional bulk update, so overlapping runs are harmless.
fn spawn_expiry_sweep(db: DatabaseConnection) {
    let interval_secs: u64 = env::var("SWEEP_INTERVAL_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(86_400); // daily

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // interval fires immediately; skip the startup tick
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let service = AlertService::new(db.clone());
            match service.sweep_expired(chrono::Utc::now().naive_utc()).await {
                Ok(count) => tracing::info!("Expiry sweep archived {} alerts", count),
                Err(e) => tracing::error!("Expiry sweep failed: {:?}", e),
            }
        }
    });
}

fn build_cors_layer() -> CorsLayer {
    use axum::http::{header, HeaderValue, Method};

    let origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins_str == "*" {
        cors.allow_origin(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = origins_str
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

fn create_app() -> Router {
    Router::new()
        .route("/", get(health_check))
        .merge(routes::create_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(axum::middleware::from_fn(
            middleware::security::security_headers_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Health check successful", body = serde_json::Value)
    )
)]
async fn health_check(Extension(db): Extension<DatabaseConnection>) -> impl IntoResponse {
    let db_ok = db
        .query_one(Statement::from_string(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT 1".to_string(),
        ))
        .await
        .is_ok();

    let status = if db_ok { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "service": "EnviroAlerts API",
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_ok,
    }))
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
    tracing::info!("Shutdown signal received, gracefully shutting down...");
}
