use crate::config::rate_limit::{RateLimitConfig, RateLimitRule};
use crate::handlers;
use crate::middleware::auth::auth_middleware;
use axum::{middleware, routing, Router};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

pub fn create_routes() -> Router {
    Router::new().nest("/api/v1", api_routes())
}

fn api_routes() -> Router {
    let rate_limit_config = RateLimitConfig::from_env();

    let auth = auth_routes(&rate_limit_config);
    let public_read = public_read_routes(&rate_limit_config);
    let protected =
        protected_routes(&rate_limit_config).layer(middleware::from_fn(auth_middleware));

    auth.merge(public_read).merge(protected)
}

/// Auth routes: register, login.
fn auth_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route("/auth/register", routing::post(handlers::register))
        .route("/auth/login", routing::post(handlers::login));

    with_optional_rate_limit(router, config.enabled, config.auth)
}

/// Public read routes: alert browsing, map export, user profiles.
fn public_read_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route("/alerts", routing::get(handlers::alert::list_alerts))
        .route(
            "/alerts/geojson",
            routing::get(handlers::alert::alerts_geojson),
        )
        .route("/users/top", routing::get(handlers::user::top_reporters))
        .route(
            "/users/{username}",
            routing::get(handlers::user::get_user_profile),
        );

    with_optional_rate_limit(router, config.enabled, config.public_read)
}

/// Protected routes: all authenticated reads and writes.
fn protected_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Auth
        .route("/auth/me", routing::get(handlers::get_current_user))
        // Alerts
        .route("/alerts", routing::post(handlers::alert::create_alert))
        .route(
            "/alerts/{id}",
            routing::get(handlers::alert::get_alert)
                .put(handlers::alert::update_alert)
                .delete(handlers::alert::delete_alert),
        )
        .route(
            "/alerts/{id}/archive",
            routing::put(handlers::alert::archive_alert),
        )
        // Votes
        .route("/alerts/{id}/vote", routing::post(handlers::vote::vote_alert))
        // Moderation
        .route("/admin/users", routing::get(handlers::admin::list_users))
        .route(
            "/admin/users/{id}/suspend",
            routing::put(handlers::admin::suspend_user),
        )
        .route(
            "/admin/users/{id}/unsuspend",
            routing::put(handlers::admin::unsuspend_user),
        )
        .route(
            "/admin/users/{id}/role",
            routing::put(handlers::admin::update_user_role),
        )
        .route(
            "/admin/alerts/sweep",
            routing::post(handlers::admin::sweep_alerts),
        );

    with_optional_rate_limit(router, config.enabled, config.protected)
}

fn with_optional_rate_limit(router: Router, enabled: bool, rule: RateLimitRule) -> Router {
    if !enabled {
        return router;
    }

    let governor_conf = GovernorConfigBuilder::default()
        .per_second(rule.per_second)
        .burst_size(rule.burst_size)
        .finish()
        .expect("Invalid rate limit configuration");

    router.layer(GovernorLayer::new(governor_conf))
}
