#![allow(dead_code)]

use reqwest::Client;
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Once,
};

static INIT: Once = Once::new();
static DB_PREPARED: AtomicBool = AtomicBool::new(false);
static USER_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn init_env() {
    INIT.call_once(|| {
        dotenv::dotenv().ok();
        std::env::set_var(
            "JWT_SECRET",
            "integration_test_secret_that_is_at_least_32_characters_long",
        );
        // No outbound calls and no throttling during tests
        std::env::set_var("GEOCODING_ENABLED", "false");
        std::env::set_var("RATE_LIMIT_ENABLED", "false");
        let config = enviroalerts::config::jwt::JwtConfig::from_env().unwrap();
        let _ = enviroalerts::utils::jwt::init_jwt_config(config);
    });
}

pub struct TestApp {
    pub addr: String,
    pub db: DatabaseConnection,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.addr, path)
    }
}

/// Spawn the app against the configured test database. Returns None (and
/// the test should bail out) when neither TEST_DATABASE_URL nor
/// DATABASE_URL is set.
pub async fn spawn_app() -> Option<TestApp> {
    init_env();

    let database_url = std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()?;

    let db = sea_orm::Database::connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    // Migrate and clean once per test binary; tests isolate through
    // unique usernames and descriptions rather than re-truncating.
    if !DB_PREPARED.swap(true, Ordering::SeqCst) {
        enviroalerts::migration::Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");
        cleanup_tables(&db).await;
    }

    let geocoder = enviroalerts::services::geocode::GeocodeService::from_env();

    let app = axum::Router::new()
        .route("/", axum::routing::get(|| async { "ok" }))
        .merge(enviroalerts::routes::create_routes())
        .layer(axum::middleware::from_fn(
            enviroalerts::middleware::security::security_headers_middleware,
        ))
        .layer(axum::extract::Extension(db.clone()))
        .layer(axum::extract::Extension(geocoder));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    Some(TestApp {
        addr: format!("http://{}", addr),
        db,
        client: Client::new(),
    })
}

async fn cleanup_tables(db: &DatabaseConnection) {
    // Reverse dependency order
    let tables = ["alert_votes", "alerts", "hazard_details", "users"];

    for table in tables {
        let sql = format!("TRUNCATE TABLE {} CASCADE", table);
        let _ = db
            .execute(Statement::from_string(
                sea_orm::DatabaseBackend::Postgres,
                sql,
            ))
            .await;
    }
}

/// Register a user and return (user_id, token).
pub async fn create_test_user(app: &TestApp, username_prefix: &str) -> (i32, String) {
    let counter = USER_COUNTER.fetch_add(1, Ordering::SeqCst);
    let unique_username = format!("{}_{}", username_prefix, counter);

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&serde_json::json!({
            "username": unique_username,
            "email": format!("{}@test.com", unique_username),
            "password": "test_password_123"
        }))
        .send()
        .await
        .expect("Failed to register user");

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.unwrap_or_else(|e| {
        panic!(
            "Failed to parse register response for user '{}': status={}, error={}",
            unique_username, status, e
        );
    });

    if !body["success"].as_bool().unwrap_or(false) {
        panic!(
            "Failed to register user '{}': status={}, body={}",
            unique_username, status, body
        );
    }

    let user_id = body["data"]["user_id"].as_i64().expect(&format!(
        "Response missing user_id for user '{}': {:?}",
        unique_username, body
    )) as i32;
    let token = body["data"]["token"]
        .as_str()
        .expect(&format!(
            "Response missing token for user '{}': {:?}",
            unique_username, body
        ))
        .to_string();
    (user_id, token)
}

/// Assign a role by directly updating the database.
pub async fn set_role(db: &DatabaseConnection, user_id: i32, role: &str) {
    db.execute(Statement::from_sql_and_values(
        sea_orm::DatabaseBackend::Postgres,
        "UPDATE users SET role = $1 WHERE id = $2",
        vec![role.into(), user_id.into()],
    ))
    .await
    .expect("Failed to set user role");
}

pub async fn make_admin(db: &DatabaseConnection, user_id: i32) {
    set_role(db, user_id, "admin").await;
}

pub async fn make_ambassador(db: &DatabaseConnection, user_id: i32) {
    set_role(db, user_id, "ambassador").await;
}

/// Create an alert and return its id. `extra` is merged into the request
/// body on top of the defaults.
pub async fn create_test_alert(
    app: &TestApp,
    token: &str,
    description: &str,
    extra: serde_json::Value,
) -> i32 {
    let mut body = serde_json::json!({
        "description": description,
        "lat": 37.98,
        "lng": 23.72,
        "country": "Testland",
        "city": "Testville",
        "county": "Test County"
    });
    if let (Some(base), Some(additions)) = (body.as_object_mut(), extra.as_object()) {
        for (key, value) in additions {
            base.insert(key.clone(), value.clone());
        }
    }

    let resp = app
        .client
        .post(app.url("/alerts"))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .expect("Failed to create alert");

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.expect("Failed to parse alert response");
    if !body["success"].as_bool().unwrap_or(false) {
        panic!("Failed to create alert: status={}, body={}", status, body);
    }

    body["data"]["id"].as_i64().expect("Alert response missing id") as i32
}

/// Fetch the alert detail payload as the given user.
pub async fn get_alert_detail(app: &TestApp, token: &str, alert_id: i32) -> serde_json::Value {
    let resp = app
        .client
        .get(app.url(&format!("/alerts/{}", alert_id)))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to fetch alert");
    resp.json().await.expect("Failed to parse alert detail")
}

/// Fetch a public user profile.
pub async fn get_profile(app: &TestApp, username: &str) -> serde_json::Value {
    let resp = app
        .client
        .get(app.url(&format!("/users/{}", username)))
        .send()
        .await
        .expect("Failed to fetch profile");
    resp.json().await.expect("Failed to parse profile")
}
