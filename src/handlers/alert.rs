use crate::error::{AppError, AppResult};
use crate::middleware::auth::{load_actor, AuthUser};
use crate::models::{AlertModel, HazardDetails, HazardKind};
use crate::response::ApiResponse;
use crate::services::alert::{AlertChanges, AlertFilter, AlertService, NewAlert, DEFAULT_PAGE_SIZE};
use crate::services::geocode::GeocodeService;
use crate::services::vote::VoteService;
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Serialize, ToSchema)]
pub struct GeoPoint {
    #[serde(rename = "type")]
    pub geometry_type: String,
    /// [longitude, latitude]
    pub coordinates: [f64; 2],
}

impl GeoPoint {
    fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            geometry_type: "Point".to_string(),
            coordinates: [longitude, latitude],
        }
    }
}

/// Alert record as rendered in listings and after creation.
#[derive(Debug, Serialize, ToSchema)]
pub struct AlertResponse {
    pub id: i32,
    pub description: String,
    pub location: GeoPoint,
    pub effect_radius: i32,
    pub hazard_type: Option<String>,
    pub hazard_details: Option<HazardDetails>,
    /// Reporter username; null if the account was deleted.
    pub reported_by: Option<String>,
    pub source_url: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub created_at: String,
}

impl AlertResponse {
    fn build(
        alert: AlertModel,
        details: Option<HazardDetails>,
        reporter: Option<String>,
    ) -> Self {
        Self {
            id: alert.id,
            description: alert.description,
            location: GeoPoint::new(alert.longitude, alert.latitude),
            effect_radius: alert.effect_radius,
            hazard_type: alert.hazard_kind,
            hazard_details: details,
            reported_by: reporter,
            source_url: alert.source_url,
            country: alert.country,
            city: alert.city,
            county: alert.county,
            created_at: alert.created_at.and_utc().to_rfc3339(),
        }
    }
}

/// Full alert view for the details page, including vote state.
#[derive(Debug, Serialize, ToSchema)]
pub struct AlertDetailResponse {
    #[serde(flatten)]
    pub alert: AlertResponse,
    pub positive_votes: i32,
    pub negative_votes: i32,
    pub is_active: bool,
    pub soft_deletion_time: String,
    pub updated_at: String,
    /// The caller's standing vote: 1, -1 or null.
    pub user_vote: Option<i16>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AlertListResponse {
    pub alerts: Vec<AlertResponse>,
    pub page: u64,
    pub num_pages: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AlertListQuery {
    /// Page number (out-of-range values clamp)
    pub page: Option<u64>,
    /// Items per page
    pub per_page: Option<u64>,
    /// Search term matched against description, hazard type and place names
    pub q: Option<String>,
    /// Restrict to active alerts (default true)
    pub active_only: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAlertRequest {
    /// A brief description of the alert
    #[validate(length(min = 1, max = 5000))]
    pub description: String,
    /// Latitude of the reported point
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
    /// Longitude of the reported point
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,
    /// Radius of effect in meters (0-100000); derived from hazard type if absent
    pub effect_radius: Option<i64>,
    /// Source of information about the alert
    #[validate(url)]
    pub source_url: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    /// Hazard type: earthquake, flood, tornado, fire or storm
    pub hazard_type: Option<String>,
    /// Kind-specific attributes, all optional
    pub hazard_details: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateAlertRequest {
    #[validate(length(min = 1, max = 5000))]
    pub description: Option<String>,
    pub effect_radius: Option<i64>,
    #[validate(url)]
    pub source_url: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub hazard_type: Option<String>,
    pub hazard_details: Option<serde_json::Value>,
}

/// GeoJSON feature collection of all active alerts.
#[derive(Debug, Serialize, ToSchema)]
pub struct AlertFeatureCollection {
    #[serde(rename = "type")]
    pub collection_type: String,
    pub features: Vec<AlertFeature>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AlertFeature {
    #[serde(rename = "type")]
    pub feature_type: String,
    pub id: i32,
    pub geometry: GeoPoint,
    pub properties: AlertFeatureProperties,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AlertFeatureProperties {
    pub description: String,
    pub effect_radius: i32,
    pub hazard_type: Option<String>,
    pub hazard_details: Option<HazardDetails>,
    pub reported_by: Option<String>,
    pub source_url: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub positive_votes: i32,
    pub negative_votes: i32,
    pub is_active: bool,
    pub soft_deletion_time: String,
    pub created_at: String,
    pub updated_at: String,
}

fn parse_hazard_payload(
    hazard_type: Option<&str>,
    attributes: Option<serde_json::Value>,
) -> AppResult<Option<HazardDetails>> {
    match hazard_type.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => {
            let kind = HazardKind::parse(raw)
                .ok_or_else(|| AppError::Validation("Invalid hazard type".to_string()))?;
            let details = HazardDetails::from_attributes(
                kind,
                attributes.unwrap_or(serde_json::Value::Null),
            )?;
            Ok(Some(details))
        }
        None if attributes.is_some() => Err(AppError::Validation(
            "hazard_type is required when hazard_details are given".to_string(),
        )),
        None => Ok(None),
    }
}

fn responses_for(
    alerts: Vec<AlertModel>,
    details: &mut HashMap<i32, HazardDetails>,
    reporters: &HashMap<i32, String>,
) -> Vec<AlertResponse> {
    alerts
        .into_iter()
        .map(|alert| {
            let detail = details.remove(&alert.id);
            let reporter = alert
                .reported_by
                .and_then(|id| reporters.get(&id).cloned());
            AlertResponse::build(alert, detail, reporter)
        })
        .collect()
}

#[utoipa::path(
    get,
    path = "/api/v1/alerts",
    params(
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
        ("q" = Option<String>, Query, description = "Search term"),
        ("active_only" = Option<bool>, Query, description = "Restrict to active alerts"),
    ),
    responses(
        (status = 200, description = "Paginated alert list", body = AlertListResponse),
    ),
    tag = "alerts"
)]
pub async fn list_alerts(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<AlertListQuery>,
) -> AppResult<impl IntoResponse> {
    let page = params.page.unwrap_or(1);
    let per_page = params.per_page.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 100);
    let filter = AlertFilter {
        active_only: params.active_only.unwrap_or(true),
        search: params.q,
    };

    let service = AlertService::new(db);
    let (alerts, meta) = service.list(&filter, page, per_page).await?;
    let mut details = service.hazard_details_for(&alerts).await?;
    let reporters = service.reporter_names_for(&alerts).await?;

    Ok(ApiResponse::ok(AlertListResponse {
        alerts: responses_for(alerts, &mut details, &reporters),
        page: meta.page,
        num_pages: meta.num_pages,
        has_next: meta.has_next,
        has_previous: meta.has_previous,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/alerts/geojson",
    responses(
        (status = 200, description = "Active alerts as a GeoJSON FeatureCollection", body = AlertFeatureCollection),
    ),
    tag = "alerts"
)]
pub async fn alerts_geojson(
    Extension(db): Extension<DatabaseConnection>,
) -> AppResult<impl IntoResponse> {
    let service = AlertService::new(db);
    let alerts = service.list_active().await?;
    let mut details = service.hazard_details_for(&alerts).await?;
    let reporters = service.reporter_names_for(&alerts).await?;

    let features = alerts
        .into_iter()
        .map(|alert| {
            let detail = details.remove(&alert.id);
            let reporter = alert
                .reported_by
                .and_then(|id| reporters.get(&id).cloned());
            AlertFeature {
                feature_type: "Feature".to_string(),
                id: alert.id,
                geometry: GeoPoint::new(alert.longitude, alert.latitude),
                properties: AlertFeatureProperties {
                    description: alert.description,
                    effect_radius: alert.effect_radius,
                    hazard_type: alert.hazard_kind,
                    hazard_details: detail,
                    reported_by: reporter,
                    source_url: alert.source_url,
                    country: alert.country,
                    city: alert.city,
                    county: alert.county,
                    positive_votes: alert.positive_votes,
                    negative_votes: alert.negative_votes,
                    is_active: alert.is_active,
                    soft_deletion_time: alert.soft_deletion_time.and_utc().to_rfc3339(),
                    created_at: alert.created_at.and_utc().to_rfc3339(),
                    updated_at: alert.updated_at.and_utc().to_rfc3339(),
                },
            }
        })
        .collect();

    Ok(Json(AlertFeatureCollection {
        collection_type: "FeatureCollection".to_string(),
        features,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/alerts/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Alert ID")),
    responses(
        (status = 200, description = "Alert details", body = AlertDetailResponse),
        (status = 404, description = "Alert not found", body = AppError),
    ),
    tag = "alerts"
)]
pub async fn get_alert(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let actor = load_actor(&db, &auth_user).await?;

    let service = AlertService::new(db.clone());
    let alert = service.get_by_id(id).await?;
    let page = std::slice::from_ref(&alert);
    let mut details = service.hazard_details_for(page).await?;
    let reporters = service.reporter_names_for(page).await?;

    let vote_service = VoteService::new(db);
    let user_vote = vote_service.user_vote(id, actor.id).await?;

    let detail = details.remove(&alert.id);
    let reporter = alert.reported_by.and_then(|r| reporters.get(&r).cloned());
    let positive_votes = alert.positive_votes;
    let negative_votes = alert.negative_votes;
    let is_active = alert.is_active;
    let soft_deletion_time = alert.soft_deletion_time.and_utc().to_rfc3339();
    let updated_at = alert.updated_at.and_utc().to_rfc3339();

    Ok(ApiResponse::ok(AlertDetailResponse {
        alert: AlertResponse::build(alert, detail, reporter),
        positive_votes,
        negative_votes,
        is_active,
        soft_deletion_time,
        updated_at,
        user_vote,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/alerts",
    security(("jwt_token" = [])),
    request_body = CreateAlertRequest,
    responses(
        (status = 200, description = "Alert created", body = AlertResponse),
        (status = 400, description = "Validation or geocoding error", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "alerts"
)]
pub async fn create_alert(
    Extension(db): Extension<DatabaseConnection>,
    Extension(geocoder): Extension<GeocodeService>,
    auth_user: AuthUser,
    Json(payload): Json<CreateAlertRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let actor = load_actor(&db, &auth_user).await?;

    let hazard = parse_hazard_payload(payload.hazard_type.as_deref(), payload.hazard_details)?;

    // Enrich the location unless the reporter already named the place.
    let (country, city, county) = if payload.country.is_none()
        && payload.city.is_none()
        && payload.county.is_none()
    {
        let resolved = geocoder.reverse(payload.lat, payload.lng).await?;
        (resolved.country, resolved.city, resolved.county)
    } else {
        (payload.country, payload.city, payload.county)
    };

    let service = AlertService::new(db);
    let details_echo = hazard.clone();
    let alert = service
        .create(
            actor.id,
            NewAlert {
                description: payload.description,
                longitude: payload.lng,
                latitude: payload.lat,
                effect_radius: payload.effect_radius,
                source_url: payload.source_url,
                country,
                city,
                county,
                hazard,
            },
        )
        .await?;

    tracing::info!(
        alert_id = alert.id,
        reporter = %actor.username,
        hazard = ?alert.hazard_kind,
        "Alert created"
    );

    Ok(ApiResponse::ok(AlertResponse::build(
        alert,
        details_echo,
        Some(actor.username),
    )))
}

#[utoipa::path(
    put,
    path = "/api/v1/alerts/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Alert ID")),
    request_body = UpdateAlertRequest,
    responses(
        (status = 200, description = "Alert updated", body = AlertResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Not the reporter or a moderator", body = AppError),
        (status = 404, description = "Alert not found", body = AppError),
    ),
    tag = "alerts"
)]
pub async fn update_alert(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateAlertRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let actor = load_actor(&db, &auth_user).await?;

    let service = AlertService::new(db);

    // An attribute-only edit keeps the stored hazard kind.
    let hazard_type = match (&payload.hazard_type, &payload.hazard_details) {
        (None, Some(_)) => service.get_by_id(id).await?.hazard_kind,
        _ => payload.hazard_type.clone(),
    };
    let hazard = parse_hazard_payload(hazard_type.as_deref(), payload.hazard_details)?;

    let alert = service
        .update(
            id,
            &actor,
            AlertChanges {
                description: payload.description,
                effect_radius: payload.effect_radius,
                source_url: payload.source_url,
                country: payload.country,
                city: payload.city,
                county: payload.county,
                hazard,
            },
        )
        .await?;

    let page = std::slice::from_ref(&alert);
    let mut details = service.hazard_details_for(page).await?;
    let reporters = service.reporter_names_for(page).await?;
    let detail = details.remove(&alert.id);
    let reporter = alert.reported_by.and_then(|r| reporters.get(&r).cloned());

    Ok(ApiResponse::ok(AlertResponse::build(alert, detail, reporter)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/alerts/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Alert ID")),
    responses(
        (status = 200, description = "Alert deleted", body = String),
        (status = 403, description = "Not the reporter or a moderator", body = AppError),
        (status = 404, description = "Alert not found", body = AppError),
    ),
    tag = "alerts"
)]
pub async fn delete_alert(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let actor = load_actor(&db, &auth_user).await?;

    let service = AlertService::new(db);
    service.delete(id, &actor).await?;

    Ok(ApiResponse::ok("Alert deleted"))
}

#[utoipa::path(
    put,
    path = "/api/v1/alerts/{id}/archive",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Alert ID")),
    responses(
        (status = 200, description = "Alert archived", body = String),
        (status = 403, description = "Moderator role required", body = AppError),
        (status = 404, description = "Alert not found", body = AppError),
    ),
    tag = "alerts"
)]
pub async fn archive_alert(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let actor = load_actor(&db, &auth_user).await?;

    let service = AlertService::new(db);
    service.archive(id, &actor).await?;

    Ok(ApiResponse::ok("Alert archived"))
}
