use crate::error::{AppError, AppResult};
use crate::middleware::auth::{load_actor, AuthUser};
use crate::models::UserModel;
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::alert::AlertService;
use crate::services::permission;
use crate::services::user::UserService;
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ManagedUserResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: String,
    pub alerts_created: i32,
    pub alerts_upvoted: i32,
    pub is_suspended: bool,
    pub created_at: String,
}

impl From<UserModel> for ManagedUserResponse {
    fn from(user: UserModel) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            alerts_created: user.alerts_created,
            alerts_upvoted: user.alerts_upvoted,
            is_suspended: user.is_suspended,
            created_at: user.created_at.and_utc().to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    /// New role: user, ambassador or admin
    pub role: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SweepResponse {
    /// Alerts archived by this sweep
    pub archived: u64,
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    security(("jwt_token" = [])),
    params(
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "All users, newest first", body = PaginatedResponse<ManagedUserResponse>),
        (status = 403, description = "Moderator role required", body = AppError),
    ),
    tag = "admin"
)]
pub async fn list_users(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let actor = load_actor(&db, &auth_user).await?;
    if !permission::can_list_users(&actor) {
        return Err(AppError::Forbidden);
    }

    let page = params.page.unwrap_or(1);
    let per_page = params.per_page.unwrap_or(20).min(100);

    let service = UserService::new(db);
    let (users, total) = service.list(page, per_page).await?;
    let items: Vec<ManagedUserResponse> =
        users.into_iter().map(ManagedUserResponse::from).collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/users/{id}/suspend",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User suspended", body = ManagedUserResponse),
        (status = 403, description = "Not allowed to moderate this user", body = AppError),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "admin"
)]
pub async fn suspend_user(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let actor = load_actor(&db, &auth_user).await?;

    let service = UserService::new(db);
    let user = service.set_suspended(&actor, id, true).await?;

    tracing::info!(target_id = user.id, moderator = %actor.username, "User suspended");
    Ok(ApiResponse::ok(ManagedUserResponse::from(user)))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/users/{id}/unsuspend",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User unsuspended", body = ManagedUserResponse),
        (status = 403, description = "Not allowed to moderate this user", body = AppError),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "admin"
)]
pub async fn unsuspend_user(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let actor = load_actor(&db, &auth_user).await?;

    let service = UserService::new(db);
    let user = service.set_suspended(&actor, id, false).await?;

    tracing::info!(target_id = user.id, moderator = %actor.username, "User unsuspended");
    Ok(ApiResponse::ok(ManagedUserResponse::from(user)))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/users/{id}/role",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = ManagedUserResponse),
        (status = 400, description = "Unknown role", body = AppError),
        (status = 403, description = "Admin role required", body = AppError),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "admin"
)]
pub async fn update_user_role(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateRoleRequest>,
) -> AppResult<impl IntoResponse> {
    let actor = load_actor(&db, &auth_user).await?;

    let service = UserService::new(db);
    let user = service.update_role(&actor, id, &payload.role).await?;

    Ok(ApiResponse::ok(ManagedUserResponse::from(user)))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/alerts/sweep",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Expired alerts archived", body = SweepResponse),
        (status = 403, description = "Moderator role required", body = AppError),
    ),
    tag = "admin"
)]
pub async fn sweep_alerts(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let actor = load_actor(&db, &auth_user).await?;
    if !permission::can_archive_alert(&actor) {
        return Err(AppError::Forbidden);
    }

    let service = AlertService::new(db);
    let archived = service.sweep_expired(chrono::Utc::now().naive_utc()).await?;

    tracing::info!(archived, moderator = %actor.username, "Manual expiry sweep");
    Ok(ApiResponse::ok(SweepResponse { archived }))
}
