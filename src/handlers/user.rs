use crate::error::AppResult;
use crate::models::UserModel;
use crate::response::ApiResponse;
use crate::services::user::UserService;
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct UserProfileResponse {
    pub id: i32,
    pub username: String,
    pub bio: Option<String>,
    pub role: String,
    pub alerts_created: i32,
    pub alerts_upvoted: i32,
}

impl From<UserModel> for UserProfileResponse {
    fn from(user: UserModel) -> Self {
        Self {
            id: user.id,
            username: user.username,
            bio: user.bio,
            role: user.role,
            alerts_created: user.alerts_created,
            alerts_upvoted: user.alerts_upvoted,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{username}",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "User profile", body = UserProfileResponse),
        (status = 404, description = "User not found", body = crate::error::AppError),
    ),
    tag = "users"
)]
pub async fn get_user_profile(
    Extension(db): Extension<DatabaseConnection>,
    Path(username): Path<String>,
) -> AppResult<impl IntoResponse> {
    let service = UserService::new(db);
    let user = service.get_by_username(&username).await?;

    Ok(ApiResponse::ok(UserProfileResponse::from(user)))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TopReportersQuery {
    /// Maximum entries to return (default 10, capped at 50)
    pub limit: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/v1/users/top",
    params(("limit" = Option<u64>, Query, description = "Maximum entries")),
    responses(
        (status = 200, description = "Reporters ranked by upvotes received", body = [UserProfileResponse]),
    ),
    tag = "users"
)]
pub async fn top_reporters(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<TopReportersQuery>,
) -> AppResult<impl IntoResponse> {
    let limit = params.limit.unwrap_or(10).min(50);

    let service = UserService::new(db);
    let users = service.top_reporters(limit).await?;
    let items: Vec<UserProfileResponse> =
        users.into_iter().map(UserProfileResponse::from).collect();

    Ok(ApiResponse::ok(items))
}
