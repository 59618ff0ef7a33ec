use crate::error::AppResult;
use crate::middleware::auth::parse_user_id;
use crate::middleware::AuthUser;
use crate::response::ApiResponse;
use crate::services::vote::{VoteService, VoteValue};
use axum::{extract::Path, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct VoteRequest {
    /// 1 for an upvote, -1 for a downvote; repeating a vote retracts it
    pub value: i16,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VoteResponse {
    pub alert_id: i32,
    /// Standing vote after this cast: 1, -1 or 0 (retracted)
    pub value: i16,
    pub positive_votes: i32,
    pub negative_votes: i32,
}

#[utoipa::path(
    post,
    path = "/api/v1/alerts/{id}/vote",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Alert ID")),
    request_body = VoteRequest,
    responses(
        (status = 200, description = "Vote recorded", body = VoteResponse),
        (status = 400, description = "Invalid vote value", body = crate::error::AppError),
        (status = 401, description = "Unauthorized", body = crate::error::AppError),
        (status = 404, description = "Alert not found", body = crate::error::AppError),
    ),
    tag = "votes"
)]
pub async fn vote_alert(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<VoteRequest>,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_user_id(&auth_user)?;
    let cast = VoteValue::from_raw(payload.value)?;

    let service = VoteService::new(db);
    let outcome = service.cast_vote(id, user_id, cast).await?;

    Ok(ApiResponse::ok(VoteResponse {
        alert_id: id,
        value: outcome.value,
        positive_votes: outcome.positive_votes,
        negative_votes: outcome.negative_votes,
    }))
}
