//! Platform event endpoints.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use agegate_core::UserId;

use crate::error::ServerError;

use super::AppState;
use super::schemas::ErrorResponse;

/// Request body for a member-join event.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct JoinEventRequest {
    /// The member who joined.
    #[schema(example = "1093847561203")]
    pub user_id: String,
}

/// Response for a member-join event.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct JoinEventResponse {
    /// Joins counted in the current rolling window. Zero when raid
    /// detection is disabled.
    #[schema(example = 4)]
    pub joins_in_window: u64,
    /// Whether the join count crossed the configured raid threshold.
    pub raid_suspected: bool,
}

/// `POST /v1/events/join` -- count a member join for raid detection.
#[utoipa::path(
    post,
    path = "/v1/events/join",
    tag = "Events",
    summary = "Record a member join",
    description = "Counts the join in the rolling raid window. Crossing the configured threshold posts a raid alert to the mod-log channel.",
    request_body(content = JoinEventRequest, description = "Member-join event"),
    responses(
        (status = 200, description = "Join counted", body = JoinEventResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn member_join(
    State(state): State<AppState>,
    Json(request): Json<JoinEventRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let user = UserId::new(&request.user_id);
    let joins = state.pipeline.record_join(&user).await?;

    let raid = &state.pipeline.config().raid;
    let response = JoinEventResponse {
        joins_in_window: joins,
        raid_suspected: raid.enabled && joins >= raid.join_threshold,
    };
    Ok((StatusCode::OK, Json(serde_json::json!(response))))
}
