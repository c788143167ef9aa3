//! Ban appeal endpoints.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use agegate_core::{AppealId, AppealRecord, UserId};
use agegate_pipeline::AppealOutcome;

use crate::error::ServerError;

use super::AppState;
use super::schemas::ErrorResponse;

/// Request body for a new ban appeal.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AppealRequest {
    /// The banned member appealing.
    #[schema(example = "1093847561203")]
    pub user_id: String,
    /// Why the member believes the ban was wrong.
    pub reason: String,
    /// The age the member claims to be.
    #[schema(example = "16")]
    pub claimed_age: String,
    /// What the member wants staff to reconsider.
    pub reconsideration: String,
    /// Optional reference to supporting proof.
    #[serde(default)]
    pub proof: Option<String>,
}

/// Response for a submitted appeal.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AppealResponse {
    /// Identifier of the stored appeal.
    pub appeal_id: String,
    /// `"submitted"` when queued for staff, `"auto_denied"` when the
    /// keyword filter denied it on sight.
    #[schema(example = "submitted")]
    pub status: String,
}

/// Request body for a staff decision on an appeal.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AppealDecisionRequest {
    /// The staff member deciding.
    #[schema(example = "220938475612")]
    pub staff_id: String,
    /// `true` lifts the ban; `false` starts the appeal cooldown.
    pub accept: bool,
    /// Free-form decision notes stored on the appeal.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Response for a decided appeal.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AppealDecisionResponse {
    /// Identifier of the decided appeal.
    pub appeal_id: String,
    /// Final status: `"accepted"` or `"denied"`.
    #[schema(example = "accepted")]
    pub status: String,
    /// The staff member who decided.
    pub decided_by: Option<String>,
    /// When the decision was recorded.
    pub decided_at: Option<DateTime<Utc>>,
}

/// Aggregate appeal counts.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AppealStatsResponse {
    /// All appeals ever recorded.
    #[schema(example = 12)]
    pub total: u64,
    /// Appeals accepted by staff.
    #[schema(example = 3)]
    pub accepted: u64,
    /// Appeals denied by staff or the keyword filter.
    #[schema(example = 7)]
    pub denied: u64,
    /// Appeals still awaiting a decision.
    #[schema(example = 2)]
    pub pending: u64,
}

/// `POST /v1/appeals` -- submit a ban appeal.
#[utoipa::path(
    post,
    path = "/v1/appeals",
    tag = "Appeals",
    summary = "Submit a ban appeal",
    description = "Stores the appeal and posts it to the appeals channel for staff, unless a configured keyword denies it on sight. Members on the appeal cooldown get a 429 with Retry-After.",
    request_body(content = AppealRequest, description = "Ban appeal"),
    responses(
        (status = 200, description = "Appeal processed", body = AppealResponse),
        (status = 429, description = "Appeal cooldown active", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn submit(
    State(state): State<AppState>,
    Json(request): Json<AppealRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let mut appeal = AppealRecord::new(
        UserId::new(&request.user_id),
        &request.reason,
        &request.claimed_age,
        &request.reconsideration,
    );
    if let Some(proof) = &request.proof {
        appeal = appeal.with_proof(proof);
    }

    let outcome = state.pipeline.submit_appeal(appeal).await?;
    let response = match outcome {
        AppealOutcome::Submitted { appeal_id } => AppealResponse {
            appeal_id: appeal_id.to_string(),
            status: "submitted".to_owned(),
        },
        AppealOutcome::AutoDenied { appeal_id } => AppealResponse {
            appeal_id: appeal_id.to_string(),
            status: "auto_denied".to_owned(),
        },
    };
    Ok((StatusCode::OK, Json(serde_json::json!(response))))
}

/// `POST /v1/appeals/{id}/decision` -- decide a pending appeal.
#[utoipa::path(
    post,
    path = "/v1/appeals/{id}/decision",
    tag = "Appeals",
    summary = "Decide an appeal",
    description = "Accepting lifts the ban and notifies the member; denying starts the appeal cooldown. Decisions are one-way.",
    params(
        ("id" = String, Path, description = "Appeal ID"),
    ),
    request_body(content = AppealDecisionRequest, description = "Staff decision"),
    responses(
        (status = 200, description = "Appeal decided", body = AppealDecisionResponse),
        (status = 409, description = "Appeal already decided", body = ErrorResponse),
        (status = 502, description = "Guild action failed", body = ErrorResponse)
    )
)]
pub async fn decide(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AppealDecisionRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let staff = UserId::new(&request.staff_id);
    let appeal_id = AppealId::new(id);
    let decided = state
        .pipeline
        .decide_appeal(&staff, &appeal_id, request.accept, request.notes.as_deref())
        .await?;

    let response = AppealDecisionResponse {
        appeal_id: decided.id.to_string(),
        status: decided.status.to_string(),
        decided_by: decided.decided_by.map(|u| u.to_string()),
        decided_at: decided.decided_at,
    };
    Ok((StatusCode::OK, Json(serde_json::json!(response))))
}

/// `GET /v1/appeals/stats` -- aggregate appeal counts.
#[utoipa::path(
    get,
    path = "/v1/appeals/stats",
    tag = "Appeals",
    summary = "Appeal statistics",
    description = "Returns total, accepted, denied, and pending appeal counts.",
    responses(
        (status = 200, description = "Appeal counts", body = AppealStatsResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn stats(State(state): State<AppState>) -> Result<impl IntoResponse, ServerError> {
    let stats = state.pipeline.appeal_stats().await?;
    let response = AppealStatsResponse {
        total: stats.total,
        accepted: stats.accepted,
        denied: stats.denied,
        pending: stats.pending,
    };
    Ok((StatusCode::OK, Json(serde_json::json!(response))))
}
