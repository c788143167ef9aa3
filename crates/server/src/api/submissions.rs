//! Submission intake endpoint.
//!
//! Platform adapters post verification DMs here. Media arrives base64-encoded
//! and is decoded before entering the pipeline; the three intake outcomes
//! (accepted, rejected, on cooldown) all return 200 with a tagged status.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use agegate_core::{Attachment, UserId};
use agegate_pipeline::SubmissionOutcome;

use crate::error::ServerError;

use super::AppState;
use super::schemas::ErrorResponse;

/// A single attachment on a submission, media bytes base64-encoded.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AttachmentUpload {
    /// Original filename; the extension decides the media kind.
    #[schema(example = "face.png")]
    pub filename: String,
    /// Base64-encoded media bytes.
    pub data: String,
}

/// Request body for a verification submission.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmissionRequest {
    /// The submitting member.
    #[schema(example = "1093847561203")]
    pub user_id: String,
    /// Display name shown in review alerts.
    #[schema(example = "Sam")]
    pub display_name: String,
    /// Message attachments, in order. The first allow-listed one is used.
    pub attachments: Vec<AttachmentUpload>,
}

/// Response for a verification submission.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmissionResponse {
    /// Intake outcome: `"accepted"`, `"rejected"`, or `"on_cooldown"`.
    #[schema(example = "accepted")]
    pub status: String,
    /// Identifier of the created record (accepted only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    /// Estimated age in years (accepted only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_age: Option<f32>,
    /// Whether the estimate fell below the minimum age (accepted only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_priority: Option<bool>,
    /// User-presentable rejection text (rejected only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Seconds until the next attempt is accepted (on cooldown only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<u64>,
}

impl From<SubmissionOutcome> for SubmissionResponse {
    fn from(outcome: SubmissionOutcome) -> Self {
        match outcome {
            SubmissionOutcome::Accepted {
                record_id,
                estimated_age,
                high_priority,
            } => Self {
                status: "accepted".to_owned(),
                record_id: Some(record_id.to_string()),
                estimated_age: Some(estimated_age),
                high_priority: Some(high_priority),
                reason: None,
                retry_after_seconds: None,
            },
            SubmissionOutcome::Rejected { reason } => Self {
                status: "rejected".to_owned(),
                record_id: None,
                estimated_age: None,
                high_priority: None,
                reason: Some(reason),
                retry_after_seconds: None,
            },
            SubmissionOutcome::OnCooldown { retry_after } => Self {
                status: "on_cooldown".to_owned(),
                record_id: None,
                estimated_age: None,
                high_priority: None,
                reason: None,
                retry_after_seconds: Some(retry_after.as_secs()),
            },
        }
    }
}

/// `POST /v1/submissions` -- run a verification submission through intake.
#[utoipa::path(
    post,
    path = "/v1/submissions",
    tag = "Submissions",
    summary = "Submit verification media",
    description = "Runs a member's verification submission through intake: cooldown claim, media checks, age estimation, and the staff alert. Returns the intake outcome.",
    request_body(content = SubmissionRequest, description = "Submission with base64-encoded media"),
    responses(
        (status = 200, description = "Submission processed", body = SubmissionResponse),
        (status = 400, description = "Malformed attachment encoding", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn submit(
    State(state): State<AppState>,
    Json(request): Json<SubmissionRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let mut attachments = Vec::with_capacity(request.attachments.len());
    for upload in &request.attachments {
        let Ok(data) = BASE64.decode(&upload.data) else {
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!(ErrorResponse {
                    error: format!("attachment {} is not valid base64", upload.filename),
                })),
            ));
        };
        attachments.push(Attachment::new(&upload.filename, data));
    }

    let user = UserId::new(&request.user_id);
    let outcome = state
        .pipeline
        .submit(&user, &request.display_name, &attachments)
        .await?;

    let response = SubmissionResponse::from(outcome);
    Ok((StatusCode::OK, Json(serde_json::json!(response))))
}
