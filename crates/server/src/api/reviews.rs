//! Staff review endpoints.
//!
//! Reviews are guarded by a per-subject claim inside the pipeline; a second
//! reviewer hitting the same subject gets a 409 naming the claim holder.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use agegate_core::UserId;
use agegate_pipeline::PendingReview;

use crate::error::ServerError;

use super::AppState;
use super::schemas::ErrorResponse;

/// Request body for a staff review decision.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReviewRequest {
    /// The staff member making the decision.
    #[schema(example = "220938475612")]
    pub reviewer_id: String,
    /// The member under review.
    #[schema(example = "1093847561203")]
    pub user_id: String,
    /// `true` bans the member as underage; `false` verifies them.
    pub underage: bool,
    /// Free-form reviewer notes stored on the record.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Response for a recorded review.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReviewResponse {
    /// The record the review was applied to.
    pub record_id: String,
    /// `false` when the member was banned as underage.
    pub verified: bool,
}

/// Request body for an 18+ access decision.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdultReviewRequest {
    /// The staff member making the decision.
    #[schema(example = "220938475612")]
    pub reviewer_id: String,
    /// The already-verified member requesting adult access.
    #[schema(example = "1093847561203")]
    pub user_id: String,
    /// Whether adult access was granted.
    pub approved: bool,
}

/// Response for an 18+ access decision.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdultReviewResponse {
    /// The member the decision applies to.
    pub user_id: String,
    /// Whether adult access was granted.
    pub approved: bool,
}

/// One entry in the pending review queue.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PendingReviewEntry {
    /// Verification record identifier.
    pub record_id: String,
    /// The submitting member.
    pub user_id: String,
    /// Display name at submission time.
    pub display_name: String,
    /// When the submission arrived.
    pub submitted_at: DateTime<Utc>,
    /// `"photo"` or `"video"`.
    #[schema(example = "photo")]
    pub media_kind: String,
    /// Estimated age in years.
    pub estimated_age: f32,
    /// Whether the estimate fell below the minimum age.
    pub high_priority: bool,
}

impl From<PendingReview> for PendingReviewEntry {
    fn from(review: PendingReview) -> Self {
        Self {
            record_id: review.record_id.to_string(),
            user_id: review.user.to_string(),
            display_name: review.display_name,
            submitted_at: review.submitted_at,
            media_kind: review.media_kind.to_string(),
            estimated_age: review.estimated_age,
            high_priority: review.high_priority,
        }
    }
}

/// Response for the pending review queue, oldest first.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PendingReviewsResponse {
    /// Queue entries without media payloads.
    pub reviews: Vec<PendingReviewEntry>,
    /// Number of entries returned.
    #[schema(example = 3)]
    pub count: usize,
}

/// `POST /v1/reviews` -- record a staff decision on a pending submission.
#[utoipa::path(
    post,
    path = "/v1/reviews",
    tag = "Reviews",
    summary = "Record a review decision",
    description = "Claims the subject, marks their latest unreviewed submission as decided, and applies the side effects: role swap and approval DM when verified, ban notice and ban when underage.",
    request_body(content = ReviewRequest, description = "Review decision"),
    responses(
        (status = 200, description = "Review recorded", body = ReviewResponse),
        (status = 404, description = "No submission awaiting review", body = ErrorResponse),
        (status = 409, description = "Subject claimed by another reviewer or already reviewed", body = ErrorResponse),
        (status = 502, description = "Guild action failed", body = ErrorResponse)
    )
)]
pub async fn review(
    State(state): State<AppState>,
    Json(request): Json<ReviewRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let reviewer = UserId::new(&request.reviewer_id);
    let subject = UserId::new(&request.user_id);
    let outcome = state
        .pipeline
        .review(
            &reviewer,
            &subject,
            request.underage,
            request.notes.as_deref(),
        )
        .await?;

    let response = ReviewResponse {
        record_id: outcome.record_id.to_string(),
        verified: outcome.verified,
    };
    Ok((StatusCode::OK, Json(serde_json::json!(response))))
}

/// `POST /v1/reviews/adult` -- record an 18+ access decision.
#[utoipa::path(
    post,
    path = "/v1/reviews/adult",
    tag = "Reviews",
    summary = "Record an 18+ access decision",
    description = "Approval swaps the verified 13+ role for the 18+ role and DMs the content policy; denial only sends an informational DM.",
    request_body(content = AdultReviewRequest, description = "18+ access decision"),
    responses(
        (status = 200, description = "Decision recorded", body = AdultReviewResponse),
        (status = 502, description = "Guild action failed", body = ErrorResponse)
    )
)]
pub async fn review_adult(
    State(state): State<AppState>,
    Json(request): Json<AdultReviewRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let reviewer = UserId::new(&request.reviewer_id);
    let subject = UserId::new(&request.user_id);
    state
        .pipeline
        .approve_adult(&reviewer, &subject, request.approved)
        .await?;

    let response = AdultReviewResponse {
        user_id: request.user_id,
        approved: request.approved,
    };
    Ok((StatusCode::OK, Json(serde_json::json!(response))))
}

/// `GET /v1/reviews/pending` -- list the review queue, oldest first.
#[utoipa::path(
    get,
    path = "/v1/reviews/pending",
    tag = "Reviews",
    summary = "List pending reviews",
    description = "Returns unreviewed submissions as summaries without media payloads, oldest first.",
    responses(
        (status = 200, description = "Pending reviews", body = PendingReviewsResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn pending(State(state): State<AppState>) -> Result<impl IntoResponse, ServerError> {
    let reviews: Vec<PendingReviewEntry> = state
        .pipeline
        .pending_reviews()
        .await?
        .into_iter()
        .map(PendingReviewEntry::from)
        .collect();

    let response = PendingReviewsResponse {
        count: reviews.len(),
        reviews,
    };
    Ok((StatusCode::OK, Json(serde_json::json!(response))))
}
