use super::appeals::{
    AppealDecisionRequest, AppealDecisionResponse, AppealRequest, AppealResponse,
    AppealStatsResponse,
};
use super::events::{JoinEventRequest, JoinEventResponse};
use super::reviews::{
    AdultReviewRequest, AdultReviewResponse, PendingReviewEntry, PendingReviewsResponse,
    ReviewRequest, ReviewResponse,
};
use super::schemas::{ErrorResponse, HealthResponse};
use super::submissions::{AttachmentUpload, SubmissionRequest, SubmissionResponse};

#[derive(utoipa::OpenApi)]
#[openapi(
    info(
        title = "Agegate API",
        version = "0.1.0",
        description = "HTTP API for the Agegate verification pipeline. Submit verification media, record staff decisions, and handle ban appeals.",
        license(name = "Apache-2.0")
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Submissions", description = "Verification media intake"),
        (name = "Reviews", description = "Staff review queue and decisions"),
        (name = "Appeals", description = "Ban appeal intake and decisions"),
        (name = "Events", description = "Platform events feeding the pipeline")
    ),
    paths(
        super::health::health,
        super::submissions::submit,
        super::reviews::review,
        super::reviews::review_adult,
        super::reviews::pending,
        super::appeals::submit,
        super::appeals::decide,
        super::appeals::stats,
        super::events::member_join,
    ),
    components(schemas(
        HealthResponse,
        ErrorResponse,
        AttachmentUpload,
        SubmissionRequest,
        SubmissionResponse,
        ReviewRequest,
        ReviewResponse,
        AdultReviewRequest,
        AdultReviewResponse,
        PendingReviewEntry,
        PendingReviewsResponse,
        AppealRequest,
        AppealResponse,
        AppealDecisionRequest,
        AppealDecisionResponse,
        AppealStatsResponse,
        JoinEventRequest,
        JoinEventResponse,
    ))
)]
pub struct ApiDoc;
