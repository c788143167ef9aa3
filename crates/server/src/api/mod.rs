pub mod appeals;
pub mod events;
pub mod health;
pub mod openapi;
pub mod reviews;
pub mod schemas;
pub mod submissions;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use agegate_pipeline::VerificationPipeline;

use self::openapi::ApiDoc;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The verification pipeline.
    pub pipeline: Arc<VerificationPipeline>,
}

/// Build the Axum router with all API routes, middleware, and Swagger UI.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        // Intake
        .route("/v1/submissions", post(submissions::submit))
        // Staff reviews
        .route("/v1/reviews", post(reviews::review))
        .route("/v1/reviews/adult", post(reviews::review_adult))
        .route("/v1/reviews/pending", get(reviews::pending))
        // Appeals
        .route("/v1/appeals", post(appeals::submit))
        .route("/v1/appeals/{id}/decision", post(appeals::decide))
        .route("/v1/appeals/stats", get(appeals::stats))
        // Platform events
        .route("/v1/events/join", post(events::member_join))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
