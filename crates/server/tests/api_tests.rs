use std::sync::Arc;

use axum::body::Body;
use axum::http::{self, Request, StatusCode};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tower::ServiceExt;

use agegate_core::config::{ChannelRef, RoleRef};
use agegate_core::{GateConfig, GuildId, UserId};
use agegate_estimator::testing::{
    ScriptedDecoder, ScriptedDetector, encode_png, face_frame, geometry_with_ratio,
};
use agegate_estimator::{Estimator, EstimatorSettings};
use agegate_guild::testing::{GuildCall, RecordingGuild};
use agegate_pipeline::PipelineBuilder;
use agegate_records_memory::{MemoryAppealStore, MemoryVerificationStore};
use agegate_server::api::AppState;
use agegate_state::{SessionKey, SessionStore};
use agegate_state_memory::MemorySessionStore;

// -- Helpers --------------------------------------------------------------

struct TestBackends {
    sessions: Arc<MemorySessionStore>,
    guild: Arc<RecordingGuild>,
}

fn test_config() -> GateConfig {
    let mut config = GateConfig::default();
    config.guild = GuildId::new("guild-1");
    config.roles.unverified = RoleRef::new("role-unverified", "Unverified");
    config.roles.awaiting_review = RoleRef::new("role-awaiting", "Awaiting Review");
    config.roles.verified_13plus = RoleRef::new("role-13", "13+");
    config.roles.verified_18plus = RoleRef::new("role-18", "18+");
    config.roles.staff = RoleRef::new("role-staff", "Staff");
    config.channels.mod_log = ChannelRef::new("chan-modlog", "mod-log");
    config.channels.appeals = ChannelRef::new("chan-appeals", "appeals");
    config.appeals.auto_deny_keywords = vec!["troll".into()];
    config
}

fn build_test_state() -> (AppState, TestBackends) {
    let sessions = Arc::new(MemorySessionStore::new());
    let guild = Arc::new(RecordingGuild::new());
    let estimator = Arc::new(Estimator::new(
        Arc::new(ScriptedDetector::always(geometry_with_ratio(0.90))),
        Arc::new(ScriptedDecoder::empty()),
        EstimatorSettings::default(),
    ));

    let pipeline = PipelineBuilder::new()
        .config(test_config())
        .sessions(sessions.clone())
        .verifications(Arc::new(MemoryVerificationStore::new()))
        .appeals(Arc::new(MemoryAppealStore::new()))
        .guild(guild.clone())
        .audit(Arc::new(agegate_audit_memory::MemoryAuditSink::new()))
        .estimator(estimator)
        .build()
        .expect("test pipeline builds");

    let state = AppState {
        pipeline: Arc::new(pipeline),
    };
    (state, TestBackends { sessions, guild })
}

fn build_app(state: AppState) -> axum::Router {
    agegate_server::api::router(state)
}

fn photo_base64() -> String {
    BASE64.encode(encode_png(&face_frame(128, 128, 40, 50)))
}

fn submission_body(user: &str) -> String {
    serde_json::to_string(&serde_json::json!({
        "user_id": user,
        "display_name": "Sam",
        "attachments": [{ "filename": "face.png", "data": photo_base64() }],
    }))
    .unwrap()
}

fn post_json(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method(http::Method::POST)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

// -- Tests ----------------------------------------------------------------

#[tokio::test]
async fn health_returns_200() {
    let (state, _) = build_test_state();
    let app = build_app(state);

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn accepted_submission_returns_the_estimate() {
    let (state, _) = build_test_state();
    let app = build_app(state);

    let response = app
        .oneshot(post_json("/v1/submissions", submission_body("user-1")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "accepted");
    assert_eq!(json["high_priority"], false);
    assert!((json["estimated_age"].as_f64().unwrap() - 15.0).abs() < 0.01);
    assert!(!json["record_id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn unsupported_attachment_is_rejected() {
    let (state, _) = build_test_state();
    let app = build_app(state);

    let body = serde_json::to_string(&serde_json::json!({
        "user_id": "user-1",
        "display_name": "Sam",
        "attachments": [{ "filename": "statement.pdf", "data": BASE64.encode(b"%PDF-") }],
    }))
    .unwrap();

    let response = app
        .oneshot(post_json("/v1/submissions", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "rejected");
    assert!(
        json["reason"]
            .as_str()
            .unwrap()
            .contains("not supported")
    );
}

#[tokio::test]
async fn resubmission_inside_cooldown_reports_the_wait() {
    let (state, _) = build_test_state();
    let app = build_app(state);

    let first = app
        .clone()
        .oneshot(post_json("/v1/submissions", submission_body("user-1")))
        .await
        .unwrap();
    assert_eq!(json_body(first).await["status"], "accepted");

    let second = app
        .oneshot(post_json("/v1/submissions", submission_body("user-1")))
        .await
        .unwrap();

    assert_eq!(second.status(), StatusCode::OK);
    let json = json_body(second).await;
    assert_eq!(json["status"], "on_cooldown");
    let wait = json["retry_after_seconds"].as_u64().unwrap();
    assert!(wait > 0 && wait <= 30 * 60, "wait was {wait}");
}

#[tokio::test]
async fn invalid_base64_is_a_bad_request() {
    let (state, _) = build_test_state();
    let app = build_app(state);

    let body = serde_json::to_string(&serde_json::json!({
        "user_id": "user-1",
        "display_name": "Sam",
        "attachments": [{ "filename": "face.png", "data": "!!! not base64 !!!" }],
    }))
    .unwrap();

    let response = app
        .oneshot(post_json("/v1/submissions", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert!(json["error"].as_str().unwrap().contains("face.png"));
}

#[tokio::test]
async fn pending_queue_lists_the_submission() {
    let (state, _) = build_test_state();
    let app = build_app(state);

    app.clone()
        .oneshot(post_json("/v1/submissions", submission_body("user-1")))
        .await
        .unwrap();

    let response = app.oneshot(get("/v1/reviews/pending")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["count"], 1);
    let entry = &json["reviews"][0];
    assert_eq!(entry["user_id"], "user-1");
    assert_eq!(entry["media_kind"], "photo");
    assert!(entry.get("media").is_none(), "queue must not carry bytes");
}

#[tokio::test]
async fn review_verifies_the_member() {
    let (state, backends) = build_test_state();
    let app = build_app(state);

    app.clone()
        .oneshot(post_json("/v1/submissions", submission_body("user-1")))
        .await
        .unwrap();

    let body = serde_json::to_string(&serde_json::json!({
        "reviewer_id": "mod-1",
        "user_id": "user-1",
        "underage": false,
        "notes": "checked",
    }))
    .unwrap();
    let response = app.oneshot(post_json("/v1/reviews", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["verified"], true);
    assert!(!json["record_id"].as_str().unwrap().is_empty());

    let granted = backends.guild.calls().into_iter().any(|call| {
        matches!(
            call,
            GuildCall::AddRole { user, role }
                if user.as_str() == "user-1" && role.as_str() == "role-13"
        )
    });
    assert!(granted, "verified role was not granted");
}

#[tokio::test]
async fn review_without_submission_is_not_found() {
    let (state, _) = build_test_state();
    let app = build_app(state);

    let body = serde_json::to_string(&serde_json::json!({
        "reviewer_id": "mod-1",
        "user_id": "user-9",
        "underage": false,
    }))
    .unwrap();
    let response = app.oneshot(post_json("/v1/reviews", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = json_body(response).await;
    assert_eq!(json["error"], "no submission awaiting review");
}

#[tokio::test]
async fn claimed_subject_conflicts() {
    let (state, backends) = build_test_state();
    let app = build_app(state);

    app.clone()
        .oneshot(post_json("/v1/submissions", submission_body("user-1")))
        .await
        .unwrap();

    let claim = SessionKey::review_claim(&GuildId::new("guild-1"), &UserId::new("user-1"));
    backends
        .sessions
        .set(&claim, "mod-1", None)
        .await
        .unwrap();

    let body = serde_json::to_string(&serde_json::json!({
        "reviewer_id": "mod-2",
        "user_id": "user-1",
        "underage": false,
    }))
    .unwrap();
    let response = app.oneshot(post_json("/v1/reviews", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = json_body(response).await;
    assert!(json["error"].as_str().unwrap().contains("mod-1"));
}

#[tokio::test]
async fn adult_approval_swaps_roles() {
    let (state, backends) = build_test_state();
    let app = build_app(state);

    let body = serde_json::to_string(&serde_json::json!({
        "reviewer_id": "mod-1",
        "user_id": "user-1",
        "approved": true,
    }))
    .unwrap();
    let response = app
        .oneshot(post_json("/v1/reviews/adult", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["approved"], true);
    assert_eq!(json["user_id"], "user-1");

    let granted = backends.guild.calls().into_iter().any(|call| {
        matches!(
            call,
            GuildCall::AddRole { role, .. } if role.as_str() == "role-18"
        )
    });
    assert!(granted, "18+ role was not granted");
}

#[tokio::test]
async fn appeal_is_queued_for_staff() {
    let (state, _) = build_test_state();
    let app = build_app(state);

    let body = serde_json::to_string(&serde_json::json!({
        "user_id": "user-1",
        "reason": "I was banned by mistake",
        "claimed_age": "16",
        "reconsideration": "My submission was misjudged",
    }))
    .unwrap();
    let response = app.oneshot(post_json("/v1/appeals", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "submitted");
    assert!(!json["appeal_id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn keyword_appeal_is_auto_denied() {
    let (state, _) = build_test_state();
    let app = build_app(state);

    let body = serde_json::to_string(&serde_json::json!({
        "user_id": "user-1",
        "reason": "you are all trolls",
        "claimed_age": "16",
        "reconsideration": "unban me",
    }))
    .unwrap();
    let response = app.oneshot(post_json("/v1/appeals", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "auto_denied");
}

#[tokio::test]
async fn decided_appeal_reports_the_status() {
    let (state, _) = build_test_state();
    let app = build_app(state);

    let body = serde_json::to_string(&serde_json::json!({
        "user_id": "user-1",
        "reason": "I was banned by mistake",
        "claimed_age": "16",
        "reconsideration": "My submission was misjudged",
    }))
    .unwrap();
    let submitted = app
        .clone()
        .oneshot(post_json("/v1/appeals", body))
        .await
        .unwrap();
    let appeal_id = json_body(submitted).await["appeal_id"]
        .as_str()
        .unwrap()
        .to_owned();

    let decision = serde_json::to_string(&serde_json::json!({
        "staff_id": "mod-1",
        "accept": true,
    }))
    .unwrap();
    let uri = format!("/v1/appeals/{appeal_id}/decision");
    let response = app
        .clone()
        .oneshot(post_json(&uri, decision.clone()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "accepted");
    assert_eq!(json["decided_by"], "mod-1");

    // Decisions are one-way.
    let again = app.oneshot(post_json(&uri, decision)).await.unwrap();
    assert_eq!(again.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn denied_appeal_cooldown_is_surfaced() {
    let (state, _) = build_test_state();
    let app = build_app(state);

    let appeal = serde_json::to_string(&serde_json::json!({
        "user_id": "user-1",
        "reason": "I was banned by mistake",
        "claimed_age": "16",
        "reconsideration": "My submission was misjudged",
    }))
    .unwrap();
    let submitted = app
        .clone()
        .oneshot(post_json("/v1/appeals", appeal.clone()))
        .await
        .unwrap();
    let appeal_id = json_body(submitted).await["appeal_id"]
        .as_str()
        .unwrap()
        .to_owned();

    let decision = serde_json::to_string(&serde_json::json!({
        "staff_id": "mod-1",
        "accept": false,
    }))
    .unwrap();
    app.clone()
        .oneshot(post_json(
            &format!("/v1/appeals/{appeal_id}/decision"),
            decision,
        ))
        .await
        .unwrap();

    let retry = app.oneshot(post_json("/v1/appeals", appeal)).await.unwrap();

    assert_eq!(retry.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(
        retry
            .headers()
            .get(http::header::RETRY_AFTER)
            .is_some()
    );
    let json = json_body(retry).await;
    assert!(json["error"].as_str().unwrap().contains("cooldown"));
    assert!(json["retry_after"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn appeal_stats_aggregate_the_queue() {
    let (state, _) = build_test_state();
    let app = build_app(state);

    for user in ["user-1", "user-2"] {
        let body = serde_json::to_string(&serde_json::json!({
            "user_id": user,
            "reason": "I was banned by mistake",
            "claimed_age": "16",
            "reconsideration": "My submission was misjudged",
        }))
        .unwrap();
        app.clone()
            .oneshot(post_json("/v1/appeals", body))
            .await
            .unwrap();
    }

    let response = app.oneshot(get("/v1/appeals/stats")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["total"], 2);
    assert_eq!(json["pending"], 2);
    assert_eq!(json["accepted"], 0);
    assert_eq!(json["denied"], 0);
}

#[tokio::test]
async fn join_burst_crosses_the_raid_threshold() {
    let (state, backends) = build_test_state();
    let app = build_app(state);

    for i in 1..10 {
        let body = serde_json::to_string(&serde_json::json!({ "user_id": format!("user-{i}") }))
            .unwrap();
        let response = app
            .clone()
            .oneshot(post_json("/v1/events/join", body))
            .await
            .unwrap();
        let json = json_body(response).await;
        assert_eq!(json["joins_in_window"], i);
        assert_eq!(json["raid_suspected"], false);
    }

    let body = serde_json::to_string(&serde_json::json!({ "user_id": "user-10" })).unwrap();
    let response = app
        .oneshot(post_json("/v1/events/join", body))
        .await
        .unwrap();
    let json = json_body(response).await;
    assert_eq!(json["joins_in_window"], 10);
    assert_eq!(json["raid_suspected"], true);

    let alerts = backends
        .guild
        .channel_messages(&agegate_core::ChannelId::new("chan-modlog"));
    assert_eq!(alerts.len(), 1, "one raid alert expected");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let (state, _) = build_test_state();
    let app = build_app(state);

    let response = app.oneshot(get("/api-doc/openapi.json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["info"]["title"], "Agegate API");
    assert!(json["paths"]["/v1/submissions"].is_object());
}
