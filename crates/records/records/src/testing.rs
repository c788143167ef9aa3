use agegate_core::{
    AppealRecord, AppealStatus, MediaKind, RecordId, UserId, VerificationRecord,
};
use chrono::{DateTime, Duration, Utc};

use crate::appeal::AppealStore;
use crate::error::RecordError;
use crate::verification::VerificationStore;

fn sample_record(user: &str) -> VerificationRecord {
    VerificationRecord::new(user, "Tester", vec![0xAB; 16], MediaKind::Photo, 15.0)
}

/// Backends guarantee timestamp round-trips at millisecond precision, so
/// exact-equality assertions pin their inputs to it.
fn millis_precision(ts: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ts.timestamp_millis()).expect("timestamp in range")
}

/// Position of a record id within a listing, for relative-order assertions
/// that tolerate records left behind by other tests on a shared store.
fn position_of(records: &[VerificationRecord], id: &RecordId) -> Option<usize> {
    records.iter().position(|r| &r.id == id)
}

/// Run the full verification store conformance test suite.
///
/// Call this from your backend's test module with a fresh store instance.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_verification_conformance_tests(
    store: &dyn VerificationStore,
) -> Result<(), RecordError> {
    test_get_missing_record(store).await?;
    test_add_and_get_roundtrip(store).await?;
    test_pending_excludes_reviewed(store).await?;
    test_pending_oldest_first(store).await?;
    test_latest_unreviewed_for_user(store).await?;
    test_for_user_newest_first(store).await?;
    test_update_review_once(store).await?;
    test_update_review_missing(store).await?;
    test_purge_reviewed_before(store).await?;
    Ok(())
}

async fn test_get_missing_record(store: &dyn VerificationStore) -> Result<(), RecordError> {
    let id = RecordId::new("no-such-record");
    let found = store.get(&id).await?;
    assert!(found.is_none(), "get on missing record should return None");
    Ok(())
}

async fn test_add_and_get_roundtrip(store: &dyn VerificationStore) -> Result<(), RecordError> {
    let record = sample_record("conf-roundtrip");
    store.add(&record).await?;

    let found = store
        .get(&record.id)
        .await?
        .expect("added record should be retrievable");
    assert_eq!(found.id, record.id);
    assert_eq!(found.user, record.user);
    assert_eq!(found.display_name, record.display_name);
    assert_eq!(found.media, record.media, "media bytes must survive storage");
    assert_eq!(found.media_kind, record.media_kind);
    assert!(
        (found.estimated_age - record.estimated_age).abs() < f32::EPSILON,
        "estimated age must survive storage"
    );
    assert!(found.is_pending());
    Ok(())
}

async fn test_pending_excludes_reviewed(store: &dyn VerificationStore) -> Result<(), RecordError> {
    let open = sample_record("conf-pending-open");
    let closed = sample_record("conf-pending-closed");
    store.add(&open).await?;
    store.add(&closed).await?;

    let reviewer = UserId::new("conf-reviewer");
    store
        .update_review(&closed.id, &reviewer, true, None, Utc::now())
        .await?;

    let pending = store.pending().await?;
    assert!(
        position_of(&pending, &open.id).is_some(),
        "unreviewed record should be listed as pending"
    );
    assert!(
        position_of(&pending, &closed.id).is_none(),
        "reviewed record should not be listed as pending"
    );
    Ok(())
}

async fn test_pending_oldest_first(store: &dyn VerificationStore) -> Result<(), RecordError> {
    let now = Utc::now();
    let older = sample_record("conf-order-a").with_submitted_at(now - Duration::hours(2));
    let newer = sample_record("conf-order-b").with_submitted_at(now - Duration::hours(1));
    // Insert newest first so ordering cannot come from insertion order.
    store.add(&newer).await?;
    store.add(&older).await?;

    let pending = store.pending().await?;
    let older_pos = position_of(&pending, &older.id).expect("older record should be pending");
    let newer_pos = position_of(&pending, &newer.id).expect("newer record should be pending");
    assert!(
        older_pos < newer_pos,
        "pending should list oldest submissions first"
    );
    Ok(())
}

async fn test_latest_unreviewed_for_user(store: &dyn VerificationStore) -> Result<(), RecordError> {
    let user = UserId::new("conf-latest");
    let now = Utc::now();
    let first = sample_record(user.as_str()).with_submitted_at(now - Duration::hours(3));
    let second = sample_record(user.as_str()).with_submitted_at(now - Duration::hours(1));
    store.add(&first).await?;
    store.add(&second).await?;

    let latest = store
        .latest_unreviewed_for_user(&user)
        .await?
        .expect("user has unreviewed records");
    assert_eq!(latest.id, second.id, "most recent submission should win");

    let reviewer = UserId::new("conf-reviewer");
    store
        .update_review(&second.id, &reviewer, true, None, Utc::now())
        .await?;
    let latest = store
        .latest_unreviewed_for_user(&user)
        .await?
        .expect("older record is still unreviewed");
    assert_eq!(latest.id, first.id);

    store
        .update_review(&first.id, &reviewer, true, None, Utc::now())
        .await?;
    let latest = store.latest_unreviewed_for_user(&user).await?;
    assert!(
        latest.is_none(),
        "no unreviewed records should remain for the user"
    );
    Ok(())
}

async fn test_for_user_newest_first(store: &dyn VerificationStore) -> Result<(), RecordError> {
    let user = UserId::new("conf-history");
    let now = Utc::now();
    let older = sample_record(user.as_str()).with_submitted_at(now - Duration::days(2));
    let newer = sample_record(user.as_str()).with_submitted_at(now - Duration::days(1));
    store.add(&older).await?;
    store.add(&newer).await?;

    let history = store.for_user(&user).await?;
    assert_eq!(history.len(), 2, "both records should belong to the user");
    assert_eq!(history[0].id, newer.id, "history should lead with the newest");
    assert_eq!(history[1].id, older.id);
    Ok(())
}

async fn test_update_review_once(store: &dyn VerificationStore) -> Result<(), RecordError> {
    let record = sample_record("conf-review-once");
    store.add(&record).await?;

    let reviewer = UserId::new("conf-mod-1");
    let when = millis_precision(Utc::now());
    let applied = store
        .update_review(&record.id, &reviewer, false, Some("underage"), when)
        .await?;
    assert!(applied, "first review should apply");

    let found = store
        .get(&record.id)
        .await?
        .expect("reviewed record still exists");
    assert!(found.reviewed);
    assert!(!found.verified);
    assert_eq!(found.reviewer.as_ref(), Some(&reviewer));
    assert_eq!(found.reviewed_at, Some(when));
    assert_eq!(found.notes.as_deref(), Some("underage"));

    let second_reviewer = UserId::new("conf-mod-2");
    let applied = store
        .update_review(&record.id, &second_reviewer, true, None, Utc::now())
        .await?;
    assert!(!applied, "second review should be rejected");

    let found = store
        .get(&record.id)
        .await?
        .expect("reviewed record still exists");
    assert_eq!(
        found.reviewer.as_ref(),
        Some(&reviewer),
        "the first review must stand"
    );
    assert!(!found.verified);
    Ok(())
}

async fn test_update_review_missing(store: &dyn VerificationStore) -> Result<(), RecordError> {
    let id = RecordId::new("no-such-review-target");
    let reviewer = UserId::new("conf-mod-3");
    let result = store
        .update_review(&id, &reviewer, true, None, Utc::now())
        .await;
    assert!(
        matches!(result, Err(RecordError::NotFound(_))),
        "reviewing a missing record should fail with NotFound"
    );
    Ok(())
}

async fn test_purge_reviewed_before(store: &dyn VerificationStore) -> Result<(), RecordError> {
    let now = Utc::now();
    let stale = sample_record("conf-purge-stale").with_submitted_at(now - Duration::days(401));
    let lingering = sample_record("conf-purge-open").with_submitted_at(now - Duration::days(401));
    store.add(&stale).await?;
    store.add(&lingering).await?;

    // Backdate the review far enough that no other conformance test's
    // records fall before the cutoff.
    let reviewer = UserId::new("conf-mod-4");
    store
        .update_review(&stale.id, &reviewer, true, None, now - Duration::days(400))
        .await?;

    let purged = store
        .purge_reviewed_before(now - Duration::days(399))
        .await?;
    assert_eq!(purged, 1, "exactly the stale reviewed record should go");
    assert!(
        store.get(&stale.id).await?.is_none(),
        "purged record should be gone"
    );
    assert!(
        store.get(&lingering.id).await?.is_some(),
        "unreviewed records must never be purged, however old"
    );
    Ok(())
}

fn sample_appeal(user: &str) -> AppealRecord {
    AppealRecord::new(user, "the estimate was wrong", "19", "I can provide ID")
}

/// Run the full appeal store conformance test suite.
///
/// Call this from your backend's test module with a fresh store instance.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_appeal_conformance_tests(store: &dyn AppealStore) -> Result<(), RecordError> {
    test_get_missing_appeal(store).await?;
    test_add_and_get_appeal(store).await?;
    test_add_preserves_denied_status(store).await?;
    test_pending_appeals_oldest_first(store).await?;
    test_decide_appeal_once(store).await?;
    test_decide_missing_appeal(store).await?;
    test_stats_deltas(store).await?;
    Ok(())
}

async fn test_get_missing_appeal(store: &dyn AppealStore) -> Result<(), RecordError> {
    let id = agegate_core::AppealId::new("no-such-appeal");
    let found = store.get(&id).await?;
    assert!(found.is_none(), "get on missing appeal should return None");
    Ok(())
}

async fn test_add_and_get_appeal(store: &dyn AppealStore) -> Result<(), RecordError> {
    let appeal = sample_appeal("conf-appeal-roundtrip")
        .with_proof("https://example.com/id")
        .with_origin_message("msg-42");
    store.add(&appeal).await?;

    let found = store
        .get(&appeal.id)
        .await?
        .expect("added appeal should be retrievable");
    assert_eq!(found.id, appeal.id);
    assert_eq!(found.user, appeal.user);
    assert_eq!(found.reason, appeal.reason);
    assert_eq!(found.claimed_age, appeal.claimed_age);
    assert_eq!(found.proof, appeal.proof);
    assert_eq!(found.reconsideration, appeal.reconsideration);
    assert_eq!(found.origin_message_id, appeal.origin_message_id);
    assert_eq!(found.status, AppealStatus::Pending);
    Ok(())
}

async fn test_add_preserves_denied_status(store: &dyn AppealStore) -> Result<(), RecordError> {
    // Keyword auto-denials are persisted already decided.
    let mut appeal = sample_appeal("conf-appeal-autodenied");
    appeal.status = AppealStatus::Denied;
    appeal.decided_at = Some(Utc::now());
    appeal.decision_notes = Some("automatic denial: matched keyword \"troll\"".to_string());
    store.add(&appeal).await?;

    let found = store
        .get(&appeal.id)
        .await?
        .expect("auto-denied appeal should be retrievable");
    assert_eq!(found.status, AppealStatus::Denied);
    assert!(found.decided_at.is_some());
    assert_eq!(found.decision_notes, appeal.decision_notes);

    let pending = store.pending().await?;
    assert!(
        !pending.iter().any(|a| a.id == appeal.id),
        "an appeal stored as denied should never appear pending"
    );
    Ok(())
}

async fn test_pending_appeals_oldest_first(store: &dyn AppealStore) -> Result<(), RecordError> {
    let now = Utc::now();
    let mut older = sample_appeal("conf-appeal-order-a");
    older.submitted_at = now - Duration::hours(2);
    let mut newer = sample_appeal("conf-appeal-order-b");
    newer.submitted_at = now - Duration::hours(1);
    store.add(&newer).await?;
    store.add(&older).await?;

    let pending = store.pending().await?;
    let older_pos = pending
        .iter()
        .position(|a| a.id == older.id)
        .expect("older appeal should be pending");
    let newer_pos = pending
        .iter()
        .position(|a| a.id == newer.id)
        .expect("newer appeal should be pending");
    assert!(
        older_pos < newer_pos,
        "pending should list oldest appeals first"
    );
    Ok(())
}

async fn test_decide_appeal_once(store: &dyn AppealStore) -> Result<(), RecordError> {
    let appeal = sample_appeal("conf-appeal-decide");
    store.add(&appeal).await?;

    let staff = UserId::new("conf-staff-1");
    let when = millis_precision(Utc::now());
    let decided = store
        .decide(&appeal.id, &staff, true, Some("ID checks out"), when)
        .await?
        .expect("first decision should apply");
    assert_eq!(decided.status, AppealStatus::Accepted);
    assert_eq!(decided.decided_by.as_ref(), Some(&staff));
    assert_eq!(decided.decided_at, Some(when));
    assert_eq!(decided.decision_notes.as_deref(), Some("ID checks out"));

    let other_staff = UserId::new("conf-staff-2");
    let second = store
        .decide(&appeal.id, &other_staff, false, None, Utc::now())
        .await?;
    assert!(second.is_none(), "second decision should be rejected");

    let found = store
        .get(&appeal.id)
        .await?
        .expect("decided appeal still exists");
    assert_eq!(found.status, AppealStatus::Accepted, "first decision stands");
    assert_eq!(found.decided_by.as_ref(), Some(&staff));

    // Denial path on a fresh appeal.
    let appeal = sample_appeal("conf-appeal-deny");
    store.add(&appeal).await?;
    let decided = store
        .decide(&appeal.id, &staff, false, None, Utc::now())
        .await?
        .expect("denial should apply");
    assert_eq!(decided.status, AppealStatus::Denied);
    Ok(())
}

async fn test_decide_missing_appeal(store: &dyn AppealStore) -> Result<(), RecordError> {
    let id = agegate_core::AppealId::new("no-such-decision-target");
    let staff = UserId::new("conf-staff-3");
    let result = store.decide(&id, &staff, true, None, Utc::now()).await;
    assert!(
        matches!(result, Err(RecordError::NotFound(_))),
        "deciding a missing appeal should fail with NotFound"
    );
    Ok(())
}

async fn test_stats_deltas(store: &dyn AppealStore) -> Result<(), RecordError> {
    let before = store.stats().await?;

    let staff = UserId::new("conf-staff-4");
    let accepted = sample_appeal("conf-stats-accepted");
    store.add(&accepted).await?;
    store
        .decide(&accepted.id, &staff, true, None, Utc::now())
        .await?;

    let denied = sample_appeal("conf-stats-denied");
    store.add(&denied).await?;
    store
        .decide(&denied.id, &staff, false, None, Utc::now())
        .await?;

    let pending = sample_appeal("conf-stats-pending");
    store.add(&pending).await?;

    let after = store.stats().await?;
    assert_eq!(after.total - before.total, 3);
    assert_eq!(after.accepted - before.accepted, 1);
    assert_eq!(after.denied - before.denied, 1);
    assert_eq!(after.pending - before.pending, 1);
    Ok(())
}
