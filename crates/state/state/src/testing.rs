use std::time::Duration;

use agegate_core::GuildId;

use crate::error::StateError;
use crate::key::{KeyKind, SessionKey};
use crate::store::SessionStore;

fn test_key(kind: KeyKind, id: &str) -> SessionKey {
    SessionKey::new(GuildId::new("test-guild"), kind, id)
}

/// Run the full session store conformance test suite.
///
/// Call this from your backend's test module with a fresh store instance.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_store_conformance_tests(store: &dyn SessionStore) -> Result<(), StateError> {
    test_get_missing(store).await?;
    test_set_and_get(store).await?;
    test_check_and_set_new(store).await?;
    test_check_and_set_existing(store).await?;
    test_delete(store).await?;
    test_increment(store).await?;
    test_increment_keeps_window_ttl(store).await?;
    test_ttl_set(store).await?;
    Ok(())
}

async fn test_get_missing(store: &dyn SessionStore) -> Result<(), StateError> {
    let key = test_key(KeyKind::VerifyCooldown, "missing");
    let val = store.get(&key).await?;
    assert!(val.is_none(), "get on missing key should return None");
    Ok(())
}

async fn test_set_and_get(store: &dyn SessionStore) -> Result<(), StateError> {
    let key = test_key(KeyKind::VerifyCooldown, "set-get");
    store.set(&key, "hello", None).await?;
    let val = store.get(&key).await?;
    assert_eq!(val.as_deref(), Some("hello"));
    Ok(())
}

async fn test_check_and_set_new(store: &dyn SessionStore) -> Result<(), StateError> {
    let key = test_key(KeyKind::ReviewClaim, "cas-new");
    let created = store.check_and_set(&key, "v1", None).await?;
    assert!(created, "check_and_set on new key should return true");
    let val = store.get(&key).await?;
    assert_eq!(val.as_deref(), Some("v1"));
    Ok(())
}

async fn test_check_and_set_existing(store: &dyn SessionStore) -> Result<(), StateError> {
    let key = test_key(KeyKind::ReviewClaim, "cas-existing");
    store.set(&key, "v1", None).await?;
    let created = store.check_and_set(&key, "v2", None).await?;
    assert!(
        !created,
        "check_and_set on existing key should return false"
    );
    let val = store.get(&key).await?;
    assert_eq!(val.as_deref(), Some("v1"), "original value should remain");
    Ok(())
}

async fn test_delete(store: &dyn SessionStore) -> Result<(), StateError> {
    let key = test_key(KeyKind::AppealCooldown, "to-delete");
    store.set(&key, "bye", None).await?;
    let existed = store.delete(&key).await?;
    assert!(existed, "delete should return true for existing key");
    let val = store.get(&key).await?;
    assert!(val.is_none(), "get after delete should return None");

    let existed = store.delete(&key).await?;
    assert!(!existed, "delete on missing key should return false");
    Ok(())
}

async fn test_increment(store: &dyn SessionStore) -> Result<(), StateError> {
    let key = test_key(KeyKind::JoinWindow, "counter-1");
    let val = store.increment(&key, 1, None).await?;
    assert_eq!(val, 1, "first increment from zero should yield 1");

    let val = store.increment(&key, 5, None).await?;
    assert_eq!(val, 6, "second increment should accumulate");

    let val = store.increment(&key, -2, None).await?;
    assert_eq!(val, 4, "negative delta should decrement");
    Ok(())
}

async fn test_increment_keeps_window_ttl(store: &dyn SessionStore) -> Result<(), StateError> {
    let key = test_key(KeyKind::JoinWindow, "counter-window");
    store
        .increment(&key, 1, Some(Duration::from_secs(3600)))
        .await?;
    // A later increment must not push the window's expiry out.
    let val = store
        .increment(&key, 1, Some(Duration::from_secs(3600)))
        .await?;
    assert_eq!(val, 2, "increments inside the window should accumulate");
    Ok(())
}

async fn test_ttl_set(store: &dyn SessionStore) -> Result<(), StateError> {
    let key = test_key(KeyKind::VerifyCooldown, "ttl-test");
    store
        .set(&key, "ephemeral", Some(Duration::from_secs(3600)))
        .await?;
    let val = store.get(&key).await?;
    assert_eq!(val.as_deref(), Some("ephemeral"));
    Ok(())
}
