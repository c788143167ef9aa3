use std::time::Duration;

use async_trait::async_trait;

use crate::error::StateError;
use crate::key::SessionKey;

/// Trait for persisting short-lived session state: cooldowns, review claims,
/// and join counters.
///
/// Implementations must be `Send + Sync` and safe for concurrent access.
/// Expired entries must behave exactly like missing ones.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Check if a key exists; if not, set it atomically with an optional TTL.
    /// Returns `true` if the key was newly set, `false` if it already existed.
    ///
    /// This is the primitive claim operation: concurrent callers racing on
    /// the same key must observe exactly one `true`.
    async fn check_and_set(
        &self,
        key: &SessionKey,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<bool, StateError>;

    /// Get the value for a key. Returns `None` if not found or expired.
    async fn get(&self, key: &SessionKey) -> Result<Option<String>, StateError>;

    /// Set a value with an optional TTL, overwriting any previous value.
    async fn set(
        &self,
        key: &SessionKey,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), StateError>;

    /// Delete a key. Returns `true` if the key existed.
    async fn delete(&self, key: &SessionKey) -> Result<bool, StateError>;

    /// Atomically increment a counter by `delta`. Returns the new value.
    /// Creates the counter at 0 if it doesn't exist before incrementing.
    ///
    /// The TTL applies only when the counter is created; later increments
    /// keep the original expiry so a rolling window closes on schedule.
    async fn increment(
        &self,
        key: &SessionKey,
        delta: i64,
        ttl: Option<Duration>,
    ) -> Result<i64, StateError>;
}
