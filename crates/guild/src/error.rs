use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during guild operations.
#[derive(Debug, Error)]
pub enum GuildError {
    /// The platform reported that the bot lacks a required permission.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The platform asked us to slow down.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// How long the platform asked us to wait.
        retry_after: Duration,
    },

    /// A network or transport-level error occurred.
    #[error("http error: {0}")]
    Http(String),

    /// The platform API returned an error response.
    #[error("api error ({status}): {message}")]
    Api {
        /// HTTP status code of the response.
        status: u16,
        /// Error message extracted from the response body.
        message: String,
    },

    /// The addressed member, role or channel does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

impl GuildError {
    /// Returns `true` if the error is transient and the operation may succeed
    /// on retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http(_) | Self::RateLimited { .. })
    }
}
