use std::time::Duration;

use thiserror::Error;

use agegate_core::UserId;

/// Errors that can occur during verification pipeline operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// An error occurred in the session-state store.
    #[error("state error: {0}")]
    State(#[from] agegate_state::StateError),

    /// An error occurred in a record store.
    #[error("record error: {0}")]
    Record(#[from] agegate_records::RecordError),

    /// A guild action was rejected by the platform.
    #[error("guild error: {0}")]
    Guild(#[from] agegate_guild::GuildError),

    /// The pipeline was misconfigured (e.g. missing required components).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The record has already been reviewed; review is a one-time transition.
    #[error("record already reviewed")]
    AlreadyReviewed,

    /// The user has no submission awaiting review.
    #[error("no submission awaiting review")]
    NothingPending,

    /// Another reviewer currently holds the claim on this subject.
    #[error("review already claimed by {reviewer}")]
    ReviewClaimed {
        /// The staff member holding the claim.
        reviewer: UserId,
    },

    /// The appeal has already been decided; decisions are one-way.
    #[error("appeal already decided")]
    AlreadyDecided,

    /// The user must wait before submitting another appeal.
    #[error("appeal cooldown active, retry after {retry_after:?}")]
    AppealCooldown {
        /// Time left until a new appeal is accepted.
        retry_after: Duration,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = PipelineError::ReviewClaimed {
            reviewer: UserId::new("mod-1"),
        };
        assert_eq!(err.to_string(), "review already claimed by mod-1");
    }

    #[test]
    fn state_errors_convert() {
        let state = agegate_state::StateError::Backend("down".into());
        let err = PipelineError::from(state);
        assert!(err.to_string().starts_with("state error:"));
    }
}
