use std::sync::Arc;

use tokio_util::task::TaskTracker;

use agegate_audit::AuditSink;
use agegate_core::GateConfig;
use agegate_estimator::{Estimator, EstimatorSettings, NullVideoDecoder, RegionDetector};
use agegate_guild::GuildActions;
use agegate_records::{AppealStore, VerificationStore};
use agegate_state::SessionStore;

use crate::error::PipelineError;
use crate::pipeline::VerificationPipeline;

/// Fluent builder for constructing a [`VerificationPipeline`].
///
/// The configuration, session store, both record stores, guild actions and
/// an audit sink must be supplied. The estimator is optional: when omitted,
/// one is built from the configured band table and blur threshold with the
/// bundled region detector and no video codec.
pub struct PipelineBuilder {
    config: Option<GateConfig>,
    sessions: Option<Arc<dyn SessionStore>>,
    verifications: Option<Arc<dyn VerificationStore>>,
    appeals: Option<Arc<dyn AppealStore>>,
    guild: Option<Arc<dyn GuildActions>>,
    audit: Option<Arc<dyn AuditSink>>,
    estimator: Option<Arc<Estimator>>,
}

impl PipelineBuilder {
    /// Create a new builder with no components set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: None,
            sessions: None,
            verifications: None,
            appeals: None,
            guild: None,
            audit: None,
            estimator: None,
        }
    }

    /// Set the gate configuration.
    #[must_use]
    pub fn config(mut self, config: GateConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the session-state store for cooldowns, claims and counters.
    #[must_use]
    pub fn sessions(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.sessions = Some(store);
        self
    }

    /// Set the verification record store.
    #[must_use]
    pub fn verifications(mut self, store: Arc<dyn VerificationStore>) -> Self {
        self.verifications = Some(store);
        self
    }

    /// Set the appeal store.
    #[must_use]
    pub fn appeals(mut self, store: Arc<dyn AppealStore>) -> Self {
        self.appeals = Some(store);
        self
    }

    /// Set the guild-actions collaborator.
    #[must_use]
    pub fn guild(mut self, guild: Arc<dyn GuildActions>) -> Self {
        self.guild = Some(guild);
        self
    }

    /// Set the audit sink receiving every pipeline transition.
    #[must_use]
    pub fn audit(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    /// Override the media estimator.
    ///
    /// Use this to plug a real face-landmark detector or a video codec
    /// behind the estimator traits.
    #[must_use]
    pub fn estimator(mut self, estimator: Arc<Estimator>) -> Self {
        self.estimator = Some(estimator);
        self
    }

    /// Consume the builder and produce a configured [`VerificationPipeline`].
    ///
    /// Returns a [`PipelineError::Configuration`] if a required component is
    /// missing or the configuration fails validation.
    pub fn build(self) -> Result<VerificationPipeline, PipelineError> {
        let config = self
            .config
            .ok_or_else(|| PipelineError::Configuration("configuration is required".into()))?;
        config
            .validate()
            .map_err(|e| PipelineError::Configuration(e.to_string()))?;

        let sessions = self
            .sessions
            .ok_or_else(|| PipelineError::Configuration("session store is required".into()))?;
        let verifications = self.verifications.ok_or_else(|| {
            PipelineError::Configuration("verification store is required".into())
        })?;
        let appeals = self
            .appeals
            .ok_or_else(|| PipelineError::Configuration("appeal store is required".into()))?;
        let guild = self
            .guild
            .ok_or_else(|| PipelineError::Configuration("guild actions are required".into()))?;
        let audit = self
            .audit
            .ok_or_else(|| PipelineError::Configuration("audit sink is required".into()))?;

        let estimator = self.estimator.unwrap_or_else(|| {
            Arc::new(Estimator::new(
                Arc::new(RegionDetector::new()),
                Arc::new(NullVideoDecoder::new()),
                EstimatorSettings {
                    bands: config.verification.bands.clone(),
                    blur_threshold: config.verification.blur_threshold,
                },
            ))
        });

        Ok(VerificationPipeline {
            config,
            sessions,
            verifications,
            appeals,
            estimator,
            guild,
            audit,
            audit_tracker: TaskTracker::new(),
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
