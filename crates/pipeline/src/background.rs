//! Scheduled maintenance around the pipeline: retention, reminders,
//! auto-kicks and the raid watchdog.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{error, info};

use crate::pipeline::VerificationPipeline;

/// Scheduling configuration for [`BackgroundProcessor`].
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct BackgroundConfig {
    /// How often reviewed records are checked against the retention window.
    pub retention_interval: Duration,
    /// How often unverified members get their scheduled reminder DMs.
    pub reminder_interval: Duration,
    /// How often members past the verification grace period are kicked.
    pub kick_interval: Duration,
    /// How often the join window is re-checked for a raid in progress.
    pub raid_check_interval: Duration,
    /// Whether to purge reviewed records past retention.
    pub enable_retention: bool,
    /// Whether to send verification reminders.
    pub enable_reminders: bool,
    /// Whether to kick members past the grace period.
    pub enable_auto_kick: bool,
    /// Whether to run the periodic raid check.
    pub enable_raid_watch: bool,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            retention_interval: Duration::from_secs(24 * 60 * 60),
            reminder_interval: Duration::from_secs(24 * 60 * 60),
            kick_interval: Duration::from_secs(12 * 60 * 60),
            raid_check_interval: Duration::from_secs(5 * 60),
            enable_retention: true,
            enable_reminders: true,
            enable_auto_kick: true,
            enable_raid_watch: true,
        }
    }
}

/// Drives the pipeline's periodic sweeps until told to shut down.
///
/// Each sweep failure is logged and the schedule keeps running; one bad
/// tick must not stall the others.
#[derive(Debug)]
pub struct BackgroundProcessor {
    config: BackgroundConfig,
    pipeline: Arc<VerificationPipeline>,
    shutdown_rx: mpsc::Receiver<()>,
}

impl BackgroundProcessor {
    /// Run the processing loop until a shutdown signal arrives.
    pub async fn run(&mut self) {
        info!("background processor starting");

        let mut retention = tokio::time::interval(self.config.retention_interval);
        let mut reminders = tokio::time::interval(self.config.reminder_interval);
        let mut kicks = tokio::time::interval(self.config.kick_interval);
        let mut raid = tokio::time::interval(self.config.raid_check_interval);

        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    info!("background processor shutting down");
                    break;
                }
                _ = retention.tick(), if self.config.enable_retention => {
                    if let Err(e) = self.pipeline.sweep_retention().await {
                        error!(error = %e, "retention sweep failed");
                    }
                }
                _ = reminders.tick(), if self.config.enable_reminders => {
                    if let Err(e) = self.pipeline.sweep_reminders().await {
                        error!(error = %e, "reminder sweep failed");
                    }
                }
                _ = kicks.tick(), if self.config.enable_auto_kick => {
                    if let Err(e) = self.pipeline.sweep_unverified_kicks().await {
                        error!(error = %e, "unverified kick sweep failed");
                    }
                }
                _ = raid.tick(), if self.config.enable_raid_watch => {
                    if let Err(e) = self.pipeline.check_raid().await {
                        error!(error = %e, "raid check failed");
                    }
                }
            }
        }
    }
}

/// Builder for [`BackgroundProcessor`].
#[derive(Debug, Default)]
pub struct BackgroundProcessorBuilder {
    config: BackgroundConfig,
    pipeline: Option<Arc<VerificationPipeline>>,
}

impl BackgroundProcessorBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn config(mut self, config: BackgroundConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn pipeline(mut self, pipeline: Arc<VerificationPipeline>) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Build the processor and the sender used to stop it.
    ///
    /// # Errors
    ///
    /// Returns an error if the pipeline is missing.
    pub fn build(self) -> Result<(BackgroundProcessor, mpsc::Sender<()>), &'static str> {
        let pipeline = self.pipeline.ok_or("pipeline is required")?;
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        Ok((
            BackgroundProcessor {
                config: self.config,
                pipeline,
                shutdown_rx,
            },
            shutdown_tx,
        ))
    }
}
