use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::task::TaskTracker;
use tracing::{debug, info, instrument, warn};

use agegate_audit::{AuditActor, AuditEvent, AuditKind, AuditSink};
use agegate_core::media::{self, Attachment};
use agegate_core::template;
use agegate_core::{
    AppealId, AppealRecord, AppealStats, AppealStatus, GateConfig, UserId, VerificationRecord,
};
use agegate_estimator::Estimator;
use agegate_guild::{ChannelMessage, GuildActions};
use agegate_records::{AppealStore, VerificationStore};
use agegate_state::{SessionKey, SessionStore};

use crate::alerts;
use crate::error::PipelineError;
use crate::outcome::{AppealOutcome, PendingReview, ReviewOutcome, SubmissionOutcome};

/// How long a review claim is held before lapsing on its own.
const REVIEW_CLAIM_TTL: Duration = Duration::from_secs(300);

/// The verification pipeline: intake, staff review, appeals and the
/// periodic sweeps.
///
/// Every entry point is safe for concurrent callers. Shared collaborators
/// sit behind `Arc<dyn …>` seams; per-user races are settled through the
/// session store's atomic claims rather than in-process locks. Audit events
/// are emitted fire-and-forget on tracked tasks; [`shutdown`] drains them.
///
/// [`shutdown`]: VerificationPipeline::shutdown
pub struct VerificationPipeline {
    // Note: manual `Debug` impl below because trait objects lack `Debug`.
    pub(crate) config: GateConfig,
    pub(crate) sessions: Arc<dyn SessionStore>,
    pub(crate) verifications: Arc<dyn VerificationStore>,
    pub(crate) appeals: Arc<dyn AppealStore>,
    pub(crate) estimator: Arc<Estimator>,
    pub(crate) guild: Arc<dyn GuildActions>,
    pub(crate) audit: Arc<dyn AuditSink>,
    pub(crate) audit_tracker: TaskTracker,
}

impl fmt::Debug for VerificationPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationPipeline")
            .field("guild", &self.config.guild)
            .field("estimator", &self.estimator)
            .finish_non_exhaustive()
    }
}

impl VerificationPipeline {
    /// The configuration this pipeline was built with.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Handle one verification submission from intake to the review queue.
    ///
    /// The cooldown is claimed atomically before any media processing, so
    /// two racing submissions from the same user settle on exactly one
    /// acceptance; a rejected submission releases the claim so failed
    /// attempts do not consume the window.
    #[instrument(skip(self, attachments), fields(user = %user, attachments = attachments.len()))]
    pub async fn submit(
        &self,
        user: &UserId,
        display_name: &str,
        attachments: &[Attachment],
    ) -> Result<SubmissionOutcome, PipelineError> {
        let Some((attachment, kind)) = media::select_attachment(attachments) else {
            debug!("no allow-listed attachment in submission");
            return Ok(SubmissionOutcome::Rejected {
                reason: format!(
                    "That file type is not supported. Accepted types: {}.",
                    media::allowed_extensions_label()
                ),
            });
        };

        let cooldown = Duration::from_secs(
            self.config.verification.cooldown_minutes.saturating_mul(60),
        );
        let key = SessionKey::verify_cooldown(&self.config.guild, user);
        let expiry = cooldown_expiry(cooldown);
        let claimed = self
            .sessions
            .check_and_set(&key, &expiry.to_rfc3339(), Some(cooldown))
            .await?;
        if !claimed {
            let retry_after = match self.sessions.get(&key).await? {
                Some(stored) => remaining_cooldown(&stored),
                // The entry lapsed between the claim attempt and the read.
                None => Duration::ZERO,
            };
            debug!(?retry_after, "submission rejected by cooldown");
            return Ok(SubmissionOutcome::OnCooldown { retry_after });
        }

        let estimate = match self.estimator.estimate(kind, &attachment.data) {
            Ok(estimate) => estimate,
            Err(err) => {
                self.release(&key).await;
                if !err.is_media_rejection() {
                    warn!(error = %err, "estimator failure surfaced as rejection");
                }
                return Ok(SubmissionOutcome::Rejected {
                    reason: err.user_reason(),
                });
            }
        };

        let high_priority = estimate.age < self.config.verification.min_age;
        let potential_adult = estimate.age >= self.config.verification.adult_age;
        let record = VerificationRecord::new(
            user.clone(),
            display_name,
            attachment.data.clone(),
            kind,
            estimate.age,
        );
        if let Err(err) = self.verifications.add(&record).await {
            self.release(&key).await;
            return Err(err.into());
        }

        let awaiting = &self.config.roles.awaiting_review.id;
        if let Err(err) = self
            .guild
            .add_role(&self.config.guild, user, awaiting, "verification submitted")
            .await
        {
            warn!(error = %err, "failed to grant awaiting-review role");
        }

        let alert = alerts::review_alert(&self.config, &record, high_priority, potential_adult);
        if let Err(err) = self
            .guild
            .send_channel_message(&self.config.channels.mod_log.id, &alert)
            .await
        {
            warn!(error = %err, "failed to post review alert");
        }

        let template = if high_priority {
            &self.config.messages.submission_flagged
        } else {
            &self.config.messages.submission_received
        };
        self.dm(user, template::render(template, &[])).await;

        let mut event = AuditEvent::new(
            self.config.guild.clone(),
            AuditKind::Submission,
            AuditActor::System,
            format!("submission from {} estimated at {:.1}", user, estimate.age),
        )
        .with_subject(user.clone())
        .with_detail(serde_json::json!({
            "record_id": record.id.as_str(),
            "media_kind": record.media_kind.as_str(),
            "estimated_age": record.estimated_age,
            "high_priority": high_priority,
        }));
        if high_priority {
            event = event.urgent();
        }
        self.emit_audit(event);

        info!(
            record = %record.id,
            age = estimate.age,
            high_priority,
            "submission accepted"
        );
        Ok(SubmissionOutcome::Accepted {
            record_id: record.id,
            estimated_age: estimate.age,
            high_priority,
        })
    }

    /// Apply a staff decision to the subject's latest unreviewed record.
    ///
    /// The per-subject review claim is taken first so two moderators cannot
    /// race one subject; the claim is released on every exit path. Underage
    /// decisions ban and never grant a role; the ban notice is sent before
    /// the ban while the DM can still be delivered.
    #[instrument(skip(self, notes), fields(reviewer = %reviewer, subject = %subject, underage))]
    pub async fn review(
        &self,
        reviewer: &UserId,
        subject: &UserId,
        underage: bool,
        notes: Option<&str>,
    ) -> Result<ReviewOutcome, PipelineError> {
        let claim = SessionKey::review_claim(&self.config.guild, subject);
        self.claim_review(&claim, reviewer).await?;
        let result = self.review_locked(reviewer, subject, underage, notes).await;
        self.release(&claim).await;
        result
    }

    async fn review_locked(
        &self,
        reviewer: &UserId,
        subject: &UserId,
        underage: bool,
        notes: Option<&str>,
    ) -> Result<ReviewOutcome, PipelineError> {
        let Some(record) = self.verifications.latest_unreviewed_for_user(subject).await? else {
            return Err(PipelineError::NothingPending);
        };
        let verified = !underage;
        let performed = self
            .verifications
            .update_review(&record.id, reviewer, verified, notes, Utc::now())
            .await?;
        if !performed {
            return Err(PipelineError::AlreadyReviewed);
        }

        if underage {
            // Notify before banning; the DM cannot be delivered afterwards.
            self.dm(
                subject,
                template::render(&self.config.messages.ban_notice, &[]),
            )
            .await;
            self.guild
                .ban(
                    &self.config.guild,
                    subject,
                    "User does not meet minimum age requirement (13+)",
                )
                .await?;
        } else {
            let roles = &self.config.roles;
            if let Err(err) = self
                .guild
                .remove_role(
                    &self.config.guild,
                    subject,
                    &roles.awaiting_review.id,
                    "verification approved",
                )
                .await
            {
                warn!(error = %err, "failed to remove awaiting-review role");
            }
            self.guild
                .add_role(
                    &self.config.guild,
                    subject,
                    &roles.verified_13plus.id,
                    "verification approved",
                )
                .await?;
            self.dm(
                subject,
                template::render(&self.config.messages.approval_notice, &[]),
            )
            .await;
        }

        let summary = if verified {
            format!("approved {subject} as 13+")
        } else {
            format!("banned {subject} as underage")
        };
        let event = AuditEvent::new(
            self.config.guild.clone(),
            AuditKind::Review,
            AuditActor::Staff(reviewer.clone()),
            summary,
        )
        .with_subject(subject.clone())
        .with_detail(serde_json::json!({
            "record_id": record.id.as_str(),
            "verified": verified,
            "notes": notes,
        }));
        self.emit_audit(event);

        info!(record = %record.id, verified, "review recorded");
        Ok(ReviewOutcome {
            record_id: record.id,
            verified,
        })
    }

    /// Apply a staff decision on 18+ access for an already-verified member.
    ///
    /// Approval swaps the 13+ role for 18+; the member never holds both.
    /// Denial changes no roles and only informs the member.
    #[instrument(skip(self), fields(reviewer = %reviewer, subject = %subject, approved))]
    pub async fn approve_adult(
        &self,
        reviewer: &UserId,
        subject: &UserId,
        approved: bool,
    ) -> Result<(), PipelineError> {
        if approved {
            let roles = &self.config.roles;
            self.guild
                .remove_role(
                    &self.config.guild,
                    subject,
                    &roles.verified_13plus.id,
                    "adult access approved",
                )
                .await?;
            self.guild
                .add_role(
                    &self.config.guild,
                    subject,
                    &roles.verified_18plus.id,
                    "adult access approved",
                )
                .await?;
            let text = template::render(
                &self.config.messages.adult_approved,
                &[("policy", self.config.messages.adult_content_policy.as_str())],
            );
            self.dm(subject, text).await;
        } else {
            self.dm(
                subject,
                template::render(&self.config.messages.adult_denied, &[]),
            )
            .await;
        }

        let summary = if approved {
            format!("granted 18+ access to {subject}")
        } else {
            format!("declined 18+ access for {subject}")
        };
        let event = AuditEvent::new(
            self.config.guild.clone(),
            AuditKind::AdultReview,
            AuditActor::Staff(reviewer.clone()),
            summary,
        )
        .with_subject(subject.clone())
        .with_detail(serde_json::json!({ "approved": approved }));
        self.emit_audit(event);

        info!(approved, "adult review recorded");
        Ok(())
    }

    /// Accept a ban appeal into the staff queue, or deny it on sight.
    ///
    /// Appeals whose reason contains a configured keyword are stored
    /// directly in the denied state; keyword denials do not start the
    /// appeal cooldown, only staff denials do.
    #[instrument(skip(self, appeal), fields(user = %appeal.user, appeal_id = %appeal.id))]
    pub async fn submit_appeal(
        &self,
        mut appeal: AppealRecord,
    ) -> Result<AppealOutcome, PipelineError> {
        let key = SessionKey::appeal_cooldown(&self.config.guild, &appeal.user);
        if let Some(stored) = self.sessions.get(&key).await? {
            return Err(PipelineError::AppealCooldown {
                retry_after: remaining_cooldown(&stored),
            });
        }

        if let Some(keyword) = self.matched_deny_keyword(&appeal.reason) {
            appeal.status = AppealStatus::Denied;
            appeal.decided_at = Some(Utc::now());
            appeal.decision_notes = Some(format!("auto-denied: matched keyword '{keyword}'"));
            self.appeals.add(&appeal).await?;

            self.dm(
                &appeal.user,
                template::render(&self.config.messages.appeal_auto_denied, &[]),
            )
            .await;
            let event = AuditEvent::new(
                self.config.guild.clone(),
                AuditKind::Appeal,
                AuditActor::System,
                format!("auto-denied appeal from {}", appeal.user),
            )
            .with_subject(appeal.user.clone())
            .with_detail(serde_json::json!({
                "appeal_id": appeal.id.as_str(),
                "keyword": keyword,
            }));
            self.emit_audit(event);

            info!(appeal = %appeal.id, keyword, "appeal auto-denied");
            return Ok(AppealOutcome::AutoDenied {
                appeal_id: appeal.id,
            });
        }

        self.appeals.add(&appeal).await?;

        let alert = alerts::appeal_alert(&self.config, &appeal);
        if let Err(err) = self
            .guild
            .send_channel_message(&self.config.channels.appeals.id, &alert)
            .await
        {
            warn!(error = %err, "failed to post appeal alert");
        }
        self.dm(
            &appeal.user,
            template::render(&self.config.messages.appeal_received, &[]),
        )
        .await;

        let event = AuditEvent::new(
            self.config.guild.clone(),
            AuditKind::Appeal,
            AuditActor::System,
            format!("appeal submitted by {}", appeal.user),
        )
        .with_subject(appeal.user.clone())
        .with_detail(serde_json::json!({ "appeal_id": appeal.id.as_str() }));
        self.emit_audit(event);

        info!(appeal = %appeal.id, "appeal queued for staff");
        Ok(AppealOutcome::Submitted {
            appeal_id: appeal.id,
        })
    }

    /// Record a staff decision on a pending appeal.
    ///
    /// Acceptance lifts the ban; denial starts the appeal cooldown. The
    /// first decision wins and later attempts fail with `AlreadyDecided`.
    #[instrument(skip(self, notes), fields(staff = %staff, appeal_id = %id, accept))]
    pub async fn decide_appeal(
        &self,
        staff: &UserId,
        id: &AppealId,
        accept: bool,
        notes: Option<&str>,
    ) -> Result<AppealRecord, PipelineError> {
        let Some(appeal) = self
            .appeals
            .decide(id, staff, accept, notes, Utc::now())
            .await?
        else {
            return Err(PipelineError::AlreadyDecided);
        };

        if accept {
            self.guild
                .unban(&self.config.guild, &appeal.user, "ban appeal accepted")
                .await?;
            self.dm(
                &appeal.user,
                template::render(&self.config.messages.appeal_accepted, &[]),
            )
            .await;
        } else {
            let days = self.config.appeals.cooldown_days;
            let ttl = Duration::from_secs(u64::from(days).saturating_mul(86_400));
            let key = SessionKey::appeal_cooldown(&self.config.guild, &appeal.user);
            let expiry = cooldown_expiry(ttl);
            if let Err(err) = self
                .sessions
                .set(&key, &expiry.to_rfc3339(), Some(ttl))
                .await
            {
                warn!(error = %err, "failed to start appeal cooldown");
            }
            let days_text = days.to_string();
            self.dm(
                &appeal.user,
                template::render(
                    &self.config.messages.appeal_denied,
                    &[("days", days_text.as_str())],
                ),
            )
            .await;
        }

        let summary = if accept {
            format!("accepted appeal from {}", appeal.user)
        } else {
            format!("denied appeal from {}", appeal.user)
        };
        let event = AuditEvent::new(
            self.config.guild.clone(),
            AuditKind::Appeal,
            AuditActor::Staff(staff.clone()),
            summary,
        )
        .with_subject(appeal.user.clone())
        .with_detail(serde_json::json!({
            "appeal_id": id.as_str(),
            "accepted": accept,
        }));
        self.emit_audit(event);

        info!(appeal = %id, accept, "appeal decided");
        Ok(appeal)
    }

    /// Aggregate appeal counts for reporting.
    pub async fn appeal_stats(&self) -> Result<AppealStats, PipelineError> {
        Ok(self.appeals.stats().await?)
    }

    /// The review queue, oldest first, without media payloads.
    pub async fn pending_reviews(&self) -> Result<Vec<PendingReview>, PipelineError> {
        let records = self.verifications.pending().await?;
        let min_age = self.config.verification.min_age;
        Ok(records
            .iter()
            .map(|record| PendingReview::from_record(record, min_age))
            .collect())
    }

    /// Remaining submission-cooldown wait for a user, when one is active.
    pub async fn cooldown_remaining(
        &self,
        user: &UserId,
    ) -> Result<Option<Duration>, PipelineError> {
        let key = SessionKey::verify_cooldown(&self.config.guild, user);
        Ok(self
            .sessions
            .get(&key)
            .await?
            .map(|stored| remaining_cooldown(&stored)))
    }

    /// Count a member join against the rolling raid window.
    ///
    /// Returns the window count after this join, or 0 when the raid watch
    /// is disabled. Crossing the threshold fires the alert inline so a
    /// burst is caught as it happens, not on the next periodic check.
    #[instrument(skip(self), fields(user = %user))]
    pub async fn record_join(&self, user: &UserId) -> Result<u64, PipelineError> {
        if !self.config.raid.enabled {
            return Ok(0);
        }
        let key = SessionKey::join_window(&self.config.guild);
        let window = Duration::from_secs(self.config.raid.window_seconds);
        let count = self.sessions.increment(&key, 1, Some(window)).await?;
        let count = u64::try_from(count).unwrap_or(0);
        debug!(count, "join counted");
        if count >= self.config.raid.join_threshold {
            self.fire_raid_alert(count).await?;
        }
        Ok(count)
    }

    /// Check the rolling join counter and alert when the threshold is
    /// crossed.
    ///
    /// Returns the count that triggered an alert, or `None` when the
    /// window is below threshold or the watch is disabled.
    pub async fn check_raid(&self) -> Result<Option<u64>, PipelineError> {
        if !self.config.raid.enabled {
            return Ok(None);
        }
        let key = SessionKey::join_window(&self.config.guild);
        let Some(stored) = self.sessions.get(&key).await? else {
            return Ok(None);
        };
        let count: u64 = stored.parse().unwrap_or(0);
        if count < self.config.raid.join_threshold {
            return Ok(None);
        }
        self.fire_raid_alert(count).await?;
        Ok(Some(count))
    }

    /// Post the raid alert and reset the window so one burst alerts once.
    async fn fire_raid_alert(&self, joins: u64) -> Result<(), PipelineError> {
        let window_seconds = self.config.raid.window_seconds;
        warn!(joins, window_seconds, "possible raid detected");

        let alert = alerts::raid_alert(&self.config, joins, window_seconds);
        if let Err(err) = self
            .guild
            .send_channel_message(&self.config.channels.mod_log.id, &alert)
            .await
        {
            warn!(error = %err, "failed to post raid alert");
        }

        let event = AuditEvent::new(
            self.config.guild.clone(),
            AuditKind::RaidAlert,
            AuditActor::System,
            format!("{joins} joins inside {window_seconds}s window"),
        )
        .with_detail(serde_json::json!({
            "joins": joins,
            "window_seconds": window_seconds,
        }))
        .urgent();
        self.emit_audit(event);

        self.sessions
            .delete(&SessionKey::join_window(&self.config.guild))
            .await?;
        Ok(())
    }

    /// Purge reviewed records older than the retention window.
    ///
    /// Returns the number of records deleted. Unreviewed records are never
    /// purged.
    #[instrument(skip(self))]
    pub async fn sweep_retention(&self) -> Result<u64, PipelineError> {
        let days = i64::from(self.config.verification.retention_days);
        let cutoff = Utc::now()
            .checked_sub_signed(chrono::Duration::days(days))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let purged = self.verifications.purge_reviewed_before(cutoff).await?;
        if purged > 0 {
            info!(purged, "retention sweep purged reviewed records");
            let event = AuditEvent::new(
                self.config.guild.clone(),
                AuditKind::Retention,
                AuditActor::System,
                format!("purged {purged} reviewed records"),
            )
            .with_detail(serde_json::json!({ "purged": purged }));
            self.emit_audit(event);
        }
        Ok(purged)
    }

    /// DM verification reminders to unverified members on their scheduled
    /// nudge days.
    ///
    /// Returns the number of members reminded.
    #[instrument(skip(self))]
    pub async fn sweep_reminders(&self) -> Result<u64, PipelineError> {
        let members = self
            .guild
            .members_with_role(&self.config.guild, &self.config.roles.unverified.id)
            .await?;
        let now = Utc::now();
        let auto_kick_days = i64::from(self.config.sweeps.auto_kick_days);
        let mut reminded = 0u64;
        for member in members {
            let elapsed_days = (now - member.joined_at).num_days();
            let due = self
                .config
                .sweeps
                .reminder_days
                .iter()
                .any(|day| i64::from(*day) == elapsed_days);
            if !due {
                continue;
            }
            let remaining = (auto_kick_days - elapsed_days).max(0).to_string();
            let text = template::render(
                &self.config.messages.reminder,
                &[("days", remaining.as_str())],
            );
            self.dm(&member.user, text).await;
            reminded += 1;
        }
        if reminded > 0 {
            info!(reminded, "verification reminders sent");
        }
        Ok(reminded)
    }

    /// Kick members who exhausted the verification grace period.
    ///
    /// Each member is DMed the templated notice before the kick. Per-member
    /// failures are logged and the sweep moves on; returns the number
    /// actually kicked.
    #[instrument(skip(self))]
    pub async fn sweep_unverified_kicks(&self) -> Result<u64, PipelineError> {
        let members = self
            .guild
            .members_with_role(&self.config.guild, &self.config.roles.unverified.id)
            .await?;
        let days = self.config.sweeps.auto_kick_days;
        let cutoff = Utc::now()
            .checked_sub_signed(chrono::Duration::days(i64::from(days)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let reason = format!("Not verified within {days} days");
        let days_text = days.to_string();
        let mut kicked = 0u64;
        for member in members {
            if member.joined_at >= cutoff {
                continue;
            }
            let notice = template::render(
                &self.config.messages.kick_notice,
                &[("days", days_text.as_str())],
            );
            self.dm(&member.user, notice).await;
            if let Err(err) = self.guild.kick(&self.config.guild, &member.user, &reason).await {
                warn!(user = %member.user, error = %err, "kick failed");
                continue;
            }
            kicked += 1;
            let event = AuditEvent::new(
                self.config.guild.clone(),
                AuditKind::Kick,
                AuditActor::System,
                format!("kicked {} after {days} unverified days", member.user),
            )
            .with_subject(member.user.clone())
            .with_detail(serde_json::json!({ "days": days }));
            self.emit_audit(event);
        }
        if kicked > 0 {
            info!(kicked, "unverified members kicked");
        }
        Ok(kicked)
    }

    /// Wait for in-flight audit recordings to drain. Call once, at the end.
    pub async fn shutdown(&self) {
        self.audit_tracker.close();
        self.audit_tracker.wait().await;
        info!("verification pipeline shutdown complete");
    }

    /// Take the per-subject review claim, or report who holds it.
    async fn claim_review(
        &self,
        key: &SessionKey,
        reviewer: &UserId,
    ) -> Result<(), PipelineError> {
        if self
            .sessions
            .check_and_set(key, reviewer.as_str(), Some(REVIEW_CLAIM_TTL))
            .await?
        {
            return Ok(());
        }
        match self.sessions.get(key).await? {
            Some(holder) if holder == reviewer.as_str() => Ok(()),
            Some(holder) => Err(PipelineError::ReviewClaimed {
                reviewer: UserId::new(holder),
            }),
            // The claim lapsed between the attempt and the read; take it.
            None => {
                self.sessions
                    .set(key, reviewer.as_str(), Some(REVIEW_CLAIM_TTL))
                    .await?;
                Ok(())
            }
        }
    }

    /// First configured deny keyword found in the text, case-insensitive.
    fn matched_deny_keyword(&self, reason: &str) -> Option<String> {
        let lowered = reason.to_lowercase();
        self.config
            .appeals
            .auto_deny_keywords
            .iter()
            .find(|keyword| !keyword.is_empty() && lowered.contains(&keyword.to_lowercase()))
            .cloned()
    }

    /// Drop a session claim so a failed attempt does not consume it.
    async fn release(&self, key: &SessionKey) {
        if let Err(err) = self.sessions.delete(key).await {
            warn!(key = %key, error = %err, "failed to release session claim");
        }
    }

    /// Best-effort DM. Closed DMs must not block any flow.
    async fn dm(&self, user: &UserId, text: String) {
        if let Err(err) = self.guild.send_dm(user, &ChannelMessage::text(text)).await {
            debug!(user = %user, error = %err, "dm not delivered");
        }
    }

    /// Record an audit event without blocking the caller.
    fn emit_audit(&self, event: AuditEvent) {
        let audit = Arc::clone(&self.audit);
        self.audit_tracker.spawn(async move {
            if let Err(e) = audit.record(event).await {
                warn!(error = %e, "audit recording failed");
            }
        });
    }
}

/// Expiry timestamp stored in a cooldown entry, as RFC 3339.
fn cooldown_expiry(ttl: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|delta| Utc::now().checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Remaining wait on a cooldown entry created by [`cooldown_expiry`].
///
/// Unparseable or elapsed entries report zero; the entry's TTL is what
/// actually enforces the window.
fn remaining_cooldown(stored: &str) -> Duration {
    let Ok(expiry) = DateTime::parse_from_rfc3339(stored) else {
        return Duration::ZERO;
    };
    (expiry.with_timezone(&Utc) - Utc::now())
        .to_std()
        .unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use agegate_audit::AuditQuery;
    use agegate_audit_memory::MemoryAuditSink;
    use agegate_core::config::{ChannelRef, RoleRef};
    use agegate_core::{ChannelId, GuildId, RecordId, RoleId};
    use agegate_estimator::testing::{
        encode_png, face_frame, geometry_with_ratio, ScriptedDecoder, ScriptedDetector,
    };
    use agegate_estimator::EstimatorSettings;
    use agegate_guild::testing::{GuildCall, RecordingGuild};
    use agegate_guild::GuildMember;
    use agegate_records_memory::{MemoryAppealStore, MemoryVerificationStore};
    use agegate_state_memory::MemorySessionStore;

    use crate::builder::PipelineBuilder;

    use super::*;

    struct Harness {
        pipeline: VerificationPipeline,
        sessions: Arc<MemorySessionStore>,
        verifications: Arc<MemoryVerificationStore>,
        appeals: Arc<MemoryAppealStore>,
        guild: Arc<RecordingGuild>,
        audit: Arc<MemoryAuditSink>,
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

    fn harness_full(detector: ScriptedDetector, config: GateConfig) -> Harness {
        let sessions = Arc::new(MemorySessionStore::new());
        let verifications = Arc::new(MemoryVerificationStore::new());
        let appeals = Arc::new(MemoryAppealStore::new());
        let guild = Arc::new(RecordingGuild::new());
        let audit = Arc::new(MemoryAuditSink::new());
        let estimator = Arc::new(Estimator::new(
            Arc::new(detector),
            Arc::new(ScriptedDecoder::empty()),
            EstimatorSettings::default(),
        ));
        let pipeline = PipelineBuilder::new()
            .config(config)
            .sessions(sessions.clone())
            .verifications(verifications.clone())
            .appeals(appeals.clone())
            .guild(guild.clone())
            .audit(audit.clone())
            .estimator(estimator)
            .build()
            .expect("harness pipeline builds");
        Harness {
            pipeline,
            sessions,
            verifications,
            appeals,
            guild,
            audit,
        }
    }

    fn harness_with(detector: ScriptedDetector) -> Harness {
        harness_full(detector, test_config())
    }

    fn harness() -> Harness {
        harness_with(ScriptedDetector::always(geometry_with_ratio(0.90)))
    }

    fn photo() -> Vec<Attachment> {
        vec![Attachment::new(
            "face.png",
            encode_png(&face_frame(128, 128, 40, 50)),
        )]
    }

    async fn accepted_submission(harness: &Harness, user: &UserId) -> RecordId {
        match harness
            .pipeline
            .submit(user, "Sam", &photo())
            .await
            .unwrap()
        {
            SubmissionOutcome::Accepted { record_id, .. } => record_id,
            other => panic!("expected acceptance, got {other:?}"),
        }
    }

    // -- Intake --------------------------------------------------------------

    #[tokio::test]
    async fn accepted_submission_enters_review_queue() {
        let harness = harness();
        let user = UserId::new("user-1");

        let outcome = harness
            .pipeline
            .submit(&user, "Sam", &photo())
            .await
            .unwrap();
        let SubmissionOutcome::Accepted {
            estimated_age,
            high_priority,
            ..
        } = outcome
        else {
            panic!("expected acceptance, got {outcome:?}");
        };
        assert!((estimated_age - 15.0).abs() < f32::EPSILON);
        assert!(!high_priority);

        let pending = harness.pipeline.pending_reviews().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].user, user);

        let calls = harness.guild.calls();
        assert!(calls.contains(&GuildCall::AddRole {
            user: user.clone(),
            role: RoleId::new("role-awaiting"),
        }));
        assert_eq!(
            harness
                .guild
                .channel_messages(&ChannelId::new("chan-modlog"))
                .len(),
            1
        );
        assert_eq!(harness.guild.dms_to(&user).len(), 1);
        assert!(harness
            .pipeline
            .cooldown_remaining(&user)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn underage_estimate_is_flagged_urgent() {
        let harness = harness_with(ScriptedDetector::always(geometry_with_ratio(0.80)));
        let user = UserId::new("user-2");

        let outcome = harness
            .pipeline
            .submit(&user, "Kim", &photo())
            .await
            .unwrap();
        let SubmissionOutcome::Accepted {
            estimated_age,
            high_priority,
            ..
        } = outcome
        else {
            panic!("expected acceptance, got {outcome:?}");
        };
        assert!((estimated_age - 10.0).abs() < f32::EPSILON);
        assert!(high_priority);

        let posts = harness
            .guild
            .channel_messages(&ChannelId::new("chan-modlog"));
        let content = posts[0].content.clone().unwrap();
        assert!(content.contains("@here"));
        assert!(content.contains("<@&role-staff>"));

        harness.pipeline.shutdown().await;
        let page = harness.audit.query(&AuditQuery {
            kind: Some(AuditKind::Submission),
            urgent_only: true,
            ..Default::default()
        });
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn adult_estimate_is_noted_in_alert() {
        let harness = harness_with(ScriptedDetector::always(geometry_with_ratio(1.0)));
        let user = UserId::new("user-3");
        accepted_submission(&harness, &user).await;

        let posts = harness
            .guild
            .channel_messages(&ChannelId::new("chan-modlog"));
        let embed = posts[0].embed.clone().unwrap();
        let status = embed.fields.iter().find(|f| f.name == "Status").unwrap();
        assert_eq!(status.value, "Potential 18+");
    }

    #[tokio::test]
    async fn rejected_media_releases_the_cooldown() {
        let harness = harness_with(ScriptedDetector::with_responses(vec![
            vec![],
            vec![geometry_with_ratio(0.90)],
        ]));
        let user = UserId::new("user-4");

        let outcome = harness
            .pipeline
            .submit(&user, "Sam", &photo())
            .await
            .unwrap();
        let SubmissionOutcome::Rejected { reason } = outcome else {
            panic!("expected rejection, got {outcome:?}");
        };
        assert!(reason.contains("No face"));
        assert!(harness
            .pipeline
            .cooldown_remaining(&user)
            .await
            .unwrap()
            .is_none());
        assert!(harness.pipeline.pending_reviews().await.unwrap().is_empty());

        // The claim was released, so the corrected retake goes through.
        accepted_submission(&harness, &user).await;
    }

    #[tokio::test]
    async fn cooldown_blocks_immediate_resubmission() {
        let harness = harness();
        let user = UserId::new("user-5");
        accepted_submission(&harness, &user).await;

        let outcome = harness
            .pipeline
            .submit(&user, "Sam", &photo())
            .await
            .unwrap();
        let SubmissionOutcome::OnCooldown { retry_after } = outcome else {
            panic!("expected cooldown, got {outcome:?}");
        };
        assert!(retry_after > Duration::ZERO);
        assert!(retry_after <= Duration::from_secs(30 * 60));
    }

    #[tokio::test]
    async fn unsupported_attachment_rejected_without_cooldown() {
        let harness = harness();
        let user = UserId::new("user-6");
        let files = vec![Attachment::new("statement.pdf", vec![1, 2, 3])];

        let outcome = harness.pipeline.submit(&user, "Sam", &files).await.unwrap();
        let SubmissionOutcome::Rejected { reason } = outcome else {
            panic!("expected rejection, got {outcome:?}");
        };
        assert!(reason.contains("not supported"));
        assert!(harness
            .pipeline
            .cooldown_remaining(&user)
            .await
            .unwrap()
            .is_none());
        assert!(harness.guild.calls().is_empty());
    }

    #[tokio::test]
    async fn notification_failures_do_not_block_acceptance() {
        let harness = harness();
        harness.guild.fail_messages(true);
        let user = UserId::new("user-7");

        accepted_submission(&harness, &user).await;
        assert_eq!(harness.pipeline.pending_reviews().await.unwrap().len(), 1);
    }

    // -- Review --------------------------------------------------------------

    #[tokio::test]
    async fn approving_review_swaps_roles_and_notifies() {
        let harness = harness();
        let user = UserId::new("user-8");
        let reviewer = UserId::new("mod-1");
        let record_id = accepted_submission(&harness, &user).await;

        let outcome = harness
            .pipeline
            .review(&reviewer, &user, false, None)
            .await
            .unwrap();
        assert_eq!(outcome.record_id, record_id);
        assert!(outcome.verified);

        let calls = harness.guild.calls();
        assert!(calls.contains(&GuildCall::RemoveRole {
            user: user.clone(),
            role: RoleId::new("role-awaiting"),
        }));
        let grants = calls
            .iter()
            .filter(|c| matches!(c, GuildCall::AddRole { role, .. } if role.as_str() == "role-13"))
            .count();
        assert_eq!(grants, 1);

        assert!(harness.pipeline.pending_reviews().await.unwrap().is_empty());
        // The claim is released once the review lands.
        let claim = SessionKey::review_claim(&harness.pipeline.config().guild, &user);
        assert!(harness.sessions.get(&claim).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn underage_review_notifies_then_bans() {
        let harness = harness_with(ScriptedDetector::always(geometry_with_ratio(0.80)));
        let user = UserId::new("user-9");
        accepted_submission(&harness, &user).await;

        let outcome = harness
            .pipeline
            .review(&UserId::new("mod-1"), &user, true, Some("clearly a child"))
            .await
            .unwrap();
        assert!(!outcome.verified);

        let calls = harness.guild.calls();
        let dm_index = calls
            .iter()
            .position(|c| {
                matches!(c, GuildCall::Dm { message, .. }
                    if message.content.as_deref().is_some_and(|t| t.contains("banned")))
            })
            .unwrap();
        let ban_index = calls
            .iter()
            .position(|c| matches!(c, GuildCall::Ban { .. }))
            .unwrap();
        assert!(dm_index < ban_index, "ban notice must precede the ban");

        match &calls[ban_index] {
            GuildCall::Ban { reason, .. } => {
                assert_eq!(reason, "User does not meet minimum age requirement (13+)");
            }
            _ => unreachable!(),
        }
        assert!(!calls
            .iter()
            .any(|c| matches!(c, GuildCall::AddRole { role, .. } if role.as_str() == "role-13")));
    }

    #[tokio::test]
    async fn review_claim_blocks_second_reviewer() {
        let harness = harness();
        let user = UserId::new("user-10");
        accepted_submission(&harness, &user).await;

        let claim = SessionKey::review_claim(&harness.pipeline.config().guild, &user);
        harness.sessions.set(&claim, "mod-1", None).await.unwrap();

        let err = harness
            .pipeline
            .review(&UserId::new("mod-2"), &user, false, None)
            .await
            .unwrap_err();
        match err {
            PipelineError::ReviewClaimed { reviewer } => assert_eq!(reviewer.as_str(), "mod-1"),
            other => panic!("expected claim conflict, got {other:?}"),
        }
        // The holder's claim is untouched.
        assert_eq!(
            harness.sessions.get(&claim).await.unwrap().as_deref(),
            Some("mod-1")
        );
    }

    #[tokio::test]
    async fn claim_holder_may_reenter_review() {
        let harness = harness();
        let user = UserId::new("user-11");
        accepted_submission(&harness, &user).await;

        let claim = SessionKey::review_claim(&harness.pipeline.config().guild, &user);
        harness.sessions.set(&claim, "mod-1", None).await.unwrap();

        let outcome = harness
            .pipeline
            .review(&UserId::new("mod-1"), &user, false, None)
            .await
            .unwrap();
        assert!(outcome.verified);
    }

    #[tokio::test]
    async fn review_without_pending_submission_fails() {
        let harness = harness();
        let user = UserId::new("user-12");
        let err = harness
            .pipeline
            .review(&UserId::new("mod-1"), &user, false, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NothingPending));

        // The transient claim is released on the error path.
        let claim = SessionKey::review_claim(&harness.pipeline.config().guild, &user);
        assert!(harness.sessions.get(&claim).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn second_review_finds_nothing_pending() {
        let harness = harness();
        let user = UserId::new("user-13");
        accepted_submission(&harness, &user).await;

        harness
            .pipeline
            .review(&UserId::new("mod-1"), &user, false, None)
            .await
            .unwrap();
        let err = harness
            .pipeline
            .review(&UserId::new("mod-2"), &user, true, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NothingPending));
    }

    #[tokio::test]
    async fn ban_failure_surfaces_after_review_is_recorded() {
        let harness = harness_with(ScriptedDetector::always(geometry_with_ratio(0.80)));
        harness.guild.fail_bans(true);
        let user = UserId::new("user-14");
        accepted_submission(&harness, &user).await;

        let err = harness
            .pipeline
            .review(&UserId::new("mod-1"), &user, true, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Guild(_)));
        // The review transition itself is terminal even though the ban failed.
        assert!(harness.pipeline.pending_reviews().await.unwrap().is_empty());
    }

    // -- Adult access --------------------------------------------------------

    #[tokio::test]
    async fn adult_approval_swaps_thirteen_for_eighteen() {
        let harness = harness();
        let user = UserId::new("user-15");

        harness
            .pipeline
            .approve_adult(&UserId::new("mod-1"), &user, true)
            .await
            .unwrap();

        let calls = harness.guild.calls();
        let removed = calls
            .iter()
            .position(|c| {
                matches!(c, GuildCall::RemoveRole { role, .. } if role.as_str() == "role-13")
            })
            .unwrap();
        let added = calls
            .iter()
            .position(|c| matches!(c, GuildCall::AddRole { role, .. } if role.as_str() == "role-18"))
            .unwrap();
        assert!(removed < added, "13+ must come off before 18+ goes on");

        let dms = harness.guild.dms_to(&user);
        assert_eq!(dms.len(), 1);
        let text = dms[0].content.clone().unwrap();
        assert!(
            text.contains("Mature language"),
            "policy text is substituted: {text}"
        );
    }

    #[tokio::test]
    async fn adult_denial_changes_no_roles() {
        let harness = harness();
        let user = UserId::new("user-16");

        harness
            .pipeline
            .approve_adult(&UserId::new("mod-1"), &user, false)
            .await
            .unwrap();

        let calls = harness.guild.calls();
        assert!(!calls
            .iter()
            .any(|c| matches!(c, GuildCall::AddRole { .. } | GuildCall::RemoveRole { .. })));
        assert_eq!(harness.guild.dms_to(&user).len(), 1);
    }

    // -- Appeals -------------------------------------------------------------

    #[tokio::test]
    async fn appeal_enters_staff_queue() {
        let harness = harness();
        let appeal = AppealRecord::new(
            "user-17",
            "I am actually nineteen",
            "19",
            "happy to reverify",
        );

        let outcome = harness.pipeline.submit_appeal(appeal).await.unwrap();
        let AppealOutcome::Submitted { appeal_id } = outcome else {
            panic!("expected submission, got {outcome:?}");
        };

        let pending = harness.appeals.pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, appeal_id);

        let posts = harness
            .guild
            .channel_messages(&ChannelId::new("chan-appeals"));
        assert_eq!(posts.len(), 1);
        assert!(posts[0].content.clone().unwrap().contains("@here"));
        assert_eq!(harness.guild.dms_to(&UserId::new("user-17")).len(), 1);
    }

    #[tokio::test]
    async fn keyword_appeal_is_denied_on_sight() {
        let harness = harness();
        let appeal = AppealRecord::new("user-18", "you are all trolls", "19", "unban me");

        let outcome = harness.pipeline.submit_appeal(appeal).await.unwrap();
        let AppealOutcome::AutoDenied { appeal_id } = outcome else {
            panic!("expected auto-denial, got {outcome:?}");
        };

        let stored = harness.appeals.get(&appeal_id).await.unwrap().unwrap();
        assert_eq!(stored.status, AppealStatus::Denied);
        assert!(stored.decision_notes.unwrap().contains("troll"));
        assert!(stored.decided_by.is_none());

        // No staff post, and no cooldown: only staff denials start one.
        assert!(harness
            .guild
            .channel_messages(&ChannelId::new("chan-appeals"))
            .is_empty());
        let retry = harness
            .pipeline
            .submit_appeal(AppealRecord::new(
                "user-18",
                "I can show ID",
                "19",
                "please reconsider",
            ))
            .await
            .unwrap();
        assert!(matches!(retry, AppealOutcome::Submitted { .. }));
    }

    #[tokio::test]
    async fn accepted_appeal_lifts_the_ban() {
        let harness = harness();
        let user = UserId::new("user-19");
        let outcome = harness
            .pipeline
            .submit_appeal(AppealRecord::new(
                user.clone(),
                "wrong call",
                "20",
                "ready to reverify",
            ))
            .await
            .unwrap();
        let AppealOutcome::Submitted { appeal_id } = outcome else {
            panic!("expected submission, got {outcome:?}");
        };

        let decided = harness
            .pipeline
            .decide_appeal(&UserId::new("mod-1"), &appeal_id, true, None)
            .await
            .unwrap();
        assert_eq!(decided.status, AppealStatus::Accepted);

        let calls = harness.guild.calls();
        assert!(calls
            .iter()
            .any(|c| matches!(c, GuildCall::Unban { user: u, .. } if u == &user)));

        let err = harness
            .pipeline
            .decide_appeal(&UserId::new("mod-2"), &appeal_id, false, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::AlreadyDecided));
    }

    #[tokio::test]
    async fn denied_appeal_starts_the_cooldown() {
        let harness = harness();
        let user = UserId::new("user-20");
        let outcome = harness
            .pipeline
            .submit_appeal(AppealRecord::new(user.clone(), "wrong call", "20", "rc"))
            .await
            .unwrap();
        let AppealOutcome::Submitted { appeal_id } = outcome else {
            panic!("expected submission, got {outcome:?}");
        };

        harness
            .pipeline
            .decide_appeal(
                &UserId::new("mod-1"),
                &appeal_id,
                false,
                Some("estimate was clear"),
            )
            .await
            .unwrap();

        let err = harness
            .pipeline
            .submit_appeal(AppealRecord::new(user.clone(), "second try", "20", "rc"))
            .await
            .unwrap_err();
        match err {
            PipelineError::AppealCooldown { retry_after } => {
                assert!(retry_after > Duration::ZERO);
            }
            other => panic!("expected cooldown, got {other:?}"),
        }
        // The denial DM names the wait in days.
        let dms = harness.guild.dms_to(&user);
        assert!(dms
            .iter()
            .any(|m| m.content.as_deref().is_some_and(|t| t.contains("7 days"))));
    }

    // -- Raid watch ----------------------------------------------------------

    #[tokio::test]
    async fn join_burst_fires_one_raid_alert() {
        let harness = harness();
        for i in 0..9u64 {
            let count = harness
                .pipeline
                .record_join(&UserId::new(format!("joiner-{i}")))
                .await
                .unwrap();
            assert_eq!(count, i + 1);
        }
        assert!(harness
            .guild
            .channel_messages(&ChannelId::new("chan-modlog"))
            .is_empty());

        // The tenth join crosses the default threshold.
        harness
            .pipeline
            .record_join(&UserId::new("joiner-9"))
            .await
            .unwrap();
        assert_eq!(
            harness
                .guild
                .channel_messages(&ChannelId::new("chan-modlog"))
                .len(),
            1
        );

        // The window resets, so the next join starts a fresh count.
        let count = harness
            .pipeline
            .record_join(&UserId::new("joiner-10"))
            .await
            .unwrap();
        assert_eq!(count, 1);

        harness.pipeline.shutdown().await;
        let page = harness.audit.query(&AuditQuery {
            kind: Some(AuditKind::RaidAlert),
            ..Default::default()
        });
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn disabled_raid_watch_counts_nothing() {
        let mut config = test_config();
        config.raid.enabled = false;
        let harness = harness_full(
            ScriptedDetector::always(geometry_with_ratio(0.90)),
            config,
        );

        for i in 0..20u64 {
            let count = harness
                .pipeline
                .record_join(&UserId::new(format!("j-{i}")))
                .await
                .unwrap();
            assert_eq!(count, 0);
        }
        assert!(harness
            .guild
            .channel_messages(&ChannelId::new("chan-modlog"))
            .is_empty());
        assert_eq!(harness.pipeline.check_raid().await.unwrap(), None);
    }

    // -- Queue listing -------------------------------------------------------

    #[tokio::test]
    async fn pending_queue_lists_oldest_first() {
        let harness = harness_with(ScriptedDetector::with_responses(vec![
            vec![geometry_with_ratio(0.80)],
            vec![geometry_with_ratio(0.90)],
        ]));
        accepted_submission(&harness, &UserId::new("user-a")).await;
        accepted_submission(&harness, &UserId::new("user-b")).await;

        let pending = harness.pipeline.pending_reviews().await.unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].user.as_str(), "user-a");
        assert!(pending[0].high_priority);
        assert!(!pending[1].high_priority);
    }

    // -- Sweeps --------------------------------------------------------------

    #[tokio::test]
    async fn retention_sweep_purges_old_reviewed_records() {
        let harness = harness();
        let user = UserId::new("user-21");
        let record_id = accepted_submission(&harness, &user).await;

        // Review it, backdating the review past the retention window.
        let reviewed_at = Utc::now() - chrono::Duration::days(40);
        harness
            .verifications
            .update_review(&record_id, &UserId::new("mod-1"), true, None, reviewed_at)
            .await
            .unwrap();

        let purged = harness.pipeline.sweep_retention().await.unwrap();
        assert_eq!(purged, 1);
        assert!(harness
            .verifications
            .get(&record_id)
            .await
            .unwrap()
            .is_none());

        harness.pipeline.shutdown().await;
        let page = harness.audit.query(&AuditQuery {
            kind: Some(AuditKind::Retention),
            ..Default::default()
        });
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn reminder_sweep_nudges_only_on_schedule() {
        let harness = harness();
        let due = GuildMember::new(
            "member-due",
            Utc::now() - chrono::Duration::days(3) - chrono::Duration::hours(2),
        );
        let fresh = GuildMember::new("member-fresh", Utc::now() - chrono::Duration::days(1));
        harness
            .guild
            .set_members(RoleId::new("role-unverified"), vec![due, fresh]);

        let reminded = harness.pipeline.sweep_reminders().await.unwrap();
        assert_eq!(reminded, 1);

        let dms = harness.guild.dms_to(&UserId::new("member-due"));
        assert_eq!(dms.len(), 1);
        assert!(dms[0].content.as_deref().unwrap().contains("4 days"));
        assert!(harness
            .guild
            .dms_to(&UserId::new("member-fresh"))
            .is_empty());
    }

    #[tokio::test]
    async fn kick_sweep_removes_members_past_grace() {
        let harness = harness();
        let expired = GuildMember::new("member-old", Utc::now() - chrono::Duration::days(8));
        let within = GuildMember::new("member-new", Utc::now() - chrono::Duration::days(2));
        harness
            .guild
            .set_members(RoleId::new("role-unverified"), vec![expired, within]);

        let kicked = harness.pipeline.sweep_unverified_kicks().await.unwrap();
        assert_eq!(kicked, 1);

        let calls = harness.guild.calls();
        let dm_index = calls
            .iter()
            .position(|c| matches!(c, GuildCall::Dm { user, .. } if user.as_str() == "member-old"))
            .unwrap();
        let kick_index = calls
            .iter()
            .position(|c| matches!(c, GuildCall::Kick { .. }))
            .unwrap();
        assert!(dm_index < kick_index, "notice precedes the kick");
        match &calls[kick_index] {
            GuildCall::Kick { user, reason } => {
                assert_eq!(user.as_str(), "member-old");
                assert_eq!(reason, "Not verified within 7 days");
            }
            _ => unreachable!(),
        }
        assert!(!calls
            .iter()
            .any(|c| matches!(c, GuildCall::Kick { user, .. } if user.as_str() == "member-new")));
    }

    #[tokio::test]
    async fn kick_failures_do_not_stop_the_sweep() {
        let harness = harness();
        harness.guild.fail_kicks(true);
        harness.guild.set_members(
            RoleId::new("role-unverified"),
            vec![
                GuildMember::new("m-1", Utc::now() - chrono::Duration::days(9)),
                GuildMember::new("m-2", Utc::now() - chrono::Duration::days(10)),
            ],
        );

        let kicked = harness.pipeline.sweep_unverified_kicks().await.unwrap();
        assert_eq!(kicked, 0);
        let attempts = harness
            .guild
            .calls()
            .iter()
            .filter(|c| matches!(c, GuildCall::Kick { .. }))
            .count();
        assert_eq!(attempts, 2);
    }

    // -- Audit ---------------------------------------------------------------

    #[tokio::test]
    async fn every_transition_reaches_the_audit_sink() {
        let harness = harness();
        let user = UserId::new("user-22");
        accepted_submission(&harness, &user).await;
        harness
            .pipeline
            .review(&UserId::new("mod-1"), &user, false, Some("looks fine"))
            .await
            .unwrap();
        harness
            .pipeline
            .approve_adult(&UserId::new("mod-1"), &user, true)
            .await
            .unwrap();

        harness.pipeline.shutdown().await;
        for kind in [AuditKind::Submission, AuditKind::Review, AuditKind::AdultReview] {
            let page = harness.audit.query(&AuditQuery {
                kind: Some(kind),
                ..Default::default()
            });
            assert_eq!(page.total, 1, "missing audit kind {kind}");
        }
    }

    // -- Cooldown helpers ----------------------------------------------------

    #[test]
    fn remaining_cooldown_parses_future_expiry() {
        let expiry = (Utc::now() + chrono::Duration::minutes(10)).to_rfc3339();
        let remaining = remaining_cooldown(&expiry);
        assert!(remaining > Duration::from_secs(9 * 60));
        assert!(remaining <= Duration::from_secs(10 * 60));
    }

    #[test]
    fn remaining_cooldown_is_zero_for_past_or_garbage() {
        let past = (Utc::now() - chrono::Duration::minutes(1)).to_rfc3339();
        assert_eq!(remaining_cooldown(&past), Duration::ZERO);
        assert_eq!(remaining_cooldown("not a timestamp"), Duration::ZERO);
    }
}
