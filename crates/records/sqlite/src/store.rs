use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};

use agegate_core::{
    AppealId, AppealRecord, AppealStats, AppealStatus, MediaKind, RecordId, UserId,
    VerificationRecord,
};
use agegate_records::appeal::AppealStore;
use agegate_records::error::RecordError;
use agegate_records::verification::VerificationStore;

use crate::config::SqliteRecordsConfig;
use crate::migrations;

async fn open_pool(config: &SqliteRecordsConfig) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", config.path))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await
}

/// SQLite-backed verification store using `sqlx`.
pub struct SqliteVerificationStore {
    pool: SqlitePool,
}

impl SqliteVerificationStore {
    /// Create a new store, opening the database file and running migrations.
    pub async fn new(config: &SqliteRecordsConfig) -> Result<Self, RecordError> {
        let pool = open_pool(config)
            .await
            .map_err(|e| RecordError::Storage(e.to_string()))?;

        Self::from_pool(pool).await
    }

    /// Create from an existing pool (useful for testing and pool sharing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, RecordError> {
        migrations::run_migrations(&pool)
            .await
            .map_err(|e| RecordError::Storage(e.to_string()))?;

        Ok(Self { pool })
    }

    /// The underlying pool, for sharing with the appeal store.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl VerificationStore for SqliteVerificationStore {
    async fn add(&self, record: &VerificationRecord) -> Result<(), RecordError> {
        let sql = "
            INSERT INTO verifications (
                id, user_id, display_name, submitted_at, media, media_kind,
                estimated_age, reviewed, verified, reviewer_id, reviewed_at, notes
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ";

        sqlx::query(sql)
            .bind(record.id.as_str())
            .bind(record.user.as_str())
            .bind(&record.display_name)
            .bind(record.submitted_at.timestamp_millis())
            .bind(&record.media)
            .bind(record.media_kind.as_str())
            .bind(f64::from(record.estimated_age))
            .bind(record.reviewed)
            .bind(record.verified)
            .bind(record.reviewer.as_ref().map(UserId::as_str))
            .bind(record.reviewed_at.map(|t| t.timestamp_millis()))
            .bind(record.notes.as_deref())
            .execute(&self.pool)
            .await
            .map_err(|e| RecordError::Storage(e.to_string()))?;

        Ok(())
    }

    async fn get(&self, id: &RecordId) -> Result<Option<VerificationRecord>, RecordError> {
        let row = sqlx::query_as::<_, VerificationRow>("SELECT * FROM verifications WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RecordError::Storage(e.to_string()))?;

        row.map(VerificationRow::into_record).transpose()
    }

    async fn pending(&self) -> Result<Vec<VerificationRecord>, RecordError> {
        let rows = sqlx::query_as::<_, VerificationRow>(
            "SELECT * FROM verifications WHERE reviewed = 0 ORDER BY submitted_at ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RecordError::Storage(e.to_string()))?;

        rows.into_iter().map(VerificationRow::into_record).collect()
    }

    async fn latest_unreviewed_for_user(
        &self,
        user: &UserId,
    ) -> Result<Option<VerificationRecord>, RecordError> {
        let row = sqlx::query_as::<_, VerificationRow>(
            "SELECT * FROM verifications WHERE user_id = ? AND reviewed = 0
             ORDER BY submitted_at DESC LIMIT 1",
        )
        .bind(user.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RecordError::Storage(e.to_string()))?;

        row.map(VerificationRow::into_record).transpose()
    }

    async fn for_user(&self, user: &UserId) -> Result<Vec<VerificationRecord>, RecordError> {
        let rows = sqlx::query_as::<_, VerificationRow>(
            "SELECT * FROM verifications WHERE user_id = ? ORDER BY submitted_at DESC",
        )
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RecordError::Storage(e.to_string()))?;

        rows.into_iter().map(VerificationRow::into_record).collect()
    }

    async fn update_review(
        &self,
        id: &RecordId,
        reviewer: &UserId,
        verified: bool,
        notes: Option<&str>,
        reviewed_at: DateTime<Utc>,
    ) -> Result<bool, RecordError> {
        // The reviewed guard in the WHERE clause makes the transition
        // first-writer-wins without a transaction.
        let result = sqlx::query(
            "UPDATE verifications
             SET reviewed = 1, verified = ?, reviewer_id = ?, reviewed_at = ?, notes = ?
             WHERE id = ? AND reviewed = 0",
        )
        .bind(verified)
        .bind(reviewer.as_str())
        .bind(reviewed_at.timestamp_millis())
        .bind(notes)
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| RecordError::Storage(e.to_string()))?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }

        let exists =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM verifications WHERE id = ?")
                .bind(id.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| RecordError::Storage(e.to_string()))?;

        if exists == 0 {
            return Err(RecordError::NotFound(id.to_string()));
        }
        Ok(false)
    }

    async fn purge_reviewed_before(&self, cutoff: DateTime<Utc>) -> Result<u64, RecordError> {
        let result =
            sqlx::query("DELETE FROM verifications WHERE reviewed = 1 AND reviewed_at < ?")
                .bind(cutoff.timestamp_millis())
                .execute(&self.pool)
                .await
                .map_err(|e| RecordError::Storage(e.to_string()))?;

        Ok(result.rows_affected())
    }
}

/// SQLite-backed appeal store using `sqlx`.
pub struct SqliteAppealStore {
    pool: SqlitePool,
}

impl SqliteAppealStore {
    /// Create a new store, opening the database file and running migrations.
    pub async fn new(config: &SqliteRecordsConfig) -> Result<Self, RecordError> {
        let pool = open_pool(config)
            .await
            .map_err(|e| RecordError::Storage(e.to_string()))?;

        Self::from_pool(pool).await
    }

    /// Create from an existing pool (useful for testing and pool sharing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, RecordError> {
        migrations::run_migrations(&pool)
            .await
            .map_err(|e| RecordError::Storage(e.to_string()))?;

        Ok(Self { pool })
    }

    /// The underlying pool, for sharing with the verification store.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl AppealStore for SqliteAppealStore {
    async fn add(&self, appeal: &AppealRecord) -> Result<(), RecordError> {
        let sql = "
            INSERT INTO appeals (
                id, user_id, submitted_at, reason, claimed_age, proof,
                reconsideration, origin_message_id, status, decided_by,
                decided_at, decision_notes
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ";

        sqlx::query(sql)
            .bind(appeal.id.as_str())
            .bind(appeal.user.as_str())
            .bind(appeal.submitted_at.timestamp_millis())
            .bind(&appeal.reason)
            .bind(appeal.claimed_age.as_str())
            .bind(appeal.proof.as_deref())
            .bind(&appeal.reconsideration)
            .bind(appeal.origin_message_id.as_deref())
            .bind(appeal.status.as_str())
            .bind(appeal.decided_by.as_ref().map(UserId::as_str))
            .bind(appeal.decided_at.map(|t| t.timestamp_millis()))
            .bind(appeal.decision_notes.as_deref())
            .execute(&self.pool)
            .await
            .map_err(|e| RecordError::Storage(e.to_string()))?;

        Ok(())
    }

    async fn get(&self, id: &AppealId) -> Result<Option<AppealRecord>, RecordError> {
        let row = sqlx::query_as::<_, AppealRow>("SELECT * FROM appeals WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RecordError::Storage(e.to_string()))?;

        row.map(AppealRow::into_record).transpose()
    }

    async fn pending(&self) -> Result<Vec<AppealRecord>, RecordError> {
        let rows = sqlx::query_as::<_, AppealRow>(
            "SELECT * FROM appeals WHERE status = 'pending' ORDER BY submitted_at ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RecordError::Storage(e.to_string()))?;

        rows.into_iter().map(AppealRow::into_record).collect()
    }

    async fn decide(
        &self,
        id: &AppealId,
        decided_by: &UserId,
        accept: bool,
        notes: Option<&str>,
        decided_at: DateTime<Utc>,
    ) -> Result<Option<AppealRecord>, RecordError> {
        let status = if accept {
            AppealStatus::Accepted
        } else {
            AppealStatus::Denied
        };

        // The status guard in the WHERE clause makes the transition
        // first-writer-wins without a transaction.
        let result = sqlx::query(
            "UPDATE appeals
             SET status = ?, decided_by = ?, decided_at = ?, decision_notes = ?
             WHERE id = ? AND status = 'pending'",
        )
        .bind(status.as_str())
        .bind(decided_by.as_str())
        .bind(decided_at.timestamp_millis())
        .bind(notes)
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| RecordError::Storage(e.to_string()))?;

        if result.rows_affected() == 1 {
            return self.get(id).await;
        }

        let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM appeals WHERE id = ?")
            .bind(id.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RecordError::Storage(e.to_string()))?;

        if exists == 0 {
            return Err(RecordError::NotFound(id.to_string()));
        }
        Ok(None)
    }

    async fn stats(&self) -> Result<AppealStats, RecordError> {
        let row = sqlx::query_as::<_, StatsRow>(
            "SELECT
                COUNT(*) AS total,
                COALESCE(SUM(CASE WHEN status = 'accepted' THEN 1 ELSE 0 END), 0) AS accepted,
                COALESCE(SUM(CASE WHEN status = 'denied' THEN 1 ELSE 0 END), 0) AS denied,
                COALESCE(SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END), 0) AS pending
             FROM appeals",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RecordError::Storage(e.to_string()))?;

        #[allow(clippy::cast_sign_loss)]
        Ok(AppealStats {
            total: row.total as u64,
            accepted: row.accepted as u64,
            denied: row.denied as u64,
            pending: row.pending as u64,
        })
    }
}

fn datetime_from_millis(ms: i64) -> Result<DateTime<Utc>, RecordError> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| RecordError::Serialization(format!("timestamp out of range: {ms}")))
}

fn media_kind_from_str(value: &str) -> Result<MediaKind, RecordError> {
    match value {
        "photo" => Ok(MediaKind::Photo),
        "video" => Ok(MediaKind::Video),
        other => Err(RecordError::Serialization(format!(
            "unknown media kind: {other}"
        ))),
    }
}

fn appeal_status_from_str(value: &str) -> Result<AppealStatus, RecordError> {
    match value {
        "pending" => Ok(AppealStatus::Pending),
        "accepted" => Ok(AppealStatus::Accepted),
        "denied" => Ok(AppealStatus::Denied),
        other => Err(RecordError::Serialization(format!(
            "unknown appeal status: {other}"
        ))),
    }
}

/// Internal row type for mapping database rows to `VerificationRecord`.
#[derive(sqlx::FromRow)]
struct VerificationRow {
    id: String,
    user_id: String,
    display_name: String,
    submitted_at: i64,
    media: Vec<u8>,
    media_kind: String,
    estimated_age: f64,
    reviewed: bool,
    verified: bool,
    reviewer_id: Option<String>,
    reviewed_at: Option<i64>,
    notes: Option<String>,
}

impl VerificationRow {
    fn into_record(self) -> Result<VerificationRecord, RecordError> {
        #[allow(clippy::cast_possible_truncation)]
        let estimated_age = self.estimated_age as f32;

        Ok(VerificationRecord {
            id: RecordId::new(self.id),
            user: UserId::new(self.user_id),
            display_name: self.display_name,
            submitted_at: datetime_from_millis(self.submitted_at)?,
            media: self.media,
            media_kind: media_kind_from_str(&self.media_kind)?,
            estimated_age,
            reviewed: self.reviewed,
            verified: self.verified,
            reviewer: self.reviewer_id.map(UserId::new),
            reviewed_at: self.reviewed_at.map(datetime_from_millis).transpose()?,
            notes: self.notes,
        })
    }
}

/// Internal row type for mapping database rows to `AppealRecord`.
#[derive(sqlx::FromRow)]
struct AppealRow {
    id: String,
    user_id: String,
    submitted_at: i64,
    reason: String,
    claimed_age: String,
    proof: Option<String>,
    reconsideration: String,
    origin_message_id: Option<String>,
    status: String,
    decided_by: Option<String>,
    decided_at: Option<i64>,
    decision_notes: Option<String>,
}

impl AppealRow {
    fn into_record(self) -> Result<AppealRecord, RecordError> {
        Ok(AppealRecord {
            id: AppealId::new(self.id),
            user: UserId::new(self.user_id),
            submitted_at: datetime_from_millis(self.submitted_at)?,
            reason: self.reason,
            claimed_age: self.claimed_age,
            proof: self.proof,
            reconsideration: self.reconsideration,
            origin_message_id: self.origin_message_id,
            status: appeal_status_from_str(&self.status)?,
            decided_by: self.decided_by.map(UserId::new),
            decided_at: self.decided_at.map(datetime_from_millis).transpose()?,
            decision_notes: self.decision_notes,
        })
    }
}

#[derive(sqlx::FromRow)]
struct StatsRow {
    total: i64,
    accepted: i64,
    denied: i64,
    pending: i64,
}
