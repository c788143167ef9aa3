use sqlx::SqlitePool;

/// Create the verification and appeal tables and their indexes if they do
/// not already exist.
///
/// Timestamps are stored as integer epoch milliseconds so that index order
/// matches chronological order.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let create_verifications = "
        CREATE TABLE IF NOT EXISTS verifications (
            id             TEXT PRIMARY KEY,
            user_id        TEXT NOT NULL,
            display_name   TEXT NOT NULL,
            submitted_at   INTEGER NOT NULL,
            media          BLOB NOT NULL,
            media_kind     TEXT NOT NULL,
            estimated_age  REAL NOT NULL,
            reviewed       INTEGER NOT NULL DEFAULT 0,
            verified       INTEGER NOT NULL DEFAULT 0,
            reviewer_id    TEXT,
            reviewed_at    INTEGER,
            notes          TEXT
        )
    ";
    sqlx::query(create_verifications).execute(pool).await?;

    let create_appeals = "
        CREATE TABLE IF NOT EXISTS appeals (
            id                 TEXT PRIMARY KEY,
            user_id            TEXT NOT NULL,
            submitted_at       INTEGER NOT NULL,
            reason             TEXT NOT NULL,
            claimed_age        TEXT NOT NULL,
            proof              TEXT,
            reconsideration    TEXT NOT NULL,
            origin_message_id  TEXT,
            status             TEXT NOT NULL,
            decided_by         TEXT,
            decided_at         INTEGER,
            decision_notes     TEXT
        )
    ";
    sqlx::query(create_appeals).execute(pool).await?;

    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_verifications_pending ON verifications (submitted_at) WHERE reviewed = 0",
        "CREATE INDEX IF NOT EXISTS idx_verifications_user ON verifications (user_id, submitted_at DESC)",
        "CREATE INDEX IF NOT EXISTS idx_verifications_reviewed_at ON verifications (reviewed_at) WHERE reviewed_at IS NOT NULL",
        "CREATE INDEX IF NOT EXISTS idx_appeals_pending ON appeals (submitted_at) WHERE status = 'pending'",
        "CREATE INDEX IF NOT EXISTS idx_appeals_user ON appeals (user_id)",
    ];

    for idx in &indexes {
        sqlx::query(idx).execute(pool).await?;
    }

    Ok(())
}
