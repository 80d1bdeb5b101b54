use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs the schema migrations that have not been applied yet.
///
/// Version 1 creates `test_results` and its indexes.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS test_results (
                    id INTEGER PRIMARY KEY,
                    session_id TEXT NOT NULL UNIQUE,
                    name TEXT NOT NULL,
                    email TEXT NOT NULL,
                    phone TEXT NOT NULL,
                    branch TEXT NOT NULL,
                    skill_level TEXT NOT NULL,
                    correct_answers INTEGER NOT NULL CHECK (correct_answers >= 0),
                    total_questions INTEGER NOT NULL CHECK (total_questions > 0),
                    percentage_tenths INTEGER NOT NULL
                        CHECK (percentage_tenths BETWEEN 0 AND 1000),
                    passed INTEGER NOT NULL CHECK (passed IN (0, 1)),
                    time_taken_seconds INTEGER NOT NULL CHECK (time_taken_seconds >= 0),
                    pause_count INTEGER NOT NULL DEFAULT 0 CHECK (pause_count >= 0),
                    started_at TEXT NOT NULL,
                    completed_at TEXT NOT NULL,
                    answers TEXT NOT NULL,
                    incorrect_answers TEXT NOT NULL,
                    CHECK (correct_answers <= total_questions)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_test_results_email
                    ON test_results (email);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_test_results_branch_completed
                    ON test_results (branch, completed_at);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
    }

    Ok(())
}
