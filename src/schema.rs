//! Database schema management for `leafmealone-diary`.
//!
//! Ensures required tables and indexes exist before serving requests.
//! Applied once on startup from `main.rs`.

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create or update the database schema (idempotent).
///
/// Creates `readings` (sensor documents, sections as JSONB), `diary_posts`
/// and `interactions`. Safe to call on every startup; no-op if objects
/// already exist.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS readings (
            id                 UUID PRIMARY KEY,
            captured_at        TIMESTAMPTZ NOT NULL,
            environmental_data JSONB       NOT NULL,
            external_factors   JSONB       NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Append-only; rows are never updated by the service
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS diary_posts (
            id          UUID PRIMARY KEY,
            content     TEXT        NOT NULL,
            created_at  TIMESTAMPTZ NOT NULL,
            reading_id  UUID        NOT NULL REFERENCES readings (id)
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Written by external actors (likes, comments)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS interactions (
            id          UUID PRIMARY KEY,
            post_id     UUID        NOT NULL REFERENCES diary_posts (id) ON DELETE CASCADE,
            kind        TEXT        NOT NULL CHECK (kind IN ('like', 'comment')),
            content     TEXT,
            created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_readings_captured_at
            ON readings (captured_at DESC);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_diary_posts_created_at
            ON diary_posts (created_at DESC);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_interactions_post_id
            ON interactions (post_id, created_at);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
