//! Persistence for readings, diary posts and interactions.
//!
//! The workflow only sees the [`PlantStore`] trait; `PgStore` backs it with
//! PostgreSQL, keeping each reading's document sections as JSONB.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};
use uuid::Uuid;

use crate::{Config, DiaryError, DiaryPost, Interaction, InteractionKind, Reading};
use crate::models::{EnvironmentalData, ExternalFactors};

// ---

#[async_trait]
pub trait PlantStore: Send + Sync {
    // ---
    /// Up to `limit` readings, newest first.
    async fn latest_readings(&self, limit: usize) -> Result<Vec<Reading>, DiaryError>;

    async fn insert_reading(&self, reading: &Reading) -> Result<(), DiaryError>;

    /// Up to `limit` diary posts, newest first.
    async fn recent_posts(&self, limit: usize) -> Result<Vec<DiaryPost>, DiaryError>;

    /// Interactions on one post, oldest first.
    async fn interactions_for(&self, post_id: Uuid) -> Result<Vec<Interaction>, DiaryError>;

    async fn insert_post(&self, post: &DiaryPost) -> Result<(), DiaryError>;

    async fn latest_reading(&self) -> Result<Reading, DiaryError> {
        // ---
        self.latest_readings(1)
            .await?
            .into_iter()
            .next()
            .ok_or(DiaryError::NotFound("No data found"))
    }

    async fn latest_post(&self) -> Result<DiaryPost, DiaryError> {
        // ---
        self.recent_posts(1)
            .await?
            .into_iter()
            .next()
            .ok_or(DiaryError::NotFound("No diary found"))
    }
}

/// PostgreSQL-backed store. Owns the connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    // ---
    pub async fn connect(cfg: &Config) -> anyhow::Result<Self> {
        // ---
        tracing::info!("Attempting to connect to database: {}", cfg.masked_db_url());

        let pool = PgPoolOptions::new()
            .max_connections(cfg.db_pool_max)
            .connect(&cfg.db_url)
            .await
            .map_err(|e| {
                anyhow::anyhow!(
                    "Failed to connect to database '{}': {}",
                    cfg.masked_db_url(),
                    e
                )
            })?;

        tracing::info!("Successfully connected to database");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Drain and close the pool. Further queries fail with `StoreUnavailable`.
    pub async fn close(&self) {
        // ---
        self.pool.close().await;
        tracing::info!("Database pool closed");
    }
}

#[derive(sqlx::FromRow)]
struct ReadingRow {
    id: Uuid,
    captured_at: DateTime<Utc>,
    environmental_data: Json<EnvironmentalData>,
    external_factors: Json<ExternalFactors>,
}

impl From<ReadingRow> for Reading {
    fn from(row: ReadingRow) -> Self {
        Reading {
            id: row.id,
            timestamp: row.captured_at,
            environmental_data: row.environmental_data.0,
            external_factors: row.external_factors.0,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    content: String,
    created_at: DateTime<Utc>,
    reading_id: Uuid,
}

impl From<PostRow> for DiaryPost {
    fn from(row: PostRow) -> Self {
        DiaryPost {
            id: row.id,
            content: row.content,
            created_at: row.created_at,
            reading_id: row.reading_id,
        }
    }
}

#[derive(sqlx::FromRow)]
struct InteractionRow {
    id: Uuid,
    post_id: Uuid,
    kind: String,
    content: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<InteractionRow> for Interaction {
    type Error = DiaryError;

    fn try_from(row: InteractionRow) -> Result<Self, Self::Error> {
        // ---
        let kind = row
            .kind
            .parse::<InteractionKind>()
            .map_err(|e| DiaryError::Unknown(anyhow::anyhow!("interaction {}: {}", row.id, e)))?;

        Ok(Interaction {
            id: row.id,
            post_id: row.post_id,
            kind,
            content: row.content,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl PlantStore for PgStore {
    // ---
    async fn latest_readings(&self, limit: usize) -> Result<Vec<Reading>, DiaryError> {
        // ---
        let rows: Vec<ReadingRow> = sqlx::query_as(
            r#"
            SELECT id, captured_at, environmental_data, external_factors
            FROM readings
            ORDER BY captured_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Reading::from).collect())
    }

    async fn insert_reading(&self, reading: &Reading) -> Result<(), DiaryError> {
        // ---
        sqlx::query(
            r#"
            INSERT INTO readings (id, captured_at, environmental_data, external_factors)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(reading.id)
        .bind(reading.timestamp)
        .bind(Json(&reading.environmental_data))
        .bind(Json(&reading.external_factors))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn recent_posts(&self, limit: usize) -> Result<Vec<DiaryPost>, DiaryError> {
        // ---
        let rows: Vec<PostRow> = sqlx::query_as(
            r#"
            SELECT id, content, created_at, reading_id
            FROM diary_posts
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(DiaryPost::from).collect())
    }

    async fn interactions_for(&self, post_id: Uuid) -> Result<Vec<Interaction>, DiaryError> {
        // ---
        let rows: Vec<InteractionRow> = sqlx::query_as(
            r#"
            SELECT id, post_id, kind, content, created_at
            FROM interactions
            WHERE post_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Interaction::try_from).collect()
    }

    async fn insert_post(&self, post: &DiaryPost) -> Result<(), DiaryError> {
        // ---
        sqlx::query(
            r#"
            INSERT INTO diary_posts (id, content, created_at, reading_id)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(post.id)
        .bind(&post.content)
        .bind(post.created_at)
        .bind(post.reading_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
