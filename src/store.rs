//! Persistence for the incremental-sync state: per-source/per-stream anchors
//! and the offered-workout-id registry. These are the only values that must
//! survive process restarts for correct incremental behavior.

use crate::db::DbPool;
use crate::ingest::{Anchors, HEART_RATE_STREAM, WORKOUTS_STREAM};
use crate::models::OfferedRegistry;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Migration error: {0}")]
  Migrate(#[from] sqlx::migrate::MigrateError),

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct AnchorStore {
  db: DbPool,
}

impl AnchorStore {
  pub fn new(db: DbPool) -> Self {
    Self { db }
  }

  /// -------------------------------------------------------------------------
  /// Anchors
  /// -------------------------------------------------------------------------

  pub async fn load_anchors(&self, source: &str) -> Result<Anchors, StoreError> {
    let rows: Vec<(String, String)> =
      sqlx::query_as("SELECT stream, anchor FROM sync_anchors WHERE source = ?1")
        .bind(source)
        .fetch_all(&self.db)
        .await?;

    let mut anchors = Anchors::default();
    for (stream, anchor) in rows {
      match stream.as_str() {
        WORKOUTS_STREAM => anchors.workouts = Some(anchor),
        HEART_RATE_STREAM => anchors.heart_rate = Some(anchor),
        other => tracing::warn!(stream = other, "ignoring unknown anchor stream"),
      }
    }
    Ok(anchors)
  }

  pub async fn save_anchors(&self, source: &str, anchors: &Anchors) -> Result<(), StoreError> {
    if let Some(anchor) = &anchors.workouts {
      self.upsert_anchor(source, WORKOUTS_STREAM, anchor).await?;
    }
    if let Some(anchor) = &anchors.heart_rate {
      self.upsert_anchor(source, HEART_RATE_STREAM, anchor).await?;
    }
    Ok(())
  }

  async fn upsert_anchor(&self, source: &str, stream: &str, anchor: &str) -> Result<(), StoreError> {
    sqlx::query(
      r#"
      INSERT INTO sync_anchors (source, stream, anchor, updated_at)
      VALUES (?1, ?2, ?3, CURRENT_TIMESTAMP)
      ON CONFLICT(source, stream) DO UPDATE SET
        anchor = excluded.anchor,
        updated_at = excluded.updated_at
      "#,
    )
    .bind(source)
    .bind(stream)
    .bind(anchor)
    .execute(&self.db)
    .await?;

    Ok(())
  }

  pub async fn clear_anchors(&self, source: &str) -> Result<(), StoreError> {
    sqlx::query("DELETE FROM sync_anchors WHERE source = ?1")
      .bind(source)
      .execute(&self.db)
      .await?;
    Ok(())
  }

  /// -------------------------------------------------------------------------
  /// Offered Registry
  /// -------------------------------------------------------------------------

  pub async fn load_offered(&self) -> Result<OfferedRegistry, StoreError> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT workout_id FROM offered_workouts")
      .fetch_all(&self.db)
      .await?;
    Ok(OfferedRegistry::from_ids(rows.into_iter().map(|(id,)| id)))
  }

  pub async fn record_offered(&self, ids: &[String]) -> Result<(), StoreError> {
    for id in ids {
      sqlx::query(
        "INSERT INTO offered_workouts (workout_id) VALUES (?1)
         ON CONFLICT(workout_id) DO NOTHING",
      )
      .bind(id)
      .execute(&self.db)
      .await?;
    }
    Ok(())
  }

  pub async fn clear_offered(&self) -> Result<(), StoreError> {
    sqlx::query("DELETE FROM offered_workouts").execute(&self.db).await?;
    Ok(())
  }

  /// Explicit reset for one source: drop its anchors so the next fetch reads
  /// everything, and clear the offered registry so stale ids from the
  /// discarded ingestion history cannot suppress legitimate matches.
  pub async fn reset_source(&self, source: &str) -> Result<(), StoreError> {
    self.clear_anchors(source).await?;
    self.clear_offered().await?;
    tracing::info!(source, "anchors and offered registry reset");
    Ok(())
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
