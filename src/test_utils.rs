//! Test utilities and helpers for unit testing
//!
//! This module provides common test infrastructure including:
//! - In-memory database setup/teardown
//! - Mock SDK clients for both platform adapters
//! - Mock data factories

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;

use crate::googlefit::{GoogleFitClient, GoogleFitHeartRatePoint, GoogleFitSession};
use crate::healthkit::{
  HealthKitClient, HealthKitQuantitySample, HealthKitWorkout, QuantityQueryResponse,
  SwimStatistics, WorkoutQueryResponse,
};
use crate::ingest::{Anchors, HealthSource, IngestError, IngestionResult};
use crate::models::{ActivityType, CanonicalWorkout, TrainingPlanEntry};

/// Install a log subscriber so `RUST_LOG=debug cargo test -- --nocapture`
/// shows engine traces. Safe to call from every test; later calls are no-ops.
pub fn init_test_logging() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_test_writer()
    .try_init();
}

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing.
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases.
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

pub fn mock_swim_workout(id: &str, start: DateTime<Utc>) -> CanonicalWorkout {
  CanonicalWorkout {
    id: Some(id.to_string()),
    activity_type: ActivityType::Swimming,
    start_time: start,
    end_time: start + Duration::minutes(32),
    duration_seconds: Some(1920.0),
    distance_meters: Some(1500.0),
    energy_kcal: Some(420.0),
    stroke_count: None,
    source_name: Some("Apple Watch".to_string()),
    device: None,
  }
}

pub fn mock_plan_entry(id: &str, training_date: DateTime<Utc>) -> TrainingPlanEntry {
  TrainingPlanEntry {
    id: id.to_string(),
    title: format!("Session {}", id),
    training_date,
    estimated_minutes: Some(30.0),
    planned_distance_meters: None,
  }
}

/// ---------------------------------------------------------------------------
/// Mock HealthKit Client
/// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockHealthKitClient {
  workouts: Vec<HealthKitWorkout>,
  workout_anchor: Option<String>,
  workout_error: Option<String>,
  heart_rate_samples: Vec<HealthKitQuantitySample>,
  heart_rate_anchor: Option<String>,
  heart_rate_error: Option<String>,
  swim_statistics: Option<SwimStatistics>,
  swim_statistics_error: Option<String>,
}

impl MockHealthKitClient {
  pub fn with_workouts(mut self, workouts: Vec<HealthKitWorkout>, anchor: Option<&str>) -> Self {
    self.workouts = workouts;
    self.workout_anchor = anchor.map(String::from);
    self
  }

  pub fn with_workout_error(mut self, message: &str) -> Self {
    self.workout_error = Some(message.to_string());
    self
  }

  pub fn with_heart_rate_samples(
    mut self,
    samples: Vec<HealthKitQuantitySample>,
    anchor: Option<&str>,
  ) -> Self {
    self.heart_rate_samples = samples;
    self.heart_rate_anchor = anchor.map(String::from);
    self
  }

  pub fn with_heart_rate_error(mut self, message: &str) -> Self {
    self.heart_rate_error = Some(message.to_string());
    self
  }

  pub fn with_swim_statistics(mut self, statistics: SwimStatistics) -> Self {
    self.swim_statistics = Some(statistics);
    self
  }

  pub fn with_swim_statistics_error(mut self, message: &str) -> Self {
    self.swim_statistics_error = Some(message.to_string());
    self
  }
}

#[async_trait]
impl HealthKitClient for MockHealthKitClient {
  async fn query_workouts(
    &self,
    _anchor: Option<&str>,
  ) -> Result<WorkoutQueryResponse, IngestError> {
    if let Some(message) = &self.workout_error {
      return Err(IngestError::Query(message.clone()));
    }
    Ok(WorkoutQueryResponse {
      workouts: self.workouts.clone(),
      new_anchor: self.workout_anchor.clone(),
    })
  }

  async fn query_heart_rate(
    &self,
    _anchor: Option<&str>,
  ) -> Result<QuantityQueryResponse, IngestError> {
    if let Some(message) = &self.heart_rate_error {
      return Err(IngestError::Query(message.clone()));
    }
    Ok(QuantityQueryResponse {
      samples: self.heart_rate_samples.clone(),
      new_anchor: self.heart_rate_anchor.clone(),
    })
  }

  async fn swim_statistics(
    &self,
    _workout: &HealthKitWorkout,
  ) -> Result<SwimStatistics, IngestError> {
    if let Some(message) = &self.swim_statistics_error {
      return Err(IngestError::Query(message.clone()));
    }
    Ok(self.swim_statistics.clone().unwrap_or_default())
  }
}

/// ---------------------------------------------------------------------------
/// Mock Google Fit Client
/// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockGoogleFitClient {
  sessions: Vec<GoogleFitSession>,
  session_error: Option<String>,
  heart_rate_points: Vec<GoogleFitHeartRatePoint>,
  requested_sessions: std::sync::Mutex<Vec<(DateTime<Utc>, DateTime<Utc>)>>,
}

impl MockGoogleFitClient {
  pub fn with_sessions(mut self, sessions: Vec<GoogleFitSession>) -> Self {
    self.sessions = sessions;
    self
  }

  pub fn with_session_error(mut self, message: &str) -> Self {
    self.session_error = Some(message.to_string());
    self
  }

  pub fn with_heart_rate_points(mut self, points: Vec<GoogleFitHeartRatePoint>) -> Self {
    self.heart_rate_points = points;
    self
  }

  /// The (start, end) windows requested through `workout_sessions`.
  pub fn requested_session_ranges(&self) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    self.requested_sessions.lock().expect("mutex poisoned").clone()
  }
}

#[async_trait]
impl GoogleFitClient for MockGoogleFitClient {
  async fn workout_sessions(
    &self,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
  ) -> Result<Vec<GoogleFitSession>, IngestError> {
    self
      .requested_sessions
      .lock()
      .expect("mutex poisoned")
      .push((start, end));
    if let Some(message) = &self.session_error {
      return Err(IngestError::Query(message.clone()));
    }
    Ok(self.sessions.clone())
  }

  async fn heart_rate_samples(
    &self,
    _start: DateTime<Utc>,
    _end: DateTime<Utc>,
  ) -> Result<Vec<GoogleFitHeartRatePoint>, IngestError> {
    Ok(self.heart_rate_points.clone())
  }
}

/// ---------------------------------------------------------------------------
/// Mock Health Source
/// ---------------------------------------------------------------------------

/// A canned [`HealthSource`] for exercising the sync coordinator without a
/// platform adapter in the loop.
pub struct MockHealthSource {
  source_name: &'static str,
  result: IngestionResult,
  delay_ms: Option<u64>,
}

impl MockHealthSource {
  pub fn new(source_name: &'static str) -> Self {
    Self {
      source_name,
      result: IngestionResult::default(),
      delay_ms: None,
    }
  }

  pub fn with_result(mut self, result: IngestionResult) -> Self {
    self.result = result;
    self
  }

  pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
    self.delay_ms = Some(delay_ms);
    self
  }
}

#[async_trait]
impl HealthSource for MockHealthSource {
  fn source_name(&self) -> &'static str {
    self.source_name
  }

  async fn run_anchored_fetches(&self, _anchors: &Anchors) -> IngestionResult {
    if let Some(delay_ms) = self.delay_ms {
      tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
    }
    self.result.clone()
  }
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> = sqlx::query_as(
      "SELECT name FROM sqlite_master WHERE type='table' AND name IN ('sync_anchors', 'offered_workouts')",
    )
    .fetch_all(&pool)
    .await
    .expect("Failed to query tables");

    assert_eq!(tables.len(), 2, "Expected 2 tables, got {}", tables.len());

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_mock_factories_create_valid_data() {
    let start = Utc::now();
    let workout = mock_swim_workout("w1", start);
    assert!(workout.is_swim());
    assert_eq!(workout.id.as_deref(), Some("w1"));
    assert_eq!(workout.end_time - workout.start_time, Duration::minutes(32));

    let plan = mock_plan_entry("p1", start);
    assert_eq!(plan.id, "p1");
    assert_eq!(plan.estimated_minutes, Some(30.0));
  }
}
