//! HealthKit ingestion adapter (iOS).
//!
//! The native HealthKit bridge is abstracted behind [`HealthKitClient`]; this
//! module runs the anchored fetch loop against it, enriches swim workouts
//! with derived statistics, and maps the vendor records into
//! [`CanonicalWorkout`]. Vendor shapes stay inside this module.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ingest::{
  derive_workout_id, normalize_distance_meters, normalize_energy_kcal, normalize_stroke_count,
  sanitize_quantity, Anchors, HealthSource, IngestError, IngestionResult,
};
use crate::models::{ActivityType, CanonicalWorkout, HeartRateSample};

pub const SOURCE: &str = "healthkit";

/// ---------------------------------------------------------------------------
/// Vendor Record Shapes
/// ---------------------------------------------------------------------------

/// A quantity with its unit, as HealthKit reports durations and statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quantity {
  pub quantity: f64,
  #[serde(default)]
  pub unit: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRevision {
  #[serde(default)]
  pub source: Option<Source>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
  pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
  pub name: String,
}

/// A workout sample as returned by the HealthKit anchored workout query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthKitWorkout {
  #[serde(default)]
  pub uuid: Option<String>,
  pub workout_activity_type: i64,
  pub start_date: DateTime<Utc>,
  pub end_date: DateTime<Utc>,
  #[serde(default)]
  pub duration: Option<Quantity>,
  #[serde(default)]
  pub total_distance: Option<f64>,
  #[serde(default)]
  pub total_distance_unit: Option<String>,
  #[serde(default)]
  pub total_energy_burned: Option<f64>,
  #[serde(default)]
  pub total_energy_burned_unit: Option<String>,
  #[serde(default)]
  pub total_swimming_stroke_count: Option<f64>,
  #[serde(default)]
  pub source_revision: Option<SourceRevision>,
  #[serde(default)]
  pub device: Option<Device>,
}

impl HealthKitWorkout {
  pub fn is_swim(&self) -> bool {
    ActivityType::from_healthkit_code(self.workout_activity_type) == ActivityType::Swimming
  }

  /// Map this vendor record into the shared canonical shape. Falls back to
  /// the elapsed interval when HealthKit supplies no duration quantity.
  pub fn canonicalize(&self) -> CanonicalWorkout {
    let duration_seconds = sanitize_quantity(self.duration.as_ref().map(|q| q.quantity))
      .or_else(|| {
        let elapsed = (self.end_date - self.start_date).num_milliseconds() as f64 / 1000.0;
        sanitize_quantity(Some(elapsed))
      });

    CanonicalWorkout {
      id: derive_workout_id(
        self.uuid.as_deref(),
        None,
        None,
        Some(self.start_date),
        Some(self.end_date),
        &self.workout_activity_type.to_string(),
      ),
      activity_type: ActivityType::from_healthkit_code(self.workout_activity_type),
      start_time: self.start_date,
      end_time: self.end_date,
      duration_seconds,
      distance_meters: normalize_distance_meters(
        self.total_distance,
        self.total_distance_unit.as_deref(),
      ),
      energy_kcal: normalize_energy_kcal(
        self.total_energy_burned,
        self.total_energy_burned_unit.as_deref(),
      ),
      stroke_count: normalize_stroke_count(self.total_swimming_stroke_count),
      source_name: self
        .source_revision
        .as_ref()
        .and_then(|r| r.source.as_ref())
        .map(|s| s.name.clone()),
      device: self.device.as_ref().map(|d| d.name.clone()),
    }
  }
}

/// A quantity sample from the anchored heart-rate query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthKitQuantitySample {
  #[serde(default)]
  pub uuid: Option<String>,
  pub quantity: f64,
  #[serde(default)]
  pub unit: Option<String>,
  pub start_date: DateTime<Utc>,
  pub end_date: DateTime<Utc>,
}

impl HealthKitQuantitySample {
  pub fn to_heart_rate(&self) -> Option<HeartRateSample> {
    Some(HeartRateSample {
      bpm: sanitize_quantity(Some(self.quantity))?,
      start_time: self.start_date,
      end_time: self.end_date,
    })
  }
}

/// Swim statistics queried per workout (distance swum, active energy,
/// stroke count), already in canonical units.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwimStatistics {
  pub distance_meters: Option<f64>,
  pub energy_kcal: Option<f64>,
  pub stroke_count: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutQueryResponse {
  #[serde(default)]
  pub workouts: Vec<HealthKitWorkout>,
  #[serde(default)]
  pub new_anchor: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantityQueryResponse {
  #[serde(default)]
  pub samples: Vec<HealthKitQuantitySample>,
  #[serde(default)]
  pub new_anchor: Option<String>,
}

/// ---------------------------------------------------------------------------
/// SDK Port
/// ---------------------------------------------------------------------------

/// The native HealthKit boundary. Anchors are opaque HKQueryAnchor blobs;
/// passing the anchor from a previous response returns only newer samples.
#[async_trait]
pub trait HealthKitClient: Send + Sync {
  async fn query_workouts(&self, anchor: Option<&str>)
    -> Result<WorkoutQueryResponse, IngestError>;

  async fn query_heart_rate(&self, anchor: Option<&str>)
    -> Result<QuantityQueryResponse, IngestError>;

  /// Derived statistics for one workout (swim distance, active energy,
  /// stroke count).
  async fn swim_statistics(&self, workout: &HealthKitWorkout)
    -> Result<SwimStatistics, IngestError>;
}

/// ---------------------------------------------------------------------------
/// Anchored Fetch Loop
/// ---------------------------------------------------------------------------

/// Fetch workouts and heart rate since the given anchors.
///
/// Each stream fails independently: a failed query is logged, its samples
/// stay empty and its anchor is left unchanged so the next call retries the
/// same range. Swim workouts are enriched with derived statistics so the
/// matcher has distance/energy/strokes available; enrichment failures
/// degrade to missing fields.
pub async fn run_anchored_fetches<C: HealthKitClient>(
  client: &C,
  anchors: &Anchors,
) -> IngestionResult {
  let mut next_anchors = anchors.clone();
  let mut raw_workouts = Vec::new();
  let mut heart_rates = Vec::new();

  match client.query_workouts(anchors.workouts.as_deref()).await {
    Ok(resp) => {
      tracing::info!(count = resp.workouts.len(), "[HealthKit] workout anchor query done");
      raw_workouts = resp.workouts;
      if let Some(anchor) = resp.new_anchor {
        next_anchors.workouts = Some(anchor);
      }
    }
    Err(err) => {
      tracing::warn!(error = %err, "[HealthKit] workout anchor query failed");
    }
  }

  for workout in &mut raw_workouts {
    if !workout.is_swim() {
      continue;
    }
    match client.swim_statistics(workout).await {
      Ok(stats) => {
        if let Some(distance) = stats.distance_meters {
          workout.total_distance = Some(distance);
          workout.total_distance_unit = Some("m".to_string());
        }
        if let Some(energy) = stats.energy_kcal {
          workout.total_energy_burned = Some(energy);
          workout.total_energy_burned_unit = Some("kcal".to_string());
        }
        if let Some(strokes) = stats.stroke_count {
          workout.total_swimming_stroke_count = Some(strokes);
        }
      }
      Err(err) => {
        tracing::warn!(error = %err, "[HealthKit] failed to enrich swim workout stats");
      }
    }
  }

  match client.query_heart_rate(anchors.heart_rate.as_deref()).await {
    Ok(resp) => {
      tracing::info!(count = resp.samples.len(), "[HealthKit] heart rate anchor query done");
      heart_rates = resp
        .samples
        .iter()
        .filter_map(HealthKitQuantitySample::to_heart_rate)
        .collect();
      if let Some(anchor) = resp.new_anchor {
        next_anchors.heart_rate = Some(anchor);
      }
    }
    Err(err) => {
      tracing::warn!(error = %err, "[HealthKit] heart rate anchor query failed");
    }
  }

  IngestionResult {
    workouts: raw_workouts.iter().map(HealthKitWorkout::canonicalize).collect(),
    heart_rates,
    next_anchors,
  }
}

/// [`HealthSource`] wrapper handed to the sync coordinator.
pub struct HealthKitSource<C> {
  client: C,
}

impl<C: HealthKitClient> HealthKitSource<C> {
  pub fn new(client: C) -> Self {
    Self { client }
  }
}

#[async_trait]
impl<C: HealthKitClient> HealthSource for HealthKitSource<C> {
  fn source_name(&self) -> &'static str {
    SOURCE
  }

  async fn run_anchored_fetches(&self, anchors: &Anchors) -> IngestionResult {
    run_anchored_fetches(&self.client, anchors).await
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
