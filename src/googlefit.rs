//! Google Fit ingestion adapter (Android).
//!
//! Google Fit has no anchored query API; anchors are ISO timestamps of the
//! newest sample seen, and each fetch asks for the window from the anchor
//! (or a 30-day lookback on first run) to now. Vendor records arrive loosely
//! shaped, so every field is read with the fallbacks the SDK actually
//! exhibits before mapping into [`CanonicalWorkout`].

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::ingest::{
  derive_workout_id, normalize_distance_meters, normalize_energy_kcal, normalize_stroke_count,
  sanitize_quantity, Anchors, HealthSource, IngestError, IngestionResult,
};
use crate::models::{ActivityType, CanonicalWorkout, HeartRateSample};

pub const SOURCE: &str = "googlefit";

const DEFAULT_LOOKBACK_DAYS: i64 = 30;

/// ---------------------------------------------------------------------------
/// Vendor Record Shapes
/// ---------------------------------------------------------------------------

/// A workout session as the Google Fit SDK reports it. Dates arrive as ISO
/// strings or epoch milliseconds depending on the SDK path; numeric fields
/// move between names across SDK versions, hence the fallbacks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleFitSession {
  #[serde(default)]
  pub id: Option<String>,
  #[serde(default)]
  pub session_id: Option<String>,
  #[serde(default)]
  pub source_id: Option<String>,
  #[serde(default)]
  pub start_date: Option<serde_json::Value>,
  #[serde(default)]
  pub start: Option<serde_json::Value>,
  #[serde(default)]
  pub end_date: Option<serde_json::Value>,
  #[serde(default)]
  pub end: Option<serde_json::Value>,
  #[serde(default)]
  pub activity_type: Option<serde_json::Value>,
  #[serde(default)]
  pub activity_name: Option<String>,
  #[serde(default)]
  pub activity: Option<serde_json::Value>,
  #[serde(default)]
  pub distance: Option<f64>,
  #[serde(default)]
  pub distance_meters: Option<f64>,
  #[serde(default)]
  pub total_distance: Option<f64>,
  #[serde(default)]
  pub calories: Option<f64>,
  #[serde(default)]
  pub total_energy_burned: Option<f64>,
  #[serde(default)]
  pub swimming_stroke_count: Option<f64>,
  #[serde(default)]
  pub stroke_count: Option<f64>,
  #[serde(default)]
  pub source_name: Option<String>,
}

impl GoogleFitSession {
  fn activity_value(&self) -> serde_json::Value {
    self
      .activity_type
      .clone()
      .or_else(|| self.activity_name.clone().map(serde_json::Value::String))
      .or_else(|| self.activity.clone())
      .unwrap_or(serde_json::Value::Null)
  }

  /// Map into the canonical shape, or `None` when either instant is missing
  /// or unparseable (such records cannot be placed on a timeline).
  pub fn canonicalize(&self) -> Option<CanonicalWorkout> {
    let start = coerce_date(self.start_date.as_ref().or(self.start.as_ref()))?;
    let end = coerce_date(self.end_date.as_ref().or(self.end.as_ref()))?;

    let activity = self.activity_value();
    let distance = self.distance.or(self.distance_meters).or(self.total_distance);
    let energy = self.calories.or(self.total_energy_burned);
    let strokes = self.swimming_stroke_count.or(self.stroke_count);
    let duration =
      sanitize_quantity(Some((end - start).num_milliseconds() as f64 / 1000.0));

    Some(CanonicalWorkout {
      id: derive_workout_id(
        None,
        self.id.as_deref(),
        self.session_id.as_deref().or(self.source_id.as_deref()),
        Some(start),
        Some(end),
        &activity_label(&activity),
      ),
      activity_type: ActivityType::from_googlefit(&activity),
      start_time: start,
      end_time: end,
      duration_seconds: duration,
      // Google Fit reports meters and kilocalories natively
      distance_meters: normalize_distance_meters(distance, Some("m")),
      energy_kcal: normalize_energy_kcal(energy, Some("kcal")),
      stroke_count: normalize_stroke_count(strokes),
      source_name: self.source_name.clone(),
      device: None,
    })
  }
}

/// A raw heart-rate point from the SDK.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleFitHeartRatePoint {
  pub value: f64,
  #[serde(default)]
  pub start_date: Option<serde_json::Value>,
  #[serde(default)]
  pub end_date: Option<serde_json::Value>,
}

impl GoogleFitHeartRatePoint {
  pub fn to_heart_rate(&self) -> Option<HeartRateSample> {
    Some(HeartRateSample {
      bpm: sanitize_quantity(Some(self.value))?,
      start_time: coerce_date(self.start_date.as_ref())?,
      end_time: coerce_date(self.end_date.as_ref())?,
    })
  }
}

/// Accept ISO-8601 strings or epoch milliseconds.
pub fn coerce_date(value: Option<&serde_json::Value>) -> Option<DateTime<Utc>> {
  match value? {
    serde_json::Value::String(s) => DateTime::parse_from_rfc3339(s)
      .ok()
      .map(|dt| dt.with_timezone(&Utc)),
    serde_json::Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
    _ => None,
  }
}

fn activity_label(value: &serde_json::Value) -> String {
  match value {
    serde_json::Value::String(s) => s.clone(),
    serde_json::Value::Number(n) => n.to_string(),
    _ => "unknown".to_string(),
  }
}

/// ---------------------------------------------------------------------------
/// SDK Port
/// ---------------------------------------------------------------------------

#[async_trait]
pub trait GoogleFitClient: Send + Sync {
  async fn workout_sessions(
    &self,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
  ) -> Result<Vec<GoogleFitSession>, IngestError>;

  async fn heart_rate_samples(
    &self,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
  ) -> Result<Vec<GoogleFitHeartRatePoint>, IngestError>;
}

/// ---------------------------------------------------------------------------
/// Anchored Fetch Loop
/// ---------------------------------------------------------------------------

/// Fetch both streams from their anchors (or the default lookback) to now.
/// Streams fail independently; a failed stream keeps its previous anchor so
/// the next call re-covers the same window.
pub async fn run_anchored_fetches<C: GoogleFitClient>(
  client: &C,
  anchors: &Anchors,
) -> IngestionResult {
  let now = Utc::now();
  let lookback = now - Duration::days(DEFAULT_LOOKBACK_DAYS);
  let sessions_start = parse_anchor(anchors.workouts.as_deref()).unwrap_or(lookback);
  let hr_start = parse_anchor(anchors.heart_rate.as_deref()).unwrap_or(lookback);

  let mut next_anchors = anchors.clone();
  let mut workouts = Vec::new();
  let mut heart_rates = Vec::new();

  match client.workout_sessions(sessions_start, now).await {
    Ok(raw) => {
      workouts = raw
        .iter()
        .filter_map(GoogleFitSession::canonicalize)
        .collect::<Vec<_>>();
      tracing::info!(
        fetched = raw.len(),
        mapped = workouts.len(),
        "[GoogleFit] workout fetch done"
      );
      if let Some(latest) = workouts.iter().map(|w| w.end_time).max() {
        next_anchors.workouts = Some(latest.to_rfc3339());
      }
    }
    Err(err) => {
      tracing::warn!(error = %err, "[GoogleFit] workout fetch failed");
    }
  }

  match client.heart_rate_samples(hr_start, now).await {
    Ok(raw) => {
      heart_rates = raw
        .iter()
        .filter_map(GoogleFitHeartRatePoint::to_heart_rate)
        .collect::<Vec<_>>();
      tracing::info!(count = heart_rates.len(), "[GoogleFit] heart rate fetch done");
      if let Some(latest) = heart_rates.iter().map(|s| s.end_time).max() {
        next_anchors.heart_rate = Some(latest.to_rfc3339());
      }
    }
    Err(err) => {
      tracing::warn!(error = %err, "[GoogleFit] heart rate fetch failed");
    }
  }

  IngestionResult {
    workouts,
    heart_rates,
    next_anchors,
  }
}

fn parse_anchor(anchor: Option<&str>) -> Option<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(anchor?)
    .ok()
    .map(|dt| dt.with_timezone(&Utc))
}

/// [`HealthSource`] wrapper handed to the sync coordinator.
pub struct GoogleFitSource<C> {
  client: C,
}

impl<C: GoogleFitClient> GoogleFitSource<C> {
  pub fn new(client: C) -> Self {
    Self { client }
  }
}

#[async_trait]
impl<C: GoogleFitClient> HealthSource for GoogleFitSource<C> {
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
