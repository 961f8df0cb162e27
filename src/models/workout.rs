use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// HealthKit workout activity code for swimming (HKWorkoutActivityTypeSwimming).
pub const HEALTHKIT_SWIMMING_CODE: i64 = 46;

/// Google Fit session activity code for swimming.
pub const GOOGLEFIT_SWIMMING_CODE: i64 = 82;

/// Workout modality. The matcher only acts on `Swimming`; everything else is
/// carried through for display and ignored by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
  Swimming,
  Other,
}

impl ActivityType {
  pub fn from_healthkit_code(code: i64) -> Self {
    if code == HEALTHKIT_SWIMMING_CODE {
      ActivityType::Swimming
    } else {
      ActivityType::Other
    }
  }

  /// Google Fit reports activity as either a numeric code or a name like
  /// "swimming.pool"; treat any swim-flavored value as swimming.
  pub fn from_googlefit(value: &serde_json::Value) -> Self {
    match value {
      serde_json::Value::Number(n) => {
        if n.as_i64() == Some(GOOGLEFIT_SWIMMING_CODE) {
          ActivityType::Swimming
        } else {
          ActivityType::Other
        }
      }
      serde_json::Value::String(s) => {
        if s.to_lowercase().contains("swim") {
          ActivityType::Swimming
        } else {
          ActivityType::Other
        }
      }
      _ => ActivityType::Other,
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      ActivityType::Swimming => "Swimming",
      ActivityType::Other => "Workout",
    }
  }
}

/// A workout sample normalized out of a platform health store.
///
/// Constructed fresh on every ingestion call and held in memory only for the
/// duration of a matching pass. `id` is `None` when no identifier could be
/// derived; such workouts are excluded by the matcher because they cannot be
/// deduplicated safely.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalWorkout {
  pub id: Option<String>,
  pub activity_type: ActivityType,
  pub start_time: DateTime<Utc>,
  pub end_time: DateTime<Utc>,
  pub duration_seconds: Option<f64>,
  pub distance_meters: Option<f64>,
  pub energy_kcal: Option<f64>,
  pub stroke_count: Option<f64>,
  pub source_name: Option<String>,
  pub device: Option<String>,
}

impl CanonicalWorkout {
  pub fn is_swim(&self) -> bool {
    self.activity_type == ActivityType::Swimming
  }

  /// Seconds per kilometer, when distance and duration are both known.
  pub fn pace_per_km_seconds(&self) -> Option<f64> {
    match (self.distance_meters, self.duration_seconds) {
      (Some(dist), Some(dur)) if dist > 0.0 => Some((dur / dist) * 1000.0),
      _ => None,
    }
  }

  /// Seconds per 100 m, the swim-native pace unit.
  pub fn pace_per_100m_seconds(&self) -> Option<f64> {
    match (self.distance_meters, self.duration_seconds) {
      (Some(dist), Some(dur)) if dist > 0.0 => Some((dur / dist) * 100.0),
      _ => None,
    }
  }

  /// Approximate SWOLF: seconds per 100 m plus strokes per 100 m.
  /// Present only when stroke count, a positive distance, and duration are
  /// all known.
  pub fn swolf_approx(&self) -> Option<f64> {
    let pace = self.pace_per_100m_seconds()?;
    let dist = self.distance_meters.filter(|d| *d > 0.0)?;
    let strokes = self.stroke_count?;
    let strokes_per_100m = (strokes / dist) * 100.0;
    Some(pace + strokes_per_100m)
  }
}

/// A heart-rate sample ingested alongside workouts. The matcher does not use
/// these; they ride along for display and future correlation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartRateSample {
  pub bpm: f64,
  pub start_time: DateTime<Utc>,
  pub end_time: DateTime<Utc>,
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn swim(duration: Option<f64>, distance: Option<f64>, strokes: Option<f64>) -> CanonicalWorkout {
    let start = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
    CanonicalWorkout {
      id: Some("w1".to_string()),
      activity_type: ActivityType::Swimming,
      start_time: start,
      end_time: start + chrono::Duration::minutes(30),
      duration_seconds: duration,
      distance_meters: distance,
      energy_kcal: None,
      stroke_count: strokes,
      source_name: None,
      device: None,
    }
  }

  #[test]
  fn test_activity_type_mapping() {
    assert_eq!(ActivityType::from_healthkit_code(46), ActivityType::Swimming);
    assert_eq!(ActivityType::from_healthkit_code(37), ActivityType::Other);

    assert_eq!(
      ActivityType::from_googlefit(&serde_json::json!(82)),
      ActivityType::Swimming
    );
    assert_eq!(
      ActivityType::from_googlefit(&serde_json::json!("swimming.pool")),
      ActivityType::Swimming
    );
    assert_eq!(
      ActivityType::from_googlefit(&serde_json::json!("Swimming")),
      ActivityType::Swimming
    );
    assert_eq!(
      ActivityType::from_googlefit(&serde_json::json!("running")),
      ActivityType::Other
    );
    assert_eq!(ActivityType::from_googlefit(&serde_json::Value::Null), ActivityType::Other);
  }

  #[test]
  fn test_pace_per_100m() {
    // 1800s over 1500m -> 120s per 100m
    let w = swim(Some(1800.0), Some(1500.0), None);
    let pace = w.pace_per_100m_seconds().unwrap();
    assert!((pace - 120.0).abs() < 1e-9);

    // Missing distance or zero distance -> no pace
    assert!(swim(Some(1800.0), None, None).pace_per_100m_seconds().is_none());
    assert!(swim(Some(1800.0), Some(0.0), None).pace_per_100m_seconds().is_none());
  }

  #[test]
  fn test_swolf_requires_all_inputs() {
    // 1800s, 1500m, 900 strokes -> 120 + 60 = 180
    let w = swim(Some(1800.0), Some(1500.0), Some(900.0));
    let swolf = w.swolf_approx().unwrap();
    assert!((swolf - 180.0).abs() < 1e-9);

    assert!(swim(None, Some(1500.0), Some(900.0)).swolf_approx().is_none());
    assert!(swim(Some(1800.0), None, Some(900.0)).swolf_approx().is_none());
    assert!(swim(Some(1800.0), Some(0.0), Some(900.0)).swolf_approx().is_none());
    assert!(swim(Some(1800.0), Some(1500.0), None).swolf_approx().is_none());
  }
}
