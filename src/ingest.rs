//! Shared ingestion contract for the platform health adapters.
//!
//! Both adapters produce the same shape: canonical workouts and heart-rate
//! samples fetched since the last anchors, plus the anchors to persist for
//! the next incremental call. Vendor-shaped records never leave the adapter
//! modules; only `CanonicalWorkout` crosses into the matcher.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{CanonicalWorkout, HeartRateSample};

/// Anchor stream names, matching the `sync_anchors.stream` column.
pub const WORKOUTS_STREAM: &str = "workouts";
pub const HEART_RATE_STREAM: &str = "heart_rate";

/// Opaque incremental-sync cursors, one per data stream.
///
/// HealthKit anchors are serialized HKQueryAnchor blobs; Google Fit anchors
/// are ISO timestamps of the newest sample seen. Both are opaque here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anchors {
  pub workouts: Option<String>,
  pub heart_rate: Option<String>,
}

/// The result of one anchored ingestion call.
#[derive(Debug, Clone, Default)]
pub struct IngestionResult {
  pub workouts: Vec<CanonicalWorkout>,
  pub heart_rates: Vec<HeartRateSample>,
  pub next_anchors: Anchors,
}

/// Recoverable ingestion failures. These never escape an adapter's anchored
/// fetch as a crash; the failed stream is logged and left empty so a matching
/// pass simply has nothing new to chew on.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
  #[error("health store unavailable: {0}")]
  Unavailable(String),

  #[error("authorization denied: {0}")]
  Unauthorized(String),

  #[error("health store query failed: {0}")]
  Query(String),
}

/// Platform-neutral face of an ingestion adapter, consumed by the sync
/// coordinator. One implementation per health source.
#[async_trait]
pub trait HealthSource: Send + Sync {
  /// Stable source key, also used as the `sync_anchors.source` column.
  fn source_name(&self) -> &'static str;

  /// Fetch everything newer than `anchors`. Never fails outward: a failed
  /// stream is logged and returned empty with its anchor unchanged.
  async fn run_anchored_fetches(&self, anchors: &Anchors) -> IngestionResult;
}

/// ---------------------------------------------------------------------------
/// Workout Identifier Derivation
/// ---------------------------------------------------------------------------

/// Derive a stable workout id with the fallback chain:
/// vendor UUID, then generic id, then session id, then a synthetic
/// `"{start}-{end}-{activity}"` key when both instants are known.
///
/// Returns `None` when nothing resolves; such workouts cannot be deduplicated
/// and are excluded from matching.
pub fn derive_workout_id(
  uuid: Option<&str>,
  id: Option<&str>,
  session_id: Option<&str>,
  start: Option<DateTime<Utc>>,
  end: Option<DateTime<Utc>>,
  activity: &str,
) -> Option<String> {
  let present = |v: Option<&str>| v.filter(|s| !s.is_empty()).map(String::from);

  present(uuid)
    .or_else(|| present(id))
    .or_else(|| present(session_id))
    .or_else(|| match (start, end) {
      (Some(start), Some(end)) => Some(format!(
        "{}-{}-{}",
        start.to_rfc3339(),
        end.to_rfc3339(),
        activity
      )),
      _ => None,
    })
}

/// ---------------------------------------------------------------------------
/// Unit Normalization
/// ---------------------------------------------------------------------------

/// Normalize a vendor distance to meters. `m` passes through, `km` scales;
/// an unrecognized unit passes the raw value through as a best effort.
pub fn normalize_distance_meters(value: Option<f64>, unit: Option<&str>) -> Option<f64> {
  let value = sanitize_quantity(value)?;
  match unit {
    Some("km") => Some(value * 1000.0),
    _ => Some(value),
  }
}

/// Normalize a vendor energy value to kilocalories. `kcal` passes through,
/// `cal` scales down; an unrecognized unit passes through.
pub fn normalize_energy_kcal(value: Option<f64>, unit: Option<&str>) -> Option<f64> {
  let value = sanitize_quantity(value)?;
  match unit {
    Some("cal") => Some(value / 1000.0),
    _ => Some(value),
  }
}

/// Stroke counts carry no unit conversion, only sanitation.
pub fn normalize_stroke_count(value: Option<f64>) -> Option<f64> {
  sanitize_quantity(value)
}

/// Malformed numeric fields (non-finite or negative) degrade to unknown
/// rather than faulting.
pub fn sanitize_quantity(value: Option<f64>) -> Option<f64> {
  value.filter(|v| v.is_finite() && *v >= 0.0)
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
