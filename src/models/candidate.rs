use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A proposed pairing between one planned session and one recorded workout,
/// pending user confirmation. Computed fresh on every matching pass and never
/// persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCandidate {
  pub plan_id: String,
  pub workout_id: String,
  /// Plan display title.
  pub title: String,
  pub plan_start: DateTime<Utc>,
  /// Plan start rendered in the matcher's local offset, for the review UI.
  pub plan_start_display: String,
  pub workout_start: DateTime<Utc>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub distance_meters: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub duration_seconds: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub energy_kcal: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub stroke_count: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub pace_per_100m_seconds: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub swolf_approx: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub source_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub device: Option<String>,
  /// Comma-joined human-readable deltas that justified the match.
  pub reason: String,
}

/// Workout ids that have already been surfaced as part of some candidate.
///
/// The matcher reads the registry and reports the ids it used; the caller
/// merges them back in after the pass, keeping a single writer over this
/// state. Cleared on anchor reset.
#[derive(Debug, Clone, Default)]
pub struct OfferedRegistry {
  ids: HashSet<String>,
}

impl OfferedRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn from_ids<I: IntoIterator<Item = String>>(ids: I) -> Self {
    Self {
      ids: ids.into_iter().collect(),
    }
  }

  pub fn contains(&self, id: &str) -> bool {
    self.ids.contains(id)
  }

  pub fn merge(&mut self, used_ids: &[String]) {
    for id in used_ids {
      self.ids.insert(id.clone());
    }
  }

  pub fn clear(&mut self) {
    self.ids.clear();
  }

  pub fn len(&self) -> usize {
    self.ids.len()
  }

  pub fn is_empty(&self) -> bool {
    self.ids.is_empty()
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
