use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One scheduled session from the training plan pushed by the web content.
///
/// Plan pushes are snapshots: a new push fully replaces the working set the
/// matcher sees. `trainingDate` arrives either as an ISO-8601 string or as
/// epoch milliseconds, depending on the web build.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingPlanEntry {
  pub id: String,
  pub title: String,
  #[serde(deserialize_with = "deserialize_training_date")]
  pub training_date: DateTime<Utc>,
  #[serde(default)]
  pub estimated_minutes: Option<f64>,
  #[serde(default)]
  pub planned_distance_meters: Option<f64>,
}

/// Accept ISO-8601 strings or epoch-millisecond numbers for the scheduled
/// instant.
pub fn parse_training_date(value: &serde_json::Value) -> Option<DateTime<Utc>> {
  match value {
    serde_json::Value::String(s) => DateTime::parse_from_rfc3339(s)
      .ok()
      .map(|dt| dt.with_timezone(&Utc)),
    serde_json::Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
    _ => None,
  }
}

fn deserialize_training_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = serde_json::Value::deserialize(deserializer)?;
  parse_training_date(&value)
    .ok_or_else(|| serde::de::Error::custom(format!("unparseable training date: {}", value)))
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
