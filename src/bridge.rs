//! Message passing with the embedded web content.
//!
//! Inbound, the web app posts JSON envelopes (`log`, `planTrainings`) through
//! the WebView bridge; outbound, confirmed matches are serialized and handed
//! to the shell for delivery. The transport itself is the shell's concern;
//! this module only owns the payload shapes and the fire-and-forget relay
//! channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::models::{CanonicalWorkout, MatchCandidate, TrainingPlanEntry};

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
  #[error("Bad message from webview: {0}")]
  Malformed(#[from] serde_json::Error),

  #[error("Bridge channel closed")]
  ChannelClosed,
}

/// ---------------------------------------------------------------------------
/// Inbound Messages
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum InboundMessage {
  /// Console forwarding from the web content.
  #[serde(rename = "log")]
  Log {
    #[serde(default)]
    payload: Vec<serde_json::Value>,
  },

  /// A full training-plan snapshot. Replaces any prior plan state.
  #[serde(rename = "planTrainings")]
  PlanTrainings {
    #[serde(default)]
    trainings: Vec<serde_json::Value>,
  },
}

pub fn parse_message(raw: &str) -> Result<InboundMessage, BridgeError> {
  Ok(serde_json::from_str(raw)?)
}

/// Decode the entries of a `planTrainings` push individually, dropping the
/// ones that do not parse so one bad row cannot take down the snapshot.
pub fn parse_plan_entries(trainings: &[serde_json::Value]) -> Vec<TrainingPlanEntry> {
  trainings
    .iter()
    .filter_map(|value| match serde_json::from_value::<TrainingPlanEntry>(value.clone()) {
      Ok(entry) => Some(entry),
      Err(err) => {
        tracing::warn!(error = %err, "dropping unparseable plan entry");
        None
      }
    })
    .collect()
}

/// ---------------------------------------------------------------------------
/// Outbound Messages
/// ---------------------------------------------------------------------------

/// The payload relayed to the web content when the user confirms a match.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedMatch {
  pub plan_id: String,
  pub title: String,
  pub plan_start: DateTime<Utc>,
  pub workout_id: String,
  pub workout_start: DateTime<Utc>,
  pub workout_end: DateTime<Utc>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub distance_meters: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub duration_seconds: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub energy_kcal: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub stroke_count: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub swolf_approx: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub source_name: Option<String>,
  pub reason: String,
}

impl ConfirmedMatch {
  pub fn new(candidate: &MatchCandidate, workout: &CanonicalWorkout) -> Self {
    Self {
      plan_id: candidate.plan_id.clone(),
      title: candidate.title.clone(),
      plan_start: candidate.plan_start,
      workout_id: candidate.workout_id.clone(),
      workout_start: workout.start_time,
      workout_end: workout.end_time,
      distance_meters: workout.distance_meters,
      duration_seconds: workout.duration_seconds,
      energy_kcal: workout.energy_kcal,
      stroke_count: workout.stroke_count,
      swolf_approx: workout.swolf_approx(),
      source_name: workout.source_name.clone(),
      reason: candidate.reason.clone(),
    }
  }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum OutboundMessage {
  #[serde(rename = "matchConfirmed")]
  MatchConfirmed(ConfirmedMatch),
}

/// ---------------------------------------------------------------------------
/// Confirmation Relay
/// ---------------------------------------------------------------------------

/// Fire-and-forget sender for outbound payloads. The shell drains the
/// receiving end into `postMessage`; the engine never observes a reply.
#[derive(Debug, Clone)]
pub struct ConfirmationRelay {
  tx: mpsc::UnboundedSender<String>,
}

impl ConfirmationRelay {
  pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Self { tx }, rx)
  }

  pub fn send_confirmed(
    &self,
    candidate: &MatchCandidate,
    workout: &CanonicalWorkout,
  ) -> Result<(), BridgeError> {
    let message = OutboundMessage::MatchConfirmed(ConfirmedMatch::new(candidate, workout));
    let payload = serde_json::to_string(&message)?;
    self.tx.send(payload).map_err(|_| BridgeError::ChannelClosed)
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
