//! Event-driven sync coordinator.
//!
//! Owns the working snapshot (plan entries, last-ingested workouts, the
//! offered registry) and re-runs the matching pass whenever either input set
//! changes: a plan push from the web content, or a completed ingestion.
//! Ingestion is single-flight: concurrent triggers are no-ops while a fetch
//! is in the air. The registry has one writer (this coordinator); the matcher
//! only reads it and reports the ids it used.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;

use crate::bridge::{self, BridgeError, ConfirmationRelay, InboundMessage};
use crate::ingest::HealthSource;
use crate::matcher::{match_workouts_to_plans, MatchConfig};
use crate::models::{
  CanonicalWorkout, HeartRateSample, MatchCandidate, OfferedRegistry, TrainingPlanEntry,
};
use crate::store::{AnchorStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
  #[error("Storage error: {0}")]
  Store(#[from] StoreError),

  #[error("Bridge error: {0}")]
  Bridge(#[from] BridgeError),
}

/// Result of one sync trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
  Completed {
    new_workouts: usize,
    new_heart_rates: usize,
    candidates: usize,
  },
  /// Another ingestion call was already in flight; this trigger was a no-op.
  AlreadyRunning,
}

#[derive(Default)]
struct EngineState {
  plans: Vec<TrainingPlanEntry>,
  workouts: Vec<CanonicalWorkout>,
  heart_rates: Vec<HeartRateSample>,
  offered: OfferedRegistry,
  candidates: Vec<MatchCandidate>,
}

pub struct SyncEngine<S: HealthSource> {
  source: S,
  store: AnchorStore,
  relay: ConfirmationRelay,
  config: MatchConfig,
  state: Mutex<EngineState>,
  ingest_in_flight: AtomicBool,
}

impl<S: HealthSource> SyncEngine<S> {
  /// Build the engine, rehydrating the offered registry from storage so
  /// matches surfaced in earlier runs stay suppressed.
  pub async fn new(
    source: S,
    store: AnchorStore,
    relay: ConfirmationRelay,
    config: MatchConfig,
  ) -> Result<Self, SyncError> {
    let offered = store.load_offered().await?;
    tracing::info!(offered = offered.len(), "sync engine ready");

    Ok(Self {
      source,
      store,
      relay,
      config,
      state: Mutex::new(EngineState {
        offered,
        ..Default::default()
      }),
      ingest_in_flight: AtomicBool::new(false),
    })
  }

  /// ---------------------------------------------------------------------------
  /// Inputs
  /// ---------------------------------------------------------------------------

  /// Route a raw message from the WebView bridge. Malformed messages are
  /// logged and dropped; a `planTrainings` push replaces the plan snapshot
  /// and re-runs the matcher.
  pub async fn handle_bridge_message(&self, raw: &str) -> Result<(), SyncError> {
    match bridge::parse_message(raw) {
      Ok(InboundMessage::Log { payload }) => {
        tracing::info!(?payload, "[WebView] log");
        Ok(())
      }
      Ok(InboundMessage::PlanTrainings { trainings }) => {
        let entries = bridge::parse_plan_entries(&trainings);
        tracing::info!(count = entries.len(), "[WebView] received plan trainings");
        self.set_plan_entries(entries).await?;
        Ok(())
      }
      Err(err) => {
        tracing::warn!(error = %err, "[WebView] bad message");
        Ok(())
      }
    }
  }

  /// Replace the plan snapshot and re-run the matcher against the workouts
  /// already in memory.
  pub async fn set_plan_entries(
    &self,
    entries: Vec<TrainingPlanEntry>,
  ) -> Result<Vec<MatchCandidate>, SyncError> {
    let mut state = self.state.lock().await;
    state.plans = entries;
    self.rematch(&mut state).await
  }

  /// Run one anchored ingestion and re-run the matcher with the result.
  /// Only one ingestion call may be in flight at a time; concurrent triggers
  /// return [`SyncOutcome::AlreadyRunning`].
  pub async fn sync(&self) -> Result<SyncOutcome, SyncError> {
    if self.ingest_in_flight.swap(true, Ordering::SeqCst) {
      tracing::info!("ingestion already in flight; trigger ignored");
      return Ok(SyncOutcome::AlreadyRunning);
    }

    let outcome = self.sync_inner().await;
    self.ingest_in_flight.store(false, Ordering::SeqCst);
    outcome
  }

  async fn sync_inner(&self) -> Result<SyncOutcome, SyncError> {
    let source = self.source.source_name();
    let anchors = self.store.load_anchors(source).await?;
    let result = self.source.run_anchored_fetches(&anchors).await;
    self.store.save_anchors(source, &result.next_anchors).await?;

    let mut state = self.state.lock().await;
    state.workouts = result.workouts;
    state.heart_rates = result.heart_rates;
    let new_workouts = state.workouts.len();
    let new_heart_rates = state.heart_rates.len();
    let candidates = self.rematch(&mut state).await?;

    tracing::info!(
      source,
      workouts = new_workouts,
      heart_rates = new_heart_rates,
      candidates = candidates.len(),
      "sync complete"
    );

    Ok(SyncOutcome::Completed {
      new_workouts,
      new_heart_rates,
      candidates: candidates.len(),
    })
  }

  /// One matching pass over the current snapshot. The registry is read at
  /// pass start and the pass's used ids are merged (and persisted) at pass
  /// end.
  async fn rematch(
    &self,
    state: &mut EngineState,
  ) -> Result<Vec<MatchCandidate>, SyncError> {
    let outcome =
      match_workouts_to_plans(&state.workouts, &state.plans, &state.offered, &self.config);

    if !outcome.used_ids.is_empty() {
      self.store.record_offered(&outcome.used_ids).await?;
    }
    state.offered.merge(&outcome.used_ids);
    state.candidates = outcome.candidates.clone();

    Ok(outcome.candidates)
  }

  /// ---------------------------------------------------------------------------
  /// Review Surface
  /// ---------------------------------------------------------------------------

  pub async fn candidates(&self) -> Vec<MatchCandidate> {
    self.state.lock().await.candidates.clone()
  }

  /// Relay a user-confirmed candidate to the web content. Returns `false`
  /// when the candidate is no longer current (superseded by a newer pass).
  pub async fn confirm_match(&self, plan_id: &str, workout_id: &str) -> Result<bool, SyncError> {
    let mut state = self.state.lock().await;
    let Some(position) = state
      .candidates
      .iter()
      .position(|c| c.plan_id == plan_id && c.workout_id == workout_id)
    else {
      return Ok(false);
    };

    let candidate = state.candidates.remove(position);
    match state
      .workouts
      .iter()
      .find(|w| w.id.as_deref() == Some(workout_id))
    {
      Some(workout) => self.relay.send_confirmed(&candidate, workout)?,
      None => {
        tracing::warn!(workout_id, "confirmed candidate has no backing workout in snapshot");
      }
    }
    Ok(true)
  }

  /// Drop a candidate the user rejected. Its workout stays in the registry,
  /// so it will not be re-offered.
  pub async fn dismiss_candidate(&self, plan_id: &str, workout_id: &str) -> bool {
    let mut state = self.state.lock().await;
    let before = state.candidates.len();
    state
      .candidates
      .retain(|c| !(c.plan_id == plan_id && c.workout_id == workout_id));
    state.candidates.len() != before
  }

  /// ---------------------------------------------------------------------------
  /// Reset
  /// ---------------------------------------------------------------------------

  /// Explicit reset: clear the source's anchors and the offered registry so
  /// the next fetch reads everything and may legitimately re-offer it.
  pub async fn reset(&self) -> Result<(), SyncError> {
    self.store.reset_source(self.source.source_name()).await?;

    let mut state = self.state.lock().await;
    state.offered.clear();
    state.workouts.clear();
    state.heart_rates.clear();
    state.candidates.clear();
    Ok(())
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
