//! Workout-to-training-plan matching engine.
//!
//! A pure, synchronous pass over in-memory data: given canonical workouts,
//! plan entries and the registry of already-offered workout ids, produce
//! ranked match candidates for user confirmation. The engine performs no I/O
//! and cannot fail under well-formed input; absence of candidates is
//! indistinguishable from "nothing to match yet".

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveTime, Utc};

use crate::models::{CanonicalWorkout, MatchCandidate, OfferedRegistry, TrainingPlanEntry};

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

/// Symmetric tolerance around the scheduled instant. A workout starting more
/// than this far from the plan time is not offered even on the correct day.
/// The boundary is inclusive: a delta of exactly the window still matches.
pub const DEFAULT_MATCH_WINDOW_HOURS: i64 = 4;

#[derive(Debug, Clone)]
pub struct MatchConfig {
  /// Proximity tolerance, symmetric around the plan instant.
  pub window: Duration,
  /// Offset used to resolve the plan's local calendar day.
  pub tz_offset: FixedOffset,
}

impl MatchConfig {
  pub fn new(window_hours: i64, tz_offset: FixedOffset) -> Self {
    Self {
      window: Duration::hours(window_hours),
      tz_offset,
    }
  }
}

impl Default for MatchConfig {
  fn default() -> Self {
    Self::new(DEFAULT_MATCH_WINDOW_HOURS, *Local::now().offset())
  }
}

/// The output of one matching pass. `used_ids` lists the workout ids that
/// produced a candidate, one entry per candidate; the caller merges them into
/// the offered registry after the pass.
#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
  pub candidates: Vec<MatchCandidate>,
  pub used_ids: Vec<String>,
}

/// ---------------------------------------------------------------------------
/// Matching Pass
/// ---------------------------------------------------------------------------

/// Correlate workouts against plan entries, in plan-then-workout input order.
///
/// A workout survives for a given plan when it is a swim, has a derivable id
/// not yet in `offered`, starts on the plan's local calendar day, and starts
/// within the proximity window of the plan instant. A single workout may be
/// proposed for several plans within the same pass; only prior passes are
/// suppressed via the registry.
pub fn match_workouts_to_plans(
  workouts: &[CanonicalWorkout],
  plans: &[TrainingPlanEntry],
  offered: &OfferedRegistry,
  config: &MatchConfig,
) -> MatchOutcome {
  let mut outcome = MatchOutcome::default();

  let unidentifiable = workouts.iter().filter(|w| w.is_swim() && w.id.is_none()).count();
  if unidentifiable > 0 {
    tracing::debug!(count = unidentifiable, "skipping workouts with no derivable identifier");
  }

  for plan in plans {
    let (day_start, day_end) = plan_day_window(plan.training_date, config.tz_offset);

    for workout in workouts {
      if !workout.is_swim() {
        continue;
      }
      let Some(workout_id) = workout.id.as_deref() else {
        continue;
      };
      if offered.contains(workout_id) {
        continue;
      }
      // Local calendar day: [midnight, midnight + 24h)
      if workout.start_time < day_start || workout.start_time >= day_end {
        continue;
      }
      let delta = workout.start_time - plan.training_date;
      let delta = if delta < Duration::zero() { -delta } else { delta };
      if delta > config.window {
        continue;
      }

      outcome
        .candidates
        .push(build_candidate(plan, workout, workout_id, delta, config));
      outcome.used_ids.push(workout_id.to_string());
    }
  }

  outcome
}

/// UTC bounds of the plan's calendar day in the configured local offset.
fn plan_day_window(plan_start: DateTime<Utc>, tz_offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
  let local_midnight = plan_start
    .with_timezone(&tz_offset)
    .date_naive()
    .and_time(NaiveTime::MIN);
  let utc_naive = local_midnight - Duration::seconds(i64::from(tz_offset.local_minus_utc()));
  let day_start = DateTime::<Utc>::from_naive_utc_and_offset(utc_naive, Utc);
  (day_start, day_start + Duration::hours(24))
}

/// ---------------------------------------------------------------------------
/// Candidate Construction
/// ---------------------------------------------------------------------------

fn build_candidate(
  plan: &TrainingPlanEntry,
  workout: &CanonicalWorkout,
  workout_id: &str,
  delta: Duration,
  config: &MatchConfig,
) -> MatchCandidate {
  MatchCandidate {
    plan_id: plan.id.clone(),
    workout_id: workout_id.to_string(),
    title: plan.title.clone(),
    plan_start: plan.training_date,
    plan_start_display: plan
      .training_date
      .with_timezone(&config.tz_offset)
      .format("%Y-%m-%d %H:%M")
      .to_string(),
    workout_start: workout.start_time,
    distance_meters: workout.distance_meters,
    duration_seconds: workout.duration_seconds,
    energy_kcal: workout.energy_kcal,
    stroke_count: workout.stroke_count,
    pace_per_100m_seconds: workout.pace_per_100m_seconds(),
    swolf_approx: workout.swolf_approx(),
    source_name: workout.source_name.clone(),
    device: workout.device.clone(),
    reason: build_reason(plan, workout, delta),
  }
}

/// Comma-joined deltas, in fixed order; each clause only when its inputs are
/// known.
fn build_reason(plan: &TrainingPlanEntry, workout: &CanonicalWorkout, delta: Duration) -> String {
  let delta_minutes = (delta.num_milliseconds() as f64 / 60_000.0).round() as i64;
  let mut parts = vec![format!("Δtime {} min", delta_minutes)];

  if let (Some(estimated), Some(duration)) = (plan.estimated_minutes, workout.duration_seconds) {
    let diff = (duration / 60.0 - estimated).abs();
    parts.push(format!("Δduration {:.1} min", diff));
  }
  if let Some(distance) = workout.distance_meters {
    parts.push(format!("distance {:.0} m", distance));
  }
  if let (Some(planned), Some(distance)) = (plan.planned_distance_meters, workout.distance_meters) {
    parts.push(format!("Δdist {:.0} m", (distance - planned).abs()));
  }

  parts.join(", ")
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
