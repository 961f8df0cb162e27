//! Swim Tribe companion core.
//!
//! The native half of the Swim Tribe app: ingest workouts and heart rate
//! from the platform health store (HealthKit on iOS, Google Fit on Android),
//! normalize them into canonical records, and correlate them against the
//! training plan pushed by the embedded web content. Proposed matches are
//! surfaced for user confirmation and relayed back over the WebView bridge.
//!
//! The shell (WebView, splash, push notifications, permission prompts) lives
//! in the host app; this crate owns the data path between the health store
//! and the web content.

pub mod bridge;
pub mod config;
pub mod db;
pub mod googlefit;
pub mod healthkit;
pub mod ingest;
pub mod matcher;
pub mod models;
pub mod store;
pub mod sync;

#[cfg(test)]
pub mod test_utils;

pub use bridge::ConfirmationRelay;
pub use config::AppConfig;
pub use ingest::{Anchors, HealthSource, IngestionResult};
pub use matcher::{match_workouts_to_plans, MatchConfig, MatchOutcome};
pub use models::{CanonicalWorkout, MatchCandidate, OfferedRegistry, TrainingPlanEntry};
pub use store::AnchorStore;
pub use sync::{SyncEngine, SyncOutcome};
