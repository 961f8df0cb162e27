pub mod candidate;
pub mod plan;
pub mod workout;

pub use candidate::{MatchCandidate, OfferedRegistry};
pub use plan::TrainingPlanEntry;
pub use workout::{ActivityType, CanonicalWorkout, HeartRateSample};
