mod collector;
mod scorer;

pub use collector::{AvailabilityWindow, Collector, PassCandidate, SearchTarget, TargetPasses};
pub use scorer::{DataVolumeScorer, DurationScorer, Scorer};
