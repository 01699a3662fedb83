pub mod collect;
pub mod horizon;
pub mod passes;
pub mod planner;
pub mod predict;
pub mod schedule;

#[cfg(test)]
pub(crate) mod sim;

pub use collect::{
    AvailabilityWindow, Collector, DataVolumeScorer, DurationScorer, PassCandidate, Scorer,
    SearchTarget, TargetPasses,
};
pub use horizon::{
    GridTerrain, HorizonMask, InMemoryMaskStore, MaskBuilder, MaskError, MaskStore,
    SyntheticTerrain, TerrainModel,
};
pub use passes::{PassError, PassFinder, PassWindow, SearchConfig};
pub use planner::{
    PassSearchRequest, PassSearchResponse, Planner, PlannerError, ScheduleRequest,
    ScheduleResponse, ScheduledPass, TargetReport,
};
pub use predict::{Observer, PropagationError, Propagator, Satellite, TopocentricSample};
pub use schedule::{optimize, Capacity, CapacityStep, OptimizerConfig, ScheduleResult, SolverStatus};
