mod optimizer;
mod types;

pub use optimizer::optimize;
pub use types::{Capacity, CapacityStep, OptimizerConfig, ScheduleResult, SolverStatus};
