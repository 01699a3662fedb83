use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverStatus {
    /// Proven best selection.
    Optimal,
    /// Valid selection, search stopped at the node limit before proof.
    Feasible,
    /// Valid selection, search stopped at the time budget before proof.
    Timeout,
    /// No valid selection exists; unreachable in practice because the empty
    /// selection is always valid.
    Infeasible,
}

/// Selected candidate indices (into the caller's candidate slice, ascending)
/// plus the achieved objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResult {
    pub selected: Vec<usize>,
    pub objective: f64,
    pub status: SolverStatus,
}

impl ScheduleResult {
    pub fn empty(status: SolverStatus) -> Self {
        Self {
            selected: Vec::new(),
            objective: 0.0,
            status,
        }
    }
}

/// Piecewise-constant capacity: `max_concurrent` applies from `from` until
/// the next step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CapacityStep {
    pub from: DateTime<Utc>,
    pub max_concurrent: usize,
}

/// How many candidates may be serviced at the same instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Capacity {
    Constant(usize),
    Profile(Vec<CapacityStep>),
}

impl Capacity {
    /// Build a profile, sorting the steps by their start time.
    pub fn profile(mut steps: Vec<CapacityStep>) -> Self {
        steps.sort_by_key(|s| s.from);
        Capacity::Profile(steps)
    }

    /// Capacity in force at `t`. Before the first profile step nothing may
    /// be scheduled.
    pub fn at(&self, t: DateTime<Utc>) -> usize {
        match self {
            Capacity::Constant(k) => *k,
            Capacity::Profile(steps) => steps
                .iter()
                .rev()
                .find(|s| s.from <= t)
                .map(|s| s.max_concurrent)
                .unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OptimizerConfig {
    /// Wall-clock budget; exceeding it returns the best selection found so
    /// far with status `Timeout`.
    pub time_budget: std::time::Duration,
    /// Search-node cap; exceeding it returns status `Feasible`.
    pub max_nodes: u64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            time_budget: std::time::Duration::from_secs(8),
            max_nodes: 50_000_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn profile_lookup_picks_the_latest_started_step() {
        let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let cap = Capacity::profile(vec![
            CapacityStep {
                from: t0 + chrono::Duration::hours(1),
                max_concurrent: 3,
            },
            CapacityStep {
                from: t0,
                max_concurrent: 1,
            },
        ]);

        assert_eq!(cap.at(t0 - chrono::Duration::seconds(1)), 0);
        assert_eq!(cap.at(t0), 1);
        assert_eq!(cap.at(t0 + chrono::Duration::minutes(59)), 1);
        assert_eq!(cap.at(t0 + chrono::Duration::hours(2)), 3);
    }
}
