use std::time::Instant;

use super::types::{Capacity, OptimizerConfig, ScheduleResult, SolverStatus};
use crate::collect::PassCandidate;

/// Pick a value-maximizing subset of candidates whose concurrent activity
/// never exceeds the capacity.
///
/// Capacity 1 is solved by the exact weighted-interval dynamic program.
/// Anything else uses depth-first branch and bound over the breakpoint
/// formulation: concurrency can only change where a candidate starts or
/// ends, so bounding the active count at every such timestamp is exact.
///
/// Intervals are half-open `[rise, set)`: a pass ending exactly when
/// another starts does not conflict with it. Ties between equally valuable
/// selections resolve to the first one reached in deterministic search
/// order, which prefers lower candidate indices. Candidates with
/// non-positive value are never selected.
pub fn optimize(
    candidates: &[PassCandidate],
    capacity: &Capacity,
    config: &OptimizerConfig,
) -> ScheduleResult {
    if candidates.is_empty() {
        return ScheduleResult::empty(SolverStatus::Optimal);
    }

    let mut items: Vec<Item> = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| c.value > 0.0)
        .map(|(index, c)| Item {
            index,
            start_ms: c.window.rise.timestamp_millis(),
            end_ms: c.window.set.timestamp_millis(),
            value: c.value,
        })
        .collect();
    items.sort_by(|a, b| {
        (a.end_ms, a.start_ms, a.index).cmp(&(b.end_ms, b.start_ms, b.index))
    });

    let result = match capacity {
        Capacity::Constant(1) => interval_dp(&items),
        _ => branch_and_bound(&items, capacity, config),
    };
    log::debug!(
        "schedule over {} candidates: {} selected, objective {:.1}, {:?}",
        candidates.len(),
        result.selected.len(),
        result.objective,
        result.status
    );
    result
}

struct Item {
    index: usize,
    start_ms: i64,
    end_ms: i64,
    value: f64,
}

/// Classic O(n log n) weighted interval scheduling over items sorted by end
/// time. On ties the later-ending candidate is dropped, so the result is
/// deterministic.
fn interval_dp(items: &[Item]) -> ScheduleResult {
    let n = items.len();
    // predecessor: latest item ending at or before this item's start
    let pred: Vec<usize> = items
        .iter()
        .map(|item| {
            items.partition_point(|other| other.end_ms <= item.start_ms)
        })
        .collect();

    let mut best = vec![0.0f64; n + 1];
    for i in 1..=n {
        let with = items[i - 1].value + best[pred[i - 1]];
        best[i] = if with > best[i - 1] { with } else { best[i - 1] };
    }

    let mut selected = Vec::new();
    let mut i = n;
    while i > 0 {
        if best[i] > best[i - 1] {
            selected.push(items[i - 1].index);
            i = pred[i - 1];
        } else {
            i -= 1;
        }
    }
    selected.sort_unstable();

    ScheduleResult {
        selected,
        objective: best[n],
        status: SolverStatus::Optimal,
    }
}

struct Search<'a> {
    items: &'a [Item],
    /// Breakpoint indices each item occupies.
    active: Vec<Vec<usize>>,
    caps: Vec<usize>,
    usage: Vec<usize>,
    suffix: Vec<f64>,
    chosen: Vec<usize>,
    best_value: f64,
    best_selection: Vec<usize>,
    nodes: u64,
    max_nodes: u64,
    deadline: Instant,
    stopped: Option<SolverStatus>,
}

fn branch_and_bound(items: &[Item], capacity: &Capacity, config: &OptimizerConfig) -> ScheduleResult {
    let mut breakpoints: Vec<i64> = items
        .iter()
        .flat_map(|i| [i.start_ms, i.end_ms])
        .collect();
    breakpoints.sort_unstable();
    breakpoints.dedup();

    let active = items
        .iter()
        .map(|item| {
            breakpoints
                .iter()
                .enumerate()
                .filter(|(_, &t)| item.start_ms <= t && t < item.end_ms)
                .map(|(bp, _)| bp)
                .collect()
        })
        .collect();

    let caps = breakpoints
        .iter()
        .map(|&ms| {
            let t = chrono::DateTime::from_timestamp_millis(ms)
                .unwrap_or_else(chrono::Utc::now);
            capacity.at(t)
        })
        .collect();

    let mut suffix = vec![0.0; items.len() + 1];
    for i in (0..items.len()).rev() {
        suffix[i] = suffix[i + 1] + items[i].value;
    }

    let mut search = Search {
        items,
        active,
        caps,
        usage: vec![0; breakpoints.len()],
        suffix,
        chosen: Vec::new(),
        best_value: 0.0,
        best_selection: Vec::new(),
        nodes: 0,
        max_nodes: config.max_nodes,
        deadline: Instant::now() + config.time_budget,
        stopped: None,
    };
    search.dfs(0, 0.0);

    let mut selected = search.best_selection;
    selected.sort_unstable();
    ScheduleResult {
        selected,
        objective: search.best_value,
        status: search.stopped.unwrap_or(SolverStatus::Optimal),
    }
}

impl Search<'_> {
    /// Returns true when the search was cut off and must unwind.
    fn dfs(&mut self, i: usize, value: f64) -> bool {
        self.nodes += 1;
        if Instant::now() >= self.deadline {
            self.stopped = Some(SolverStatus::Timeout);
            return true;
        }
        if self.nodes > self.max_nodes {
            self.stopped = Some(SolverStatus::Feasible);
            return true;
        }

        if i == self.items.len() {
            // Strict improvement only: the first selection reached wins ties.
            if value > self.best_value {
                self.best_value = value;
                self.best_selection = self
                    .chosen
                    .iter()
                    .map(|&pos| self.items[pos].index)
                    .collect();
            }
            return false;
        }

        if value + self.suffix[i] <= self.best_value {
            return false;
        }

        if self.fits(i) {
            self.apply(i, 1);
            self.chosen.push(i);
            let cut = self.dfs(i + 1, value + self.items[i].value);
            self.chosen.pop();
            self.apply(i, -1);
            if cut {
                return true;
            }
        }

        self.dfs(i + 1, value)
    }

    fn fits(&self, i: usize) -> bool {
        self.active[i]
            .iter()
            .all(|&bp| self.usage[bp] < self.caps[bp])
    }

    fn apply(&mut self, i: usize, delta: i64) {
        for &bp in &self.active[i] {
            self.usage[bp] = (self.usage[bp] as i64 + delta) as usize;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::PassWindow;
    use crate::schedule::types::CapacityStep;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()
    }

    fn candidate(id: &str, start_s: i64, end_s: i64, value: f64) -> PassCandidate {
        let rise = t0() + Duration::seconds(start_s);
        let set = t0() + Duration::seconds(end_s);
        PassCandidate {
            satellite_id: id.to_string(),
            window: PassWindow {
                rise,
                culmination: rise + (set - rise) / 2,
                set,
                max_elevation_deg: 45.0,
                rise_azimuth_deg: 0.0,
                set_azimuth_deg: 180.0,
                duration_s: (end_s - start_s) as f64,
            },
            value,
            min_elevation_deg: None,
        }
    }

    fn abc() -> Vec<PassCandidate> {
        vec![
            candidate("a", 0, 10, 5.0),
            candidate("b", 5, 15, 8.0),
            candidate("c", 10, 20, 5.0),
        ]
    }

    #[test]
    fn empty_input_is_trivially_optimal() {
        let result = optimize(&[], &Capacity::Constant(1), &OptimizerConfig::default());
        assert_eq!(result, ScheduleResult::empty(SolverStatus::Optimal));
    }

    #[test]
    fn capacity_one_prefers_the_dominating_pair() {
        let result = optimize(&abc(), &Capacity::Constant(1), &OptimizerConfig::default());
        assert_eq!(result.selected, vec![0, 2]);
        assert_eq!(result.objective, 10.0);
        assert_eq!(result.status, SolverStatus::Optimal);
    }

    #[test]
    fn capacity_two_admits_the_overlap() {
        let result = optimize(&abc(), &Capacity::Constant(2), &OptimizerConfig::default());
        assert_eq!(result.selected, vec![0, 1, 2]);
        assert_eq!(result.objective, 18.0);
        assert_eq!(result.status, SolverStatus::Optimal);
    }

    #[test]
    fn touching_intervals_do_not_conflict() {
        let candidates = vec![candidate("a", 0, 10, 5.0), candidate("b", 10, 20, 5.0)];
        let result = optimize(&candidates, &Capacity::Constant(1), &OptimizerConfig::default());
        assert_eq!(result.selected, vec![0, 1]);
        assert_eq!(result.objective, 10.0);
    }

    #[test]
    fn result_does_not_depend_on_input_order() {
        let mut shuffled = abc();
        shuffled.reverse();
        let result = optimize(&shuffled, &Capacity::Constant(1), &OptimizerConfig::default());
        // same schedule, indices remapped to the shuffled positions
        assert_eq!(result.selected, vec![0, 2]);
        assert_eq!(result.objective, 10.0);
    }

    #[test]
    fn capacity_profile_gates_the_early_overlap() {
        let capacity = Capacity::profile(vec![
            CapacityStep {
                from: t0(),
                max_concurrent: 1,
            },
            CapacityStep {
                from: t0() + Duration::seconds(10),
                max_concurrent: 2,
            },
        ]);
        let result = optimize(&abc(), &capacity, &OptimizerConfig::default());
        // a and b clash at t=5 where capacity is still 1; b + c wins
        assert_eq!(result.selected, vec![1, 2]);
        assert_eq!(result.objective, 13.0);
        assert_eq!(result.status, SolverStatus::Optimal);
    }

    #[test]
    fn non_positive_values_are_never_selected() {
        let candidates = vec![
            candidate("a", 0, 10, 0.0),
            candidate("b", 20, 30, -4.0),
            candidate("c", 40, 50, 3.0),
        ];
        let result = optimize(&candidates, &Capacity::Constant(2), &OptimizerConfig::default());
        assert_eq!(result.selected, vec![2]);
        assert_eq!(result.objective, 3.0);
    }

    #[test]
    fn zero_time_budget_reports_timeout() {
        let config = OptimizerConfig {
            time_budget: std::time::Duration::ZERO,
            ..OptimizerConfig::default()
        };
        let result = optimize(&abc(), &Capacity::Constant(2), &config);
        assert_eq!(result.status, SolverStatus::Timeout);
        assert!(result.objective >= 0.0);
    }

    #[test]
    fn node_limit_reports_feasible() {
        let config = OptimizerConfig {
            max_nodes: 1,
            ..OptimizerConfig::default()
        };
        let result = optimize(&abc(), &Capacity::Constant(2), &config);
        assert_eq!(result.status, SolverStatus::Feasible);
    }

    #[test]
    fn equal_optima_resolve_to_the_lower_indices() {
        // two disjoint pairs with identical value
        let candidates = vec![
            candidate("a", 0, 10, 5.0),
            candidate("b", 0, 10, 5.0),
            candidate("c", 20, 30, 5.0),
        ];
        let result = optimize(&candidates, &Capacity::Constant(1), &OptimizerConfig::default());
        assert_eq!(result.selected, vec![0, 2]);
        assert_eq!(result.objective, 10.0);
    }

    #[test]
    fn larger_instance_still_solves_exactly() {
        // ten satellites, staggered half-overlapping passes
        let mut candidates = Vec::new();
        for i in 0..20i64 {
            candidates.push(candidate("s", i * 5, i * 5 + 10, 1.0 + (i % 3) as f64));
        }
        let result = optimize(&candidates, &Capacity::Constant(2), &OptimizerConfig::default());
        assert_eq!(result.status, SolverStatus::Optimal);
        // any instant sees at most two selected passes
        for t in 0..110 {
            let at = t0() + Duration::seconds(t);
            let active = result
                .selected
                .iter()
                .filter(|&&i| candidates[i].window.rise <= at && at < candidates[i].window.set)
                .count();
            assert!(active <= 2);
        }
    }
}
