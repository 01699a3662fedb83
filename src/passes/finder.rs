use std::time::Instant;

use chrono::{DateTime, Duration, Utc};

use super::error::PassError;
use super::window::PassWindow;
use crate::horizon::HorizonMask;
use crate::predict::{Observer, Propagator, TopocentricSample};

const BISECTION_TOLERANCE_S: i64 = 1;
const RETRY_OFFSET_S: i64 = 5;
const MAX_BACKSCAN_STEPS: usize = 30;
const MAX_CULMINATION_ROUNDS: usize = 12;

#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    /// Constant elevation threshold for rise/set crossings.
    pub min_elevation_deg: f64,
    /// Sampling step of the initial scan.
    pub coarse_step: Duration,
    /// How far past the rise to look for the falling edge.
    pub set_lookahead: Duration,
    /// Gap enforced after a pass before scanning resumes.
    pub guard_interval: Duration,
    /// Points sampled per culmination-search round.
    pub culmination_samples: usize,
    /// Consecutive propagation failures tolerated during scanning.
    pub max_sample_failures: u32,
    /// Resolve the crossing threshold per azimuth from the mask instead of
    /// using `min_elevation_deg` alone.
    pub mask_threshold: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_elevation_deg: 0.0,
            coarse_step: Duration::seconds(60),
            set_lookahead: Duration::hours(2),
            guard_interval: Duration::minutes(5),
            culmination_samples: 10,
            max_sample_failures: 5,
            mask_threshold: false,
        }
    }
}

/// Locates visibility windows by coarse scanning followed by bisection.
///
/// The search progresses through scanning, threshold-crossing refinement,
/// culmination refinement and an optional terrain-mask check; a mask-rejected
/// window silently resumes scanning after the guard interval. The whole
/// procedure is free of randomness: identical inputs give identical windows.
pub struct PassFinder<'a> {
    propagator: &'a dyn Propagator,
    observer: Observer,
    mask: Option<&'a HorizonMask>,
    config: SearchConfig,
}

impl<'a> PassFinder<'a> {
    pub fn new(propagator: &'a dyn Propagator, observer: Observer, config: SearchConfig) -> Self {
        Self {
            propagator,
            observer,
            mask: None,
            config,
        }
    }

    pub fn with_mask(mut self, mask: &'a HorizonMask) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Find the next pass with a rise inside `[start, end]`.
    ///
    /// Returns `Ok(None)` when the window is exhausted without a crossing.
    /// The set refinement may run up to `set_lookahead` past `end`. If the
    /// satellite is already above threshold at `start`, the rise bracket
    /// extends backwards, so the returned rise can precede `start`.
    pub fn find_next(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        deadline: Option<Instant>,
    ) -> Result<Option<PassWindow>, PassError> {
        if start >= end {
            return Err(PassError::InvalidWindow(format!(
                "start {} is not before end {}",
                start, end
            )));
        }

        let mut cursor = start;
        let mut below: Option<DateTime<Utc>> = None;
        let mut failures = 0u32;

        while cursor <= end {
            check_deadline(deadline)?;

            let sample = match self.propagator.topocentric(&self.observer, cursor) {
                Ok(s) => s,
                Err(e) => {
                    failures += 1;
                    if failures >= self.config.max_sample_failures {
                        log::warn!("pass search aborted after {} bad samples: {}", failures, e);
                        return Err(PassError::TooManyFailures(failures));
                    }
                    // Retry just next to the failing instant instead of
                    // losing a whole coarse step.
                    cursor += Duration::seconds(RETRY_OFFSET_S);
                    continue;
                }
            };
            failures = 0;

            if self.margin(&sample) >= 0.0 {
                let bracket_low = match below {
                    Some(t) => t,
                    None => self.backscan_below(cursor, deadline)?,
                };
                let rise = self.refine_crossing(bracket_low, cursor, true, deadline)?;
                let set = self.refine_set(rise.timestamp, deadline)?;
                let (culmination, max_elevation) =
                    self.refine_culmination(rise.timestamp, set.timestamp, deadline)?;

                if let Some(mask) = self.mask {
                    let at_culmination = self
                        .propagator
                        .topocentric(&self.observer, culmination)?;
                    let blocked = mask.elevation_at(at_culmination.azimuth_deg);
                    if max_elevation < blocked {
                        log::debug!(
                            "window at {} rejected: {:.2} deg below mask {:.2} deg at az {:.0}",
                            rise.timestamp,
                            max_elevation,
                            blocked,
                            at_culmination.azimuth_deg
                        );
                        cursor = set.timestamp + self.config.guard_interval;
                        below = None;
                        continue;
                    }
                }

                return Ok(Some(build_window(&rise, culmination, max_elevation, &set)));
            }

            below = Some(cursor);
            cursor += self.config.coarse_step;
        }

        Ok(None)
    }

    /// Signed elevation margin above the active threshold.
    fn margin(&self, sample: &TopocentricSample) -> f64 {
        sample.elevation_deg - self.threshold_at(sample.azimuth_deg)
    }

    fn threshold_at(&self, azimuth_deg: f64) -> f64 {
        match self.mask {
            Some(mask) if self.config.mask_threshold => self
                .config
                .min_elevation_deg
                .max(mask.elevation_at(azimuth_deg)),
            _ => self.config.min_elevation_deg,
        }
    }

    /// The first coarse sample was already above threshold: walk backwards
    /// to find a below-threshold bracket end (pass in progress at `start`).
    fn backscan_below(
        &self,
        above: DateTime<Utc>,
        deadline: Option<Instant>,
    ) -> Result<DateTime<Utc>, PassError> {
        let mut t = above;
        for _ in 0..MAX_BACKSCAN_STEPS {
            check_deadline(deadline)?;
            t -= self.config.coarse_step;
            let sample = self.propagator.topocentric(&self.observer, t)?;
            if self.margin(&sample) < 0.0 {
                return Ok(t);
            }
        }
        // Continuously visible over the whole backscan; use the oldest
        // sample as the bracket end and let bisection collapse onto it.
        Ok(t)
    }

    /// Bisect a threshold crossing down to the tolerance. `rising` selects
    /// the direction; the returned sample sits on the `after` side of the
    /// crossing, within one tolerance step of the exact instant.
    fn refine_crossing(
        &self,
        before: DateTime<Utc>,
        after: DateTime<Utc>,
        rising: bool,
        deadline: Option<Instant>,
    ) -> Result<TopocentricSample, PassError> {
        let mut low = before;
        let mut high = after;

        while (high - low).num_seconds() > BISECTION_TOLERANCE_S {
            check_deadline(deadline)?;
            let mid = low + (high - low) / 2;
            let sample = self.propagator.topocentric(&self.observer, mid)?;
            let above = self.margin(&sample) >= 0.0;
            if above == rising {
                high = mid;
            } else {
                low = mid;
            }
        }

        Ok(self.propagator.topocentric(&self.observer, high)?)
    }

    /// Scan forward from the rise for the falling edge, then bisect it.
    fn refine_set(
        &self,
        rise: DateTime<Utc>,
        deadline: Option<Instant>,
    ) -> Result<TopocentricSample, PassError> {
        let horizon = rise + self.config.set_lookahead;
        let mut last_above = rise;
        let mut cursor = rise + self.config.coarse_step;
        let mut failures = 0u32;

        while cursor <= horizon {
            check_deadline(deadline)?;
            let sample = match self.propagator.topocentric(&self.observer, cursor) {
                Ok(s) => s,
                Err(e) => {
                    failures += 1;
                    if failures >= self.config.max_sample_failures {
                        log::warn!("set search aborted after {} bad samples: {}", failures, e);
                        return Err(PassError::TooManyFailures(failures));
                    }
                    cursor += Duration::seconds(RETRY_OFFSET_S);
                    continue;
                }
            };
            failures = 0;

            if self.margin(&sample) < 0.0 {
                return self.refine_crossing(last_above, cursor, false, deadline);
            }
            last_above = cursor;
            cursor += self.config.coarse_step;
        }

        Err(PassError::SetNotFound(
            self.config.set_lookahead.num_seconds(),
        ))
    }

    /// Locate the elevation maximum inside `[rise, set]` by repeated
    /// sub-sampling around the best point. On equal elevations the earlier
    /// instant wins, keeping the result deterministic.
    fn refine_culmination(
        &self,
        rise: DateTime<Utc>,
        set: DateTime<Utc>,
        deadline: Option<Instant>,
    ) -> Result<(DateTime<Utc>, f64), PassError> {
        let points = self.config.culmination_samples.max(3);
        let mut low = rise;
        let mut high = set;
        let mut best_time = rise + (set - rise) / 2;
        let mut best_elevation = f64::NEG_INFINITY;

        for _ in 0..MAX_CULMINATION_ROUNDS {
            check_deadline(deadline)?;
            let span = high - low;
            let mut sampled = false;
            for i in 0..points {
                let t = low + span * i as i32 / (points - 1) as i32;
                let sample = match self.propagator.topocentric(&self.observer, t) {
                    Ok(s) => s,
                    // Isolated bad samples just shrink this round's evidence.
                    Err(_) => continue,
                };
                sampled = true;
                if sample.elevation_deg > best_elevation {
                    best_elevation = sample.elevation_deg;
                    best_time = t;
                }
            }
            if !sampled {
                return Err(PassError::Propagation(
                    crate::predict::PropagationError::Propagation(
                        "no valid samples in culmination search".into(),
                    ),
                ));
            }

            let step = span / (points - 1) as i32;
            if step <= Duration::seconds(BISECTION_TOLERANCE_S) {
                break;
            }
            low = (best_time - step).max(rise);
            high = (best_time + step).min(set);
        }

        // Degenerate short passes can pin the maximum onto an endpoint. The
        // elevation is re-sampled so it belongs to the reported instant.
        if best_time <= rise || best_time >= set {
            best_time = rise + (set - rise) / 2;
            let sample = self.propagator.topocentric(&self.observer, best_time)?;
            best_elevation = sample.elevation_deg;
        }

        Ok((best_time, best_elevation))
    }
}

fn build_window(
    rise: &TopocentricSample,
    culmination: DateTime<Utc>,
    max_elevation_deg: f64,
    set: &TopocentricSample,
) -> PassWindow {
    PassWindow {
        rise: rise.timestamp,
        culmination,
        set: set.timestamp,
        max_elevation_deg,
        rise_azimuth_deg: rise.azimuth_deg,
        set_azimuth_deg: set.azimuth_deg,
        duration_s: (set.timestamp - rise.timestamp).num_milliseconds() as f64 / 1000.0,
    }
}

fn check_deadline(deadline: Option<Instant>) -> Result<(), PassError> {
    match deadline {
        Some(d) if Instant::now() >= d => Err(PassError::DeadlineExceeded),
        _ => Ok(()),
    }
}
