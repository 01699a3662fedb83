use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::scorer::{DurationScorer, Scorer};
use crate::horizon::HorizonMask;
use crate::passes::{PassError, PassFinder, PassWindow, SearchConfig};
use crate::predict::{Observer, Propagator};

/// A weighted pass, ready for schedule optimization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassCandidate {
    pub satellite_id: String,
    pub window: PassWindow,
    pub value: f64,
    pub min_elevation_deg: Option<f64>,
}

/// Time range during which a satellite may be serviced at all.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl AvailabilityWindow {
    fn covers(&self, window: &PassWindow) -> bool {
        self.start <= window.rise && window.set <= self.end
    }
}

/// One satellite search stream: the orbital state source plus optional
/// availability constraints. Cheap to clone into worker tasks.
#[derive(Clone)]
pub struct SearchTarget {
    pub satellite_id: String,
    pub propagator: Arc<dyn Propagator>,
    pub availability: Vec<AvailabilityWindow>,
}

impl SearchTarget {
    pub fn new(satellite_id: impl Into<String>, propagator: Arc<dyn Propagator>) -> Self {
        Self {
            satellite_id: satellite_id.into(),
            propagator,
            availability: Vec::new(),
        }
    }

    pub fn with_availability(mut self, windows: Vec<AvailabilityWindow>) -> Self {
        self.availability = windows;
        self
    }
}

/// Per-satellite result slot: a failure in one stream never aborts the batch.
pub struct TargetPasses {
    pub satellite_id: String,
    pub outcome: Result<Vec<PassCandidate>, PassError>,
}

/// Drives the pass finder across a horizon for one or many satellites and
/// wraps the discovered windows into weighted candidates.
#[derive(Clone)]
pub struct Collector {
    observer: Observer,
    config: SearchConfig,
    mask: Option<Arc<HorizonMask>>,
    scorer: Arc<dyn Scorer>,
    max_passes: usize,
}

impl Collector {
    pub fn new(observer: Observer, config: SearchConfig) -> Self {
        Self {
            observer,
            config,
            mask: None,
            scorer: Arc::new(DurationScorer),
            max_passes: 10,
        }
    }

    pub fn with_mask(mut self, mask: Arc<HorizonMask>) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn with_scorer(mut self, scorer: Arc<dyn Scorer>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    /// Collect up to `max_passes` candidates for one satellite, in
    /// non-decreasing start order. The cursor advances past each pass by the
    /// guard interval, also for mask-rejected or availability-filtered ones.
    pub fn collect(
        &self,
        target: &SearchTarget,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        deadline: Option<Instant>,
    ) -> Result<Vec<PassCandidate>, PassError> {
        let finder = PassFinder::new(target.propagator.as_ref(), self.observer, self.config);
        let finder = match self.mask.as_deref() {
            Some(mask) => finder.with_mask(mask),
            None => finder,
        };

        let mut candidates = Vec::new();
        let mut cursor = start;

        while candidates.len() < self.max_passes && cursor < end {
            let window = match finder.find_next(cursor, end, deadline)? {
                Some(w) => w,
                None => break,
            };
            cursor = window.set + self.config.guard_interval;

            if !target.availability.is_empty()
                && !target.availability.iter().any(|a| a.covers(&window))
            {
                continue;
            }

            let value = self.scorer.value(&target.satellite_id, &window);
            candidates.push(PassCandidate {
                satellite_id: target.satellite_id.clone(),
                window,
                value,
                min_elevation_deg: Some(self.config.min_elevation_deg),
            });
        }

        log::debug!(
            "collected {} candidates for {} in [{}, {}]",
            candidates.len(),
            target.satellite_id,
            start,
            end
        );
        Ok(candidates)
    }

    /// Run one independent search stream per satellite on blocking worker
    /// threads and join them all. Result order matches target order.
    pub async fn collect_batch(
        &self,
        targets: &[SearchTarget],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        deadline: Option<Instant>,
    ) -> Vec<TargetPasses> {
        let mut handles = Vec::with_capacity(targets.len());
        for target in targets {
            let collector = self.clone();
            let target = target.clone();
            handles.push(tokio::task::spawn_blocking(move || TargetPasses {
                satellite_id: target.satellite_id.clone(),
                outcome: collector.collect(&target, start, end, deadline),
            }));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (handle, target) in handles.into_iter().zip(targets) {
            results.push(match handle.await {
                Ok(slot) => slot,
                Err(e) => TargetPasses {
                    satellite_id: target.satellite_id.clone(),
                    outcome: Err(PassError::Worker(e.to_string())),
                },
            });
        }
        results
    }
}
