//! Request/response surface tying the collector and the optimizer together.
//! A calling layer (HTTP handler, CLI, ...) owns transport concerns; this
//! module owns validation, mask resolution, deadline propagation and the
//! mapping of solver output back onto candidates.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::collect::{Collector, PassCandidate, Scorer, SearchTarget, TargetPasses};
use crate::horizon::{MaskError, MaskStore};
use crate::passes::SearchConfig;
use crate::predict::Observer;
use crate::schedule::{optimize, Capacity, OptimizerConfig, SolverStatus};

const MAX_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error(transparent)]
    Mask(#[from] MaskError),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

pub struct PassSearchRequest {
    pub targets: Vec<SearchTarget>,
    pub observer: Observer,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub config: SearchConfig,
    pub mask_id: Option<String>,
    pub max_passes: usize,
    /// End-to-end wall-clock budget for the whole request.
    pub budget: Option<std::time::Duration>,
}

pub struct ScheduleRequest {
    pub search: PassSearchRequest,
    pub capacity: Capacity,
    pub optimizer: OptimizerConfig,
    /// Candidate scorer; duration in seconds when not given.
    pub scorer: Option<Arc<dyn Scorer>>,
}

/// Per-satellite slot: pass-finding failures stay local to their satellite.
#[derive(Debug, Serialize, Deserialize)]
pub struct TargetReport {
    pub satellite_id: String,
    pub passes: Vec<PassCandidate>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PassSearchResponse {
    pub results: Vec<TargetReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledPass {
    pub satellite_id: String,
    pub rise: DateTime<Utc>,
    pub set: DateTime<Utc>,
    pub max_elevation_deg: f64,
    pub value: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleResponse {
    pub results: Vec<TargetReport>,
    /// All candidates that entered the optimizer; `selected` indexes into it.
    pub candidates: Vec<PassCandidate>,
    pub selected_indices: Vec<usize>,
    pub selected: Vec<ScheduledPass>,
    pub objective: f64,
    pub status: SolverStatus,
}

#[derive(Default)]
pub struct Planner {
    mask_store: Option<Arc<dyn MaskStore>>,
}

impl Planner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mask_store(mut self, store: Arc<dyn MaskStore>) -> Self {
        self.mask_store = Some(store);
        self
    }

    pub async fn search_passes(
        &self,
        request: &PassSearchRequest,
    ) -> Result<PassSearchResponse, PlannerError> {
        let (slots, _) = self.run_search(request).await?;
        Ok(PassSearchResponse {
            results: slots.into_iter().map(into_report).collect(),
        })
    }

    pub async fn plan_schedule(
        &self,
        request: &ScheduleRequest,
    ) -> Result<ScheduleResponse, PlannerError> {
        let (slots, deadline) = self
            .run_search_with_scorer(&request.search, request.scorer.clone())
            .await?;

        let mut candidates = Vec::new();
        let mut results = Vec::with_capacity(slots.len());
        for slot in slots {
            if let Ok(passes) = &slot.outcome {
                candidates.extend(passes.iter().cloned());
            }
            results.push(into_report(slot));
        }

        let mut optimizer = request.optimizer;
        if let Some(deadline) = deadline {
            let remaining = deadline.saturating_duration_since(Instant::now());
            optimizer.time_budget = optimizer.time_budget.min(remaining);
        }
        let schedule = optimize(&candidates, &request.capacity, &optimizer);

        let selected = schedule
            .selected
            .iter()
            .map(|&i| {
                let c = &candidates[i];
                ScheduledPass {
                    satellite_id: c.satellite_id.clone(),
                    rise: c.window.rise,
                    set: c.window.set,
                    max_elevation_deg: c.window.max_elevation_deg,
                    value: c.value,
                }
            })
            .collect();

        Ok(ScheduleResponse {
            results,
            candidates,
            selected_indices: schedule.selected,
            selected,
            objective: schedule.objective,
            status: schedule.status,
        })
    }

    async fn run_search(
        &self,
        request: &PassSearchRequest,
    ) -> Result<(Vec<TargetPasses>, Option<Instant>), PlannerError> {
        self.run_search_with_scorer(request, None).await
    }

    async fn run_search_with_scorer(
        &self,
        request: &PassSearchRequest,
        scorer: Option<Arc<dyn Scorer>>,
    ) -> Result<(Vec<TargetPasses>, Option<Instant>), PlannerError> {
        validate_window(request.start, request.end)?;
        let deadline = request.budget.map(|b| Instant::now() + b);

        let mut collector = Collector::new(request.observer, request.config)
            .with_max_passes(request.max_passes);
        if let Some(id) = &request.mask_id {
            let store = self.mask_store.as_ref().ok_or_else(|| {
                PlannerError::InvalidRequest("mask id given but no mask store configured".into())
            })?;
            collector = collector.with_mask(Arc::new(store.lookup(id)?));
        }
        if let Some(scorer) = scorer {
            collector = collector.with_scorer(scorer);
        }

        log::info!(
            "searching passes for {} satellites in [{}, {}]",
            request.targets.len(),
            request.start,
            request.end
        );
        let slots = collector
            .collect_batch(&request.targets, request.start, request.end, deadline)
            .await;
        Ok((slots, deadline))
    }
}

fn into_report(slot: TargetPasses) -> TargetReport {
    match slot.outcome {
        Ok(passes) => TargetReport {
            satellite_id: slot.satellite_id,
            passes,
            error: None,
        },
        Err(e) => TargetReport {
            satellite_id: slot.satellite_id,
            passes: Vec::new(),
            error: Some(e.to_string()),
        },
    }
}

fn validate_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), PlannerError> {
    if start >= end {
        return Err(PlannerError::InvalidRequest(
            "end must be after start".into(),
        ));
    }
    if end - start > Duration::days(MAX_WINDOW_DAYS) {
        return Err(PlannerError::InvalidRequest(format!(
            "search window exceeds {} days",
            MAX_WINDOW_DAYS
        )));
    }
    Ok(())
}
