//! Batch evaluation of every area against every route
//!
//! Areas are evaluated in parallel and, within an area, routes are evaluated
//! in parallel as well. Each area collects its own results, so the output
//! keeps the input order of both areas and routes without any shared mutable
//! state.

use crate::{Area, AreaResult, DataError, EngineConfig, IntersectionEngine, Route};
use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A (route, area) pair that could not be evaluated
#[derive(Debug)]
pub struct PairFailure {
    pub area: String,
    pub route: String,
    pub error: DataError,
}

#[cfg(feature = "serde")]
impl serde::Serialize for PairFailure {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("PairFailure", 3)?;
        state.serialize_field("area", &self.area)?;
        state.serialize_field("route", &self.route)?;
        state.serialize_field("error", &self.error.to_string())?;
        state.end()
    }
}

/// Outcome of a whole batch
#[derive(Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CoverageReport {
    /// One entry per area, in input order
    pub areas: Vec<AreaResult>,
    /// Pairs rejected by validation, in (area, route) order
    pub failures: Vec<PairFailure>,
    /// Whether the batch was stopped before every pair was evaluated
    pub cancelled: bool,
}

impl CoverageReport {
    /// Result of the first area with the given name
    pub fn area(&self, name: &str) -> Option<&AreaResult> {
        self.areas.iter().find(|area| area.name == name)
    }

    /// Sum of traversed distance over all areas (km)
    pub fn total_distance_km(&self) -> f64 {
        self.areas.iter().map(AreaResult::total_distance_km).sum()
    }
}

/// What happened to a single pair
enum PairOutcome {
    Crossed(crate::IntersectionResult),
    Missed,
    Failed(PairFailure),
    Skipped,
}

/// Runs an [`IntersectionEngine`] over the full area x route product
#[derive(Debug, Clone, Default)]
pub struct BatchRunner {
    engine: IntersectionEngine,
    cancel: Option<Arc<AtomicBool>>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl BatchRunner {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            engine: IntersectionEngine::new(config),
            cancel: None,
        }
    }

    /// Stop scheduling new pairs once `flag` is set
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    #[inline]
    pub fn engine(&self) -> &IntersectionEngine {
        &self.engine
    }

    #[inline]
    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Evaluate every area against every route
    pub fn run(&self, routes: &[Route], areas: &[Area]) -> CoverageReport {
        #[cfg(feature = "profiling")]
        profiling::scope!("batch::run");

        tracing::info!(
            "Evaluating {} areas against {} routes",
            areas.len(),
            routes.len()
        );

        let per_area: Vec<(AreaResult, Vec<PairFailure>)> = areas
            .par_iter()
            .map(|area| self.evaluate_area(routes, area))
            .collect();

        let mut report = CoverageReport {
            cancelled: self.is_cancelled(),
            ..CoverageReport::default()
        };
        for (result, failures) in per_area {
            report.areas.push(result);
            report.failures.extend(failures);
        }

        if report.cancelled {
            tracing::warn!("Batch cancelled, report is partial");
        }
        tracing::info!(
            "Batch complete: {} areas, {} failed pairs",
            report.areas.len(),
            report.failures.len()
        );
        report
    }

    /// Evaluate one area against every route
    ///
    /// Intersection results and failures keep the order of `routes`.
    pub fn evaluate_area(&self, routes: &[Route], area: &Area) -> (AreaResult, Vec<PairFailure>) {
        let outcomes: Vec<PairOutcome> = routes
            .par_iter()
            .map(|route| self.evaluate_pair(route, area))
            .collect();

        let mut result = AreaResult::new(area.name());
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                PairOutcome::Crossed(intersection) => {
                    result.intersection_results.push(intersection)
                }
                PairOutcome::Failed(failure) => failures.push(failure),
                PairOutcome::Missed | PairOutcome::Skipped => {}
            }
        }
        (result, failures)
    }

    fn evaluate_pair(&self, route: &Route, area: &Area) -> PairOutcome {
        if self.is_cancelled() {
            return PairOutcome::Skipped;
        }

        match self.engine.evaluate_pair(route, area) {
            Ok(Some(intersection)) => PairOutcome::Crossed(intersection),
            Ok(None) => PairOutcome::Missed,
            Err(error) => {
                tracing::warn!(
                    "Skipping route '{}' in area '{}': {}",
                    route.name(),
                    area.name(),
                    error
                );
                PairOutcome::Failed(PairFailure {
                    area: area.name().to_string(),
                    route: route.name().to_string(),
                    error,
                })
            }
        }
    }
}
