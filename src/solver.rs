//! Route optimization controller.
//!
//! Chooses a planning path from the pool size, runs the strategy portfolio
//! when selection is needed, sequences the winning subset, enforces stop
//! spacing on it and assembles the final [`OptimizedRoute`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use rayon::prelude::*;

use crate::config::{ConfigError, OptimizationConfig};
use crate::haversine::{GeoMetrics, travel_hours};
use crate::models::{
    City, OptimizationMethod, OptimizedRoute, PerformanceMetrics, RouteSegment, ScoreMap,
    StrategyReport,
};
use crate::polyline::Polyline;
use crate::portfolio::{
    Deadline, Selection, SelectionProblem, StrategyError, composite_greedy, default_portfolio,
};
use crate::scoring::route_ratio;
use crate::traits::SelectionStrategy;

/// Detour ratio below which a route is called efficient.
const EFFICIENT_DETOUR_RATIO: f64 = 1.3;
const WELL_SPACED: f64 = 0.7;
const DIVERSE: f64 = 0.6;

/// How a request is handled, decided from the pool size and stop budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanningPath {
    /// Nothing to choose from: drive straight through.
    DirectRoute,
    /// Every candidate fits the budget; only ordering is needed.
    SequenceOnly,
    /// Run the selection portfolio.
    Portfolio,
}

impl PlanningPath {
    pub fn classify(candidate_count: usize, max_cities: usize) -> Self {
        if candidate_count == 0 || max_cities == 0 {
            PlanningPath::DirectRoute
        } else if candidate_count <= max_cities {
            PlanningPath::SequenceOnly
        } else {
            PlanningPath::Portfolio
        }
    }
}

#[derive(Debug)]
struct StrategyRun {
    method: OptimizationMethod,
    result: Result<Selection, StrategyError>,
    elapsed: Duration,
}

impl StrategyRun {
    fn report(&self) -> StrategyReport {
        StrategyReport {
            method: self.method,
            score: self.result.as_ref().ok().map(|selection| selection.score),
            error: self.result.as_ref().err().map(ToString::to_string),
            elapsed_ms: self.elapsed.as_millis() as u64,
        }
    }
}

/// Plans road trips between two cities.
///
/// Owns its configuration and the distance cache; create one per planning
/// context and pass it to whoever needs it.
pub struct OptimizationController {
    config: OptimizationConfig,
    geo: GeoMetrics,
    strategies: Option<Vec<Box<dyn SelectionStrategy>>>,
}

impl OptimizationController {
    pub fn new(config: OptimizationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            geo: GeoMetrics::new(),
            strategies: None,
        })
    }

    /// Replace the standard portfolio with a custom set of strategies.
    pub fn with_strategies(mut self, strategies: Vec<Box<dyn SelectionStrategy>>) -> Self {
        self.strategies = Some(strategies);
        self
    }

    pub fn config(&self) -> &OptimizationConfig {
        &self.config
    }

    pub fn geo(&self) -> &GeoMetrics {
        &self.geo
    }

    pub fn clear_cache(&self) {
        self.geo.clear_cache();
    }

    /// Select at most `max_cities` stops from `candidates` and order them
    /// between `start` and `end`.
    #[tracing::instrument(
        skip_all,
        fields(start = %start.name, end = %end.name, candidates = candidates.len(), max_cities = max_cities)
    )]
    pub fn optimize(
        &self,
        start: &City,
        end: &City,
        candidates: &[City],
        max_cities: usize,
        scores: &ScoreMap,
    ) -> OptimizedRoute {
        let problem = SelectionProblem::new(start, end, candidates, scores, max_cities, &self.config, &self.geo);
        let path = PlanningPath::classify(candidates.len(), max_cities);
        tracing::info!(?path, direct_km = %format!("{:.1}", problem.direct_km()), "planning route");

        let route = match path {
            PlanningPath::DirectRoute => {
                self.finish(&problem, start, end, Vec::new(), OptimizationMethod::NoCandidates, Vec::new(), None)
            }
            PlanningPath::SequenceOnly => {
                let everything: Vec<usize> = (0..candidates.len()).collect();
                let order = problem.sequence(&everything);
                self.finish(&problem, start, end, order, OptimizationMethod::SimpleOrdering, Vec::new(), None)
            }
            PlanningPath::Portfolio => {
                let seed = self.config.seed.unwrap_or_else(rand::random);
                let (method, subset, reports) = self.run_portfolio(&problem, seed);
                let order = problem.sequence(&subset);
                self.finish(&problem, start, end, order, method, reports, Some(seed))
            }
        };

        tracing::info!(
            method = %route.optimization_method,
            stops = route.cities.len(),
            dropped = route.dropped_cities.len(),
            score = %format!("{:.3}", route.total_score),
            distance_km = %format!("{:.1}", route.total_distance_km),
            "route planned"
        );
        route
    }

    /// Order already chosen stops between `start` and `end`.
    pub fn sequence_cities(&self, start: &City, end: &City, stops: &[City]) -> Vec<City> {
        let problem = SelectionProblem::new(
            start,
            end,
            stops,
            &ScoreMap::new(),
            stops.len(),
            &self.config,
            &self.geo,
        );
        let everything: Vec<usize> = (0..stops.len()).collect();
        problem
            .sequence(&everything)
            .into_iter()
            .map(|i| stops[i].clone())
            .collect()
    }

    fn run_portfolio(
        &self,
        problem: &SelectionProblem<'_>,
        seed: u64,
    ) -> (OptimizationMethod, Vec<usize>, Vec<StrategyReport>) {
        let default_strategies;
        let strategies: &[Box<dyn SelectionStrategy>] = match &self.strategies {
            Some(custom) => custom,
            None => {
                default_strategies = default_portfolio(seed);
                &default_strategies
            }
        };

        let eligible: Vec<&dyn SelectionStrategy> = strategies
            .iter()
            .map(|strategy| strategy.as_ref())
            .filter(|strategy| {
                let eligible = strategy.is_eligible(problem);
                if !eligible {
                    tracing::debug!(method = %strategy.method(), "strategy not eligible for this pool");
                }
                eligible
            })
            .collect();

        let runs: Vec<StrategyRun> = if self.config.parallel {
            eligible
                .par_iter()
                .map(|strategy| self.run_strategy(*strategy, problem))
                .collect()
        } else {
            eligible
                .iter()
                .map(|strategy| self.run_strategy(*strategy, problem))
                .collect()
        };

        let mut winner: Option<(OptimizationMethod, &Selection)> = None;
        for run in &runs {
            match &run.result {
                Ok(selection) => {
                    tracing::debug!(
                        method = %run.method,
                        score = selection.score,
                        stops = selection.candidates.len(),
                        elapsed_ms = run.elapsed.as_millis() as u64,
                        "strategy finished"
                    );
                    if winner.is_none_or(|(_, best)| selection.score > best.score) {
                        winner = Some((run.method, selection));
                    }
                }
                Err(err) => {
                    tracing::warn!(method = %run.method, error = %err, "optimization strategy failed");
                }
            }
        }

        let reports = runs.iter().map(StrategyRun::report).collect();
        match winner {
            Some((method, selection)) => (method, selection.candidates.clone(), reports),
            None => {
                tracing::warn!(attempted = runs.len(), "all strategies failed, using greedy fallback");
                (OptimizationMethod::GreedyFallback, composite_greedy(problem), reports)
            }
        }
    }

    fn run_strategy(&self, strategy: &dyn SelectionStrategy, problem: &SelectionProblem<'_>) -> StrategyRun {
        let started = Instant::now();
        let deadline = Deadline::after(self.config.strategy_time_limit());
        let result = panic::catch_unwind(AssertUnwindSafe(|| strategy.select(problem, &deadline)))
            .unwrap_or_else(|payload| Err(StrategyError::Panicked(panic_message(payload.as_ref()))));

        StrategyRun {
            method: strategy.method(),
            result,
            elapsed: started.elapsed(),
        }
    }

    /// Drop stops closer than the minimum spacing to the start, the end, or
    /// an earlier kept stop. Dropped stops are not replaced.
    fn enforce_spacing(&self, problem: &SelectionProblem<'_>, order: Vec<usize>) -> (Vec<usize>, Vec<usize>) {
        let min_km = self.config.min_stop_distance_km;
        let mut kept: Vec<usize> = Vec::with_capacity(order.len());
        let mut dropped = Vec::new();

        for candidate in order {
            let clear_of_ends = problem.from_start(candidate) >= min_km && problem.to_end(candidate) >= min_km;
            let clear_of_kept = kept.iter().all(|&other| problem.between(candidate, other) >= min_km);
            if clear_of_ends && clear_of_kept {
                kept.push(candidate);
            } else {
                tracing::debug!(
                    city = %problem.candidates()[candidate].name,
                    min_km,
                    "dropping stop that violates minimum spacing"
                );
                dropped.push(candidate);
            }
        }

        (kept, dropped)
    }

    #[allow(clippy::too_many_arguments)]
    fn finish(
        &self,
        problem: &SelectionProblem<'_>,
        start: &City,
        end: &City,
        order: Vec<usize>,
        method: OptimizationMethod,
        strategy_reports: Vec<StrategyReport>,
        seed: Option<u64>,
    ) -> OptimizedRoute {
        // Ordering-only routes keep every candidate; spacing is enforced on
        // selected subsets.
        let (kept, dropped) = match method {
            OptimizationMethod::NoCandidates | OptimizationMethod::SimpleOrdering => (order, Vec::new()),
            _ => {
                let (kept, dropped) = self.enforce_spacing(problem, order);
                if dropped.is_empty() {
                    (kept, dropped)
                } else {
                    (problem.resequence(&kept), dropped)
                }
            }
        };

        let candidates = problem.candidates();
        let cities: Vec<City> = kept.iter().map(|&i| candidates[i].clone()).collect();
        let legs = problem.legs(&kept);
        let total_distance_km: f64 = legs.iter().sum();
        let breakdown = problem.score_order(&kept);

        let performance_metrics = PerformanceMetrics {
            detour_ratio: route_ratio(total_distance_km, problem.direct_km()),
            avg_stop_distance: if cities.is_empty() {
                0.0
            } else {
                total_distance_km / (cities.len() + 1) as f64
            },
            spacing_efficiency: breakdown.spacing_uniformity,
            variety_score: breakdown.variety,
            total_cities: cities.len(),
            longest_leg_km: legs.iter().copied().fold(0.0, f64::max),
        };

        let names: Vec<&str> = std::iter::once(start.name.as_str())
            .chain(cities.iter().map(|city| city.name.as_str()))
            .chain(std::iter::once(end.name.as_str()))
            .collect();
        let segments = names
            .windows(2)
            .zip(&legs)
            .map(|(pair, &distance_km)| RouteSegment {
                from: pair[0].to_string(),
                to: pair[1].to_string(),
                distance_km,
                duration_hours: travel_hours(distance_km, self.config.average_speed_kmh),
            })
            .collect();

        let routing_explanation = explain(
            method,
            &performance_metrics,
            candidates.len(),
            dropped.len(),
            &self.config,
        );

        OptimizedRoute {
            path: Polyline::through(start, &cities, end),
            cities,
            total_distance_km,
            total_score: breakdown.total,
            optimization_method: method,
            performance_metrics,
            routing_explanation,
            segments,
            strategy_reports,
            dropped_cities: dropped.iter().map(|&i| candidates[i].name.clone()).collect(),
            seed,
        }
    }
}

impl Default for OptimizationController {
    fn default() -> Self {
        Self {
            config: OptimizationConfig::default(),
            geo: GeoMetrics::new(),
            strategies: None,
        }
    }
}

/// One-shot optimization with a fresh controller.
pub fn optimize(
    start: &City,
    end: &City,
    candidates: &[City],
    max_cities: usize,
    scores: &ScoreMap,
    config: OptimizationConfig,
) -> Result<OptimizedRoute, ConfigError> {
    let controller = OptimizationController::new(config)?;
    Ok(controller.optimize(start, end, candidates, max_cities, scores))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn explain(
    method: OptimizationMethod,
    metrics: &PerformanceMetrics,
    pool_size: usize,
    dropped: usize,
    config: &OptimizationConfig,
) -> String {
    let mut text = if metrics.total_cities == 0 {
        let reason = if pool_size == 0 {
            "No candidate cities available. "
        } else if method == OptimizationMethod::NoCandidates {
            "No intermediate stops requested. "
        } else {
            ""
        };
        format!("{reason}Direct route with no intermediate stops.")
    } else {
        let base = match method {
            OptimizationMethod::ExactEnumeration => {
                "Best possible selection found by scoring every combination of candidate cities."
            }
            OptimizationMethod::GeneticAlgorithm => {
                "Selected using a genetic algorithm to find a combination of cities that balances quality, distance, and variety."
            }
            OptimizationMethod::SimulatedAnnealing => {
                "Optimized using simulated annealing to explore different city combinations while avoiding local optima."
            }
            OptimizationMethod::GreedyWithLocalSearch => {
                "Greedy selection refined with local search to improve spacing and reduce unnecessary detours."
            }
            OptimizationMethod::SimpleOrdering => "All available cities ordered for the shortest drive.",
            OptimizationMethod::GreedyFallback => {
                "Cities chosen by a simple greedy ranking of quality, spacing, and detour."
            }
            OptimizationMethod::NoCandidates => "Direct route.",
        };

        let mut features = Vec::new();
        if metrics.detour_ratio < EFFICIENT_DETOUR_RATIO {
            features.push("efficient routing");
        }
        if metrics.spacing_efficiency > WELL_SPACED {
            features.push("well-spaced stops");
        }
        if metrics.variety_score > DIVERSE {
            features.push("diverse city types");
        }

        let mut text = base.to_string();
        if !features.is_empty() {
            text.push_str(&format!(" Features: {}.", features.join(", ")));
        }
        text
    };

    if metrics.longest_leg_km > config.max_stop_distance_km {
        text.push_str(&format!(
            " Longest leg is {:.0} km, beyond the preferred {:.0} km between stops.",
            metrics.longest_leg_km, config.max_stop_distance_km
        ));
    }
    if dropped > 0 {
        text.push_str(&format!(
            " {dropped} stop(s) removed to keep stops at least {:.0} km apart.",
            config.min_stop_distance_km
        ));
    }
    text
}
