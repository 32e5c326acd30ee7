//! Subset-selection strategies.
//!
//! Every strategy works on the same [`SelectionProblem`] and scores subsets
//! through [`SelectionProblem::evaluate`], so their results are directly
//! comparable. A subset is a sorted list of candidate indices; its score is
//! the route score of the subset after sequencing.
//!
//! - [`ExactEnumeration`]: every subset up to the stop budget, small pools only
//! - [`GeneticAlgorithm`]: elitist GA with tournament selection
//! - [`SimulatedAnnealing`]: single-trajectory annealing with geometric cooling
//! - [`GreedyWithLocalSearch`]: constrained greedy build, then replacement hill-climb

mod annealing;
mod exact;
mod genetic;
mod greedy;

pub use annealing::SimulatedAnnealing;
pub use exact::{EXACT_MAX_CANDIDATES, ExactEnumeration};
pub use genetic::GeneticAlgorithm;
pub use greedy::{GreedyWithLocalSearch, composite_greedy};

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use rand::Rng;
use rand::seq::index;

use crate::config::OptimizationConfig;
use crate::haversine::DistanceMatrix;
use crate::models::{City, ScoreMap, resolve_score};
use crate::scoring::{RouteScorer, ScoreBreakdown, route_ratio};
use crate::sequence::SequenceOptimizer;
use crate::traits::{DistanceMatrixProvider, SelectionStrategy};

/// Matrix index of the route origin.
pub const START: usize = 0;
/// Matrix index of the route destination.
pub const END: usize = 1;

#[inline]
fn location(candidate: usize) -> usize {
    candidate + 2
}

#[derive(Debug, Clone, PartialEq)]
pub enum StrategyError {
    TooManyCandidates { count: usize, limit: usize },
    NoEligibleCandidates,
    EmptyPool,
    TimedOut(Duration),
    Panicked(String),
}

impl fmt::Display for StrategyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyError::TooManyCandidates { count, limit } => {
                write!(f, "{count} candidates exceeds the limit of {limit}")
            }
            StrategyError::NoEligibleCandidates => {
                write!(f, "no candidate satisfies the spacing and detour limits")
            }
            StrategyError::EmptyPool => write!(f, "no candidates or no stop budget"),
            StrategyError::TimedOut(limit) => write!(f, "exceeded time limit of {limit:?}"),
            StrategyError::Panicked(message) => write!(f, "strategy panicked: {message}"),
        }
    }
}

impl std::error::Error for StrategyError {}

/// Cooperative wall-clock limit polled by strategies between steps.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    limit: Option<Duration>,
    expires_at: Option<Instant>,
}

impl Deadline {
    pub fn after(limit: Option<Duration>) -> Self {
        Self {
            limit,
            expires_at: limit.map(|limit| Instant::now() + limit),
        }
    }

    pub fn unlimited() -> Self {
        Self::after(None)
    }

    pub fn check(&self) -> Result<(), StrategyError> {
        match (self.limit, self.expires_at) {
            (Some(limit), Some(expires_at)) if Instant::now() >= expires_at => {
                Err(StrategyError::TimedOut(limit))
            }
            _ => Ok(()),
        }
    }
}

/// A strategy's chosen subset (sorted candidate indices) and its score.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub candidates: Vec<usize>,
    pub score: f64,
}

/// Immutable view of one optimization call shared by all strategies.
#[derive(Debug)]
pub struct SelectionProblem<'a> {
    candidates: &'a [City],
    matrix: DistanceMatrix,
    base_scores: Vec<f64>,
    max_cities: usize,
    config: &'a OptimizationConfig,
    scorer: RouteScorer,
}

impl<'a> SelectionProblem<'a> {
    pub fn new<M: DistanceMatrixProvider>(
        start: &City,
        end: &City,
        candidates: &'a [City],
        scores: &ScoreMap,
        max_cities: usize,
        config: &'a OptimizationConfig,
        matrix_provider: &M,
    ) -> Self {
        let locations: Vec<_> = [start, end]
            .into_iter()
            .chain(candidates)
            .map(|city| city.coordinates)
            .collect();

        Self {
            candidates,
            matrix: matrix_provider.matrix_for(&locations),
            base_scores: candidates
                .iter()
                .map(|city| resolve_score(scores, &city.name))
                .collect(),
            max_cities,
            config,
            scorer: RouteScorer::new(config.max_detour_ratio),
        }
    }

    pub fn candidates(&self) -> &'a [City] {
        self.candidates
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    /// Largest subset size a strategy may return.
    pub fn subset_limit(&self) -> usize {
        self.max_cities.min(self.candidates.len())
    }

    pub fn config(&self) -> &OptimizationConfig {
        self.config
    }

    pub fn base_score(&self, candidate: usize) -> f64 {
        self.base_scores[candidate]
    }

    pub fn direct_km(&self) -> f64 {
        self.matrix.get(START, END)
    }

    pub fn between(&self, a: usize, b: usize) -> f64 {
        self.matrix.get(location(a), location(b))
    }

    pub fn from_start(&self, candidate: usize) -> f64 {
        self.matrix.get(START, location(candidate))
    }

    pub fn to_end(&self, candidate: usize) -> f64 {
        self.matrix.get(location(candidate), END)
    }

    /// Path length via `candidate` over the direct distance.
    pub fn detour_factor(&self, candidate: usize) -> f64 {
        route_ratio(self.from_start(candidate) + self.to_end(candidate), self.direct_km())
    }

    /// Driving order for a subset. The result does not depend on the order
    /// of `subset`.
    pub fn sequence(&self, subset: &[usize]) -> Vec<usize> {
        let mut stops: Vec<usize> = subset.iter().map(|&candidate| location(candidate)).collect();
        stops.sort_unstable();
        SequenceOptimizer::new(&self.matrix)
            .sequence(START, END, &stops)
            .into_iter()
            .map(|stop| stop - 2)
            .collect()
    }

    /// Improve an existing driving order with 2-opt only.
    pub fn resequence(&self, order: &[usize]) -> Vec<usize> {
        let stops = order.iter().map(|&candidate| location(candidate)).collect();
        SequenceOptimizer::new(&self.matrix)
            .two_opt(START, END, stops)
            .into_iter()
            .map(|stop| stop - 2)
            .collect()
    }

    pub fn legs(&self, order: &[usize]) -> Vec<f64> {
        let mut legs = Vec::with_capacity(order.len() + 1);
        let mut previous = START;
        for &candidate in order {
            legs.push(self.matrix.get(previous, location(candidate)));
            previous = location(candidate);
        }
        legs.push(self.matrix.get(previous, END));
        legs
    }

    /// Route score of an already ordered list of stops.
    pub fn score_order(&self, order: &[usize]) -> ScoreBreakdown {
        let stop_scores: Vec<f64> = order.iter().map(|&candidate| self.base_scores[candidate]).collect();
        let mut tags: Vec<&str> = order
            .iter()
            .flat_map(|&candidate| self.candidates[candidate].tags.iter().map(String::as_str))
            .collect();
        tags.sort_unstable();
        tags.dedup();

        self.scorer
            .score(&self.legs(order), self.direct_km(), &stop_scores, tags.len())
    }

    /// Route score of a subset after sequencing.
    pub fn evaluate(&self, subset: &[usize]) -> f64 {
        self.score_order(&self.sequence(subset)).total
    }

    pub fn unused(&self, subset: &[usize]) -> Vec<usize> {
        (0..self.candidates.len())
            .filter(|candidate| !subset.contains(candidate))
            .collect()
    }

    /// Random non-empty subset within the stop budget.
    pub fn random_subset<R: Rng>(&self, rng: &mut R) -> Vec<usize> {
        let limit = self.subset_limit();
        if limit == 0 {
            return Vec::new();
        }
        let size = rng.random_range(1..=limit);
        let mut subset = index::sample(rng, self.candidates.len(), size).into_vec();
        subset.sort_unstable();
        subset
    }
}

/// Memoized subset scoring local to one strategy run.
struct Evaluator<'p, 'a> {
    problem: &'p SelectionProblem<'a>,
    memo: HashMap<Vec<usize>, f64>,
}

impl<'p, 'a> Evaluator<'p, 'a> {
    fn new(problem: &'p SelectionProblem<'a>) -> Self {
        Self {
            problem,
            memo: HashMap::new(),
        }
    }

    fn score(&mut self, subset: &[usize]) -> f64 {
        let mut key = subset.to_vec();
        key.sort_unstable();
        if let Some(&score) = self.memo.get(&key) {
            return score;
        }
        let score = self.problem.evaluate(&key);
        self.memo.insert(key, score);
        score
    }
}

fn canonical(mut subset: Vec<usize>) -> Vec<usize> {
    subset.sort_unstable();
    subset
}

/// The standard portfolio in comparison order.
///
/// Randomized strategies derive their seeds from `seed` so a run can be
/// reproduced from the seed alone.
pub fn default_portfolio(seed: u64) -> Vec<Box<dyn SelectionStrategy>> {
    vec![
        Box::new(ExactEnumeration),
        Box::new(GeneticAlgorithm::new(seed)),
        Box::new(SimulatedAnnealing::new(seed.wrapping_add(0x9E37_79B9_7F4A_7C15))),
        Box::new(GreedyWithLocalSearch),
    ]
}
