//! Greedy construction with replacement local search.

use super::{Deadline, Evaluator, Selection, SelectionProblem, StrategyError, canonical};
use crate::models::OptimizationMethod;
use crate::traits::SelectionStrategy;

const BASE_WEIGHT: f64 = 0.5;
const SPACING_WEIGHT: f64 = 0.3;
const DETOUR_WEIGHT: f64 = 0.2;

/// Spacing fit before any stop has been chosen.
const OPEN_SPACING_FIT: f64 = 0.8;

#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyWithLocalSearch;

impl SelectionStrategy for GreedyWithLocalSearch {
    fn method(&self) -> OptimizationMethod {
        OptimizationMethod::GreedyWithLocalSearch
    }

    fn select(
        &self,
        problem: &SelectionProblem<'_>,
        deadline: &Deadline,
    ) -> Result<Selection, StrategyError> {
        if problem.subset_limit() == 0 {
            return Err(StrategyError::EmptyPool);
        }

        let selected = build(problem, true);
        if selected.is_empty() {
            return Err(StrategyError::NoEligibleCandidates);
        }

        let improved = local_search(problem, selected, deadline)?;
        let score = problem.evaluate(&improved);
        Ok(Selection {
            candidates: canonical(improved),
            score,
        })
    }
}

/// Unconstrained composite greedy: always fills the stop budget when the
/// pool allows. Used as the controller's last-resort selection.
pub fn composite_greedy(problem: &SelectionProblem<'_>) -> Vec<usize> {
    build(problem, false)
}

fn build(problem: &SelectionProblem<'_>, constrained: bool) -> Vec<usize> {
    let limit = problem.subset_limit();
    let mut selected: Vec<usize> = Vec::with_capacity(limit);
    let mut remaining: Vec<usize> = (0..problem.candidate_count()).collect();

    while selected.len() < limit {
        let mut best: Option<(usize, f64)> = None;

        for (position, &candidate) in remaining.iter().enumerate() {
            if constrained && !is_eligible(problem, candidate, &selected) {
                continue;
            }
            let composite = problem.base_score(candidate) * BASE_WEIGHT
                + spacing_fit(problem, candidate, &selected) * SPACING_WEIGHT
                + detour_fit(problem, candidate) * DETOUR_WEIGHT;
            if best.is_none_or(|(_, score)| composite > score) {
                best = Some((position, composite));
            }
        }

        match best {
            Some((position, _)) => selected.push(remaining.remove(position)),
            None => break,
        }
    }

    selected
}

fn is_eligible(problem: &SelectionProblem<'_>, candidate: usize, selected: &[usize]) -> bool {
    let config = problem.config();
    let spaced = selected
        .iter()
        .all(|&other| problem.between(candidate, other) >= config.min_stop_distance_km);
    spaced && problem.detour_factor(candidate) - 1.0 <= config.max_detour_ratio
}

/// How well the candidate's distance to its nearest chosen stop matches an
/// even split of the direct route.
fn spacing_fit(problem: &SelectionProblem<'_>, candidate: usize, selected: &[usize]) -> f64 {
    let ideal = problem.direct_km() / (selected.len() + 2) as f64;
    let nearest = selected
        .iter()
        .map(|&other| problem.between(candidate, other))
        .fold(f64::INFINITY, f64::min);

    if !nearest.is_finite() || ideal <= 0.0 {
        return OPEN_SPACING_FIT;
    }

    let ratio = nearest / ideal;
    if (0.5..=1.5).contains(&ratio) {
        1.0
    } else if (0.3..=2.0).contains(&ratio) {
        0.7
    } else {
        0.3
    }
}

fn detour_fit(problem: &SelectionProblem<'_>, candidate: usize) -> f64 {
    let factor = problem.detour_factor(candidate);
    if factor <= 1.2 {
        1.0
    } else if factor <= 1.5 {
        0.8
    } else if factor <= 2.0 {
        0.5
    } else {
        0.2
    }
}

/// First-improvement hill climbing over single replacements.
fn local_search(
    problem: &SelectionProblem<'_>,
    mut current: Vec<usize>,
    deadline: &Deadline,
) -> Result<Vec<usize>, StrategyError> {
    let mut evaluator = Evaluator::new(problem);
    let mut current_score = evaluator.score(&current);
    let mut passes = 0usize;

    'search: loop {
        deadline.check()?;
        passes += 1;

        for position in 0..current.len() {
            for replacement in problem.unused(&current) {
                let mut trial = current.clone();
                trial[position] = replacement;
                let trial_score = evaluator.score(&trial);
                if trial_score > current_score {
                    current = trial;
                    current_score = trial_score;
                    continue 'search;
                }
            }
        }

        break;
    }

    tracing::debug!(passes, score = current_score, "greedy local search converged");
    Ok(current)
}
