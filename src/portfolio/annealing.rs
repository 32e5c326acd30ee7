//! Simulated annealing over stop subsets.
//!
//! A single current subset is perturbed by one random move per step. Better
//! neighbors are always accepted; worse ones with probability
//! `exp((neighbor - current) / T)` (the score is maximized). Temperature
//! cools geometrically until it drops below the configured minimum.

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use super::{Deadline, Evaluator, Selection, SelectionProblem, StrategyError, canonical};
use crate::models::OptimizationMethod;
use crate::traits::SelectionStrategy;

#[derive(Debug, Clone, Copy)]
pub struct SimulatedAnnealing {
    seed: u64,
}

impl SimulatedAnnealing {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

/// Neighborhood moves on a subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Move {
    /// Flip the membership of two candidates.
    Swap,
    Add,
    Remove,
    Replace,
}

impl SelectionStrategy for SimulatedAnnealing {
    fn method(&self) -> OptimizationMethod {
        OptimizationMethod::SimulatedAnnealing
    }

    fn select(
        &self,
        problem: &SelectionProblem<'_>,
        deadline: &Deadline,
    ) -> Result<Selection, StrategyError> {
        if problem.subset_limit() == 0 {
            return Err(StrategyError::EmptyPool);
        }

        let config = problem.config();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut evaluator = Evaluator::new(problem);

        let mut current = problem.random_subset(&mut rng);
        let mut current_score = evaluator.score(&current);
        let mut best = Selection {
            candidates: current.clone(),
            score: current_score,
        };

        let mut temperature = config.initial_temperature;
        let mut steps = 0usize;
        let mut accepted = 0usize;

        while temperature > config.min_temperature {
            deadline.check()?;

            for _ in 0..config.iterations_per_temperature {
                let neighbor = neighbor(&current, problem, &mut rng);
                let neighbor_score = evaluator.score(&neighbor);

                let accept = neighbor_score > current_score
                    || rng.random_range(0.0..1.0) < ((neighbor_score - current_score) / temperature).exp();

                if accept {
                    current = neighbor;
                    current_score = neighbor_score;
                    accepted += 1;

                    if current_score > best.score {
                        best = Selection {
                            candidates: current.clone(),
                            score: current_score,
                        };
                    }
                }
                steps += 1;
            }

            temperature *= config.cooling_rate;
        }

        tracing::debug!(steps, accepted, best = best.score, "simulated annealing finished");
        Ok(best)
    }
}

fn neighbor<R: Rng>(current: &[usize], problem: &SelectionProblem<'_>, rng: &mut R) -> Vec<usize> {
    let limit = problem.subset_limit();
    let n = problem.candidate_count();
    let has_unused = current.len() < n;

    let mut moves = Vec::with_capacity(4);
    if n >= 2 {
        moves.push(Move::Swap);
    }
    if current.len() < limit && has_unused {
        moves.push(Move::Add);
    }
    if current.len() > 1 {
        moves.push(Move::Remove);
    }
    if has_unused && !current.is_empty() {
        moves.push(Move::Replace);
    }

    let Some(&chosen) = moves.choose(rng) else {
        return current.to_vec();
    };

    let mut next = current.to_vec();
    match chosen {
        Move::Swap => {
            let picked = rand::seq::index::sample(rng, n, 2);
            for candidate in picked.iter() {
                match next.iter().position(|&c| c == candidate) {
                    Some(position) => {
                        next.remove(position);
                    }
                    None => next.push(candidate),
                }
            }
            // Fall back to a replacement when flipping leaves the budget.
            if next.is_empty() || next.len() > limit {
                next = current.to_vec();
                replace(&mut next, problem, rng);
            }
        }
        Move::Add => {
            if let Some(&city) = problem.unused(&next).choose(rng) {
                next.push(city);
            }
        }
        Move::Remove => {
            let position = rng.random_range(0..next.len());
            next.remove(position);
        }
        Move::Replace => replace(&mut next, problem, rng),
    }

    canonical(next)
}

fn replace<R: Rng>(subset: &mut [usize], problem: &SelectionProblem<'_>, rng: &mut R) {
    if subset.is_empty() {
        return;
    }
    if let Some(&city) = problem.unused(subset).choose(rng) {
        let position = rng.random_range(0..subset.len());
        subset[position] = city;
    }
}
