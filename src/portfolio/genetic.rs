//! Genetic algorithm over stop subsets.
//!
//! Each individual is a non-empty subset of candidates. Per generation the
//! top fifth survives unchanged; the rest of the population is bred from
//! tournament-selected parents by uniform crossover and mutation. The best
//! individual seen in any generation is returned, not just the final
//! population's best.

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use super::{Deadline, Evaluator, Selection, SelectionProblem, StrategyError, canonical};
use crate::models::OptimizationMethod;
use crate::traits::SelectionStrategy;

const TOURNAMENT_SIZE: usize = 3;
/// Fraction of each generation carried over unchanged.
const ELITE_FRACTION: usize = 5;

#[derive(Debug, Clone, Copy)]
pub struct GeneticAlgorithm {
    seed: u64,
}

impl GeneticAlgorithm {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

#[derive(Debug, Clone, Copy)]
enum Mutation {
    Add,
    Remove,
    Replace,
}

impl SelectionStrategy for GeneticAlgorithm {
    fn method(&self) -> OptimizationMethod {
        OptimizationMethod::GeneticAlgorithm
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
        let population_size = config.population_size;
        let elite_count = population_size / ELITE_FRACTION;
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut evaluator = Evaluator::new(problem);

        let mut population: Vec<Vec<usize>> = (0..population_size)
            .map(|_| problem.random_subset(&mut rng))
            .collect();
        let mut best: Option<Selection> = None;

        for generation in 0..config.generations {
            deadline.check()?;

            let fitness: Vec<f64> = population.iter().map(|individual| evaluator.score(individual)).collect();
            for (individual, &score) in population.iter().zip(&fitness) {
                if best.as_ref().is_none_or(|best| score > best.score) {
                    best = Some(Selection {
                        candidates: individual.clone(),
                        score,
                    });
                }
            }

            let mut ranked: Vec<usize> = (0..population.len()).collect();
            ranked.sort_by(|&a, &b| fitness[b].total_cmp(&fitness[a]));

            let mut next: Vec<Vec<usize>> = ranked
                .iter()
                .take(elite_count)
                .map(|&i| population[i].clone())
                .collect();

            while next.len() < population_size {
                let first = tournament(&fitness, &mut rng);
                let second = tournament(&fitness, &mut rng);
                let child = crossover(&population[first], &population[second], problem.subset_limit(), &mut rng);
                let child = if rng.random_bool(config.mutation_rate) {
                    mutate(child, problem, &mut rng)
                } else {
                    child
                };
                next.push(child);
            }

            population = next;

            if generation % 10 == 0 {
                tracing::trace!(
                    generation,
                    best = best.as_ref().map(|best| best.score),
                    "genetic algorithm progress"
                );
            }
        }

        // A run with zero generations still reports its initial population.
        if best.is_none() {
            for individual in &population {
                let score = evaluator.score(individual);
                if best.as_ref().is_none_or(|best| score > best.score) {
                    best = Some(Selection {
                        candidates: individual.clone(),
                        score,
                    });
                }
            }
        }

        best.ok_or(StrategyError::EmptyPool)
    }
}

/// Sample up to three distinct individuals, return the fittest.
fn tournament<R: Rng>(fitness: &[f64], rng: &mut R) -> usize {
    let size = TOURNAMENT_SIZE.min(fitness.len());
    rand::seq::index::sample(rng, fitness.len(), size)
        .into_iter()
        .fold(None, |best: Option<usize>, i| match best {
            Some(b) if fitness[b] >= fitness[i] => Some(b),
            _ => Some(i),
        })
        .unwrap_or(0)
}

/// Uniform crossover: cities in both parents are always inherited, cities in
/// one parent are inherited with probability 0.5. The child is capped at
/// `limit` and never empty.
fn crossover<R: Rng>(first: &[usize], second: &[usize], limit: usize, rng: &mut R) -> Vec<usize> {
    let mut union: Vec<usize> = first.iter().chain(second).copied().collect();
    union.sort_unstable();
    union.dedup();

    let (mut child, single): (Vec<usize>, Vec<usize>) = union
        .iter()
        .copied()
        .partition(|city| first.contains(city) && second.contains(city));
    child.truncate(limit);

    for city in single {
        if child.len() >= limit {
            break;
        }
        if rng.random_bool(0.5) {
            child.push(city);
        }
    }

    if child.is_empty() {
        if let Some(&city) = union.choose(rng) {
            child.push(city);
        }
    }
    canonical(child)
}

fn mutate<R: Rng>(mut individual: Vec<usize>, problem: &SelectionProblem<'_>, rng: &mut R) -> Vec<usize> {
    let mutation = [Mutation::Add, Mutation::Remove, Mutation::Replace][rng.random_range(0..3)];

    match mutation {
        Mutation::Add if individual.len() < problem.subset_limit() => {
            if let Some(&city) = problem.unused(&individual).choose(rng) {
                individual.push(city);
            }
        }
        Mutation::Remove if individual.len() > 1 => {
            let position = rng.random_range(0..individual.len());
            individual.remove(position);
        }
        Mutation::Replace if !individual.is_empty() => {
            if let Some(&city) = problem.unused(&individual).choose(rng) {
                let position = rng.random_range(0..individual.len());
                individual[position] = city;
            }
        }
        _ => {}
    }

    canonical(individual)
}
