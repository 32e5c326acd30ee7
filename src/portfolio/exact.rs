//! Exhaustive subset enumeration.
//!
//! Scores every subset of size `1..=max_cities`. The subset count grows
//! binomially, so the strategy refuses pools larger than
//! [`EXACT_MAX_CANDIDATES`].

use super::{Deadline, Selection, SelectionProblem, StrategyError};
use crate::models::OptimizationMethod;
use crate::traits::SelectionStrategy;

/// Largest candidate pool exact enumeration will accept.
pub const EXACT_MAX_CANDIDATES: usize = 15;

/// Subsets scored between deadline checks.
const DEADLINE_POLL_INTERVAL: usize = 256;

#[derive(Debug, Clone, Copy, Default)]
pub struct ExactEnumeration;

impl SelectionStrategy for ExactEnumeration {
    fn method(&self) -> OptimizationMethod {
        OptimizationMethod::ExactEnumeration
    }

    fn is_eligible(&self, problem: &SelectionProblem<'_>) -> bool {
        problem.candidate_count() <= EXACT_MAX_CANDIDATES
    }

    fn select(
        &self,
        problem: &SelectionProblem<'_>,
        deadline: &Deadline,
    ) -> Result<Selection, StrategyError> {
        let n = problem.candidate_count();
        if n > EXACT_MAX_CANDIDATES {
            return Err(StrategyError::TooManyCandidates {
                count: n,
                limit: EXACT_MAX_CANDIDATES,
            });
        }
        let limit = problem.subset_limit();
        if limit == 0 {
            return Err(StrategyError::EmptyPool);
        }

        let mut best: Option<Selection> = None;
        let mut scored = 0usize;

        for size in 1..=limit {
            let mut combination: Vec<usize> = (0..size).collect();
            loop {
                if scored % DEADLINE_POLL_INTERVAL == 0 {
                    deadline.check()?;
                }
                scored += 1;

                let score = problem.evaluate(&combination);
                if best.as_ref().is_none_or(|best| score > best.score) {
                    best = Some(Selection {
                        candidates: combination.clone(),
                        score,
                    });
                }

                if !next_combination(&mut combination, n) {
                    break;
                }
            }
        }

        tracing::debug!(subsets = scored, "exact enumeration finished");
        best.ok_or(StrategyError::EmptyPool)
    }
}

/// Advance to the next k-combination of `0..n` in lexicographic order.
/// Returns false after the last combination.
fn next_combination(combination: &mut [usize], n: usize) -> bool {
    let k = combination.len();
    let mut i = k;
    while i > 0 {
        i -= 1;
        if combination[i] < n - k + i {
            combination[i] += 1;
            for j in i + 1..k {
                combination[j] = combination[j - 1] + 1;
            }
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::config::OptimizationConfig;
    use crate::models::ScoreMap;

    #[test]
    fn test_next_combination_counts() {
        let mut combination = vec![0, 1];
        let mut seen = vec![combination.clone()];
        while next_combination(&mut combination, 4) {
            seen.push(combination.clone());
        }
        assert_eq!(
            seen,
            vec![vec![0, 1], vec![0, 2], vec![0, 3], vec![1, 2], vec![1, 3], vec![2, 3]]
        );
    }

    #[test]
    fn test_finds_best_subset() {
        let (start, end, candidates) = riviera();
        let config = OptimizationConfig::default();
        let problem = problem(&start, &end, &candidates, &ScoreMap::new(), 3, &config);
        let selection = ExactEnumeration.select(&problem, &Deadline::unlimited()).unwrap();

        assert!(!selection.candidates.is_empty() && selection.candidates.len() <= 3);
        // Every single-city and pair subset scores no better.
        for a in 0..candidates.len() {
            assert!(problem.evaluate(&[a]) <= selection.score + 1e-12);
            for b in a + 1..candidates.len() {
                assert!(problem.evaluate(&[a, b]) <= selection.score + 1e-12);
            }
        }
    }

    #[test]
    fn test_rejects_large_pool() {
        let (start, end, candidates) = corridor_pool(EXACT_MAX_CANDIDATES + 1);
        let config = OptimizationConfig::default();
        let problem = problem(&start, &end, &candidates, &ScoreMap::new(), 3, &config);
        assert!(!ExactEnumeration.is_eligible(&problem));
        assert_eq!(
            ExactEnumeration.select(&problem, &Deadline::unlimited()),
            Err(StrategyError::TooManyCandidates { count: 16, limit: 15 })
        );
    }

    #[test]
    fn test_respects_deadline() {
        let (start, end, candidates) = riviera();
        let config = OptimizationConfig::default();
        let problem = problem(&start, &end, &candidates, &ScoreMap::new(), 3, &config);
        let expired = Deadline::after(Some(std::time::Duration::ZERO));
        assert!(matches!(
            ExactEnumeration.select(&problem, &expired),
            Err(StrategyError::TimedOut(_))
        ));
    }
}
