//! Core traits for the route optimizer.
//!
//! These are the seams between geometry, the selection strategies, and the
//! controller that compares them.

use crate::haversine::DistanceMatrix;
use crate::models::{Coordinate, OptimizationMethod};
use crate::portfolio::{Deadline, Selection, SelectionProblem, StrategyError};

/// Provides a distance matrix (km) for a set of locations.
///
/// The matrix is indexed by the provided location order.
pub trait DistanceMatrixProvider {
    fn matrix_for(&self, locations: &[Coordinate]) -> DistanceMatrix;
}

/// A subset-selection algorithm in the optimizer's portfolio.
///
/// Implementations read the shared problem and keep all search state local,
/// so several strategies can run on the same problem concurrently.
pub trait SelectionStrategy: Send + Sync {
    fn method(&self) -> OptimizationMethod;

    /// Whether the strategy may run on this problem at all.
    fn is_eligible(&self, _problem: &SelectionProblem<'_>) -> bool {
        true
    }

    /// Pick a non-empty subset of candidates and report its route score.
    fn select(
        &self,
        problem: &SelectionProblem<'_>,
        deadline: &Deadline,
    ) -> Result<Selection, StrategyError>;
}
