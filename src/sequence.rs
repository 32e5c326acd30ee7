//! Stop sequencing: nearest-neighbor construction plus 2-opt.
//!
//! # Algorithm
//!
//! Starting from the route origin, repeatedly append the closest unvisited
//! stop. The resulting open path `[start, ..., end]` is then improved with
//! 2-opt: for each pair of edges `(r[i-1], r[i])` and `(r[j], r[j+1])`
//!
//! ```text
//! delta = d(r[i-1], r[j]) + d(r[i], r[j+1]) - d(r[i-1], r[i]) - d(r[j], r[j+1])
//! ```
//!
//! and if delta < 0 the segment `r[i..=j]` is reversed. Endpoints never move.
//! Passes repeat until one finds no improving reversal.
//!
//! Ordering is purely distance-driven; the route score is not consulted.

use crate::haversine::DistanceMatrix;

/// Minimum gain (km) for a reversal to count as an improvement.
const IMPROVEMENT_EPSILON: f64 = 1e-9;

/// Orders stops given as indices into a distance matrix.
#[derive(Debug, Clone, Copy)]
pub struct SequenceOptimizer<'a> {
    matrix: &'a DistanceMatrix,
}

impl<'a> SequenceOptimizer<'a> {
    pub fn new(matrix: &'a DistanceMatrix) -> Self {
        Self { matrix }
    }

    /// Nearest-neighbor order followed by 2-opt.
    pub fn sequence(&self, start: usize, end: usize, stops: &[usize]) -> Vec<usize> {
        let initial = self.nearest_neighbor(start, stops);
        self.two_opt(start, end, initial)
    }

    pub fn nearest_neighbor(&self, start: usize, stops: &[usize]) -> Vec<usize> {
        let mut remaining = stops.to_vec();
        let mut ordered = Vec::with_capacity(stops.len());
        let mut current = start;

        while !remaining.is_empty() {
            let mut nearest = 0;
            for (position, &stop) in remaining.iter().enumerate().skip(1) {
                if self.matrix.get(current, stop) < self.matrix.get(current, remaining[nearest]) {
                    nearest = position;
                }
            }
            current = remaining.remove(nearest);
            ordered.push(current);
        }

        ordered
    }

    /// Improve an order with 2-opt, keeping `start` and `end` fixed.
    ///
    /// Never lengthens the path. Running it on its own output returns that
    /// output unchanged.
    pub fn two_opt(&self, start: usize, end: usize, order: Vec<usize>) -> Vec<usize> {
        if order.len() < 2 {
            return order;
        }

        let mut route = Vec::with_capacity(order.len() + 2);
        route.push(start);
        route.extend(order);
        route.push(end);

        let n = route.len();
        let mut improved = true;
        while improved {
            improved = false;
            for i in 1..n - 2 {
                for j in i + 1..n - 1 {
                    if self.reversal_delta(&route, i, j) < -IMPROVEMENT_EPSILON {
                        route[i..=j].reverse();
                        improved = true;
                    }
                }
            }
        }

        route[1..n - 1].to_vec()
    }

    fn reversal_delta(&self, route: &[usize], i: usize, j: usize) -> f64 {
        let d = |a: usize, b: usize| self.matrix.get(route[a], route[b]);
        d(i - 1, j) + d(i, j + 1) - d(i - 1, i) - d(j, j + 1)
    }

    pub fn path_length(&self, start: usize, end: usize, order: &[usize]) -> f64 {
        let mut length = 0.0;
        let mut previous = start;
        for &stop in order {
            length += self.matrix.get(previous, stop);
            previous = stop;
        }
        length + self.matrix.get(previous, end)
    }
}
